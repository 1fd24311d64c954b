//! HTTP request pipeline.
//!
//! Requests are described by [`ApiRequest`] and flow through a chain of
//! [`Transport`] stages. [`AuthInterceptor`] attaches the bearer token and
//! handles the refresh-then-retry sequence on 401; [`ReqwestTransport`] is
//! the last stage and talks to the network.

pub mod interceptor;
pub mod request;
pub mod response;
pub mod transport;

pub use interceptor::{AuthInterceptor, RequestState};
pub use request::{ApiRequest, MultipartFile, RequestBody, UploadProgress};
pub use response::ApiResponse;
pub use transport::{ReqwestTransport, Transport};
