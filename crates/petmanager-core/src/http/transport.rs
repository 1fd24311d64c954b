use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tracing::debug;

use crate::error::ApiError;

use super::{ApiRequest, ApiResponse, MultipartFile, RequestBody, UploadProgress};

/// Upload bodies are streamed in chunks of this size so progress can be reported.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// One stage of the request pipeline.
///
/// A transport resolves to `Ok` only for 2xx responses. Any other status is
/// returned as the `ApiError` produced by [`ApiError::from_status`], and
/// connection failures as [`ApiError::NetworkUnavailable`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        (**self).send(request).await
    }
}

/// The final pipeline stage: puts requests on the wire with reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Without a timeout, requests wait for as long as the server takes.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    fn multipart_form(file: &MultipartFile) -> Result<Form, ApiError> {
        let part = Part::stream_with_length(upload_body(file), file.bytes.len() as u64)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        Ok(Form::new().part(file.field.clone(), part))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let ApiRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let builder = self.client.request(method.clone(), &url).headers(headers);
        let builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(file) => builder.multipart(Self::multipart_form(&file)?),
        };

        debug!(%method, url = %url, "Sending request");
        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        debug!(%method, url = %url, status = status.as_u16(), "Response received");

        ApiResponse {
            status,
            headers,
            body,
        }
        .error_for_status()
    }
}

/// Number of chunks an upload of `len` bytes is split into.
fn chunk_count(len: usize) -> usize {
    len.div_ceil(UPLOAD_CHUNK_SIZE)
}

/// Streaming upload body that reports progress as each chunk is pulled.
fn upload_body(file: &MultipartFile) -> Body {
    let bytes = Arc::clone(&file.bytes);
    let progress = file.progress.clone();
    let total = bytes.len() as u64;

    let stream = futures::stream::iter(0..chunk_count(bytes.len())).map(move |index| {
        let start = index * UPLOAD_CHUNK_SIZE;
        let end = (start + UPLOAD_CHUNK_SIZE).min(bytes.len());
        if let Some(tx) = &progress {
            // Receiver may be gone if the caller stopped listening
            let _ = tx.send(UploadProgress {
                sent: end as u64,
                total,
            });
        }
        Ok::<_, std::io::Error>(bytes[start..end].to_vec())
    });

    Body::wrap_stream(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(0), 0);
        assert_eq!(chunk_count(1), 1);
        assert_eq!(chunk_count(UPLOAD_CHUNK_SIZE), 1);
        assert_eq!(chunk_count(UPLOAD_CHUNK_SIZE + 1), 2);
        assert_eq!(chunk_count(5 * 1024 * 1024), 80);
    }

    #[test]
    fn test_multipart_form_rejects_bad_mime() {
        let file = MultipartFile {
            field: "foto".to_string(),
            file_name: "rex.png".to_string(),
            content_type: "not a mime type".to_string(),
            bytes: Arc::from(vec![1u8, 2, 3]),
            progress: None,
        };
        assert!(ReqwestTransport::multipart_form(&file).is_err());
    }
}
