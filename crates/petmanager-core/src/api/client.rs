//! API client for the pet manager REST API.
//!
//! `ApiClient` owns the request pipeline (auth interceptor over the HTTP
//! transport) and the session store, and hands out the resource services.

use std::sync::Arc;

use reqwest::{Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::auth::{LoginRedirect, SessionStore, TokenStorage};
use crate::config::Config;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse, AuthInterceptor, ReqwestTransport, Transport, UploadProgress};
use crate::models::Photo;

use super::{PetsApi, PhotoUpload, TutorsApi};

/// Query parameters accepted by the list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Filter by name (`nome`)
    pub name: Option<String>,
}

impl ListQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            params.push(("size", size.to_string()));
        }
        if let Some(ref name) = self.name {
            if !name.trim().is_empty() {
                params.push(("nome", name.trim().to_string()));
            }
        }
        params
    }
}

/// API client for the pet manager service.
/// Clone is cheap - the pipeline and session are shared behind `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    pipeline: Arc<dyn Transport>,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Build the full stack from configuration: reqwest transport, session
    /// store over it, and the auth interceptor in front.
    pub fn new(
        config: &Config,
        storage: Arc<dyn TokenStorage>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, ApiError> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        let session = SessionStore::new(&config.api_base_url, Arc::clone(&transport), storage)
            .with_redirect(redirect)
            .with_refresh_policy(config.refresh_policy);

        Ok(Self::with_transport(
            &config.api_base_url,
            transport,
            Arc::new(session),
        ))
    }

    /// Build a client over an existing transport. `transport` must be the
    /// same raw stage the session store talks to.
    pub fn with_transport(
        base_url: &str,
        transport: Arc<dyn Transport>,
        session: Arc<SessionStore>,
    ) -> Self {
        let pipeline: Arc<dyn Transport> =
            Arc::new(AuthInterceptor::new(Arc::clone(&session), transport));
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            pipeline,
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pets(&self) -> PetsApi {
        PetsApi::new(self.clone())
    }

    pub fn tutors(&self) -> TutorsApi {
        TutorsApi::new(self.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn url_with_query(&self, path: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let url = self.url(path);
        if query.is_empty() {
            return Ok(url);
        }
        Url::parse_with_params(&url, query)
            .map(String::from)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid URL {}: {}", url, e)))
    }

    /// Send a request through the interceptor pipeline.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method.clone();
        let url = request.url.clone();
        match self.pipeline.send(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(%method, url = %url, error = %e, "Request failed");
                Err(e)
            }
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = ApiRequest::get(self.url_with_query(path, query)?);
        self.execute(request).await?.json()
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::post_json(self.url(path), body)?;
        self.execute(request).await?.json()
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::put_json(self.url(path), body)?;
        self.execute(request).await?.json()
    }

    /// POST without a body, ignoring whatever the server returns.
    pub(crate) async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::new(Method::POST, self.url(path))).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(self.url(path))).await?;
        Ok(())
    }

    pub(crate) async fn upload(
        &self,
        path: &str,
        photo: PhotoUpload,
        progress: Option<UnboundedSender<UploadProgress>>,
    ) -> Result<Photo, ApiError> {
        debug!(path, size = photo.len(), content_type = photo.content_type(), "Uploading photo");
        let request =
            ApiRequest::new(Method::POST, self.url(path)).with_multipart(photo.into_multipart(progress));
        self.execute(request).await?.json()
    }
}
