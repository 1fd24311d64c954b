use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::ApiError;

/// Bytes sent so far for a multipart upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent.min(self.total) * 100) / self.total) as u8
    }
}

/// A single file sent as a multipart form field.
#[derive(Debug, Clone)]
pub struct MultipartFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
    pub progress: Option<UnboundedSender<UploadProgress>>,
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartFile),
}

/// Outbound HTTP call descriptor.
///
/// Descriptors are cloned, never mutated in place, when a pipeline stage
/// needs to add headers. The interceptor relies on this to replay the
/// caller's original request after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn post_json<B: Serialize + ?Sized>(url: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::POST, url).with_json(body)
    }

    pub fn put_json<B: Serialize + ?Sized>(url: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::PUT, url).with_json(body)
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn with_multipart(mut self, file: MultipartFile) -> Self {
        self.body = RequestBody::Multipart(file);
        self
    }

    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Clone of this request carrying `Authorization: Bearer <token>`.
    pub fn with_bearer(&self, token: &str) -> Result<Self, ApiError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidRequest("Token is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        Ok(self.clone().with_header(header::AUTHORIZATION, value))
    }

    /// Clone of this request with any `Authorization` header removed.
    pub fn without_authorization(&self) -> Self {
        let mut request = self.clone();
        request.headers.remove(header::AUTHORIZATION);
        request
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Whether the request URL addresses the given endpoint path.
    pub fn targets(&self, path: &str) -> bool {
        self.url.contains(path)
    }

    /// Tell the upload listener, if any, that the body starts over from zero.
    pub(crate) fn restart_upload_progress(&self) {
        if let RequestBody::Multipart(MultipartFile {
            progress: Some(tx),
            bytes,
            ..
        }) = &self.body
        {
            let _ = tx.send(UploadProgress {
                sent: 0,
                total: bytes.len() as u64,
            });
        }
    }

    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}
