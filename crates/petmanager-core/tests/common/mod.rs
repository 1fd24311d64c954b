#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use petmanager_core::api::ApiClient;
use petmanager_core::auth::{
    LoginRedirect, MemoryStorage, RefreshPolicy, SessionStore, TokenStorage, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
use petmanager_core::http::{ApiRequest, ApiResponse, Transport};
use petmanager_core::ApiError;
use reqwest::StatusCode;
use serde_json::json;

pub const BASE_URL: &str = "https://api.test";

type Handler = dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync;

/// Transport that records every request and answers from a handler.
///
/// Each send yields to the scheduler once before answering so concurrent
/// requests interleave the way real network calls would.
pub struct StubTransport {
    requests: Mutex<Vec<ApiRequest>>,
    handler: Box<Handler>,
}

impl StubTransport {
    pub fn new(handler: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(path) || r.url.contains(&format!("{}?", path)))
            .collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        (self.handler)(&request).error_for_status()
    }
}

/// Counts login redirects.
#[derive(Default)]
pub struct RedirectCounter(AtomicUsize);

impl RedirectCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl LoginRedirect for RedirectCounter {
    fn redirect_to_login(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub transport: Arc<StubTransport>,
    pub storage: Arc<MemoryStorage>,
    pub redirects: Arc<RedirectCounter>,
    pub session: Arc<SessionStore>,
    pub client: ApiClient,
}

impl Harness {
    pub fn new(handler: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Self {
        Self::with_policy(RefreshPolicy::Independent, handler)
    }

    pub fn with_policy(
        policy: RefreshPolicy,
        handler: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    ) -> Self {
        let transport = StubTransport::new(handler);
        let storage = Arc::new(MemoryStorage::new());
        let redirects = Arc::new(RedirectCounter::default());

        let raw: Arc<dyn Transport> = transport.clone();
        let session = Arc::new(
            SessionStore::new(BASE_URL, Arc::clone(&raw), storage.clone())
                .with_redirect(redirects.clone())
                .with_refresh_policy(policy),
        );
        let client = ApiClient::with_transport(BASE_URL, raw, Arc::clone(&session));

        Self {
            transport,
            storage,
            redirects,
            session,
            client,
        }
    }

    pub fn store_tokens(&self, access: Option<&str>, refresh: Option<&str>) {
        if let Some(access) = access {
            self.storage.set(ACCESS_TOKEN_KEY, access).unwrap();
        }
        if let Some(refresh) = refresh {
            self.storage.set(REFRESH_TOKEN_KEY, refresh).unwrap();
        }
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.storage.get(key).unwrap()
    }
}

pub fn ok_json(value: serde_json::Value) -> ApiResponse {
    ApiResponse::from_json(StatusCode::OK, &value)
}

pub fn status(status: StatusCode) -> ApiResponse {
    ApiResponse::empty(status)
}

pub fn empty_page() -> serde_json::Value {
    json!({"page": 0, "size": 10, "total": 0, "pageCount": 0, "content": []})
}

/// Protected resource that only accepts `Bearer <valid>`; refresh hands out `valid`.
pub fn token_gate(valid: &'static str) -> impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static {
    move |request: &ApiRequest| {
        if request.targets("/autenticacao/refresh") {
            return ok_json(json!({"access_token": valid, "refresh_token": "R2"}));
        }
        if request.authorization() == Some(format!("Bearer {}", valid).as_str()) {
            ok_json(empty_page())
        } else {
            status(StatusCode::UNAUTHORIZED)
        }
    }
}
