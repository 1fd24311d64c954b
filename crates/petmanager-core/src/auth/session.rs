use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::http::{ApiRequest, Transport};

use super::{TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Login endpoint path
pub const LOGIN_PATH: &str = "/autenticacao/login";

/// Token refresh endpoint path
pub const REFRESH_PATH: &str = "/autenticacao/refresh";

/// Account registration endpoint path
pub const REGISTER_PATH: &str = "/q/autenticacao/register";

/// How concurrent refresh requests are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Every request rejected with 401 runs its own refresh call.
    #[default]
    Independent,
    /// Requests rejected while a refresh is in flight wait for it and reuse
    /// the new token instead of refreshing again.
    SingleFlight,
}

/// Sends the user back to the login screen when the session ends.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

impl<F> LoginRedirect for F
where
    F: Fn() + Send + Sync,
{
    fn redirect_to_login(&self) {
        self()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Point-in-time view of the stored credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

/// Single source of truth for credential state.
///
/// Tokens live in a [`TokenStorage`]; the authenticated flag is always
/// derived from whether an access token is stored. Login and refresh talk
/// to the raw transport, not the intercepted pipeline, so they can never
/// recurse into another refresh.
pub struct SessionStore {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn TokenStorage>,
    redirect: Arc<dyn LoginRedirect>,
    base_url: String,
    policy: RefreshPolicy,
    refresh_lock: Mutex<()>,
    authenticated: watch::Sender<bool>,
}

impl SessionStore {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn TokenStorage>,
    ) -> Self {
        let redirect: Arc<dyn LoginRedirect> = Arc::new(|| {});
        let (authenticated, _) = watch::channel(false);
        let store = Self {
            transport,
            storage,
            redirect,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy: RefreshPolicy::default(),
            refresh_lock: Mutex::new(()),
            authenticated,
        };
        store.publish();
        store
    }

    pub fn with_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.policy
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read token storage");
                None
            }
        }
    }

    fn store_tokens(&self, tokens: &TokenResponse) -> Result<(), ApiError> {
        self.storage
            .set(ACCESS_TOKEN_KEY, &tokens.access_token)
            .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        if let Some(ref refresh_token) = tokens.refresh_token {
            self.storage
                .set(REFRESH_TOKEN_KEY, refresh_token)
                .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        }
        self.publish();
        Ok(())
    }

    /// Push the storage-derived flag to subscribers.
    fn publish(&self) {
        self.authenticated.send_replace(self.is_authenticated());
    }

    async fn exchange(&self, request: ApiRequest) -> Result<TokenResponse, ApiError> {
        let response = self.transport.send(request).await?;
        response.json()
    }

    /// Current access token, if any.
    pub fn token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn snapshot(&self) -> Session {
        let access_token = self.token();
        Session {
            is_authenticated: access_token.is_some(),
            access_token,
            refresh_token: self.read(REFRESH_TOKEN_KEY),
        }
    }

    /// Watch the authenticated flag as it changes on login, refresh and logout.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Authenticate and persist the returned tokens. Failures are returned
    /// as-is and leave the stored state untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post_json(
            self.endpoint(LOGIN_PATH),
            &Credentials { username, password },
        )?;

        let tokens = self.exchange(request).await?;
        self.store_tokens(&tokens)?;
        info!(username, "Logged in");
        Ok(())
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post_json(
            self.endpoint(REGISTER_PATH),
            &Credentials { username, password },
        )?;
        self.transport.send(request).await?;
        info!(username, "Account registered");
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Any failure ends the session: without a stored refresh token this
    /// logs out before touching the network, and a rejected refresh logs
    /// out before the error is returned.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let Some(refresh_token) = self.read(REFRESH_TOKEN_KEY) else {
            warn!("No refresh token available, logging out");
            self.logout();
            return Err(ApiError::NoRefreshToken);
        };

        let result = async {
            let request = ApiRequest::post_json(
                self.endpoint(REFRESH_PATH),
                &RefreshRequest {
                    refresh_token: &refresh_token,
                },
            )?;
            let tokens = self.exchange(request).await?;
            self.store_tokens(&tokens)
        }
        .await;

        match result {
            Ok(()) => {
                debug!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, logging out");
                self.logout();
                Err(e)
            }
        }
    }

    /// Refresh on behalf of a request that was rejected while carrying `rejected`.
    ///
    /// Under [`RefreshPolicy::SingleFlight`] callers queue behind the refresh
    /// in progress, and skip the network call when the token has already
    /// moved on from the one that was rejected.
    pub(crate) async fn refresh_rejected(&self, rejected: Option<&str>) -> Result<(), ApiError> {
        match self.policy {
            RefreshPolicy::Independent => self.refresh().await,
            RefreshPolicy::SingleFlight => {
                let _guard = self.refresh_lock.lock().await;
                let current = self.token();
                if current.is_some() && current.as_deref() != rejected {
                    debug!("Token already refreshed by a concurrent request");
                    return Ok(());
                }
                self.refresh().await
            }
        }
    }

    /// Clear every stored token and send the user to the login screen.
    /// Safe to call when already logged out.
    pub fn logout(&self) {
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear token storage");
        }
        // Subscribers see whatever storage still holds
        self.publish();
        info!("Logged out");
        self.redirect.redirect_to_login();
    }

    /// Guard for screens that need a session: redirects to login when
    /// there is none.
    pub fn require_auth(&self) -> Result<(), ApiError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            self.redirect.redirect_to_login();
            Err(ApiError::Unauthorized)
        }
    }
}
