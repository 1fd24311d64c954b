use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::auth::{SessionStore, LOGIN_PATH, REFRESH_PATH};
use crate::error::ApiError;

use super::{ApiRequest, ApiResponse, Transport};

/// Lifecycle of one logical request as it moves through the interceptor.
///
/// `Succeeded`, `Failed` and `LoggedOut` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Sent,
    Succeeded,
    FailedNonAuth,
    FailedAuth,
    RefreshPending,
    RefreshSucceeded,
    RefreshFailed,
    Retried,
    Failed,
    LoggedOut,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Succeeded | RequestState::Failed | RequestState::LoggedOut
        )
    }
}

fn transition(request: &ApiRequest, state: RequestState) {
    debug!(
        method = %request.method,
        url = %request.url,
        state = ?state,
        terminal = state.is_terminal(),
        "Request state"
    );
}

/// Pipeline stage that attaches the bearer token and recovers from an
/// expired access token by refreshing once and replaying the request.
pub struct AuthInterceptor<T> {
    session: Arc<SessionStore>,
    next: T,
}

impl<T: Transport> AuthInterceptor<T> {
    pub fn new(session: Arc<SessionStore>, next: T) -> Self {
        Self { session, next }
    }

    /// Build the request actually put on the wire, returning the token it carries.
    fn authorize(&self, request: &ApiRequest) -> Result<(ApiRequest, Option<String>), ApiError> {
        if request.targets(LOGIN_PATH) {
            return Ok((request.without_authorization(), None));
        }
        match self.session.token() {
            Some(token) => Ok((request.with_bearer(&token)?, Some(token))),
            None => Ok((request.clone(), None)),
        }
    }

    /// Login and refresh must never trigger a refresh themselves.
    fn is_refreshable(request: &ApiRequest) -> bool {
        !request.targets(LOGIN_PATH) && !request.targets(REFRESH_PATH)
    }
}

#[async_trait]
impl<T: Transport> Transport for AuthInterceptor<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        transition(&request, RequestState::Pending);
        let (outgoing, attached) = self.authorize(&request)?;

        transition(&request, RequestState::Sent);
        let error = match self.next.send(outgoing).await {
            Ok(response) => {
                transition(&request, RequestState::Succeeded);
                return Ok(response);
            }
            Err(error) => error,
        };

        if !matches!(error, ApiError::Unauthorized) || !Self::is_refreshable(&request) {
            transition(&request, RequestState::FailedNonAuth);
            transition(&request, RequestState::Failed);
            return Err(error);
        }

        transition(&request, RequestState::FailedAuth);
        transition(&request, RequestState::RefreshPending);
        if let Err(refresh_error) = self.session.refresh_rejected(attached.as_deref()).await {
            // refresh() has already logged the session out
            transition(&request, RequestState::RefreshFailed);
            transition(&request, RequestState::LoggedOut);
            return Err(refresh_error);
        }
        transition(&request, RequestState::RefreshSucceeded);

        let (retry, _) = self.authorize(&request)?;
        // Replayed uploads stream from the first byte again
        request.restart_upload_progress();
        transition(&request, RequestState::Retried);
        match self.next.send(retry).await {
            Ok(response) => {
                transition(&request, RequestState::Succeeded);
                Ok(response)
            }
            Err(ApiError::Unauthorized) => {
                warn!(url = %request.url, "Still unauthorized after token refresh, logging out");
                self.session.logout();
                transition(&request, RequestState::LoggedOut);
                Err(ApiError::Unauthorized)
            }
            Err(error) => {
                transition(&request, RequestState::Failed);
                Err(error)
            }
        }
    }
}
