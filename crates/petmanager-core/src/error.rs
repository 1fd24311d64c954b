use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Invalid photo: {0}")]
    InvalidPhoto(String),

    /// Rejected locally before anything was sent
    #[error("Invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Token storage error: {0}")]
    Storage(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    pub(crate) fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(truncated),
            code @ 500..=599 => ApiError::ServerError {
                status: code,
                message: truncated,
            },
            code => ApiError::Validation {
                status: code,
                message: truncated,
            },
        }
    }

    /// HTTP status this error corresponds to. Connection failures report 0.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::NotFound(_) => Some(404),
            ApiError::NetworkUnavailable(_) => Some(0),
            ApiError::ServerError { status, .. } | ApiError::Validation { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// True for failures that end the session (the caller has been logged out).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::NoRefreshToken)
    }

    /// Localized message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized | ApiError::NoRefreshToken => {
                "Sessão expirada. Faça login novamente.".to_string()
            }
            ApiError::NotFound(_) => "Registro não encontrado.".to_string(),
            ApiError::NetworkUnavailable(_) => {
                "Erro de conexão. Verifique sua internet ou se a API está disponível.".to_string()
            }
            ApiError::ServerError { .. } => {
                "Erro no servidor. Tente novamente mais tarde.".to_string()
            }
            ApiError::Validation { message, .. } if !message.is_empty() => {
                format!("Dados inválidos: {}", message)
            }
            ApiError::Validation { .. } => "Dados inválidos.".to_string(),
            ApiError::InvalidPhoto(reason) => reason.clone(),
            ApiError::InvalidInput { message, .. } => message.clone(),
            _ => "Erro inesperado. Tente novamente.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::NetworkUnavailable(err.to_string())
        }
    }
}
