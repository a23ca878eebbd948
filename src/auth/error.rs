use crate::api::ApiError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("email must not be empty")]
    EmptyIdentity,
    #[error("failed to generate ceremony options: {0}")]
    CeremonyOptions(String),
    #[error("user already exists, please login instead")]
    DuplicateIdentity,
    #[error("authenticator failed: {0}")]
    Authenticator(String),
    #[error("challenge expired before verification")]
    ChallengeExpired,
    #[error("verification rejected: {0}")]
    Verification(String),
    #[error("invalid session token: {0}")]
    InvalidToken(String),
    #[error("email verification failed: {0}")]
    EmailVerification(String),
    #[error("session expired")]
    ExpiredSession,
    #[error("no active session")]
    NoSession,
    #[error("authorization failed ({0}), please login again")]
    Unauthorized(u16),
    #[error("session storage error: {0}")]
    Storage(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("request failed ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Response(String),
}

impl AuthError {
    /// Errors after which the UI has to send the user back to the login screen.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::ExpiredSession | Self::NoSession | Self::Unauthorized(_)
        )
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http {
                status: status @ (401 | 403),
                ..
            } => Self::Unauthorized(status),
            ApiError::Http { status, message } => Self::Rejected { status, message },
            ApiError::Timeout(message) => Self::Timeout(message),
            ApiError::Network(message) | ApiError::Config(message) => Self::Network(message),
            ApiError::Parse(message) => Self::Response(message),
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
