use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Box authentication failed (status {status}): {reason}")]
    AuthenticationFailed { status: u16, reason: String },

    #[error("Token downscoping failed (status {status}): {reason}")]
    DownscopeFailed { status: u16, reason: String },

    #[error("Network error reaching the identity service: {0}")]
    NetworkError(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("Invalid token request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
