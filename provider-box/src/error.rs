//! Error types for the Box provider

use thiserror::Error;

/// Box provider errors
#[derive(Error, Debug)]
pub enum BoxError {
    /// API request returned a non-2xx status
    #[error("Box API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse Box API response: {0}")]
    ParseError(String),

    /// Transport failure
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

impl BoxError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BoxError::ApiError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// A metadata instance for the template already exists on the item.
    pub fn is_conflict(&self) -> bool {
        self.status_code() == Some(409)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// Result type for Box operations
pub type Result<T> = std::result::Result<T, BoxError>;
