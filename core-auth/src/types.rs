use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scopes requested for frontend tokens when the caller names none.
///
/// These cover everything the Box UI Elements (explorer, uploader, previewer)
/// need against a folder.
pub const DEFAULT_UI_SCOPES: &[&str] = &[
    "root_readwrite",
    "item_preview",
    "item_upload",
    "item_share",
    "item_download",
];

/// A Box access token.
///
/// # Security
///
/// Tokens must never be logged. The `Debug` implementation redacts the token
/// string.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
///
/// let token = AccessToken::new("T9cE5asGnuyYCCqIZFoWjFHvNbvVqHjl".to_string(), 3600);
/// assert!(!token.is_expired_with_buffer(60));
/// assert!(token.scopes.is_empty());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// The bearer token used for API requests
    pub access_token: String,
    /// When the token expires (UTC)
    pub expires_at: DateTime<Utc>,
    /// Scopes the token was restricted to; empty for a full enterprise token
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl AccessToken {
    /// Create a token expiring `expires_in` seconds from now.
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
            scopes: Vec::new(),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Check if the token is expired or will expire within `buffer_seconds`.
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        Utc::now() >= self.expires_at - Duration::seconds(buffer_seconds)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Token endpoint response.
///
/// Box answers both the client-credentials grant and the token-exchange
/// (downscope) grant with this shape.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    #[allow(dead_code)]
    pub token_type: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// Error body returned by the Box token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    pub error: Option<String>,
    pub error_description: Option<String>,
}
