//! # Authentication Module
//!
//! Server-to-server authentication against Box.
//!
//! ## Overview
//!
//! The broker holds the application's client credentials and mints access
//! tokens with the Client Credentials Grant (CCG). Tokens handed to browsers
//! can be narrowed with the token-exchange grant so a leaked token only
//! reaches one folder with a fixed set of scopes.
//!
//! ## Features
//!
//! - Client Credentials Grant on behalf of an enterprise service account
//! - Token downscoping with optional resource binding
//! - Optional in-process token cache with an expiry buffer
//! - Tokens are redacted from `Debug` output

pub mod ccg;
pub mod error;
pub mod provider;
pub mod types;

pub use ccg::{ClientCredentialsAuth, ClientCredentialsConfig};
pub use error::{AuthError, Result};
pub use provider::{
    credential_provider_from_config, CachedCredentialProvider, CredentialProvider,
    TOKEN_REFRESH_BUFFER_SECS,
};
pub use types::{AccessToken, DEFAULT_UI_SCOPES};
