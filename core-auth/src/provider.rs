//! Credential providers consumed by the HTTP layer.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::HttpClient;
use core_runtime::config::BrokerConfig;
use tokio::sync::Mutex;
use tracing::debug;

use crate::ccg::{ClientCredentialsAuth, ClientCredentialsConfig};
use crate::error::Result;
use crate::types::AccessToken;

/// Tokens this close to expiry are treated as expired.
pub const TOKEN_REFRESH_BUFFER_SECS: i64 = 60;

/// Source of Box access tokens.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// An enterprise-wide service account token.
    async fn access_token(&self) -> Result<AccessToken>;

    /// Exchange `token` for one limited to `scopes` and, optionally, `resource`.
    async fn downscope(
        &self,
        token: &AccessToken,
        scopes: &[String],
        resource: Option<&str>,
    ) -> Result<AccessToken>;
}

#[async_trait]
impl CredentialProvider for ClientCredentialsAuth {
    async fn access_token(&self) -> Result<AccessToken> {
        self.authenticate().await
    }

    async fn downscope(
        &self,
        token: &AccessToken,
        scopes: &[String],
        resource: Option<&str>,
    ) -> Result<AccessToken> {
        ClientCredentialsAuth::downscope(self, token, scopes, resource).await
    }
}

/// Reuses the service account token until it is within
/// [`TOKEN_REFRESH_BUFFER_SECS`] of expiry.
///
/// The lock is held across the refresh so concurrent callers wait for a
/// single token request instead of racing the endpoint.
pub struct CachedCredentialProvider {
    inner: Arc<dyn CredentialProvider>,
    cached: Mutex<Option<AccessToken>>,
}

impl CachedCredentialProvider {
    pub fn new(inner: Arc<dyn CredentialProvider>) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CredentialProvider for CachedCredentialProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired_with_buffer(TOKEN_REFRESH_BUFFER_SECS) {
                debug!("Reusing cached service account token");
                return Ok(token.clone());
            }
            debug!("Cached service account token is near expiry, refreshing");
        }

        let token = self.inner.access_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn downscope(
        &self,
        token: &AccessToken,
        scopes: &[String],
        resource: Option<&str>,
    ) -> Result<AccessToken> {
        self.inner.downscope(token, scopes, resource).await
    }
}

/// Build the provider selected by `config.features.cache_tokens`.
pub fn credential_provider_from_config(
    config: &BrokerConfig,
    http_client: Arc<dyn HttpClient>,
) -> Arc<dyn CredentialProvider> {
    let auth: Arc<dyn CredentialProvider> = Arc::new(ClientCredentialsAuth::new(
        ClientCredentialsConfig::from_broker_config(config),
        http_client,
    ));

    if config.features.cache_tokens {
        Arc::new(CachedCredentialProvider::new(auth))
    } else {
        auth
    }
}
