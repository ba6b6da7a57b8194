use std::sync::Arc;

use bridge_traits::HttpClient;
use core_auth::{credential_provider_from_config, AccessToken, CredentialProvider};
use core_runtime::config::BrokerConfig;
use provider_box::BoxConnector;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BrokerConfig>,
    pub http_client: Arc<dyn HttpClient>,
    pub credentials: Arc<dyn CredentialProvider>,
}

impl AppState {
    /// Wire the credential provider selected by the configuration.
    pub fn new(config: BrokerConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let credentials = credential_provider_from_config(&config, http_client.clone());
        Self::with_credential_provider(config, http_client, credentials)
    }

    pub fn with_credential_provider(
        config: BrokerConfig,
        http_client: Arc<dyn HttpClient>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            http_client,
            credentials,
        }
    }

    /// A Box connector acting with `token`.
    pub fn connector(&self, token: &AccessToken) -> BoxConnector {
        BoxConnector::new(
            self.http_client.clone(),
            self.config.endpoints.api_base_url.clone(),
            token.access_token.clone(),
        )
    }

    /// Authenticate and return a connector for the service account.
    pub async fn service_connector(&self) -> crate::error::Result<BoxConnector> {
        let token = self.credentials.access_token().await?;
        Ok(self.connector(&token))
    }
}
