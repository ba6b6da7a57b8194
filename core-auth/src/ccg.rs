//! Client Credentials Grant against the Box token endpoint.
//!
//! The broker authenticates as the application's service account using its
//! client ID/secret plus the enterprise ID, then optionally exchanges the
//! resulting token for a narrower one (downscoping) before handing it to a
//! browser.

use std::fmt;
use std::sync::Arc;

use bridge_traits::{HttpClient, HttpRequest, HttpResponse};
use core_runtime::config::BrokerConfig;
use core_runtime::logging::redact_if_sensitive;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::types::{AccessToken, TokenErrorResponse, TokenResponse};

const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";
const GRANT_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";
const SUBJECT_TYPE_ENTERPRISE: &str = "enterprise";

/// Inputs of the client-credentials grant.
#[derive(Clone)]
pub struct ClientCredentialsConfig {
    pub client_id: String,
    pub client_secret: String,
    pub enterprise_id: String,
    pub token_url: String,
}

impl ClientCredentialsConfig {
    pub fn from_broker_config(config: &BrokerConfig) -> Self {
        Self {
            client_id: config.credentials.client_id.clone(),
            client_secret: config.credentials.client_secret.clone(),
            enterprise_id: config.credentials.enterprise_id.clone(),
            token_url: config.endpoints.token_url.clone(),
        }
    }
}

impl fmt::Debug for ClientCredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &redact_if_sensitive("client_secret", &self.client_secret),
            )
            .field("enterprise_id", &self.enterprise_id)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Performs token requests against the Box identity service.
///
/// Every call goes to the network; wrap it in
/// [`CachedCredentialProvider`](crate::CachedCredentialProvider) to reuse
/// tokens until they near expiry.
pub struct ClientCredentialsAuth {
    config: ClientCredentialsConfig,
    http_client: Arc<dyn HttpClient>,
}

impl ClientCredentialsAuth {
    pub fn new(config: ClientCredentialsConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Obtain an enterprise-wide access token for the service account.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NetworkError`] when the token endpoint is unreachable
    /// - [`AuthError::AuthenticationFailed`] on any non-2xx answer
    /// - [`AuthError::InvalidResponse`] when the body lacks `access_token`
    #[instrument(skip(self), fields(enterprise_id = %self.config.enterprise_id))]
    pub async fn authenticate(&self) -> Result<AccessToken> {
        let params = [
            ("grant_type", GRANT_CLIENT_CREDENTIALS),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("box_subject_type", SUBJECT_TYPE_ENTERPRISE),
            ("box_subject_id", self.config.enterprise_id.as_str()),
        ];

        debug!("Requesting client-credentials token");
        let response = self.post_form(&params).await?;

        if !response.is_success() {
            let status = response.status;
            let reason = error_reason(&response);
            warn!(status, error = %reason, "Client-credentials token request rejected");
            return Err(AuthError::AuthenticationFailed { status, reason });
        }

        let token_response = parse_token_response(&response)?;
        info!(
            "Obtained service account token (expires in {}s)",
            token_response.expires_in
        );

        Ok(AccessToken::new(
            token_response.access_token,
            token_response.expires_in,
        ))
    }

    /// Exchange `token` for one restricted to `scopes`, optionally bound to a
    /// single `resource` URL (e.g. `https://api.box.com/2.0/folders/123`).
    #[instrument(skip(self, token))]
    pub async fn downscope(
        &self,
        token: &AccessToken,
        scopes: &[String],
        resource: Option<&str>,
    ) -> Result<AccessToken> {
        if scopes.is_empty() {
            return Err(AuthError::InvalidRequest(
                "At least one scope is required to downscope a token".to_string(),
            ));
        }

        let scope = scopes.join(" ");
        let mut params = vec![
            ("grant_type", GRANT_TOKEN_EXCHANGE),
            ("subject_token", token.access_token.as_str()),
            ("subject_token_type", TOKEN_TYPE_ACCESS_TOKEN),
            ("scope", scope.as_str()),
        ];
        if let Some(resource) = resource {
            params.push(("resource", resource));
        }

        debug!("Exchanging token for a downscoped token");
        let response = self.post_form(&params).await?;

        if !response.is_success() {
            let status = response.status;
            let reason = error_reason(&response);
            warn!(status, error = %reason, "Token exchange rejected");
            return Err(AuthError::DownscopeFailed { status, reason });
        }

        let token_response = parse_token_response(&response)?;
        debug!(
            "Obtained downscoped token (expires in {}s)",
            token_response.expires_in
        );

        Ok(
            AccessToken::new(token_response.access_token, token_response.expires_in)
                .with_scopes(scopes.to_vec()),
        )
    }

    async fn post_form(&self, params: &[(&str, &str)]) -> Result<HttpResponse> {
        let request = HttpRequest::post(self.config.token_url.clone())
            .form(&params)
            .map_err(|e| {
                AuthError::InvalidRequest(format!("Failed to encode token request: {}", e))
            })?;

        self.http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))
    }
}

fn parse_token_response(response: &HttpResponse) -> Result<TokenResponse> {
    response
        .json::<TokenResponse>()
        .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse token response: {}", e)))
}

/// Best-effort description of a token endpoint failure.
fn error_reason(response: &HttpResponse) -> String {
    if let Ok(body) = response.json::<TokenErrorResponse>() {
        match (body.error, body.error_description) {
            (Some(error), Some(description)) => return format!("{}: {}", error, description),
            (None, Some(description)) => return description,
            (Some(error), None) => return error,
            (None, None) => {}
        }
    }

    response
        .text()
        .unwrap_or_else(|_| "Unable to read error response".to_string())
}
