use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use core_auth::DEFAULT_UI_SCOPES;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{deserialize_id, deserialize_scopes, parse_json_body};
use crate::error::Result;
use crate::state::AppState;

/// Lifetime reported to the frontend, independent of the real token.
pub const TOKEN_EXPIRES_IN: u64 = 3600;

pub const DEFAULT_FOLDER_ID: &str = "0";

#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub folder_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scopes")]
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// `POST /api/token`
///
/// Without downscoping enabled the folder and scopes are accepted but the
/// enterprise token is returned as is.
#[tracing::instrument(skip(state, body))]
pub async fn issue_token(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TokenResponse>> {
    let request: TokenRequest = parse_json_body(&body)?;
    let folder_id = request
        .folder_id
        .unwrap_or_else(|| DEFAULT_FOLDER_ID.to_string());
    let scopes = request
        .scopes
        .unwrap_or_else(|| DEFAULT_UI_SCOPES.iter().map(|s| s.to_string()).collect());

    let token = state.credentials.access_token().await?;

    let token = if state.config.features.downscope_tokens {
        let resource = state.connector(&token).folder_resource_url(&folder_id);
        let narrowed = state
            .credentials
            .downscope(&token, &scopes, Some(&resource))
            .await?;
        info!(folder_id = %folder_id, ?scopes, "Issued downscoped token");
        narrowed
    } else {
        debug!(folder_id = %folder_id, ?scopes, "Issued service account token");
        token
    };

    Ok(Json(TokenResponse {
        access_token: token.access_token,
        expires_in: TOKEN_EXPIRES_IN,
    }))
}
