pub mod config;
pub mod metadata;
pub mod token;
pub mod upload;

use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::error::{Result, ServiceError};
use crate::state::AppState;

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/token", post(token::issue_token))
        .route("/config", get(config::get_config))
        .route("/upload-callback", post(upload::upload_callback))
        .route("/files/{file_id}/metadata", get(metadata::get_file_metadata))
        .route(
            "/folders/{folder_id}/metadata",
            get(metadata::get_folder_metadata),
        )
}

/// The full application: JSON API under `/api`, the frontend everywhere else.
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        .nest("/api", api_router())
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Parse an optional JSON request body.
///
/// An empty body or a literal `null` yields `T::default()`; anything else that
/// is not valid JSON for `T` is a validation error.
pub(crate) fn parse_json_body<T>(body: &Bytes) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice::<Option<T>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| ServiceError::Validation(format!("Invalid JSON body: {}", e)))
}

/// Box identifiers arrive as strings or bare numbers.
///
/// Empty strings, `null` and any other JSON type count as absent.
pub(crate) fn deserialize_id<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) if !id.is_empty() => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

/// Optional free text. Anything but a JSON string counts as absent.
pub(crate) fn deserialize_optional_string<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

/// Scope lists keep only their string entries.
///
/// A value that is not an array, or an array without a single string, counts
/// as absent so the caller falls back to its defaults.
pub(crate) fn deserialize_scopes<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let scopes: Vec<String> = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(scope) => Some(scope),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(Some(scopes).filter(|scopes| !scopes.is_empty()))
}
