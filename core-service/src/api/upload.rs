use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{deserialize_id, deserialize_optional_string, parse_json_body};
use crate::error::{Result, ServiceError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UploadCallbackRequest {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub file_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub file_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub folder_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadCallbackResponse {
    pub success: bool,
    pub file_id: String,
    pub metadata_applied: Map<String, Value>,
}

/// Text after the last `.` of a file name, or `"unknown"` without one.
pub fn file_type_tag(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((_, extension)) => extension,
        None => "unknown",
    }
}

/// `POST /api/upload-callback`
#[tracing::instrument(skip(state, body))]
pub async fn upload_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UploadCallbackResponse>> {
    let request: UploadCallbackRequest = parse_json_body(&body)?;
    let file_id = request
        .file_id
        .ok_or_else(|| ServiceError::Validation("No file_id provided".to_string()))?;

    let connector = state.service_connector().await?;
    let file = connector.get_file(&file_id).await?;

    let mut metadata = Map::new();
    metadata.insert(
        "uploadDate".to_string(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    metadata.insert(
        "fileName".to_string(),
        request.file_name.map(Value::String).unwrap_or(Value::Null),
    );
    metadata.insert(
        "fileType".to_string(),
        Value::String(file_type_tag(&file.name).to_string()),
    );

    if state.config.features.apply_upload_metadata {
        match state.config.upload_template() {
            Some(template) => {
                // Null fields are left out of the write.
                let values: Map<String, Value> = metadata
                    .iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                connector.apply_metadata(&file_id, &template, &values).await?;
                info!(
                    file_id = %file_id,
                    template = %template.template_key,
                    "Applied upload metadata"
                );
            }
            None => warn!(
                template = %state.config.metadata_templates.wealth_documents,
                "Upload metadata template is not in scope.templateKey form, skipping write"
            ),
        }
    }

    info!(
        file_id = %file_id,
        folder_id = ?request.folder_id,
        file_name = %file.name,
        "Processed upload callback"
    );

    Ok(Json(UploadCallbackResponse {
        success: true,
        file_id,
        metadata_applied: metadata,
    }))
}
