use axum::extract::{Path, State};
use axum::Json;
use provider_box::FileMetadataSummary;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FileMetadataResponse {
    pub file_id: String,
    pub metadata: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct FolderMetadataResponse {
    pub folder_id: String,
    pub items: Vec<FileMetadataSummary>,
}

/// `GET /api/files/{file_id}/metadata`
#[tracing::instrument(skip(state))]
pub async fn get_file_metadata(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<FileMetadataResponse>> {
    let connector = state.service_connector().await?;
    let file = connector.get_file(&file_id).await?;
    let metadata = connector.get_file_metadata(&file.id).await?;

    Ok(Json(FileMetadataResponse { file_id, metadata }))
}

/// `GET /api/folders/{folder_id}/metadata`
#[tracing::instrument(skip(state))]
pub async fn get_folder_metadata(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
) -> Result<Json<FolderMetadataResponse>> {
    let connector = state.service_connector().await?;
    let items = connector.folder_file_metadata(&folder_id).await?;

    Ok(Json(FolderMetadataResponse { folder_id, items }))
}
