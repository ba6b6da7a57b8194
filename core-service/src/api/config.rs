use axum::extract::State;
use axum::Json;
use core_runtime::config::FrontendConfig;

use crate::state::AppState;

/// `GET /api/config`
pub async fn get_config(State(state): State<AppState>) -> Json<FrontendConfig> {
    Json(state.config.frontend_config())
}
