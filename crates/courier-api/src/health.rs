use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn healthcheck(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.run(|db| db.ping()).await?;

    Ok(Json(json!({
        "status": "available",
        "system_info": {
            "version": env!("CARGO_PKG_VERSION"),
        },
    })))
}
