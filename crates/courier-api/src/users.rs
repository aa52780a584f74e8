use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use courier_types::api::Claims;

use crate::error::ApiError;
use crate::params::caller_scope;
use crate::state::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let user = state.run(move |db| db.get_user(&scope)).await?;

    Ok(Json(json!({ "user": user })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    state.run(move |db| db.delete_user(&scope)).await?;

    info!("deleted user {}", claims.sub);
    Ok(Json(json!({ "message": "success" })))
}
