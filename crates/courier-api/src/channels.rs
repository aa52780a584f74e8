use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use courier_db::queries::channels::{CHANNEL_DEFAULT_SORT, CHANNEL_SORT_SAFELIST};
use courier_types::api::{Claims, CreateChannelRequest, ListQuery, UpdateChannelRequest};

use crate::error::ApiError;
use crate::params::{caller_scope, list_filters, parse_id};
use crate::state::AppState;

pub async fn list_channels(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let filters = list_filters(&query, CHANNEL_DEFAULT_SORT, CHANNEL_SORT_SAFELIST)?;

    let page = state.run(move |db| db.list_channels(&scope, &filters)).await?;

    Ok(Json(json!({ "channels": page.items, "metadata": page.metadata })))
}

pub async fn create_channel(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateChannelRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let Json(req) = payload?;
    let name = req.name.ok_or_else(|| ApiError::missing_field("name"))?;

    let channel = state.run(move |db| db.insert_channel(&scope, &name)).await?;

    Ok((StatusCode::CREATED, Json(json!({ "channel": channel }))))
}

pub async fn get_channel(
    State(state): State<AppState>,
    Path((user_id, channel_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let channel_id = parse_id("channel_id", &channel_id)?;

    let channel = state.run(move |db| db.get_channel(&scope, channel_id)).await?;

    Ok(Json(json!({ "channel": channel })))
}

/// Rename. An absent `name` leaves the channel as it is.
pub async fn update_channel(
    State(state): State<AppState>,
    Path((user_id, channel_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateChannelRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let channel_id = parse_id("channel_id", &channel_id)?;
    let Json(req) = payload?;

    let channel = state
        .run(move |db| match req.name {
            Some(name) => db.update_channel(&scope, channel_id, &name),
            None => db.get_channel(&scope, channel_id),
        })
        .await?;

    Ok(Json(json!({ "channel": channel })))
}

pub async fn delete_channel(
    State(state): State<AppState>,
    Path((user_id, channel_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let channel_id = parse_id("channel_id", &channel_id)?;

    state.run(move |db| db.delete_channel(&scope, channel_id)).await?;

    Ok(Json(json!({ "message": "success" })))
}
