use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::debug;

use courier_db::queries::conversations::{CONVERSATION_DEFAULT_SORT, CONVERSATION_SORT_SAFELIST};
use courier_types::api::{Claims, CreateConversationRequest, ListQuery};

use crate::error::ApiError;
use crate::params::{caller_scope, list_filters, parse_id};
use crate::state::AppState;

pub async fn list_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let filters = list_filters(&query, CONVERSATION_DEFAULT_SORT, CONVERSATION_SORT_SAFELIST)?;

    let page = state.run(move |db| db.list_conversations(&scope, &filters)).await?;

    Ok(Json(json!({ "conversations": page.items, "metadata": page.metadata })))
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let Json(req) = payload?;
    let friend_id = req.friend_id.ok_or_else(|| ApiError::missing_field("friend_id"))?;

    let conversation = state
        .run(move |db| db.insert_conversation(&scope, friend_id))
        .await?;
    debug!(
        "conversation {} opened by {} with {}",
        conversation.conversation_id, conversation.user_id, conversation.friend_id
    );

    Ok((StatusCode::CREATED, Json(json!({ "conversation": conversation }))))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path((user_id, conversation_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let conversation_id = parse_id("conversation_id", &conversation_id)?;

    let conversation = state
        .run(move |db| db.get_conversation(&scope, conversation_id))
        .await?;

    Ok(Json(json!({ "conversation": conversation })))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    Path((user_id, conversation_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let conversation_id = parse_id("conversation_id", &conversation_id)?;

    state
        .run(move |db| db.delete_conversation(&scope, conversation_id))
        .await?;

    Ok(Json(json!({ "message": "success" })))
}
