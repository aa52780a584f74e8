use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use courier_db::models::NewMessage;
use courier_db::queries::messages::{MESSAGE_DEFAULT_SORT, MESSAGE_SORT_SAFELIST};
use courier_types::api::{Claims, ListQuery, SendMessageRequest, UpdateMessageRequest};

use crate::error::ApiError;
use crate::params::{caller_scope, list_filters, parse_id};
use crate::state::AppState;

/// `?query=` filters by content substring, matched literally and without
/// regard to ASCII case.
pub async fn list_messages(
    State(state): State<AppState>,
    Path((user_id, conversation_id)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let conversation_id = parse_id("conversation_id", &conversation_id)?;
    let filters = list_filters(&query, MESSAGE_DEFAULT_SORT, MESSAGE_SORT_SAFELIST)?;
    let search = query.query;

    let page = state
        .run(move |db| db.list_messages(&scope, conversation_id, search.as_deref(), &filters))
        .await?;

    Ok(Json(json!({ "messages": page.items, "metadata": page.metadata })))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path((user_id, conversation_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let conversation_id = parse_id("conversation_id", &conversation_id)?;
    let Json(req) = payload?;
    let content = req.content.ok_or_else(|| ApiError::missing_field("content"))?;
    let timestamp = chrono::Utc::now();

    let message = state
        .run(move |db| {
            db.insert_message(
                &scope,
                &NewMessage {
                    conversation_id,
                    content: &content,
                    timestamp,
                },
            )
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path((user_id, conversation_id, message_id)): Path<(String, String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let conversation_id = parse_id("conversation_id", &conversation_id)?;
    let message_id = parse_id("message_id", &message_id)?;

    let message = state
        .run(move |db| db.get_message(&scope, conversation_id, message_id))
        .await?;

    Ok(Json(json!({ "message": message })))
}

/// Edit. An absent `content` leaves the message as it is.
pub async fn update_message(
    State(state): State<AppState>,
    Path((user_id, conversation_id, message_id)): Path<(String, String, String)>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let conversation_id = parse_id("conversation_id", &conversation_id)?;
    let message_id = parse_id("message_id", &message_id)?;
    let Json(req) = payload?;

    let message = state
        .run(move |db| match req.content {
            Some(content) => db.update_message(&scope, conversation_id, message_id, &content),
            None => db.get_message(&scope, conversation_id, message_id),
        })
        .await?;

    Ok(Json(json!({ "message": message })))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path((user_id, conversation_id, message_id)): Path<(String, String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = caller_scope(&claims, &user_id)?;
    let conversation_id = parse_id("conversation_id", &conversation_id)?;
    let message_id = parse_id("message_id", &message_id)?;

    state
        .run(move |db| db.delete_message(&scope, conversation_id, message_id))
        .await?;

    Ok(Json(json!({ "message": "success" })))
}
