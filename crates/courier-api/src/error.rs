use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courier_db::StoreError;
use courier_types::filters::FilterError;
use courier_types::validator::FieldErrors;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    InvalidInput { message: String, fields: FieldErrors },

    #[error("invalid or missing credentials")]
    Unauthorized,

    #[error("the requested resource could not be found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("validation failed")]
    ValidationFailed(FieldErrors),

    /// The message is for the log only; clients get a generic body.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), reason.clone());
        Self::InvalidInput {
            message: format!("invalid {field}: {reason}"),
            fields,
        }
    }

    /// A required body field was absent. Reported like an empty one.
    pub fn missing_field(field: &str) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), "must be provided".to_string());
        Self::ValidationFailed(fields)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::EditConflict => StatusCode::CONFLICT,
            Self::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::EditConflict => "EDIT_CONFLICT",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = Map::new();
        body.insert("code".into(), Value::from(self.code()));

        match &self {
            Self::Internal(cause) => {
                error!("internal error: {}", cause);
                body.insert(
                    "message".into(),
                    Value::from("the server encountered a problem and could not process your request"),
                );
            }
            Self::InvalidInput { fields, .. } | Self::ValidationFailed(fields) => {
                body.insert("message".into(), Value::from(self.to_string()));
                body.insert("fields".into(), json!(fields));
            }
            _ => {
                body.insert("message".into(), Value::from(self.to_string()));
            }
        }

        (status, Json(json!({ "error": body }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::EditConflict => Self::EditConflict,
            StoreError::Validation(fields) => Self::ValidationFailed(fields),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            e @ (StoreError::Timeout | StoreError::LockPoisoned | StoreError::Sqlite(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        Self::invalid_field(err.field(), err.reason())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("rejected request body: {}", rejection.body_text());
        Self::InvalidInput {
            message: "body contains badly-formed JSON".into(),
            fields: FieldErrors::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_client_categories() {
        assert!(matches!(ApiError::from(StoreError::NotFound), ApiError::NotFound));
        assert!(matches!(
            ApiError::from(StoreError::Conflict("taken".into())),
            ApiError::Conflict(msg) if msg == "taken"
        ));
        assert_eq!(ApiError::from(StoreError::LockPoisoned).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::from(StoreError::Timeout).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn filter_errors_name_the_parameter() {
        let err = ApiError::from(FilterError::InvalidSort("-name".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        match err {
            ApiError::InvalidInput { fields, .. } => assert_eq!(fields["sort"], "invalid sort value"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn codes_are_distinct_for_conflicts() {
        assert_eq!(ApiError::Conflict("x".into()).code(), "CONFLICT");
        assert_eq!(ApiError::EditConflict.code(), "EDIT_CONFLICT");
        assert_eq!(ApiError::EditConflict.status(), StatusCode::CONFLICT);
    }
}
