use courier_types::validator::FieldErrors;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No row survived the caller's scope. Covers both "absent" and "not yours".
    #[error("record not found")]
    NotFound,

    /// Reserved for optimistic concurrency; nothing raises it yet.
    #[error("edit conflict")]
    EditConflict,

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The call ran out of its time budget; nothing was committed.
    #[error("query timed out")]
    Timeout,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.to_string());
        Self::Validation(errors)
    }
}

/// Which constraint a failed statement tripped, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
    Check,
    Other,
}

pub(crate) fn constraint_violation(err: &rusqlite::Error) -> Option<Violation> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Violation::Unique,
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Violation::ForeignKey,
                ffi::SQLITE_CONSTRAINT_CHECK => Violation::Check,
                _ => Violation::Other,
            })
        }
        _ => None,
    }
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, StoreError>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Collapse an empty single-row result into `NotFound`.
pub(crate) trait FoundExt<T> {
    fn found(self) -> Result<T, StoreError>;
}

impl<T> FoundExt<T> for Result<T, rusqlite::Error> {
    fn found(self) -> Result<T, StoreError> {
        self.optional()?.ok_or(StoreError::NotFound)
    }
}
