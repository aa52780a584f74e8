use std::sync::Arc;
use std::time::Duration;

use courier_db::{Database, StoreError};
use tracing::error;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    /// Carries its own per-call deadline; see `Database::with_conn`.
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl AppStateInner {
    /// Run a store call off the async runtime. The deadline is enforced
    /// inside the blocking call, so a call reported as timed out has not
    /// written anything.
    pub async fn run<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(&state.db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal("background task failed".into())
            })?
            .map_err(ApiError::from)
    }
}
