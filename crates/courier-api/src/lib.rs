pub mod auth;
pub mod channels;
pub mod conversations;
pub mod error;
pub mod health;
pub mod messages;
pub mod middleware;
pub mod params;
pub mod state;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// All `/api/v1` routes. Transport layers (CORS, tracing) are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .route("/users", post(auth::register))
        .route("/users/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/users/{user_id}", get(users::get_user).delete(users::delete_user))
        .route(
            "/users/{user_id}/channels",
            get(channels::list_channels).post(channels::create_channel),
        )
        .route(
            "/users/{user_id}/channels/{channel_id}",
            get(channels::get_channel)
                .put(channels::update_channel)
                .delete(channels::delete_channel),
        )
        .route(
            "/users/{user_id}/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/users/{user_id}/conversations/{conversation_id}",
            get(conversations::get_conversation).delete(conversations::delete_conversation),
        )
        .route(
            "/users/{user_id}/conversations/{conversation_id}/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route(
            "/users/{user_id}/conversations/{conversation_id}/messages/{message_id}",
            get(messages::get_message)
                .put(messages::update_message)
                .delete(messages::delete_message),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new().nest(
        "/api/v1",
        public_routes.merge(protected_routes).with_state(state),
    )
}
