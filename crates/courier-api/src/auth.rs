use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::Duration;
use tracing::{debug, info, warn};

use courier_db::models::NewUser;
use courier_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use courier_types::validator::Validator;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    validate_registration(&req)?;

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?
        .to_string();

    let user = state
        .run(move |db| {
            db.create_user(&NewUser {
                username: &req.username,
                first_name: &req.first_name,
                last_name: &req.last_name,
                password_hash: &password_hash,
            })
        })
        .await?;

    let token = create_token(&state.jwt_secret, state.token_ttl, user.user_id, &user.username)
        .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;

    info!("registered user {} ({})", user.username, user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.user_id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let username = req.username.clone();
    let user = state
        .run(move |db| db.get_user_by_username(&username))
        .await?
        .ok_or_else(|| {
            debug!("login for unknown user {}", req.username);
            ApiError::Unauthorized
        })?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(format!("stored hash unreadable: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| {
            warn!("failed login for {}", user.username);
            ApiError::Unauthorized
        })?;

    let token = create_token(&state.jwt_secret, state.token_ttl, user.user_id, &user.username)
        .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;

    Ok(Json(LoginResponse {
        user_id: user.user_id,
        username: user.username,
        token,
    }))
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let username_len = req.username.chars().count();
    let mut v = Validator::new();
    v.check(!req.username.trim().is_empty(), "username", "must be provided");
    v.check((3..=32).contains(&username_len), "username", "must be between 3 and 32 characters");
    v.check(!req.password.is_empty(), "password", "must be provided");
    v.check(req.password.chars().count() >= 8, "password", "must be at least 8 characters");
    v.check(!req.first_name.trim().is_empty(), "first_name", "must be provided");
    v.check(!req.last_name.trim().is_empty(), "last_name", "must be provided");
    v.finish().map_err(ApiError::ValidationFailed)
}

pub fn create_token(secret: &str, ttl: Duration, user_id: i64, username: &str) -> anyhow::Result<String> {
    let ttl = chrono::Duration::from_std(ttl)?;
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: usize::try_from((chrono::Utc::now() + ttl).timestamp())?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: password.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration(&request("ada", "correct horse")).is_ok());

        match validate_registration(&request("ab", "short")) {
            Err(ApiError::ValidationFailed(fields)) => {
                assert_eq!(fields["username"], "must be between 3 and 32 characters");
                assert_eq!(fields["password"], "must be at least 8 characters");
            }
            other => panic!("unexpected {other:?}"),
        }

        let long = "x".repeat(33);
        assert!(validate_registration(&request(&long, "correct horse")).is_err());
    }

    #[test]
    fn names_are_required() {
        let mut req = request("ada", "correct horse");
        req.last_name = "  ".into();
        match validate_registration(&req) {
            Err(ApiError::ValidationFailed(fields)) => assert!(fields.contains_key("last_name")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn token_carries_the_user_id() {
        use jsonwebtoken::{DecodingKey, Validation, decode};

        let token = create_token("test-secret", Duration::from_secs(60), 42, "ada").unwrap();
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, 42);
        assert_eq!(data.claims.username, "ada");
    }
}
