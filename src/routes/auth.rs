use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use sea_orm::SqlErr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::jwt::{encode_token, make_access_claims},
    auth::password,
    db::user_repo,
    error::AppError,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    id: Uuid,
    email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("A valid email is required"));
    }

    let hash = password::hash_password(&body.password)?;
    // The unique index on email is the duplicate check. A find-then-insert
    // pre-check would race with a concurrent registration.
    let user = match user_repo::create_user(&state.db, email, &hash).await {
        Ok(user) => user,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::conflict("Email already registered"));
        }
        Err(err) => return Err(err.into()),
    };
    tracing::info!(user = %user.email, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = user_repo::find_by_email(&state.db, body.email.trim())
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    if !password::verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let claims = make_access_claims(&user.id);
    let token = encode_token(&state.jwt, &claims)?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "Bearer",
    }))
}
