use std::sync::Arc;

use axum::Router;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

use crate::{
    auth::jwt::{JwtKeys, encode_token, make_access_claims},
    routes::router,
    state::AppState,
};

pub const TEST_JWT_SECRET: &[u8] = b"test-secret";

/// In-memory SQLite with the schema synced from the entity registry.
/// A single pooled connection, so concurrent transactions queue instead of
/// each landing on a private empty database.
pub async fn test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect to sqlite");
    db.get_schema_registry("listkeeper::db::entities::*")
        .sync(&db)
        .await
        .expect("sync schema");
    db
}

pub async fn test_state() -> Arc<AppState> {
    AppState::new(TEST_JWT_SECRET, test_db().await)
}

pub fn test_router(state: Arc<AppState>) -> Router {
    router(state)
}

pub fn bearer_for(user_id: &Uuid) -> String {
    let keys = JwtKeys::from_secret(TEST_JWT_SECRET);
    let token = encode_token(&keys, &make_access_claims(user_id)).expect("encode token");
    format!("Bearer {token}")
}
