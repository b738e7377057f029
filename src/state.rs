//! Per-process state shared by every listkeeper handler.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::jwt::JwtKeys;

/// Built once at startup and handed to the router; axum clones the `Arc`
/// into each request. Holds the token keys and the database pool, the only
/// two resources the handlers need.
#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub db: DatabaseConnection,
}

impl AppState {
    pub fn new(jwt_secret: &[u8], db: DatabaseConnection) -> Arc<Self> {
        Arc::new(Self {
            jwt: JwtKeys::from_secret(jwt_secret),
            db,
        })
    }
}
