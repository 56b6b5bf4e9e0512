#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::Duration;
use jsonwebtoken::{EncodingKey, Header, encode};
use sqlx::SqlitePool;
use todo_backend::auth::{Claims, TokenVerifier};
use todo_backend::db::{self, SqliteTodoRepository};
use todo_backend::routes::{cors_layer, router};
use todo_backend::state::AppState;

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub app: Router,
    pub db: SqlitePool,
}

pub async fn spawn_app() -> TestApp {
    let db = db::connect_in_memory()
        .await
        .expect("Failed to create test db");

    let state = AppState::new(
        Arc::new(SqliteTodoRepository::new(db.clone())),
        TokenVerifier::new(SECRET.as_bytes()),
    );

    TestApp {
        app: router(state, cors_layer(None)),
        db,
    }
}

pub fn token_for(sub: &str) -> String {
    sign(&Claims::new(sub, Duration::hours(1)), SECRET)
}

pub fn sign<T: serde::Serialize>(claims: &T, secret: &str) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("Failed to sign token")
}

pub async fn row_count(db: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM todos")
        .fetch_one(db)
        .await
        .expect("Failed to count todos")
}
