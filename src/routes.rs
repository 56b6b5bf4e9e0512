use std::any::Any;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::api;
use crate::auth::require_auth;
use crate::error::INTERNAL_SERVER_ERROR;
use crate::models::MessageResponse;
use crate::state::AppState;

/// Same ceiling as Express' JSON body parser.
const BODY_LIMIT: usize = 100 * 1024;

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    with_gateway_layers(routes(state.clone()), cors).with_state(state)
}

fn routes(state: AppState) -> Router<AppState> {
    let todos = api::router().route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/", get(health))
        .nest("/todos", todos)
        .fallback(not_found)
}

/// Outermost first: trace, panic catcher, CORS, body limit.
fn with_gateway_layers(routes: Router<AppState>, cors: CorsLayer) -> Router<AppState> {
    routes
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

/// `None`, or a list containing `*`, allows every origin. Origins that are
/// not valid header values are skipped.
pub fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(cors::Any).allow_headers(cors::Any);

    match allowed_origins {
        None => layer.allow_origin(cors::Any),
        Some(origins) if origins.iter().any(|origin| origin == "*") => layer.allow_origin(cors::Any),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("ignoring invalid CORS origin {:?}", origin);
                        None
                    }
                })
                .collect();
            layer.allow_origin(origins)
        }
    }
}

async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::ok("API is running"))
}

async fn not_found() -> (StatusCode, Json<MessageResponse>) {
    (StatusCode::NOT_FOUND, Json(MessageResponse::failure("Not Found")))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("unhandled error in request handler: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse::failure(INTERNAL_SERVER_ERROR)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::auth::TokenVerifier;
    use crate::db::{SqliteTodoRepository, connect_in_memory};

    async fn test_state() -> AppState {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        AppState::new(
            Arc::new(SqliteTodoRepository::new(pool)),
            TokenVerifier::new(b"test-secret"),
        )
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn explode() -> &'static str {
        panic!("sqlite file /var/lib/todos.db is corrupt");
    }

    #[tokio::test]
    async fn test_handle_panic_hides_details() {
        let response = handle_panic(Box::new("secret stack detail".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body, json!({ "success": false, "message": "Internal Server Error" }));
        assert!(!body.to_string().contains("secret stack detail"));
    }

    #[tokio::test]
    async fn test_panicking_handler_behind_gateway_layers() {
        let state = test_state().await;
        let app = with_gateway_layers(
            routes(state.clone()).route("/explode", get(explode)),
            cors_layer(None),
        )
        .with_state(state);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body, json!({ "success": false, "message": "Internal Server Error" }));
        assert!(!body.to_string().contains("corrupt"));

        // The server keeps answering after a panic.
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_cors_layer_accepts_wildcard_origin() {
        let wildcard = vec!["*".to_string(), "http://localhost:5173".to_string()];
        let _layer = cors_layer(Some(wildcard.as_slice()));

        let listed = vec!["http://localhost:5173".to_string()];
        let _layer = cors_layer(Some(listed.as_slice()));
    }
}
