use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path};
use axum::routing::{delete, put};
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::auth::Claims;
use crate::error::{AppError, GENERIC_FAILURE};
use crate::models::*;
use crate::state::AppState;

pub const INVALID_BODY: &str = "Invalid request body";
pub const INVALID_NAME: &str = "Invalid or missing 'name'";
pub const INVALID_DESCRIPTION: &str = "Invalid 'description'";
pub const INVALID_TODO_ID: &str = "Invalid todo ID";
pub const ONLY_COMPLETED_DELETABLE: &str = "Only completed todos can be deleted";
pub const FETCH_FAILED: &str = "Something went wrong while fetching todos";

/// Todo routes, relative to the `/todos` mount point. Authentication is
/// layered on by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/{id}/completed", put(complete_todo))
        .route("/{id}", delete(delete_todo))
}

async fn list_todos(State(state): State<AppState>) -> Result<Json<TodoListResponse>, AppError> {
    let todos = state.todos.find_all().await.map_err(|e| {
        error!("failed to fetch todos: {}", e);
        AppError::Internal(FETCH_FAILED.to_string())
    })?;

    Ok(Json(TodoListResponse { success: true, todos }))
}

async fn create_todo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoIdResponse>), AppError> {
    let Json(body) = body.map_err(|e| {
        warn!("rejected todo body: {}", e);
        AppError::Validation(INVALID_BODY.to_string())
    })?;
    let req = parse_new_todo(body)?;

    let todo = state.todos.create(req.into_new_todo(claims.sub)).await?;
    info!("created todo {} for {}", todo.id, todo.user_id);

    Ok((
        StatusCode::CREATED,
        Json(TodoIdResponse { success: true, todo: todo.id }),
    ))
}

async fn complete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TodoIdResponse>, AppError> {
    let id = parse_todo_id(&id)?;

    let todo = state.todos.update_completed(id).await?.ok_or_else(|| {
        error!("failed to complete todo {}: no such row", id);
        AppError::Internal(GENERIC_FAILURE.to_string())
    })?;
    info!("completed todo {}", todo.id);

    Ok(Json(TodoIdResponse { success: true, todo: todo.id }))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TodoIdResponse>, AppError> {
    let id = parse_todo_id(&id)?;

    // Missing and incomplete todos are reported the same way.
    match state.todos.find_by_id(id).await? {
        Some(todo) if todo.completed => {}
        _ => return Err(AppError::Precondition(ONLY_COMPLETED_DELETABLE.to_string())),
    }

    if !state.todos.delete(id).await? {
        return Err(AppError::Precondition(ONLY_COMPLETED_DELETABLE.to_string()));
    }
    info!("deleted todo {}", id);

    Ok(Json(TodoIdResponse { success: true, todo: id }))
}

fn parse_todo_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::Validation(INVALID_TODO_ID.to_string()))
}

fn parse_new_todo(body: Value) -> Result<NewTodoRequest, AppError> {
    let Value::Object(mut fields) = body else {
        return Err(AppError::Validation(INVALID_BODY.to_string()));
    };

    let name = match fields.remove("name") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => return Err(AppError::Validation(INVALID_NAME.to_string())),
    };

    let description = match fields.remove("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(description)) => Some(description),
        Some(_) => return Err(AppError::Validation(INVALID_DESCRIPTION.to_string())),
    };

    Ok(NewTodoRequest { name, description })
}
