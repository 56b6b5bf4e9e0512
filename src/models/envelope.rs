//! JSON bodies shared by the server and the client. Every response carries
//! `success` plus either a payload or a `message`.

use serde::{Deserialize, Serialize};

use super::Todo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoListResponse {
    pub success: bool,
    pub todos: Vec<Todo>,
}

/// Create, complete and delete all answer with the affected id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoIdResponse {
    pub success: bool,
    pub todo: i64,
}
