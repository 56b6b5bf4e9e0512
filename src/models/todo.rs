use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub completed: bool,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Row to be inserted. `user_id` always comes from the verified principal,
/// never from the request body.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub name: String,
    pub description: Option<String>,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTodoRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTodoRequest {
    pub fn into_new_todo(self, user_id: impl Into<String>) -> NewTodo {
        NewTodo {
            name: self.name,
            description: self.description,
            user_id: user_id.into(),
        }
    }
}
