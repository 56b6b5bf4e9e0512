use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{NewTodo, Todo};

/// Persistence boundary for todos. Each method is a single store call.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError>;
    async fn create(&self, todo: NewTodo) -> Result<Todo, AppError>;
    /// Returns `None` when no row has this id.
    async fn update_completed(&self, id: i64) -> Result<Option<Todo>, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, AppError>;
    /// Removes the row only if it is completed. Returns whether a row was
    /// removed.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct SqliteTodoRepository {
    db: SqlitePool,
}

impl SqliteTodoRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError> {
        let todos = sqlx::query_as::<_, Todo>(
            "SELECT id, name, description, completed, user_id, created_at, updated_at FROM todos ORDER BY id ASC"
        )
        .fetch_all(&self.db)
        .await?;

        Ok(todos)
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo, AppError> {
        let now = Utc::now().to_rfc3339();

        let id = sqlx::query(
            r#"
            INSERT INTO todos
                (name, description, completed, user_id, created_at, updated_at)
            VALUES (?1, ?2, 0, ?3, ?4, ?4)
            "#,
        )
        .bind(&todo.name)
        .bind(&todo.description)
        .bind(&todo.user_id)
        .bind(&now)
        .execute(&self.db)
        .await?
        .last_insert_rowid();

        Ok(Todo {
            id,
            name: todo.name,
            description: todo.description,
            completed: false,
            user_id: todo.user_id,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn update_completed(&self, id: i64) -> Result<Option<Todo>, AppError> {
        let now = Utc::now().to_rfc3339();

        // Already-completed rows keep their timestamp.
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET updated_at = CASE WHEN completed = 1 THEN updated_at ELSE ?2 END,
                completed = 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&now)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, AppError> {
        let todo = sqlx::query_as::<_, Todo>(
            "SELECT id, name, description, completed, user_id, created_at, updated_at FROM todos WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(todo)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let removed = sqlx::query("DELETE FROM todos WHERE id = ?1 AND completed = 1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    async fn setup_repository() -> SqliteTodoRepository {
        let pool = connect_in_memory()
            .await
            .expect("Failed to create test db");
        SqliteTodoRepository::new(pool)
    }

    fn new_todo(name: &str, user_id: &str) -> NewTodo {
        NewTodo {
            name: name.to_string(),
            description: Some("from the corner shop".to_string()),
            user_id: user_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_all() {
        let repo = setup_repository().await;

        let first = repo.create(new_todo("Buy milk", "user-1")).await.expect("Failed to create todo");
        let second = repo.create(new_todo("Walk dog", "user-2")).await.expect("Failed to create todo");

        assert!(second.id > first.id);
        assert!(!first.completed);
        assert_eq!(first.user_id, "user-1");

        let todos = repo.find_all().await.expect("Failed to fetch todos");
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0], first);
        assert_eq!(todos[1].name, "Walk dog");
        assert_eq!(todos[1].user_id, "user-2");
    }

    #[tokio::test]
    async fn test_create_without_description() {
        let repo = setup_repository().await;

        let todo = repo
            .create(NewTodo {
                name: "Call mum".to_string(),
                description: None,
                user_id: "user-1".to_string(),
            })
            .await
            .expect("Failed to create todo");

        let found = repo.find_by_id(todo.id).await.unwrap().expect("Todo not found");
        assert_eq!(found.description, None);
    }

    #[tokio::test]
    async fn test_update_completed_is_idempotent() {
        let repo = setup_repository().await;
        let todo = repo.create(new_todo("Buy milk", "user-1")).await.unwrap();

        let first = repo.update_completed(todo.id).await.unwrap().expect("Todo not found");
        assert!(first.completed);

        let second = repo.update_completed(todo.id).await.unwrap().expect("Todo not found");
        assert!(second.completed);
        assert_eq!(second.updated_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_update_completed_missing_row() {
        let repo = setup_repository().await;
        assert!(repo.update_completed(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_completed() {
        let repo = setup_repository().await;
        let todo = repo.create(new_todo("Buy milk", "user-1")).await.unwrap();

        assert!(!repo.delete(todo.id).await.unwrap());
        assert!(repo.find_by_id(todo.id).await.unwrap().is_some());

        repo.update_completed(todo.id).await.unwrap();
        assert!(repo.delete(todo.id).await.unwrap());
        assert!(repo.find_by_id(todo.id).await.unwrap().is_none());
        assert!(!repo.delete(todo.id).await.unwrap());
    }
}
