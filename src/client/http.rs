use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::error::ClientError;
use crate::models::{MessageResponse, NewTodoRequest, Todo, TodoIdResponse, TodoListResponse};

/// Hands out the current bearer token. Implemented by whatever owns the
/// user's session with the identity provider.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String, ClientError>;
}

/// A token obtained once up front.
#[derive(Clone, Debug)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, ClientError> {
        if self.0.is_empty() {
            return Err(ClientError::Token("no active session".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Operations the todo page needs from the server.
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list_todos(&self) -> Result<Vec<Todo>, ClientError>;
    async fn create_todo(&self, req: &NewTodoRequest) -> Result<i64, ClientError>;
    async fn complete_todo(&self, id: i64) -> Result<i64, ClientError>;
    async fn delete_todo(&self, id: i64) -> Result<i64, ClientError>;
}

pub struct TodoApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl TodoApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> Result<Self, ClientError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub async fn health(&self) -> Result<String, ClientError> {
        let response = self.http.get(format!("{}/", self.base_url)).send().await?;
        let body: MessageResponse = decode(response).await?;
        Ok(body.message)
    }

    /// Every `/todos` call carries the bearer token.
    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.tokens.token().await?;
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        Ok(self.http.request(method, url).bearer_auth(token))
    }
}

#[async_trait]
impl TodoApi for TodoApiClient {
    async fn list_todos(&self) -> Result<Vec<Todo>, ClientError> {
        let response = self.authorized(Method::GET, "/todos").await?.send().await?;
        let body: TodoListResponse = decode(response).await?;
        Ok(body.todos)
    }

    async fn create_todo(&self, req: &NewTodoRequest) -> Result<i64, ClientError> {
        let response = self
            .authorized(Method::POST, "/todos")
            .await?
            .json(req)
            .send()
            .await?;
        let body: TodoIdResponse = decode(response).await?;
        Ok(body.todo)
    }

    async fn complete_todo(&self, id: i64) -> Result<i64, ClientError> {
        let response = self
            .authorized(Method::PUT, &format!("/todos/{id}/completed"))
            .await?
            .send()
            .await?;
        let body: TodoIdResponse = decode(response).await?;
        Ok(body.todo)
    }

    async fn delete_todo(&self, id: i64) -> Result<i64, ClientError> {
        let response = self
            .authorized(Method::DELETE, &format!("/todos/{id}"))
            .await?
            .send()
            .await?;
        let body: TodoIdResponse = decode(response).await?;
        Ok(body.todo)
    }
}

/// Non-2xx answers become [`ClientError::Api`] with the server's message
/// when the body has one.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<MessageResponse>(&body)
            .map(|m| m.message)
            .unwrap_or(body);
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}
