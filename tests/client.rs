mod common;

use std::sync::Arc;

use todo_backend::client::{
    ClientError, MutationState, QueryCache, QueryState, Screen, StaticToken, TodoApi,
    TodoApiClient, TodosPage,
};
use todo_backend::models::NewTodoRequest;
use tokio::net::TcpListener;

use common::{spawn_app, token_for};

async fn serve() -> String {
    let test = spawn_app().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, test.app).await.unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str, token: &str) -> TodoApiClient {
    TodoApiClient::new(base_url, Arc::new(StaticToken::new(token))).expect("Failed to build client")
}

#[tokio::test]
async fn client_round_trip() {
    let base_url = serve().await;
    let api = client(&base_url, &token_for("user-7"));

    assert_eq!(api.health().await.unwrap(), "API is running");

    let id = api
        .create_todo(&NewTodoRequest {
            name: "Buy milk".to_string(),
            description: Some("semi-skimmed".to_string()),
        })
        .await
        .unwrap();

    let todos = api.list_todos().await.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, id);
    assert_eq!(todos[0].user_id, "user-7");
    assert!(!todos[0].completed);

    assert_eq!(api.complete_todo(id).await.unwrap(), id);
    assert_eq!(api.complete_todo(id).await.unwrap(), id);
    assert!(api.list_todos().await.unwrap()[0].completed);

    assert_eq!(api.delete_todo(id).await.unwrap(), id);
    assert!(api.list_todos().await.unwrap().is_empty());
}

#[tokio::test]
async fn client_surfaces_server_messages() {
    let base_url = serve().await;
    let api = client(&base_url, &token_for("user-7"));

    let id = api
        .create_todo(&NewTodoRequest { name: "Walk dog".to_string(), description: None })
        .await
        .unwrap();

    match api.delete_todo(id).await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Only completed todos can be deleted");
        }
        other => panic!("expected precondition failure, got {:?}", other),
    }

    let err = api
        .create_todo(&NewTodoRequest { name: String::new(), description: None })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn client_with_bad_token_is_unauthorized() {
    let base_url = serve().await;
    let api = client(&base_url, "not-a-token");

    let err = api.list_todos().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn client_without_session_sends_nothing() {
    let base_url = serve().await;
    let api = client(&base_url, "");

    assert!(matches!(api.list_todos().await, Err(ClientError::Token(_))));
}

#[tokio::test]
async fn page_against_live_server() {
    let base_url = serve().await;
    let api = Arc::new(client(&base_url, &token_for("user-7")));
    let cache = Arc::new(QueryCache::new());
    let mut page = TodosPage::new(api, cache.clone());

    assert_eq!(page.render(), Screen::Loading);
    page.load().await;
    assert_eq!(page.render(), Screen::Empty);

    page.open_modal();
    page.form.name = "Finish code review".to_string();
    page.form.description = "Implement suggestions".to_string();
    let id = match page.submit().await {
        MutationState::Success(id) => *id,
        other => panic!("expected success, got {:?}", other),
    };
    assert!(!page.is_modal_open());

    page.load().await;
    match page.render() {
        Screen::List(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, id);
            assert_eq!(rows[0].description, "Implement suggestions");
            assert!(rows[0].toggle_enabled);
        }
        other => panic!("expected list, got {:?}", other),
    }

    page.mark_completed(id).await;
    page.load().await;
    match cache.state(&todo_backend::client::QueryKey::todos()) {
        QueryState::Success(todos) => assert!(todos[0].completed),
        other => panic!("expected cached todos, got {:?}", other),
    }
}
