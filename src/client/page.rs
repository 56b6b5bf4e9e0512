//! View-model of the todo list page: the list, the "New Todo" modal with
//! its form, and the completion toggle on each row.

use std::sync::Arc;

use tracing::warn;

use crate::client::cache::{QueryCache, QueryKey, QueryState};
use crate::client::http::TodoApi;
use crate::models::{NewTodoRequest, Todo};

pub const LOADING_MESSAGE: &str = "Loading Todos...";
pub const ERROR_MESSAGE: &str = "There was an error loading todos.";
pub const EMPTY_MESSAGE: &str = "No todos found.";

#[derive(Debug, Clone, PartialEq)]
pub enum MutationState {
    Idle,
    Pending,
    /// Holds the id the server reported back.
    Success(i64),
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTodoForm {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    pub name: Option<&'static str>,
    pub description: Option<&'static str>,
}

impl NewTodoForm {
    pub fn validate(&self) -> Result<NewTodoRequest, FormErrors> {
        let errors = FormErrors {
            name: self.name.is_empty().then_some("Name is required"),
            description: self.description.is_empty().then_some("Description is required"),
        };
        if errors.name.is_some() || errors.description.is_some() {
            return Err(errors);
        }

        Ok(NewTodoRequest {
            name: self.name.clone(),
            description: Some(self.description.clone()),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodoRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// The toggle shows "Yes" when checked and can no longer be clicked.
    pub checked: bool,
    pub toggle_enabled: bool,
}

impl From<&Todo> for TodoRow {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            name: todo.name.clone(),
            description: todo.description.clone().unwrap_or_default(),
            checked: todo.completed,
            toggle_enabled: !todo.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Loading,
    Error,
    Empty,
    List(Vec<TodoRow>),
}

impl Screen {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Screen::Loading => Some(LOADING_MESSAGE),
            Screen::Error => Some(ERROR_MESSAGE),
            Screen::Empty => Some(EMPTY_MESSAGE),
            Screen::List(_) => None,
        }
    }
}

pub struct TodosPage {
    api: Arc<dyn TodoApi>,
    cache: Arc<QueryCache<Vec<Todo>>>,
    pub form: NewTodoForm,
    form_errors: FormErrors,
    modal_open: bool,
    create: MutationState,
    complete: MutationState,
    remove: MutationState,
    alerts: Vec<String>,
}

impl TodosPage {
    /// `cache` is the session's cache; other views may share it.
    pub fn new(api: Arc<dyn TodoApi>, cache: Arc<QueryCache<Vec<Todo>>>) -> Self {
        Self {
            api,
            cache,
            form: NewTodoForm::default(),
            form_errors: FormErrors::default(),
            modal_open: false,
            create: MutationState::Idle,
            complete: MutationState::Idle,
            remove: MutationState::Idle,
            alerts: Vec::new(),
        }
    }

    /// Loads the list, going to the server only when the cached copy is
    /// missing or stale.
    pub async fn load(&self) -> QueryState<Vec<Todo>> {
        let api = self.api.clone();
        self.cache
            .fetch(&QueryKey::todos(), || async move { api.list_todos().await })
            .await
    }

    pub fn render(&self) -> Screen {
        match self.cache.state(&QueryKey::todos()) {
            QueryState::Idle | QueryState::Loading => Screen::Loading,
            QueryState::Error(_) => Screen::Error,
            QueryState::Success(todos) if todos.is_empty() => Screen::Empty,
            QueryState::Success(todos) => Screen::List(todos.iter().map(TodoRow::from).collect()),
        }
    }

    pub fn open_modal(&mut self) {
        self.modal_open = true;
    }

    pub fn close_modal(&mut self) {
        self.modal_open = false;
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn form_errors(&self) -> &FormErrors {
        &self.form_errors
    }

    pub fn create_state(&self) -> &MutationState {
        &self.create
    }

    pub fn complete_state(&self) -> &MutationState {
        &self.complete
    }

    pub fn delete_state(&self) -> &MutationState {
        &self.remove
    }

    pub fn is_submitting(&self) -> bool {
        self.create == MutationState::Pending
    }

    /// Messages raised by failed mutations since the last call.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Submits the modal form. Invalid input stays in the form with its
    /// errors and nothing is sent.
    pub async fn submit(&mut self) -> &MutationState {
        match self.form.validate() {
            Ok(req) => {
                self.form_errors = FormErrors::default();
                self.create_todo(req).await
            }
            Err(errors) => {
                self.form_errors = errors;
                &self.create
            }
        }
    }

    pub async fn create_todo(&mut self, req: NewTodoRequest) -> &MutationState {
        self.create = MutationState::Pending;

        self.create = match self.api.create_todo(&req).await {
            Ok(id) => {
                self.cache.invalidate(&QueryKey::todos());
                self.form.reset();
                self.close_modal();
                MutationState::Success(id)
            }
            Err(e) => {
                warn!("creating todo failed: {}", e);
                self.alerts.push(format!("Error creating todo: {}", e));
                MutationState::Error(e.to_string())
            }
        };
        &self.create
    }

    /// Handler for a row's completion toggle.
    pub async fn mark_completed(&mut self, id: i64) -> &MutationState {
        self.complete = MutationState::Pending;

        self.complete = match self.api.complete_todo(id).await {
            Ok(id) => {
                self.cache.invalidate(&QueryKey::todos());
                MutationState::Success(id)
            }
            Err(e) => {
                warn!("completing todo {} failed: {}", id, e);
                self.alerts.push(format!("Error updating todo: {}", e));
                MutationState::Error(e.to_string())
            }
        };
        &self.complete
    }

    pub async fn delete_todo(&mut self, id: i64) -> &MutationState {
        self.remove = MutationState::Pending;

        self.remove = match self.api.delete_todo(id).await {
            Ok(id) => {
                self.cache.invalidate(&QueryKey::todos());
                MutationState::Success(id)
            }
            Err(e) => {
                warn!("deleting todo {} failed: {}", id, e);
                self.alerts.push(format!("Error deleting todo: {}", e));
                MutationState::Error(e.to_string())
            }
        };
        &self.remove
    }
}
