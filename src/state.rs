use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::db::TodoRepository;

#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn TodoRepository>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(todos: Arc<dyn TodoRepository>, verifier: TokenVerifier) -> Self {
        Self {
            todos,
            verifier: Arc::new(verifier),
        }
    }
}
