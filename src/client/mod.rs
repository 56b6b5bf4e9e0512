//! Client side of the todo API: an HTTP client, a query cache owned by the
//! application session, and the view-model for the todo list page.

pub mod cache;
pub mod error;
pub mod http;
pub mod page;

pub use cache::{QueryCache, QueryKey, QueryState};
pub use error::ClientError;
pub use http::{StaticToken, TodoApi, TodoApiClient, TokenSource};
pub use page::{FormErrors, MutationState, NewTodoForm, Screen, TodoRow, TodosPage};
