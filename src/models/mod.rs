pub mod envelope;
pub mod todo;

pub use envelope::{MessageResponse, TodoIdResponse, TodoListResponse};
pub use todo::{NewTodo, NewTodoRequest, Todo};
