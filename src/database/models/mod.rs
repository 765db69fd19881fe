pub mod admin;
pub mod todo;
pub mod user;

pub use admin::{Admin, AdminCredentials, NewAdmin, ADMINS};
pub use todo::{titled, HomePage, NewTodo, Priority, SubTask, Todo, TodoChanges, TodoState, TodoStatus, TODOS};
pub use user::{NewUser, Owner, User, UserCredentials, USERS};
