pub mod auth;
pub mod response;

pub use auth::{admin_auth_middleware, is_super_admin, user_auth_middleware};
pub use response::{ApiResponse, ApiResult, Message};
