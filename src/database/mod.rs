pub mod manager;
pub mod models;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::Repository;
pub use store::{fetch_one, fetch_page, RecordStore};
