// handlers/mod.rs - request handlers grouped by resource
//
// admin: admin accounts (login is public, everything else behind admin auth)
// user:  user accounts and the user home page
// task:  todos for their owner, plus the admin views over all todos

pub mod admin;
pub mod params;
pub mod task;
pub mod user;

use sqlx::{postgres::PgRow, FromRow};

use crate::config;
use crate::database::{fetch_one, fetch_page, DatabaseError, DatabaseManager, Repository};
use crate::error::ApiError;
use crate::query::{PaginatedResult, QueryDescriptor, QueryPlanner};

/// Planner configured from the `query` config section
pub fn planner() -> QueryPlanner {
    let settings = &config::config().query;
    QueryPlanner::new(
        settings.default_limit.max(1) as u64,
        settings.max_limit.filter(|max| *max > 0).map(|max| max as u64),
    )
}

/// Count-then-fetch one page of rows for a composed descriptor
pub async fn paginate<T>(descriptor: &QueryDescriptor) -> Result<PaginatedResult<T>, ApiError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin,
{
    let pool = DatabaseManager::pool().await?;
    Ok(fetch_page(&Repository::<T>::new(pool), descriptor).await?)
}

/// First matching row, or 404 with `not_found` as the message
pub async fn find_one<T>(descriptor: &QueryDescriptor, not_found: &'static str) -> Result<T, ApiError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin,
{
    let pool = DatabaseManager::pool().await?;
    match fetch_one(&Repository::<T>::new(pool), descriptor).await {
        Ok(row) => Ok(row),
        Err(DatabaseError::NotFound(_)) => Err(ApiError::not_found(not_found)),
        Err(e) => Err(e.into()),
    }
}
