use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::query::{PaginatedResult, QueryDescriptor};

/// Capability a backing store exposes to the query layer.
#[async_trait]
pub trait RecordStore<T>: Send + Sync {
    async fn count(&self, descriptor: &QueryDescriptor) -> Result<i64, DatabaseError>;

    async fn find(&self, descriptor: &QueryDescriptor) -> Result<Vec<T>, DatabaseError>;
}

/// Count, then fetch the page. A zero count returns the empty result without
/// issuing the row query. Store errors propagate as-is; writes landing between
/// the two calls may skew `count` against `data`.
pub async fn fetch_page<T, S>(store: &S, descriptor: &QueryDescriptor) -> Result<PaginatedResult<T>, DatabaseError>
where
    S: RecordStore<T> + ?Sized,
    T: Send,
{
    let count = u64::try_from(store.count(descriptor).await?).unwrap_or(0);
    if count == 0 {
        return Ok(PaginatedResult::empty());
    }

    let data = store.find(descriptor).await?;
    Ok(PaginatedResult {
        count,
        has_next: descriptor.has_next(count),
        data,
    })
}

/// First row matching the descriptor, or `NotFound`.
pub async fn fetch_one<T, S>(store: &S, descriptor: &QueryDescriptor) -> Result<T, DatabaseError>
where
    S: RecordStore<T> + ?Sized,
    T: Send,
{
    store
        .find(descriptor)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DatabaseError::NotFound(format!("{} record not found", descriptor.table())))
}
