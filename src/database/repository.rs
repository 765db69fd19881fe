use async_trait::async_trait;
use sqlx::{self, postgres::{PgArguments, PgRow}, FromRow, PgPool, Postgres, Row};

use crate::database::manager::DatabaseError;
use crate::database::store::RecordStore;
use crate::query::sql::SqlCompiler;
use crate::query::{FilterValue, QueryDescriptor};

/// Postgres-backed [`RecordStore`] decoding rows into `T`.
pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _phantom: std::marker::PhantomData }
    }
}

#[async_trait]
impl<T> RecordStore<T> for Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin,
{
    async fn count(&self, descriptor: &QueryDescriptor) -> Result<i64, DatabaseError> {
        let sql_result = SqlCompiler::count(descriptor)?;
        tracing::debug!("count: {}", sql_result.query);

        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn find(&self, descriptor: &QueryDescriptor) -> Result<Vec<T>, DatabaseError> {
        let sql_result = SqlCompiler::select(descriptor)?;
        tracing::debug!("find: {}", sql_result.query);

        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &FilterValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        FilterValue::Text(s) => q.bind(s.clone()),
        FilterValue::Bool(b) => q.bind(*b),
        FilterValue::Int(i) => q.bind(*i),
        FilterValue::Timestamp(t) => q.bind(*t),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    v: &FilterValue,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        FilterValue::Text(s) => q.bind(s.clone()),
        FilterValue::Bool(b) => q.bind(*b),
        FilterValue::Int(i) => q.bind(*i),
        FilterValue::Timestamp(t) => q.bind(*t),
    }
}
