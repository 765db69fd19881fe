use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::query::ResourceSpec;

pub const ADMINS: ResourceSpec = ResourceSpec {
    table: "admins",
    columns: &["id", "name", "username", "password", "status", "is_primary", "created_at", "updated_at"],
    always_excluded: &["password"],
    owner_column: None,
    search_column: None,
};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub username: String,
    pub status: bool,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login-time view including the password hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct AdminCredentials {
    pub id: String,
    pub username: String,
    pub password: String,
    pub status: bool,
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub is_primary: bool,
}

impl Admin {
    pub async fn find_credentials(pool: &PgPool, username: &str) -> Result<Option<AdminCredentials>, DatabaseError> {
        let admin = sqlx::query_as::<_, AdminCredentials>(
            "SELECT id, username, password, status, is_primary FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;
        Ok(admin)
    }

    pub async fn insert(pool: &PgPool, admin: &NewAdmin) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO admins (id, name, username, password, is_primary) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&admin.id)
        .bind(&admin.name)
        .bind(&admin.username)
        .bind(&admin.password_hash)
        .bind(admin.is_primary)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns the number of rows touched.
    pub async fn update_flags(
        pool: &PgPool,
        id: &str,
        status: Option<bool>,
        is_primary: Option<bool>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE admins SET status = COALESCE($2, status), is_primary = COALESCE($3, is_primary), \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(is_primary)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1").bind(id).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
