use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::query::ResourceSpec;

pub const USERS: ResourceSpec = ResourceSpec {
    table: "users",
    columns: &[
        "id",
        "index",
        "name",
        "email",
        "password",
        "status",
        "search_vector",
        "created_at",
        "updated_at",
    ],
    always_excluded: &["password", "search_vector", "index"],
    owner_column: None,
    search_column: Some("search_vector"),
};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner summary attached to todos in admin views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Owner {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub status: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl User {
    pub async fn find_credentials(pool: &PgPool, email: &str) -> Result<Option<UserCredentials>, DatabaseError> {
        let user = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, name, email, password, status FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, status, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn owners(pool: &PgPool, ids: &[String]) -> Result<Vec<Owner>, DatabaseError> {
        let owners = sqlx::query_as::<_, Owner>("SELECT id, name FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(owners)
    }

    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    pub async fn insert(pool: &PgPool, user: &NewUser) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO users (id, name, email, password) VALUES ($1, $2, $3, $4)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_status(pool: &PgPool, id: &str, status: bool) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
