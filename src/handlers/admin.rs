// handlers/admin.rs - admin accounts
//
// POST   /admin/login   public
// GET    /admin/auth    any admin
// POST   /admin/logout  any admin
// POST   /admin         primary admin
// GET    /admin         primary admin, paginated
// PATCH  /admin         primary admin
// DELETE /admin         super admin

use axum::{extract::Query, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, generate_random_slug, hash_password, verify_password, Claims, TokenRole};
use crate::config;
use crate::database::models::{Admin, NewAdmin, ADMINS};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{is_super_admin, ApiResponse, ApiResult, Message};
use crate::query::{Caller, PaginatedResult, ScopedFilterComposer, SortDirection};

use super::params::{impl_paged, required, Paged};
use super::{paginate, planner};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenBody {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub name: String,
    pub is_primary: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminBody {
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminBody {
    pub admin_id: String,
    pub is_primary: Option<bool>,
    pub status: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAdminBody {
    pub admin_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_field: Option<String>,
    #[serde(alias = "sortDirection")]
    pub sort_value: Option<SortDirection>,
    pub status: Option<bool>,
    pub is_primary: Option<bool>,
}

impl_paged!(AdminListQuery);

/// POST /admin/login
///
/// The configured super admin is checked first and never touches the
/// database; everyone else is looked up by username.
pub async fn login(Json(body): Json<LoginBody>) -> ApiResult<TokenBody> {
    let username = required("username", &body.username)?;
    let security = &config::config().security;

    let is_primary = if security.super_admin_username.as_deref() == Some(username) {
        if security.super_admin_password.as_deref() != Some(body.password.as_str()) {
            return Err(ApiError::unauthorized("Incorrect Password!"));
        }
        true
    } else {
        let pool = DatabaseManager::pool().await?;
        let admin = Admin::find_credentials(&pool, username)
            .await?
            .ok_or_else(|| ApiError::not_found("Admin Not Found!"))?;
        if !admin.status {
            return Err(ApiError::unauthorized("Your Current Admin Credentials Has been Disabled!"));
        }
        if !verify_password(&body.password, &admin.password) {
            return Err(ApiError::unauthorized("Incorrect Password!"));
        }
        admin.is_primary
    };

    tracing::info!("Admin {} logged in", username);
    let token = generate_jwt(&Claims::new(username, TokenRole::Admin, is_primary))?;
    Ok(ApiResponse::success(TokenBody { token }))
}

/// GET /admin/auth
pub async fn auth(Extension(caller): Extension<Caller>) -> ApiResult<AdminIdentity> {
    Ok(ApiResponse::success(AdminIdentity {
        is_primary: caller.is_primary(),
        name: caller.id,
    }))
}

/// POST /admin/logout - tokens are stateless, the client discards its copy
pub async fn logout() -> ApiResult<Message> {
    Ok(ApiResponse::message("Admin Logged Out!"))
}

/// POST /admin
pub async fn create(Extension(caller): Extension<Caller>, Json(body): Json<CreateAdminBody>) -> ApiResult<Message> {
    require_primary(&caller)?;
    let name = required("name", &body.name)?;
    let username = required("username", &body.username)?;
    required("password", &body.password)?;

    if config::config().security.super_admin_username.as_deref() == Some(username) {
        return Err(ApiError::conflict("Username is reserved"));
    }

    let admin = NewAdmin {
        id: generate_random_slug(name),
        name: name.to_string(),
        username: username.to_string(),
        password_hash: hash_password(&body.password)?,
        is_primary: body.is_primary,
    };

    let pool = DatabaseManager::pool().await?;
    Admin::insert(&pool, &admin).await?;
    tracing::info!("Admin {} created by {}", admin.id, caller.id);
    Ok(ApiResponse::created(Message { message: "Admin Created!" }))
}

/// GET /admin - paginated, filterable by `status` and `isPrimary`
pub async fn list(
    Extension(caller): Extension<Caller>,
    Query(query): Query<AdminListQuery>,
) -> ApiResult<PaginatedResult<Admin>> {
    require_primary(&caller)?;

    let plan = planner().plan_request(&query.page_request());
    let descriptor = ScopedFilterComposer::new(&ADMINS, &caller)
        .equals("status", query.status)
        .equals("is_primary", query.is_primary)
        .compose(plan);

    Ok(ApiResponse::success(paginate(&descriptor).await?))
}

/// PATCH /admin
pub async fn update(Extension(caller): Extension<Caller>, Json(body): Json<UpdateAdminBody>) -> ApiResult<Message> {
    require_primary(&caller)?;
    let admin_id = required("adminId", &body.admin_id)?;

    let pool = DatabaseManager::pool().await?;
    if Admin::update_flags(&pool, admin_id, body.status, body.is_primary).await? == 0 {
        return Err(ApiError::not_found("Admin Not Found!"));
    }
    Ok(ApiResponse::message("Admin Updated!"))
}

/// DELETE /admin
pub async fn delete(Extension(caller): Extension<Caller>, Json(body): Json<DeleteAdminBody>) -> ApiResult<Message> {
    if !is_super_admin(&caller) {
        return Err(ApiError::forbidden("You are not authorized to perform this action!"));
    }
    let admin_id = required("adminId", &body.admin_id)?;

    let pool = DatabaseManager::pool().await?;
    if Admin::delete(&pool, admin_id).await? == 0 {
        return Err(ApiError::not_found("Admin Not Found!"));
    }
    tracing::info!("Admin {} deleted", admin_id);
    Ok(ApiResponse::message("Admin Deleted!"))
}

fn require_primary(caller: &Caller) -> Result<(), ApiError> {
    if caller.is_primary() {
        Ok(())
    } else {
        Err(ApiError::forbidden("You are not authorized to perform this action!"))
    }
}
