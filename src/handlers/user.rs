// handlers/user.rs - user accounts and the home page
//
// POST   /user/register         public
// POST   /user/login            public
// GET    /user/auth             user
// POST   /user/logout           user
// GET    /user/home             user
// GET    /user                  admin, paginated
// GET    /user/details/:userId  admin
// PATCH  /user/status           admin
// DELETE /user                  admin

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, generate_random_slug, hash_password, verify_password, Claims, TokenRole};
use crate::config;
use crate::database::models::{HomePage, NewUser, Todo, TodoStatus, User, TODOS, USERS};
use crate::database::{DatabaseError, DatabaseManager, RecordStore, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Message};
use crate::query::{Caller, PaginatedResult, QueryPlanner, ScopedFilterComposer, SortDirection};

use super::admin::TokenBody;
use super::params::{impl_paged, present, required, Paged};
use super::{find_one, paginate, planner};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusBody {
    pub user_id: String,
    pub status: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserBody {
    pub user_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_field: Option<String>,
    #[serde(alias = "sortDirection")]
    pub sort_value: Option<SortDirection>,
    pub status: Option<bool>,
    pub user_id: Option<String>,
    pub search_key: Option<String>,
}

impl_paged!(UserListQuery);

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub tag: Option<String>,
}

/// POST /user/register
pub async fn register(Json(body): Json<RegisterBody>) -> ApiResult<TokenBody> {
    let name = required("name", &body.name)?;
    let email = required("email", &body.email)?.to_lowercase();
    required("password", &body.password)?;
    if !email.contains('@') {
        return Err(ApiError::invalid_field("email", "email must be a valid address"));
    }

    let pool = DatabaseManager::pool().await?;
    if User::email_exists(&pool, &email).await? {
        return Err(ApiError::locked("User Already Exists! Log In Instead!"));
    }

    let user = NewUser {
        id: generate_random_slug(name),
        name: name.to_string(),
        email,
        password_hash: hash_password(&body.password)?,
    };
    User::insert(&pool, &user).await?;
    tracing::info!("User {} registered", user.id);

    let token = generate_jwt(&Claims::new(user.id, TokenRole::User, false))?;
    Ok(ApiResponse::created(TokenBody { token }))
}

/// POST /user/login
pub async fn login(Json(body): Json<LoginBody>) -> ApiResult<TokenBody> {
    let email = required("email", &body.email)?.to_lowercase();

    let pool = DatabaseManager::pool().await?;
    let user = User::find_credentials(&pool, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("User Not Found!"))?;
    if !user.status {
        return Err(ApiError::unauthorized("This User has currently been disabled!"));
    }
    if !verify_password(&body.password, &user.password) {
        return Err(ApiError::unauthorized("Incorrect Password!"));
    }

    let token = generate_jwt(&Claims::new(user.id, TokenRole::User, false))?;
    Ok(ApiResponse::success(TokenBody { token }))
}

/// GET /user/auth
pub async fn auth(Extension(caller): Extension<Caller>) -> ApiResult<UserIdentity> {
    let pool = DatabaseManager::pool().await?;
    let user = User::find_by_id(&pool, &caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User Not Found!"))?;
    Ok(ApiResponse::success(UserIdentity { name: user.name, email: user.email }))
}

/// POST /user/logout
pub async fn logout() -> ApiResult<Message> {
    Ok(ApiResponse::message("User Logged Out!"))
}

/// GET /user - paginated, filterable by `status`, `userId` and `searchKey`
pub async fn list(
    Extension(caller): Extension<Caller>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<PaginatedResult<User>> {
    let plan = planner().plan_request(&query.page_request());
    let descriptor = ScopedFilterComposer::new(&USERS, &caller)
        .equals("status", query.status)
        .equals("id", present(query.user_id.as_deref()))
        .search(query.search_key.as_deref())
        .compose(plan);

    Ok(ApiResponse::success(paginate(&descriptor).await?))
}

/// GET /user/details/:userId
pub async fn details(Extension(caller): Extension<Caller>, Path(user_id): Path<String>) -> ApiResult<User> {
    let descriptor = ScopedFilterComposer::new(&USERS, &caller)
        .equals("id", Some(user_id))
        .compose(planner().plan(None, Some(1), None, None));

    Ok(ApiResponse::success(find_one(&descriptor, "User Not Found!").await?))
}

/// PATCH /user/status
pub async fn update_status(Json(body): Json<UserStatusBody>) -> ApiResult<Message> {
    let user_id = required("userId", &body.user_id)?;

    let pool = DatabaseManager::pool().await?;
    if User::set_status(&pool, user_id, body.status).await? == 0 {
        return Err(ApiError::not_found("User Not Found"));
    }
    tracing::info!("User {} status set to {}", user_id, body.status);
    Ok(ApiResponse::message("User Status Updated!"))
}

/// DELETE /user - the user's todos go with them
pub async fn delete(Json(body): Json<DeleteUserBody>) -> ApiResult<Message> {
    let user_id = required("userId", &body.user_id)?;

    let pool = DatabaseManager::pool().await?;
    if User::delete(&pool, user_id).await? == 0 {
        return Err(ApiError::not_found("User Not Found"));
    }
    tracing::info!("User {} deleted", user_id);
    Ok(ApiResponse::message("User Deleted!"))
}

/// GET /user/home - bucket lists over the caller's newest todos, counts
/// over all of them
pub async fn home(Extension(caller): Extension<Caller>, Query(query): Query<HomeQuery>) -> ApiResult<HomePage> {
    let limit = config::config().query.home_page_limit.max(1) as u64;
    let pool = DatabaseManager::pool().await?;
    let store = Repository::<Todo>::new(pool);

    let page = home_page(&store, &caller, present(query.tag.as_deref()), limit, Utc::now()).await?;
    Ok(ApiResponse::success(page))
}

async fn home_page<S>(
    store: &S,
    caller: &Caller,
    tag: Option<&str>,
    limit: u64,
    now: DateTime<Utc>,
) -> Result<HomePage, DatabaseError>
where
    S: RecordStore<Todo> + ?Sized,
{
    let planner = QueryPlanner::new(limit, None);
    let newest = || planner.plan(None, None, Some("created_at"), Some(SortDirection::Desc));
    let scoped = || {
        ScopedFilterComposer::new(&TODOS, caller)
            .equals("tag", tag)
            .exclude(&["user_id", "sub_tasks"])
    };

    let recent = store.find(&scoped().compose(newest())).await?;
    let late = scoped()
        .one_of("status", Some(vec![TodoStatus::Pending, TodoStatus::InProgress, TodoStatus::Paused]))
        .range("end_at", None, Some(now))
        .compose(newest());
    let late = store.find(&late).await?;

    let total = store.count(&scoped().compose(newest())).await?;
    let completed = scoped()
        .one_of("status", Some(vec![TodoStatus::Completed]))
        .compose(newest());
    let completed = store.count(&completed).await?;

    Ok(HomePage::new(
        recent,
        late,
        u64::try_from(completed).unwrap_or(0),
        u64::try_from(total).unwrap_or(0),
        now,
    ))
}
