// handlers/task.rs - todos
//
// Owner routes (user auth); every query is pinned to the caller's rows:
//   POST   /task
//   PATCH  /task
//   PATCH  /task/status
//   DELETE /task
//   GET    /task                 paginated
//   GET    /task/details/:todoId
//
// Admin routes; unscoped, optionally narrowed with `userId`:
//   GET    /task/fetch-by-admin                 paginated
//   GET    /task/fetch-by-admin/details/:todoId
//   DELETE /task/delete-by-admin

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::generate_random_slug;
use crate::database::models::{titled, NewTodo, Owner, Priority, SubTask, Todo, TodoChanges, TodoStatus, User, TODOS};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Message};
use crate::query::{Caller, PaginatedResult, QueryDescriptor, ScopedFilterComposer, SortDirection};

use super::params::{comma_separated, impl_paged, present, required, Paged};
use super::{find_one, paginate, planner};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub tag: String,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoBody {
    pub todo_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub tag: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub sub_tasks: Option<Vec<SubTask>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStatusBody {
    pub todo_id: String,
    pub status: TodoStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoIdBody {
    pub todo_id: String,
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub message: &'static str,
    pub id: String,
}

/// Filters shared by the owner and admin listings. `userId` only has an
/// effect for admins.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_field: Option<String>,
    #[serde(alias = "sortDirection")]
    pub sort_value: Option<SortDirection>,
    #[serde(default, deserialize_with = "comma_separated")]
    pub status: Option<Vec<TodoStatus>>,
    pub priority: Option<Priority>,
    pub tag: Option<String>,
    pub user_id: Option<String>,
    pub search_key: Option<String>,
    pub start_from: Option<DateTime<Utc>>,
    pub start_to: Option<DateTime<Utc>>,
    pub end_from: Option<DateTime<Utc>>,
    pub end_to: Option<DateTime<Utc>>,
}

impl_paged!(TodoListQuery);

/// Compose the listing descriptor. Ownership comes from the caller; the
/// `userId` filter is dropped by the composer for scoped callers.
pub fn list_descriptor(caller: &Caller, query: &TodoListQuery) -> QueryDescriptor {
    let plan = planner().plan_request(&query.page_request());
    let hidden: &[&str] = if caller.scope_override { &["sub_tasks"] } else { &["user_id", "sub_tasks"] };

    ScopedFilterComposer::new(&TODOS, caller)
        .owner(present(query.user_id.as_deref()))
        .one_of("status", query.status.clone())
        .equals("priority", query.priority)
        .equals("tag", present(query.tag.as_deref()))
        .range("start_at", query.start_from, query.start_to)
        .range("end_at", query.end_from, query.end_to)
        .search(query.search_key.as_deref())
        .exclude(hidden)
        .compose(plan)
}

fn detail_descriptor(caller: &Caller, todo_id: String) -> QueryDescriptor {
    let composer = ScopedFilterComposer::new(&TODOS, caller).equals("id", Some(todo_id));
    let composer = if caller.scope_override { composer } else { composer.exclude(&["user_id"]) };
    composer.compose(planner().plan(None, Some(1), None, None))
}

/// POST /task
pub async fn create(Extension(caller): Extension<Caller>, Json(body): Json<CreateTodoBody>) -> ApiResult<Created> {
    let title = required("title", &body.title)?;
    let tag = required("tag", &body.tag)?;
    check_window(Some(body.start_at), body.end_at)?;

    let todo = NewTodo {
        id: generate_random_slug(title),
        user_id: caller.id.clone(),
        title: title.to_string(),
        description: body.description.trim().to_string(),
        priority: body.priority,
        tag: tag.to_string(),
        start_at: body.start_at,
        end_at: body.end_at,
        sub_tasks: titled(body.sub_tasks),
    };

    let pool = DatabaseManager::pool().await?;
    Todo::insert(&pool, &todo).await?;
    tracing::debug!("Todo {} created for {}", todo.id, caller.id);
    Ok(ApiResponse::created(Created { message: "Task Created!", id: todo.id }))
}

/// PATCH /task - only the owner's todos that are not completed yet.
/// Submitting sub-tasks moves the todo to in-progress.
pub async fn update(Extension(caller): Extension<Caller>, Json(body): Json<UpdateTodoBody>) -> ApiResult<Message> {
    let todo_id = required("todoId", &body.todo_id)?.to_string();
    check_window(body.start_at, body.end_at)?;
    let changes = todo_changes(body);

    let pool = DatabaseManager::pool().await?;
    if Todo::update_open(&pool, &todo_id, &caller.id, changes).await? == 0 {
        return Err(ApiError::not_found("Task Not Found or Already Completed!"));
    }
    Ok(ApiResponse::message("Task Updated!"))
}

/// PATCH /task/status - completed is terminal; completing marks every
/// sub-task done.
pub async fn update_status(
    Extension(caller): Extension<Caller>,
    Json(body): Json<TodoStatusBody>,
) -> ApiResult<Message> {
    let todo_id = required("todoId", &body.todo_id)?;

    let pool = DatabaseManager::pool().await?;
    let state = Todo::find_state(&pool, todo_id, &caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("No Task Found!"))?;
    if state.status == TodoStatus::Completed.as_str() {
        return Err(ApiError::locked("Completed Tasks Cannot be Updated Again!"));
    }

    let sub_tasks = settle_sub_tasks(state.sub_tasks.0, body.status);
    Todo::set_status(&pool, todo_id, &caller.id, body.status, &sub_tasks).await?;
    Ok(ApiResponse::message("Task Status Updated!"))
}

/// DELETE /task
pub async fn delete(Extension(caller): Extension<Caller>, Json(body): Json<TodoIdBody>) -> ApiResult<Message> {
    let todo_id = required("todoId", &body.todo_id)?;

    let pool = DatabaseManager::pool().await?;
    if Todo::delete(&pool, todo_id, Some(&caller.id)).await? == 0 {
        return Err(ApiError::not_found("No Task Found!"));
    }
    Ok(ApiResponse::message("Task Deleted!"))
}

/// GET /task and GET /task/fetch-by-admin
pub async fn list(
    Extension(caller): Extension<Caller>,
    Query(query): Query<TodoListQuery>,
) -> ApiResult<PaginatedResult<Todo>> {
    let descriptor = list_descriptor(&caller, &query);
    let mut page = paginate::<Todo>(&descriptor).await?;
    if caller.scope_override {
        page.data = with_owners(page.data).await?;
    }
    Ok(ApiResponse::success(page))
}

/// GET /task/details/:todoId and GET /task/fetch-by-admin/details/:todoId
pub async fn details(Extension(caller): Extension<Caller>, Path(todo_id): Path<String>) -> ApiResult<Todo> {
    let descriptor = detail_descriptor(&caller, todo_id);
    let todo: Todo = find_one(&descriptor, "Todo Not Found!").await?;
    if !caller.scope_override {
        return Ok(ApiResponse::success(todo));
    }
    let mut todos = with_owners(vec![todo]).await?;
    match todos.pop() {
        Some(todo) => Ok(ApiResponse::success(todo)),
        None => Err(ApiError::not_found("Todo Not Found!")),
    }
}

/// DELETE /task/delete-by-admin
pub async fn delete_by_admin(Json(body): Json<TodoIdBody>) -> ApiResult<Message> {
    let todo_id = required("todoId", &body.todo_id)?;

    let pool = DatabaseManager::pool().await?;
    if Todo::delete(&pool, todo_id, None).await? == 0 {
        return Err(ApiError::not_found("No Task Found!"));
    }
    tracing::info!("Todo {} deleted by admin", todo_id);
    Ok(ApiResponse::message("Task Deleted!"))
}

/// Load the `{id, name}` of every owner on the page in one query
async fn with_owners(mut todos: Vec<Todo>) -> Result<Vec<Todo>, ApiError> {
    let mut ids: Vec<String> = todos.iter().filter_map(|t| t.user_id.clone()).collect();
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(todos);
    }

    let pool = DatabaseManager::pool().await?;
    let owners = User::owners(&pool, &ids).await?;
    attach_owners(&mut todos, &owners);
    Ok(todos)
}

fn attach_owners(todos: &mut [Todo], owners: &[Owner]) {
    for todo in todos.iter_mut() {
        let id = todo.user_id.as_deref();
        todo.user = owners.iter().find(|o| Some(o.id.as_str()) == id).cloned();
    }
}

/// Reject an end before the start when both are supplied
fn check_window(start_at: Option<DateTime<Utc>>, end_at: Option<DateTime<Utc>>) -> Result<(), ApiError> {
    match (start_at, end_at) {
        (Some(start), Some(end)) if end < start => {
            Err(ApiError::invalid_field("endAt", "endAt must not be before startAt"))
        }
        _ => Ok(()),
    }
}

fn todo_changes(body: UpdateTodoBody) -> TodoChanges {
    let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let (sub_tasks, status) = match body.sub_tasks {
        Some(sub_tasks) if !sub_tasks.is_empty() => (Some(titled(sub_tasks)), Some(TodoStatus::InProgress)),
        _ => (None, None),
    };

    TodoChanges {
        title: trimmed(body.title),
        description: body.description.map(|s| s.trim().to_string()),
        priority: body.priority,
        tag: trimmed(body.tag),
        start_at: body.start_at,
        end_at: body.end_at,
        sub_tasks,
        status,
    }
}

fn settle_sub_tasks(sub_tasks: Vec<SubTask>, status: TodoStatus) -> Vec<SubTask> {
    if status != TodoStatus::Completed {
        return sub_tasks;
    }
    sub_tasks.into_iter().map(|s| SubTask { status: true, ..s }).collect()
}
