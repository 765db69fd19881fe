use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::models::user::Owner;
use crate::query::{FilterValue, ResourceSpec};

pub const TODOS: ResourceSpec = ResourceSpec {
    table: "todos",
    columns: &[
        "id",
        "user_id",
        "index",
        "title",
        "description",
        "status",
        "tag",
        "priority",
        "start_at",
        "end_at",
        "sub_tasks",
        "search_vector",
        "created_at",
        "updated_at",
    ],
    always_excluded: &["search_vector", "index"],
    owner_column: Some("user_id"),
    search_column: Some("search_vector"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Paused,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in-progress",
            TodoStatus::Completed => "completed",
            TodoStatus::Paused => "paused",
        }
    }
}

impl From<TodoStatus> for FilterValue {
    fn from(status: TodoStatus) -> Self {
        FilterValue::Text(status.as_str().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl From<Priority> for FilterValue {
    fn from(priority: Priority) -> Self {
        FilterValue::Text(priority.as_str().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub title: String,
    #[serde(default)]
    pub status: bool,
}

/// Todo row. `user_id` and `sub_tasks` are absent when the projection
/// excludes them.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub tag: String,
    pub priority: String,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_tasks: Option<Json<Vec<SubTask>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Filled in for admin views only
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Owner>,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub tag: String,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub sub_tasks: Vec<SubTask>,
}

/// Partial update; `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub tag: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub sub_tasks: Option<Vec<SubTask>>,
    pub status: Option<TodoStatus>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TodoState {
    pub status: String,
    pub sub_tasks: Json<Vec<SubTask>>,
}

/// Drop sub-tasks that were submitted without a title.
pub fn titled(sub_tasks: Vec<SubTask>) -> Vec<SubTask> {
    sub_tasks.into_iter().filter(|s| !s.title.trim().is_empty()).collect()
}

impl Todo {
    pub async fn insert(pool: &PgPool, todo: &NewTodo) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO todos (id, user_id, title, description, priority, tag, start_at, end_at, sub_tasks) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&todo.id)
        .bind(&todo.user_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.priority.as_str())
        .bind(&todo.tag)
        .bind(todo.start_at)
        .bind(todo.end_at)
        .bind(Json(&todo.sub_tasks))
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Update an owned todo that has not been completed yet.
    pub async fn update_open(pool: &PgPool, id: &str, owner: &str, changes: TodoChanges) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE todos SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                priority = COALESCE($5, priority), \
                tag = COALESCE($6, tag), \
                start_at = COALESCE($7, start_at), \
                end_at = COALESCE($8, end_at), \
                sub_tasks = COALESCE($9, sub_tasks), \
                status = COALESCE($10, status), \
                updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND status <> 'completed'",
        )
        .bind(id)
        .bind(owner)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.priority.map(|p| p.as_str()))
        .bind(changes.tag)
        .bind(changes.start_at)
        .bind(changes.end_at)
        .bind(changes.sub_tasks.map(Json))
        .bind(changes.status.map(|s| s.as_str()))
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_state(pool: &PgPool, id: &str, owner: &str) -> Result<Option<TodoState>, DatabaseError> {
        let state = sqlx::query_as::<_, TodoState>(
            "SELECT status, sub_tasks FROM todos WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;
        Ok(state)
    }

    pub async fn set_status(
        pool: &PgPool,
        id: &str,
        owner: &str,
        status: TodoStatus,
        sub_tasks: &[SubTask],
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE todos SET status = $3, sub_tasks = $4, updated_at = NOW() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .bind(status.as_str())
        .bind(Json(sub_tasks))
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete by id, restricted to `owner` when given.
    pub async fn delete(pool: &PgPool, id: &str, owner: Option<&str>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND ($2::text IS NULL OR user_id = $2)")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Dashboard buckets for a user's todos. The lists are windows over the
/// newest rows; the counts cover every row.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub in_progress_tasks: Vec<Todo>,
    pub late_tasks: Vec<Todo>,
    pub completed_tasks: Vec<Todo>,
    pub count_of_completed_tasks: u64,
    pub count_of_incomplete_tasks: u64,
}

impl HomePage {
    /// `recent` fills the in-progress and completed lists. `late` is
    /// re-checked against `now` since the store bound is inclusive.
    pub fn new(recent: Vec<Todo>, late: Vec<Todo>, completed: u64, total: u64, now: DateTime<Utc>) -> Self {
        let mut page = HomePage {
            count_of_completed_tasks: completed,
            count_of_incomplete_tasks: total.saturating_sub(completed),
            ..Default::default()
        };
        page.late_tasks = late.into_iter().filter(|todo| todo.is_late(now)).collect();

        for todo in recent {
            if todo.status == TodoStatus::Pending.as_str() || todo.status == TodoStatus::InProgress.as_str() {
                page.in_progress_tasks.push(todo);
            } else if todo.status == TodoStatus::Completed.as_str() {
                page.completed_tasks.push(todo);
            }
        }
        page
    }
}

impl Todo {
    /// Not completed and past its end
    pub fn is_late(&self, now: DateTime<Utc>) -> bool {
        self.status != TodoStatus::Completed.as_str() && self.end_at.is_some_and(|end| end < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn todo(id: &str, status: TodoStatus, end_at: Option<DateTime<Utc>>) -> Todo {
        let now = Utc::now();
        Todo {
            id: id.to_string(),
            user_id: None,
            title: id.to_string(),
            description: String::new(),
            status: status.as_str().to_string(),
            tag: "work".to_string(),
            priority: Priority::Medium.as_str().to_string(),
            start_at: now,
            end_at,
            sub_tasks: None,
            created_at: now,
            updated_at: now,
            user: None,
        }
    }

    #[test]
    fn status_and_priority_wire_names() {
        assert_eq!(serde_json::to_string(&TodoStatus::InProgress).unwrap(), "\"in-progress\"");
        assert_eq!(serde_json::from_str::<Priority>("\"high\"").unwrap(), Priority::High);
        assert!(serde_json::from_str::<TodoStatus>("\"archived\"").is_err());
    }

    #[test]
    fn untitled_sub_tasks_are_dropped() {
        let kept = titled(vec![
            SubTask { title: "call".to_string(), status: false },
            SubTask { title: "  ".to_string(), status: true },
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "call");
    }

    #[test]
    fn home_page_buckets() {
        let now = Utc::now();
        let recent = vec![
            todo("a", TodoStatus::Pending, Some(now - Duration::days(1))),
            todo("b", TodoStatus::InProgress, Some(now + Duration::days(1))),
            todo("c", TodoStatus::Completed, Some(now - Duration::days(3))),
            todo("d", TodoStatus::Paused, None),
        ];
        let late = vec![
            todo("a", TodoStatus::Pending, Some(now - Duration::days(1))),
            todo("e", TodoStatus::Paused, Some(now)),
        ];
        let page = HomePage::new(recent, late, 7, 20, now);

        let ids = |v: &[Todo]| v.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&page.in_progress_tasks), ["a", "b"]);
        assert_eq!(ids(&page.late_tasks), ["a"]);
        assert_eq!(ids(&page.completed_tasks), ["c"]);
        assert_eq!(page.count_of_completed_tasks, 7);
        assert_eq!(page.count_of_incomplete_tasks, 13);
    }

    #[test]
    fn lateness() {
        let now = Utc::now();
        assert!(todo("a", TodoStatus::Paused, Some(now - Duration::minutes(1))).is_late(now));
        assert!(!todo("b", TodoStatus::Completed, Some(now - Duration::days(1))).is_late(now));
        assert!(!todo("c", TodoStatus::Pending, None).is_late(now));
        assert!(!todo("d", TodoStatus::Pending, Some(now)).is_late(now));
    }

    #[test]
    fn hidden_columns_are_not_serialized() {
        let json = serde_json::to_value(todo("a", TodoStatus::Pending, None)).unwrap();
        assert!(json.get("userId").is_none());
        assert!(json.get("subTasks").is_none());
        assert!(json.get("searchVector").is_none());
        assert!(json.get("user").is_none());
        assert_eq!(json["status"], "pending");
    }
}
