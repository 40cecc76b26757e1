use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Default page size when listing tasks.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Largest page a client may ask for.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task, 3 to 20 characters.
    #[validate(length(min = 3, max = 20))]
    pub title: String,

    /// Optional description, 3 to 100 characters if provided.
    #[validate(length(min = 3, max = 100))]
    pub description: Option<String>,

    /// Optional deadline for the task.
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial update of a task. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 3, max = 20))]
    pub title: Option<String>,

    #[validate(length(min = 3, max = 100))]
    pub description: Option<String>,

    pub deadline: Option<DateTime<Utc>>,

    #[serde(rename = "isCompleted")]
    pub is_completed: Option<bool>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
    pub deadline: Option<DateTime<Utc>>,
    /// Identifier of the user who owns the task.
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing tasks: `?page=1&limit=10&isCompleted=1`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// `1` lists completed tasks, any other value lists incomplete ones.
    #[serde(rename = "isCompleted")]
    pub is_completed: Option<String>,
}

impl TaskQuery {
    /// Page size, defaulting to 10 and clamped to `1..=100`.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip; pages are 1-based and page 0 is treated as page 1.
    /// `None` when the page lies beyond any representable offset.
    pub fn offset(&self) -> Option<i64> {
        let page = self.page.unwrap_or(1).max(1);
        (page - 1).checked_mul(self.limit())
    }

    pub fn completed_filter(&self) -> Option<bool> {
        self.is_completed.as_deref().map(|flag| flag == "1")
    }
}
