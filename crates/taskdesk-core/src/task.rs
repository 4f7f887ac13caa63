use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Task lifecycle state. The numeric codes are what the database stores
/// and are deliberately non-monotonic: new tasks carry the highest code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    New,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: &[Status] = &[Status::New, Status::InProgress, Status::Done];

    pub fn code(&self) -> i64 {
        match self {
            Status::New => 2,
            Status::InProgress => 1,
            Status::Done => 0,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            2 => Some(Status::New),
            1 => Some(Status::InProgress),
            0 => Some(Status::Done),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "new",
            Status::InProgress => "in_progress",
            Status::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Status::New),
            "in_progress" => Some(Status::InProgress),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Status::New => "New",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::New
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: &[Priority] = &[Priority::Low, Priority::Medium, Priority::High];

    pub fn code(&self) -> i64 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Priority::Low),
            1 => Some(Priority::Medium),
            2 => Some(Priority::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub creator_id: i64,
    pub assignee_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee_ids: Vec<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

impl CreateTask {
    /// Field-level validation applied before any write.
    pub fn validate(&self) -> Result<(), crate::TaskdeskError> {
        if self.title.trim().is_empty() {
            return Err(crate::TaskdeskError::InvalidInput(
                "title must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the due date.
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub assignee_ids: Option<Vec<i64>>,
    pub tag_ids: Option<Vec<i64>>,
}

/// Distinguishes an absent field (outer `None`, via `default`) from an
/// explicit JSON `null` (`Some(None)`), so `null` clears the value.
fn deserialize_double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateTask {
    pub fn validate(&self) -> Result<(), crate::TaskdeskError> {
        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                return Err(crate::TaskdeskError::InvalidInput(
                    "title must not be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Structured narrowing applied on top of the visible set. All fields are
/// optional and conjunctive; the multi-valued ones match on ANY member.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub tag_ids: Vec<i64>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee_ids: Vec<i64>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.tag_ids.is_empty()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee_ids.is_empty()
    }
}
