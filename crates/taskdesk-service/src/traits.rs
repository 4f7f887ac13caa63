use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskdesk_core::answer::{AnswerComment, CreateAnswer, CreateComment, TaskAnswer};
use taskdesk_core::search::SearchHit;
use taskdesk_core::tag::{CreateTag, Tag};
use taskdesk_core::task::{CreateTask, Task, TaskFilter, UpdateTask};
use taskdesk_core::user::{CreateUser, User};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An authorization gate, not a fault: callers surface this as a
    /// notice and fall back to a safe listing.
    #[error("denied: {0}")]
    Denied(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// One row of the subordinate report: a task assigned to the subordinate
/// paired with their earliest answer, when one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubordinateTaskReport {
    pub task: Task,
    pub answer: Option<TaskAnswer>,
}

/// Abstraction over the task-tracking operations the HTTP layer consumes.
///
/// `LocalService` wraps a direct SQLite connection and applies the
/// per-action authorization checks on top of the store.
pub trait TrackerService: Send + Sync {
    // -- Users --
    fn create_user(&self, input: &CreateUser) -> Result<User, ServiceError>;
    fn get_user(&self, id: i64) -> Result<User, ServiceError>;
    fn list_users(&self) -> Result<Vec<User>, ServiceError>;
    fn add_subordinate(&self, superior_id: i64, subordinate_id: i64)
        -> Result<(), ServiceError>;
    fn remove_subordinate(
        &self,
        superior_id: i64,
        subordinate_id: i64,
    ) -> Result<(), ServiceError>;
    fn list_subordinates(&self, superior_id: i64) -> Result<Vec<User>, ServiceError>;

    // -- Tags --
    fn create_tag(&self, input: &CreateTag) -> Result<Tag, ServiceError>;
    fn get_tag(&self, id: i64) -> Result<Tag, ServiceError>;
    fn list_tags(&self) -> Result<Vec<Tag>, ServiceError>;

    // -- Tasks --
    fn create_task(&self, creator_id: i64, input: &CreateTask) -> Result<Task, ServiceError>;
    fn get_task(&self, id: i64) -> Result<Task, ServiceError>;
    fn update_task(
        &self,
        user_id: i64,
        id: i64,
        update: &UpdateTask,
    ) -> Result<Task, ServiceError>;
    fn delete_task(&self, user_id: i64, id: i64) -> Result<(), ServiceError>;
    fn list_visible(
        &self,
        user_id: i64,
        filter: &TaskFilter,
        query: Option<&str>,
    ) -> Result<Vec<Task>, ServiceError>;
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, ServiceError>;

    // -- Answers --
    fn add_answer(
        &self,
        user_id: i64,
        task_id: i64,
        input: &CreateAnswer,
    ) -> Result<TaskAnswer, ServiceError>;
    fn list_answers(&self, task_id: i64) -> Result<Vec<TaskAnswer>, ServiceError>;

    // -- Comments --
    fn add_comment(
        &self,
        manager_id: i64,
        answer_id: i64,
        input: &CreateComment,
    ) -> Result<AnswerComment, ServiceError>;
    fn list_comments(&self, answer_id: i64) -> Result<Vec<AnswerComment>, ServiceError>;

    // -- Reports --
    fn subordinate_tasks(
        &self,
        manager_id: i64,
        subordinate_id: i64,
    ) -> Result<Vec<SubordinateTaskReport>, ServiceError>;
}
