use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A submission against a task by its creator or one of its assignees.
/// Append-only: there is no update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAnswer {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub body: String,
    /// Opaque stored-file reference; upload storage lives elsewhere.
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnswer {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attachment: Option<String>,
}

impl CreateAnswer {
    pub fn validate(&self) -> Result<(), crate::TaskdeskError> {
        if self.body.trim().is_empty() && self.attachment.is_none() {
            return Err(crate::TaskdeskError::InvalidInput(
                "answer needs a body or an attachment".into(),
            ));
        }
        Ok(())
    }
}

/// Manager feedback on a single answer. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerComment {
    pub id: i64,
    pub answer_id: i64,
    pub manager_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub text: String,
}

impl CreateComment {
    pub fn validate(&self) -> Result<(), crate::TaskdeskError> {
        if self.text.trim().is_empty() {
            return Err(crate::TaskdeskError::InvalidInput(
                "comment text must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_needs_body_or_attachment() {
        let empty = CreateAnswer {
            body: "  ".into(),
            attachment: None,
        };
        assert!(empty.validate().is_err());

        let with_file = CreateAnswer {
            body: String::new(),
            attachment: Some("report.pdf".into()),
        };
        assert!(with_file.validate().is_ok());
    }

    #[test]
    fn comment_needs_text() {
        assert!(CreateComment { text: "\n".into() }.validate().is_err());
        assert!(CreateComment { text: "ok".into() }.validate().is_ok());
    }
}
