use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
}

impl CreateUser {
    pub fn validate(&self) -> Result<(), crate::TaskdeskError> {
        if self.username.trim().is_empty() {
            return Err(crate::TaskdeskError::InvalidInput(
                "username must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Bearer credential bound to one user. Only the SHA-256 hash of the raw
/// token is ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}
