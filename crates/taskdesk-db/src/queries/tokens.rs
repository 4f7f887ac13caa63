use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use taskdesk_core::user::{ApiToken, User};

use crate::{Db, DbError};

use super::users::row_to_user;

fn row_to_token(row: &Row) -> rusqlite::Result<ApiToken> {
    Ok(ApiToken {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
        last_used_at: row.get("last_used_at")?,
    })
}

impl Db {
    pub fn insert_token(&self, user_id: i64, token_hash: &str) -> Result<ApiToken, DbError> {
        self.get_user(user_id)?;
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO api_tokens (user_id, token_hash, created_at) VALUES (?1, ?2, ?3)",
                params![user_id, token_hash, now],
            )?;
            let id = conn.last_insert_rowid();
            Ok(conn.query_row(
                "SELECT * FROM api_tokens WHERE id = ?1",
                params![id],
                row_to_token,
            )?)
        })
    }

    /// Resolve a hashed bearer token to its owner.
    pub fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, DbError> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT u.* FROM users u
                     JOIN api_tokens t ON t.user_id = u.id
                     WHERE t.token_hash = ?1",
                    params![token_hash],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn touch_token(&self, token_hash: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE api_tokens SET last_used_at = ?1 WHERE token_hash = ?2",
                params![Utc::now(), token_hash],
            )?;
            Ok(())
        })
    }

    pub fn list_tokens(&self) -> Result<Vec<ApiToken>, DbError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM api_tokens ORDER BY created_at ASC")?;
            let tokens = stmt
                .query_map([], row_to_token)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tokens)
        })
    }

    pub fn delete_token(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM api_tokens WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("token {id}")));
            }
            Ok(())
        })
    }
}
