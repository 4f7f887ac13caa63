use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use taskdesk_core::user::{CreateUser, User};

use crate::{constraint_to_conflict, Db, DbError};

pub(crate) fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        full_name: row.get("full_name")?,
        created_at: row.get("created_at")?,
    })
}

impl Db {
    pub fn create_user(&self, input: &CreateUser) -> Result<User, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO users (username, full_name, created_at) VALUES (?1, ?2, ?3)",
                params![input.username, input.full_name, now],
            )
            .map_err(|e| {
                constraint_to_conflict(e, &format!("username {} taken", input.username))
            })?;
            let id = conn.last_insert_rowid();
            Ok(conn.query_row(
                "SELECT * FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )?)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<User, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user)
                .optional()?
                .ok_or_else(|| DbError::NotFound(format!("user {id}")))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<User, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()?
            .ok_or_else(|| DbError::NotFound(format!("user {username}")))
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users ORDER BY username ASC")?;
            let users = stmt
                .query_map([], row_to_user)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }

    /// Record a direct supervision edge. Idempotent for an existing edge.
    /// Cycles between distinct users are allowed; a self-edge is not.
    pub fn add_subordinate(&self, superior_id: i64, subordinate_id: i64) -> Result<(), DbError> {
        if superior_id == subordinate_id {
            return Err(DbError::Conflict(
                "a user cannot supervise themself".into(),
            ));
        }
        // Both endpoints must exist; FK errors would otherwise surface as
        // opaque constraint failures.
        self.get_user(superior_id)?;
        self.get_user(subordinate_id)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_subordinates (superior_id, subordinate_id)
                 VALUES (?1, ?2)",
                params![superior_id, subordinate_id],
            )?;
            Ok(())
        })
    }

    pub fn remove_subordinate(
        &self,
        superior_id: i64,
        subordinate_id: i64,
    ) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM user_subordinates
                 WHERE superior_id = ?1 AND subordinate_id = ?2",
                params![superior_id, subordinate_id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!(
                    "subordinate edge {superior_id} -> {subordinate_id}"
                )));
            }
            Ok(())
        })
    }

    pub fn list_subordinates(&self, superior_id: i64) -> Result<Vec<User>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.* FROM users u
                 JOIN user_subordinates s ON s.subordinate_id = u.id
                 WHERE s.superior_id = ?1
                 ORDER BY u.username ASC",
            )?;
            let users = stmt
                .query_map(params![superior_id], row_to_user)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }

    pub fn is_subordinate(&self, superior_id: i64, user_id: i64) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM user_subordinates
                     WHERE superior_id = ?1 AND subordinate_id = ?2",
                    params![superior_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}
