use chrono::Utc;
use rusqlite::{params, Row};

use taskdesk_core::answer::{AnswerComment, CreateComment};

use crate::{Db, DbError};

fn row_to_comment(row: &Row) -> rusqlite::Result<AnswerComment> {
    Ok(AnswerComment {
        id: row.get("id")?,
        answer_id: row.get("answer_id")?,
        manager_id: row.get("manager_id")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
    })
}

impl Db {
    /// Append manager feedback to an answer. The supervision check lives
    /// in the service layer; the store only requires that the answer
    /// exists.
    pub fn create_comment(
        &self,
        answer_id: i64,
        manager_id: i64,
        input: &CreateComment,
    ) -> Result<AnswerComment, DbError> {
        self.get_answer(answer_id)?;
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO answer_comments (answer_id, manager_id, text, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![answer_id, manager_id, input.text, now],
            )?;
            let id = conn.last_insert_rowid();
            Ok(conn.query_row(
                "SELECT * FROM answer_comments WHERE id = ?1",
                params![id],
                row_to_comment,
            )?)
        })
    }

    pub fn list_comments(&self, answer_id: i64) -> Result<Vec<AnswerComment>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM answer_comments WHERE answer_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let comments = stmt
                .query_map(params![answer_id], row_to_comment)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(comments)
        })
    }
}
