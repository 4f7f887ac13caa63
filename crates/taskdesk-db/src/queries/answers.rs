use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use taskdesk_core::answer::{CreateAnswer, TaskAnswer};

use crate::{Db, DbError};

pub(crate) fn row_to_answer(row: &Row) -> rusqlite::Result<TaskAnswer> {
    Ok(TaskAnswer {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        user_id: row.get("user_id")?,
        body: row.get("body")?,
        attachment: row.get("attachment")?,
        created_at: row.get("created_at")?,
    })
}

impl Db {
    /// Append an answer. Answers are never updated or deleted.
    pub fn create_answer(
        &self,
        task_id: i64,
        user_id: i64,
        input: &CreateAnswer,
    ) -> Result<TaskAnswer, DbError> {
        self.get_task(task_id)?;
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO task_answers (task_id, user_id, body, attachment, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![task_id, user_id, input.body, input.attachment, now],
            )?;
            let id = conn.last_insert_rowid();
            Ok(conn.query_row(
                "SELECT * FROM task_answers WHERE id = ?1",
                params![id],
                row_to_answer,
            )?)
        })
    }

    pub fn get_answer(&self, id: i64) -> Result<TaskAnswer, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM task_answers WHERE id = ?1",
                params![id],
                row_to_answer,
            )
            .optional()?
            .ok_or_else(|| DbError::NotFound(format!("answer {id}")))
        })
    }

    pub fn list_answers(&self, task_id: i64) -> Result<Vec<TaskAnswer>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM task_answers WHERE task_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let answers = stmt
                .query_map(params![task_id], row_to_answer)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(answers)
        })
    }

    /// The earliest answer a given user submitted for a task, if any.
    pub fn first_answer_for(
        &self,
        task_id: i64,
        user_id: i64,
    ) -> Result<Option<TaskAnswer>, DbError> {
        self.with_conn(|conn| {
            let answer = conn
                .query_row(
                    "SELECT * FROM task_answers
                     WHERE task_id = ?1 AND user_id = ?2
                     ORDER BY created_at ASC, id ASC
                     LIMIT 1",
                    params![task_id, user_id],
                    row_to_answer,
                )
                .optional()?;
            Ok(answer)
        })
    }
}

#[cfg(test)]
mod tests {
    use taskdesk_core::answer::CreateAnswer;
    use taskdesk_core::task::CreateTask;
    use taskdesk_core::user::CreateUser;

    use crate::{Db, DbError};

    fn setup() -> (Db, i64, i64) {
        let db = Db::open_in_memory().unwrap();
        let creator = db
            .create_user(&CreateUser {
                username: "boss".into(),
                full_name: String::new(),
            })
            .unwrap()
            .id;
        let task = db
            .create_task(
                creator,
                &CreateTask {
                    title: "Write report".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        (db, creator, task.id)
    }

    #[test]
    fn answers_are_append_only_and_ordered() {
        let (db, user, task_id) = setup();

        let first = db
            .create_answer(
                task_id,
                user,
                &CreateAnswer {
                    body: "draft".into(),
                    attachment: None,
                },
            )
            .unwrap();
        let second = db
            .create_answer(
                task_id,
                user,
                &CreateAnswer {
                    body: "final".into(),
                    attachment: Some("report.pdf".into()),
                },
            )
            .unwrap();

        let answers = db.list_answers(task_id).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].id, first.id);
        assert_eq!(answers[1].attachment.as_deref(), Some("report.pdf"));

        let earliest = db.first_answer_for(task_id, user).unwrap().unwrap();
        assert_eq!(earliest.id, first.id);
        assert!(db.first_answer_for(task_id, user + 1).unwrap().is_none());
    }

    #[test]
    fn answer_requires_existing_task() {
        let (db, user, _) = setup();
        let err = db
            .create_answer(
                999,
                user,
                &CreateAnswer {
                    body: "x".into(),
                    attachment: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}
