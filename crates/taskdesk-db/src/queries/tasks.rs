use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use taskdesk_core::task::{CreateTask, Priority, Status, Task, TaskFilter, UpdateTask};

use crate::{constraint_to_conflict, Db, DbError};

pub(crate) fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status_code: i64 = row.get("status")?;
    let priority_code: i64 = row.get("priority")?;
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: Status::from_code(status_code).unwrap_or_default(),
        priority: Priority::from_code(priority_code).unwrap_or_default(),
        due_date: row.get("due_date")?,
        creator_id: row.get("creator_id")?,
        assignee_ids: Vec::new(),
        tag_ids: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Fill in the many-to-many sides of a task row.
pub(crate) fn attach_links(conn: &Connection, task: &mut Task) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM task_assignees WHERE task_id = ?1 ORDER BY user_id ASC",
    )?;
    task.assignee_ids = stmt
        .query_map(params![task.id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;

    let mut stmt =
        conn.prepare("SELECT tag_id FROM task_tags WHERE task_id = ?1 ORDER BY tag_id ASC")?;
    task.tag_ids = stmt
        .query_map(params![task.id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(())
}

fn replace_assignees(conn: &Connection, task_id: i64, ids: &[i64]) -> Result<(), DbError> {
    conn.execute("DELETE FROM task_assignees WHERE task_id = ?1", params![task_id])?;
    for user_id in ids {
        conn.execute(
            "INSERT OR IGNORE INTO task_assignees (task_id, user_id) VALUES (?1, ?2)",
            params![task_id, user_id],
        )
        .map_err(|e| constraint_to_conflict(e, &format!("unknown assignee {user_id}")))?;
    }
    Ok(())
}

fn replace_tags(conn: &Connection, task_id: i64, ids: &[i64]) -> Result<(), DbError> {
    conn.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;
    for tag_id in ids {
        conn.execute(
            "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
            params![task_id, tag_id],
        )
        .map_err(|e| constraint_to_conflict(e, &format!("unknown tag {tag_id}")))?;
    }
    Ok(())
}

impl Db {
    pub fn create_task(&self, creator_id: i64, input: &CreateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO tasks (title, description, status, priority, due_date,
                                    creator_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    input.title,
                    input.description,
                    input.status.code(),
                    input.priority.code(),
                    input.due_date,
                    creator_id,
                    now,
                ],
            )
            .map_err(|e| constraint_to_conflict(e, &format!("unknown creator {creator_id}")))?;
            let id = conn.last_insert_rowid();

            replace_assignees(conn, id, &input.assignee_ids)?;
            replace_tags(conn, id, &input.tag_ids)?;

            let mut task =
                conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)?;
            attach_links(conn, &mut task)?;
            Ok(task)
        })
    }

    pub fn get_task(&self, id: i64) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let mut task = conn
                .query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .optional()?
                .ok_or_else(|| DbError::NotFound(format!("task {id}")))?;
            attach_links(conn, &mut task)?;
            Ok(task)
        })
    }

    /// Partial update. The creator column is never touched: the creator is
    /// immutable for the life of the task.
    pub fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let mut sets = vec!["updated_at = ?1".to_string()];
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now)];

            if let Some(ref title) = update.title {
                param_values.push(Box::new(title.clone()));
                sets.push(format!("title = ?{}", param_values.len()));
            }
            if let Some(ref description) = update.description {
                param_values.push(Box::new(description.clone()));
                sets.push(format!("description = ?{}", param_values.len()));
            }
            if let Some(status) = update.status {
                param_values.push(Box::new(status.code()));
                sets.push(format!("status = ?{}", param_values.len()));
            }
            if let Some(priority) = update.priority {
                param_values.push(Box::new(priority.code()));
                sets.push(format!("priority = ?{}", param_values.len()));
            }
            if let Some(ref due_date) = update.due_date {
                param_values.push(Box::new(*due_date));
                sets.push(format!("due_date = ?{}", param_values.len()));
            }

            param_values.push(Box::new(id));
            let sql = format!(
                "UPDATE tasks SET {} WHERE id = ?{}",
                sets.join(", "),
                param_values.len()
            );
            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();

            let changed = conn.execute(&sql, params_ref.as_slice())?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }

            if let Some(ref assignee_ids) = update.assignee_ids {
                replace_assignees(conn, id, assignee_ids)?;
            }
            if let Some(ref tag_ids) = update.tag_ids {
                replace_tags(conn, id, tag_ids)?;
            }

            let mut task =
                conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)?;
            attach_links(conn, &mut task)?;
            Ok(task)
        })
    }

    pub fn delete_task(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }
            Ok(())
        })
    }

    /// The visibility and filter composer.
    ///
    /// Starts from `base_ids` (a search result) when given, otherwise from
    /// all tasks; restricts to tasks the user created or is assigned to;
    /// then ANDs the optional filters, with OR semantics inside the
    /// multi-valued ones. Final order is due date ascending with nulls
    /// last, id as the stable tiebreak.
    pub fn list_visible(
        &self,
        user_id: i64,
        filter: &TaskFilter,
        base_ids: Option<&[i64]>,
    ) -> Result<Vec<Task>, DbError> {
        if let Some(ids) = base_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
        }
        self.with_conn(|conn| {
            let mut sql = String::from(
                "SELECT DISTINCT t.* FROM tasks t
                 LEFT JOIN task_assignees ta ON ta.task_id = t.id
                 WHERE (t.creator_id = ?1 OR ta.user_id = ?1)",
            );
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> =
                vec![Box::new(user_id)];

            if let Some(ids) = base_ids {
                let placeholders = push_id_list(&mut param_values, ids);
                sql.push_str(&format!(" AND t.id IN ({placeholders})"));
            }
            if !filter.tag_ids.is_empty() {
                let placeholders = push_id_list(&mut param_values, &filter.tag_ids);
                sql.push_str(&format!(
                    " AND t.id IN (SELECT task_id FROM task_tags WHERE tag_id IN ({placeholders}))"
                ));
            }
            if let Some(status) = filter.status {
                param_values.push(Box::new(status.code()));
                sql.push_str(&format!(" AND t.status = ?{}", param_values.len()));
            }
            if let Some(priority) = filter.priority {
                param_values.push(Box::new(priority.code()));
                sql.push_str(&format!(" AND t.priority = ?{}", param_values.len()));
            }
            if !filter.assignee_ids.is_empty() {
                let placeholders = push_id_list(&mut param_values, &filter.assignee_ids);
                sql.push_str(&format!(
                    " AND t.id IN (SELECT task_id FROM task_assignees WHERE user_id IN ({placeholders}))"
                ));
            }

            sql.push_str(" ORDER BY t.due_date IS NULL, t.due_date ASC, t.id ASC");

            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let mut tasks = stmt
                .query_map(params_ref.as_slice(), row_to_task)?
                .collect::<Result<Vec<_>, _>>()?;
            for task in &mut tasks {
                attach_links(conn, task)?;
            }
            Ok(tasks)
        })
    }

    /// All tasks assigned to a user, newest first. Feeds the subordinate
    /// report.
    pub fn list_assigned(&self, user_id: i64) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.* FROM tasks t
                 JOIN task_assignees ta ON ta.task_id = t.id
                 WHERE ta.user_id = ?1
                 ORDER BY t.created_at DESC, t.id DESC",
            )?;
            let mut tasks = stmt
                .query_map(params![user_id], row_to_task)?
                .collect::<Result<Vec<_>, _>>()?;
            for task in &mut tasks {
                attach_links(conn, task)?;
            }
            Ok(tasks)
        })
    }
}

/// Append ids to the parameter list, returning the matching `?N` list for
/// an IN clause.
fn push_id_list(
    param_values: &mut Vec<Box<dyn rusqlite::types::ToSql>>,
    ids: &[i64],
) -> String {
    let mut placeholders = Vec::with_capacity(ids.len());
    for id in ids {
        param_values.push(Box::new(*id));
        placeholders.push(format!("?{}", param_values.len()));
    }
    placeholders.join(", ")
}
