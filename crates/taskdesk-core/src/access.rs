//! Per-action authorization predicates.
//!
//! Each is a pure function over ids already loaded from the store. A false
//! result is a normal authorization outcome for the request, not a fault.

use crate::task::Task;

/// Only the creator may edit a task.
pub fn can_edit(user_id: i64, task: &Task) -> bool {
    task.creator_id == user_id
}

/// Deletion rights are identical to edit rights.
pub fn can_delete(user_id: i64, task: &Task) -> bool {
    can_edit(user_id, task)
}

/// The creator or any assignee may submit an answer.
pub fn can_answer(user_id: i64, task: &Task) -> bool {
    task.creator_id == user_id || task.assignee_ids.contains(&user_id)
}

/// A manager may comment on an answer iff the answer's author is a direct
/// subordinate. The relation is not transitive.
pub fn can_comment(manager_subordinate_ids: &[i64], answer_author_id: i64) -> bool {
    manager_subordinate_ids.contains(&answer_author_id)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::task::{Priority, Status, Task};

    fn task(creator_id: i64, assignee_ids: Vec<i64>) -> Task {
        Task {
            id: 1,
            title: "Fix bug".into(),
            description: String::new(),
            status: Status::New,
            priority: Priority::Low,
            due_date: None,
            creator_id,
            assignee_ids,
            tag_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_creator_edits_and_deletes() {
        let t = task(7, vec![8]);
        assert!(can_edit(7, &t));
        assert!(can_delete(7, &t));
        // Assignees do not gain edit rights.
        assert!(!can_edit(8, &t));
        assert!(!can_delete(8, &t));
    }

    #[test]
    fn creator_and_assignees_answer() {
        let t = task(7, vec![8, 9]);
        assert!(can_answer(7, &t));
        assert!(can_answer(9, &t));
        assert!(!can_answer(10, &t));
    }

    #[test]
    fn commenting_requires_direct_edge() {
        // M supervises S directly.
        assert!(can_comment(&[3, 5], 5));
        // X does not supervise S at all.
        assert!(!can_comment(&[], 5));
        // Transitive supervision does not count: the caller passes only
        // direct subordinates.
        assert!(!can_comment(&[3], 5));
    }
}
