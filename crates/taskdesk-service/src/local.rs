use taskdesk_core::access;
use taskdesk_core::answer::{AnswerComment, CreateAnswer, CreateComment, TaskAnswer};
use taskdesk_core::search::{SearchHit, SearchQuery};
use taskdesk_core::tag::{CreateTag, Tag};
use taskdesk_core::task::{CreateTask, Task, TaskFilter, UpdateTask};
use taskdesk_core::user::{CreateUser, User};
use taskdesk_core::TaskdeskError;
use taskdesk_db::{Db, DbError};

use crate::{ServiceError, SubordinateTaskReport, TrackerService};

/// Local implementation backed by direct SQLite access.
pub struct LocalService {
    db: Db,
}

impl LocalService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Assignees may only be drawn from the creator's direct subordinates.
    fn check_assignees(&self, creator_id: i64, assignee_ids: &[i64]) -> Result<(), ServiceError> {
        for assignee_id in assignee_ids {
            if !self.db.is_subordinate(creator_id, *assignee_id)? {
                return Err(ServiceError::InvalidInput(format!(
                    "assignee {assignee_id} is not a subordinate of the creator"
                )));
            }
        }
        Ok(())
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            DbError::Conflict(msg) => ServiceError::InvalidInput(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<TaskdeskError> for ServiceError {
    fn from(e: TaskdeskError) -> Self {
        match e {
            TaskdeskError::NotFound(msg) => ServiceError::NotFound(msg),
            TaskdeskError::InvalidInput(msg) => ServiceError::InvalidInput(msg),
            TaskdeskError::Denied(msg) => ServiceError::Denied(msg),
        }
    }
}

impl TrackerService for LocalService {
    fn create_user(&self, input: &CreateUser) -> Result<User, ServiceError> {
        input.validate()?;
        Ok(self.db.create_user(input)?)
    }

    fn get_user(&self, id: i64) -> Result<User, ServiceError> {
        Ok(self.db.get_user(id)?)
    }

    fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.db.list_users()?)
    }

    fn add_subordinate(
        &self,
        superior_id: i64,
        subordinate_id: i64,
    ) -> Result<(), ServiceError> {
        Ok(self.db.add_subordinate(superior_id, subordinate_id)?)
    }

    fn remove_subordinate(
        &self,
        superior_id: i64,
        subordinate_id: i64,
    ) -> Result<(), ServiceError> {
        Ok(self.db.remove_subordinate(superior_id, subordinate_id)?)
    }

    fn list_subordinates(&self, superior_id: i64) -> Result<Vec<User>, ServiceError> {
        Ok(self.db.list_subordinates(superior_id)?)
    }

    fn create_tag(&self, input: &CreateTag) -> Result<Tag, ServiceError> {
        input.validate()?;
        Ok(self.db.create_tag(input)?)
    }

    fn get_tag(&self, id: i64) -> Result<Tag, ServiceError> {
        Ok(self.db.get_tag(id)?)
    }

    fn list_tags(&self) -> Result<Vec<Tag>, ServiceError> {
        Ok(self.db.list_tags()?)
    }

    fn create_task(&self, creator_id: i64, input: &CreateTask) -> Result<Task, ServiceError> {
        input.validate()?;
        self.check_assignees(creator_id, &input.assignee_ids)?;
        Ok(self.db.create_task(creator_id, input)?)
    }

    fn get_task(&self, id: i64) -> Result<Task, ServiceError> {
        Ok(self.db.get_task(id)?)
    }

    fn update_task(
        &self,
        user_id: i64,
        id: i64,
        update: &UpdateTask,
    ) -> Result<Task, ServiceError> {
        update.validate()?;
        let task = self.db.get_task(id)?;
        if !access::can_edit(user_id, &task) {
            return Err(ServiceError::Denied(
                "only the creator may edit this task".into(),
            ));
        }
        if let Some(ref assignee_ids) = update.assignee_ids {
            self.check_assignees(task.creator_id, assignee_ids)?;
        }
        Ok(self.db.update_task(id, update)?)
    }

    fn delete_task(&self, user_id: i64, id: i64) -> Result<(), ServiceError> {
        let task = self.db.get_task(id)?;
        if !access::can_delete(user_id, &task) {
            return Err(ServiceError::Denied(
                "only the creator may delete this task".into(),
            ));
        }
        Ok(self.db.delete_task(id)?)
    }

    fn list_visible(
        &self,
        user_id: i64,
        filter: &TaskFilter,
        query: Option<&str>,
    ) -> Result<Vec<Task>, ServiceError> {
        let base_ids = match query.map(SearchQuery::parse) {
            None | Some(SearchQuery::All) => None,
            Some(resolved) => {
                let hits = self.db.search_tasks(&resolved)?;
                Some(hits.into_iter().map(|h| h.task.id).collect::<Vec<_>>())
            }
        };
        Ok(self.db.list_visible(user_id, filter, base_ids.as_deref())?)
    }

    fn search(&self, query: &str) -> Result<Vec<SearchHit>, ServiceError> {
        Ok(self.db.search_tasks(&SearchQuery::parse(query))?)
    }

    fn add_answer(
        &self,
        user_id: i64,
        task_id: i64,
        input: &CreateAnswer,
    ) -> Result<TaskAnswer, ServiceError> {
        input.validate()?;
        let task = self.db.get_task(task_id)?;
        if !access::can_answer(user_id, &task) {
            return Err(ServiceError::Denied(
                "only the creator or an assignee may answer this task".into(),
            ));
        }
        Ok(self.db.create_answer(task_id, user_id, input)?)
    }

    fn list_answers(&self, task_id: i64) -> Result<Vec<TaskAnswer>, ServiceError> {
        self.db.get_task(task_id)?;
        Ok(self.db.list_answers(task_id)?)
    }

    fn add_comment(
        &self,
        manager_id: i64,
        answer_id: i64,
        input: &CreateComment,
    ) -> Result<AnswerComment, ServiceError> {
        input.validate()?;
        let answer = self.db.get_answer(answer_id)?;
        let subordinate_ids: Vec<i64> = self
            .db
            .list_subordinates(manager_id)?
            .into_iter()
            .map(|u| u.id)
            .collect();
        if !access::can_comment(&subordinate_ids, answer.user_id) {
            return Err(ServiceError::Denied(
                "only a direct manager of the answer's author may comment".into(),
            ));
        }
        Ok(self.db.create_comment(answer_id, manager_id, input)?)
    }

    fn list_comments(&self, answer_id: i64) -> Result<Vec<AnswerComment>, ServiceError> {
        self.db.get_answer(answer_id)?;
        Ok(self.db.list_comments(answer_id)?)
    }

    fn subordinate_tasks(
        &self,
        manager_id: i64,
        subordinate_id: i64,
    ) -> Result<Vec<SubordinateTaskReport>, ServiceError> {
        let subordinate = self.db.get_user(subordinate_id)?;
        if !self.db.is_subordinate(manager_id, subordinate.id)? {
            return Err(ServiceError::Denied(
                "the report is only available to the user's direct manager".into(),
            ));
        }
        let tasks = self.db.list_assigned(subordinate.id)?;
        let mut report = Vec::with_capacity(tasks.len());
        for task in tasks {
            let answer = self.db.first_answer_for(task.id, subordinate.id)?;
            report.push(SubordinateTaskReport { task, answer });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use taskdesk_core::answer::{CreateAnswer, CreateComment};
    use taskdesk_core::task::{CreateTask, TaskFilter, UpdateTask};
    use taskdesk_core::user::CreateUser;
    use taskdesk_db::Db;

    use super::*;

    fn service() -> LocalService {
        LocalService::new(Db::open_in_memory().unwrap())
    }

    fn user(svc: &LocalService, name: &str) -> i64 {
        svc.create_user(&CreateUser {
            username: name.into(),
            full_name: String::new(),
        })
        .unwrap()
        .id
    }

    fn plain_task(svc: &LocalService, creator: i64, title: &str) -> Task {
        svc.create_task(
            creator,
            &CreateTask {
                title: title.into(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn non_creator_cannot_edit_or_delete() {
        let svc = service();
        let a = user(&svc, "a");
        let b = user(&svc, "b");
        let task = plain_task(&svc, a, "Fix bug");

        let edit = svc.update_task(
            b,
            task.id,
            &UpdateTask {
                title: Some("Hijacked".into()),
                ..Default::default()
            },
        );
        assert!(matches!(edit, Err(ServiceError::Denied(_))));
        assert!(matches!(
            svc.delete_task(b, task.id),
            Err(ServiceError::Denied(_))
        ));

        // And the unassigned non-creator does not even see it.
        let visible = svc.list_visible(b, &TaskFilter::default(), None).unwrap();
        assert!(visible.is_empty());
    }

    #[test]
    fn assignees_must_be_subordinates_of_the_creator() {
        let svc = service();
        let boss = user(&svc, "boss");
        let dev = user(&svc, "dev");
        let outsider = user(&svc, "outsider");
        svc.add_subordinate(boss, dev).unwrap();

        let ok = svc.create_task(
            boss,
            &CreateTask {
                title: "Assigned".into(),
                assignee_ids: vec![dev],
                ..Default::default()
            },
        );
        assert!(ok.is_ok());

        let bad = svc.create_task(
            boss,
            &CreateTask {
                title: "Bad".into(),
                assignee_ids: vec![outsider],
                ..Default::default()
            },
        );
        assert!(matches!(bad, Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn answer_rights_and_comment_rights() {
        let svc = service();
        let manager = user(&svc, "manager");
        let dev = user(&svc, "dev");
        let stranger = user(&svc, "stranger");
        svc.add_subordinate(manager, dev).unwrap();

        let task = svc
            .create_task(
                manager,
                &CreateTask {
                    title: "Report".into(),
                    assignee_ids: vec![dev],
                    ..Default::default()
                },
            )
            .unwrap();

        // Stranger may not answer.
        let denied = svc.add_answer(
            stranger,
            task.id,
            &CreateAnswer {
                body: "mine now".into(),
                attachment: None,
            },
        );
        assert!(matches!(denied, Err(ServiceError::Denied(_))));

        // Assignee answers; the manager comments; the stranger cannot.
        let answer = svc
            .add_answer(
                dev,
                task.id,
                &CreateAnswer {
                    body: "done".into(),
                    attachment: None,
                },
            )
            .unwrap();
        assert!(svc
            .add_comment(manager, answer.id, &CreateComment { text: "good".into() })
            .is_ok());
        let no_comment =
            svc.add_comment(stranger, answer.id, &CreateComment { text: "no".into() });
        assert!(matches!(no_comment, Err(ServiceError::Denied(_))));
    }

    #[test]
    fn comment_rights_are_not_transitive() {
        let svc = service();
        let top = user(&svc, "top");
        let mid = user(&svc, "mid");
        let leaf = user(&svc, "leaf");
        svc.add_subordinate(top, mid).unwrap();
        svc.add_subordinate(mid, leaf).unwrap();

        let task = svc
            .create_task(
                mid,
                &CreateTask {
                    title: "Leaf work".into(),
                    assignee_ids: vec![leaf],
                    ..Default::default()
                },
            )
            .unwrap();
        let answer = svc
            .add_answer(
                leaf,
                task.id,
                &CreateAnswer {
                    body: "done".into(),
                    attachment: None,
                },
            )
            .unwrap();

        // top supervises mid, not leaf: only the direct edge counts.
        let denied = svc.add_comment(top, answer.id, &CreateComment { text: "hi".into() });
        assert!(matches!(denied, Err(ServiceError::Denied(_))));
    }

    #[test]
    fn id_query_restricted_by_visibility() {
        let svc = service();
        let a = user(&svc, "a");
        let b = user(&svc, "b");
        let task = plain_task(&svc, a, "Secret");

        // Existing id, but invisible to b: empty list, not an error.
        let listed = svc
            .list_visible(b, &TaskFilter::default(), Some(&task.id.to_string()))
            .unwrap();
        assert!(listed.is_empty());

        // Missing id: NotFound.
        let missing = svc.list_visible(a, &TaskFilter::default(), Some("99999"));
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));

        // Visible id: singleton.
        let mine = svc
            .list_visible(a, &TaskFilter::default(), Some(&task.id.to_string()))
            .unwrap();
        assert_eq!(mine.len(), 1);
    }

    #[test]
    fn text_query_composes_with_visibility() {
        let svc = service();
        let a = user(&svc, "a");
        let b = user(&svc, "b");
        plain_task(&svc, a, "urgent fix for login");
        plain_task(&svc, b, "urgent: other team's work");

        let visible = svc
            .list_visible(a, &TaskFilter::default(), Some("urgent"))
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].creator_id, a);
    }

    #[test]
    fn subordinate_report_pairs_tasks_with_answers() {
        let svc = service();
        let manager = user(&svc, "manager");
        let dev = user(&svc, "dev");
        let stranger = user(&svc, "stranger");
        svc.add_subordinate(manager, dev).unwrap();

        let answered = svc
            .create_task(
                manager,
                &CreateTask {
                    title: "Answered".into(),
                    assignee_ids: vec![dev],
                    ..Default::default()
                },
            )
            .unwrap();
        svc.create_task(
            manager,
            &CreateTask {
                title: "Pending".into(),
                assignee_ids: vec![dev],
                ..Default::default()
            },
        )
        .unwrap();
        svc.add_answer(
            dev,
            answered.id,
            &CreateAnswer {
                body: "here".into(),
                attachment: None,
            },
        )
        .unwrap();

        let report = svc.subordinate_tasks(manager, dev).unwrap();
        assert_eq!(report.len(), 2);
        let with_answer = report
            .iter()
            .find(|r| r.task.id == answered.id)
            .unwrap();
        assert!(with_answer.answer.is_some());
        assert_eq!(
            report.iter().filter(|r| r.answer.is_none()).count(),
            1
        );

        let denied = svc.subordinate_tasks(stranger, dev);
        assert!(matches!(denied, Err(ServiceError::Denied(_))));
    }

    #[test]
    fn search_keeps_rank_order_while_list_sorts_by_due_date() {
        use chrono::NaiveDate;

        let svc = service();
        let a = user(&svc, "a");
        let weak = svc
            .create_task(
                a,
                &CreateTask {
                    title: "deploy notes".into(),
                    description: "misc".into(),
                    due_date: NaiveDate::from_ymd_opt(2026, 9, 1),
                    ..Default::default()
                },
            )
            .unwrap();
        let strong = svc
            .create_task(
                a,
                &CreateTask {
                    title: "deploy deploy deploy".into(),
                    due_date: NaiveDate::from_ymd_opt(2026, 9, 2),
                    ..Default::default()
                },
            )
            .unwrap();

        let hits = svc.search("deploy").unwrap();
        assert_eq!(hits[0].task.id, strong.id);

        // The combined listing re-sorts by due date.
        let listed = svc
            .list_visible(a, &TaskFilter::default(), Some("deploy"))
            .unwrap();
        let ids: Vec<i64> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![weak.id, strong.id]);
    }
}
