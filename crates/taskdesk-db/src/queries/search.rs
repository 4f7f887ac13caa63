use rusqlite::params;

use taskdesk_core::search::{SearchHit, SearchQuery, HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN};

use crate::{Db, DbError};

use super::tasks::{attach_links, row_to_task};

impl Db {
    /// Execute a resolved search query.
    ///
    /// `All` returns every task unranked (a blank query is a no-op, not an
    /// error). `IdLookup` bypasses ranking and fails with NotFound for a
    /// missing id. `Text` runs an FTS5 match over title and description:
    /// rank is the negated bm25 score, non-matches never surface, and hits
    /// come back in descending rank order with highlighted excerpts.
    pub fn search_tasks(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, DbError> {
        match query {
            SearchQuery::All => {
                let tasks = self.with_conn(|conn| {
                    let mut stmt = conn.prepare("SELECT * FROM tasks ORDER BY id ASC")?;
                    let mut tasks = stmt
                        .query_map([], row_to_task)?
                        .collect::<Result<Vec<_>, _>>()?;
                    for task in &mut tasks {
                        attach_links(conn, task)?;
                    }
                    Ok(tasks)
                })?;
                Ok(tasks.into_iter().map(SearchHit::unranked).collect())
            }
            SearchQuery::IdLookup(id) => {
                let task = self.get_task(*id)?;
                Ok(vec![SearchHit::unranked(task)])
            }
            SearchQuery::Text(expr) => self.with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT t.*,
                            -bm25(tasks_fts) AS rank,
                            highlight(tasks_fts, 0, ?2, ?3) AS title_excerpt,
                            highlight(tasks_fts, 1, ?2, ?3) AS body_excerpt
                     FROM tasks_fts
                     JOIN tasks t ON t.id = tasks_fts.rowid
                     WHERE tasks_fts MATCH ?1 AND bm25(tasks_fts) < 0
                     ORDER BY bm25(tasks_fts) ASC, t.id ASC",
                )?;
                let mut hits = stmt
                    .query_map(params![expr, HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE], |row| {
                        let task = row_to_task(row)?;
                        Ok(SearchHit {
                            task,
                            rank: row.get("rank")?,
                            title_excerpt: row.get("title_excerpt")?,
                            body_excerpt: row.get("body_excerpt")?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                for hit in &mut hits {
                    attach_links(conn, &mut hit.task)?;
                }
                Ok(hits)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use taskdesk_core::search::{SearchQuery, HIGHLIGHT_OPEN};
    use taskdesk_core::task::CreateTask;
    use taskdesk_core::user::CreateUser;

    use crate::{Db, DbError};

    fn seed(db: &Db) -> i64 {
        db.create_user(&CreateUser {
            username: "a".into(),
            full_name: String::new(),
        })
        .unwrap()
        .id
    }

    fn add_task(db: &Db, creator: i64, title: &str, description: &str) -> i64 {
        db.create_task(
            creator,
            &CreateTask {
                title: title.into(),
                description: description.into(),
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn id_lookup_ignores_content() {
        let db = Db::open_in_memory().unwrap();
        let a = seed(&db);
        let id = add_task(&db, a, "Nothing relevant here", "");

        let hits = db
            .search_tasks(&SearchQuery::parse(&id.to_string()))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task.id, id);
        assert_eq!(hits[0].rank, 0.0);
    }

    #[test]
    fn id_lookup_missing_is_not_found() {
        let db = Db::open_in_memory().unwrap();
        seed(&db);
        let err = db.search_tasks(&SearchQuery::IdLookup(404)).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn text_search_ranks_and_excludes_non_matches() {
        let db = Db::open_in_memory().unwrap();
        let a = seed(&db);
        // "urgent" twice: should outrank the single mention.
        let strong = add_task(&db, a, "Urgent: urgent deploy fix", "");
        let weak = add_task(&db, a, "Plan the sprint", "one urgent item pending");
        add_task(&db, a, "Unrelated chore", "nothing to see");

        let hits = db.search_tasks(&SearchQuery::parse("urgent")).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].task.id, strong);
        assert_eq!(hits[1].task.id, weak);
        assert!(hits[0].rank > hits[1].rank);
        assert!(hits.iter().all(|h| h.rank > 0.0));
    }

    #[test]
    fn text_search_highlights_matched_terms() {
        let db = Db::open_in_memory().unwrap();
        let a = seed(&db);
        add_task(&db, a, "Deploy hotfix", "deploy to staging first");

        let hits = db.search_tasks(&SearchQuery::parse("deploy")).unwrap();
        assert_eq!(hits.len(), 1);
        let title = hits[0].title_excerpt.as_deref().unwrap();
        let body = hits[0].body_excerpt.as_deref().unwrap();
        assert!(title.contains(&format!("{HIGHLIGHT_OPEN}Deploy")));
        assert!(body.contains(&format!("{HIGHLIGHT_OPEN}deploy")));
    }

    #[test]
    fn multi_term_query_requires_all_terms() {
        let db = Db::open_in_memory().unwrap();
        let a = seed(&db);
        let both = add_task(&db, a, "Deploy the urgent fix", "");
        add_task(&db, a, "Deploy later", "");

        let hits = db.search_tasks(&SearchQuery::parse("urgent deploy")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task.id, both);
    }

    #[test]
    fn hostile_query_text_is_neutralised() {
        let db = Db::open_in_memory().unwrap();
        let a = seed(&db);
        add_task(&db, a, "Quoting \"fun\"", "");

        // Raw FTS operators would be a syntax error without sanitising.
        assert!(db.search_tasks(&SearchQuery::parse("AND NOT (")).is_ok());
        assert!(db
            .search_tasks(&SearchQuery::parse("say \"hi\" OR"))
            .is_ok());
    }

    #[test]
    fn blank_query_returns_everything() {
        let db = Db::open_in_memory().unwrap();
        let a = seed(&db);
        add_task(&db, a, "One", "");
        add_task(&db, a, "Two", "");

        let hits = db.search_tasks(&SearchQuery::parse("  ")).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn updated_tasks_are_reindexed() {
        let db = Db::open_in_memory().unwrap();
        let a = seed(&db);
        let id = add_task(&db, a, "Boring title", "");

        assert!(db
            .search_tasks(&SearchQuery::parse("exciting"))
            .unwrap()
            .is_empty());

        db.update_task(
            id,
            &taskdesk_core::task::UpdateTask {
                title: Some("Exciting title".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let hits = db.search_tasks(&SearchQuery::parse("exciting")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task.id, id);

        db.delete_task(id).unwrap();
        assert!(db
            .search_tasks(&SearchQuery::parse("exciting"))
            .unwrap()
            .is_empty());
    }
}
