use rusqlite::{params, OptionalExtension, Row};

use taskdesk_core::tag::{CreateTag, Tag};

use crate::{constraint_to_conflict, Db, DbError};

fn row_to_tag(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
    })
}

impl Db {
    pub fn create_tag(&self, input: &CreateTag) -> Result<Tag, DbError> {
        let slug = input.slug();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tags (name, slug) VALUES (?1, ?2)",
                params![input.name, slug],
            )
            .map_err(|e| constraint_to_conflict(e, &format!("tag {} exists", input.name)))?;
            let id = conn.last_insert_rowid();
            Ok(conn.query_row("SELECT * FROM tags WHERE id = ?1", params![id], row_to_tag)?)
        })
    }

    pub fn get_tag(&self, id: i64) -> Result<Tag, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM tags WHERE id = ?1", params![id], row_to_tag)
                .optional()?
                .ok_or_else(|| DbError::NotFound(format!("tag {id}")))
        })
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tags ORDER BY name ASC")?;
            let tags = stmt
                .query_map([], row_to_tag)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tags)
        })
    }
}

#[cfg(test)]
mod tests {
    use taskdesk_core::tag::CreateTag;

    use crate::{Db, DbError};

    #[test]
    fn tag_crud_with_derived_slug() {
        let db = Db::open_in_memory().unwrap();
        let tag = db
            .create_tag(&CreateTag {
                name: "Hot Fix".into(),
                slug: None,
            })
            .unwrap();
        assert_eq!(tag.slug, "hot-fix");
        assert_eq!(db.get_tag(tag.id).unwrap().name, "Hot Fix");

        let dup = db.create_tag(&CreateTag {
            name: "Hot Fix".into(),
            slug: Some("other".into()),
        });
        assert!(matches!(dup, Err(DbError::Conflict(_))));

        let all = db.list_tags().unwrap();
        assert_eq!(all.len(), 1);
    }
}
