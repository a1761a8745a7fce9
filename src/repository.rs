use std::collections::HashSet;

use chrono::{DateTime, Utc};
use libsql::{Connection, Value};

use crate::error::{BarkyError, Result};
use crate::model::{Bookmark, BookmarkField, NewBookmark, SortDirection, format_timestamp, parse_timestamp};

const COLUMNS: &str = "id, title, url, notes, date_added, date_edited";

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Id(i64),
    Title(String),
    DateAdded(DateTime<Utc>),
    DateEdited(DateTime<Utc>),
}

/// A single-field equality filter plus an optional single-field sort over the
/// `bookmarks` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkQuery {
    condition: Option<Condition>,
    order: Option<(BookmarkField, SortDirection)>,
    limit: Option<u32>,
}

/// Stored timestamps carry microseconds, so a finer value can never match.
fn parse_filter_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let ts = parse_timestamp(value)?;
    if ts.timestamp_subsec_nanos() % 1_000 != 0 {
        return Err(BarkyError::invalid(format!(
            "timestamp {} is finer than microsecond precision",
            value
        )));
    }
    Ok(ts)
}

impl BookmarkQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: i64) -> Self {
        BookmarkQuery {
            condition: Some(Condition::Id(id)),
            ..Self::default()
        }
    }

    pub fn by_title(title: &str) -> Self {
        BookmarkQuery {
            condition: Some(Condition::Title(title.to_string())),
            ..Self::default()
        }
    }

    /// Filter on `field == value`, parsing `value` for the field's type.
    pub fn where_field(field: BookmarkField, value: &str) -> Result<Self> {
        let condition = match field {
            BookmarkField::Id => Condition::Id(
                value
                    .trim()
                    .parse()
                    .map_err(|_| BarkyError::invalid(format!("invalid bookmark id: {}", value)))?,
            ),
            BookmarkField::Title => Condition::Title(value.to_string()),
            BookmarkField::DateAdded => Condition::DateAdded(parse_filter_timestamp(value)?),
            BookmarkField::DateEdited => Condition::DateEdited(parse_filter_timestamp(value)?),
        };

        Ok(BookmarkQuery {
            condition: Some(condition),
            ..Self::default()
        })
    }

    pub fn order_by(mut self, field: BookmarkField, direction: SortDirection) -> Self {
        self.order = Some((field, direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {} FROM bookmarks", COLUMNS);
        let mut params: Vec<Value> = Vec::new();

        match &self.condition {
            None => sql.push_str(" WHERE id IS NOT NULL"),
            Some(Condition::Id(id)) => {
                sql.push_str(" WHERE id = ?");
                params.push((*id).into());
            }
            Some(Condition::Title(title)) => {
                sql.push_str(" WHERE title = ?");
                params.push(title.clone().into());
            }
            Some(Condition::DateAdded(ts)) => {
                sql.push_str(" WHERE date_added = ?");
                params.push(format_timestamp(ts).into());
            }
            Some(Condition::DateEdited(ts)) => {
                sql.push_str(" WHERE date_edited = ?");
                params.push(format_timestamp(ts).into());
            }
        }

        match self.order {
            Some((field, direction)) => {
                // ties on the sort column fall back to insertion order
                sql.push_str(&format!(" ORDER BY {} {}, id ASC", field.as_str(), direction.as_sql()));
            }
            None => sql.push_str(" ORDER BY id ASC"),
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push((limit as i64).into());
        }

        (sql, params)
    }
}

/// CRUD access to bookmarks for one unit of work. Reads record the ids they
/// return in the unit of work's seen set; writes become durable when the unit
/// of work commits.
pub struct BookmarkRepository<'a> {
    conn: &'a Connection,
    seen: &'a mut HashSet<i64>,
}

impl<'a> BookmarkRepository<'a> {
    pub fn new(conn: &'a Connection, seen: &'a mut HashSet<i64>) -> Self {
        Self { conn, seen }
    }

    pub async fn add_one(&self, bookmark: NewBookmark) -> Result<Bookmark> {
        let query = format!(
            "INSERT INTO bookmarks (title, url, notes, date_added, date_edited) VALUES (?, ?, ?, ?, ?) RETURNING {}",
            COLUMNS
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    bookmark.title,
                    bookmark.url,
                    bookmark.notes,
                    format_timestamp(&bookmark.date_added),
                    format_timestamp(&bookmark.date_edited)
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => row_to_bookmark(&row),
            None => Err(BarkyError::Decode("insert returned no row".to_string())),
        }
    }

    pub async fn add_many(&self, bookmarks: Vec<NewBookmark>) -> Result<Vec<Bookmark>> {
        let mut added = Vec::with_capacity(bookmarks.len());
        for bookmark in bookmarks {
            added.push(self.add_one(bookmark).await?);
        }
        Ok(added)
    }

    pub async fn delete_one(&self, id: i64) -> Result<u64> {
        self.delete_many(&[id]).await
    }

    /// Returns the number of rows removed; unknown ids are ignored.
    pub async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!("DELETE FROM bookmarks WHERE id IN ({})", placeholders);
        let params: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();

        Ok(self.conn.execute(&query, params).await?)
    }

    pub async fn get(&mut self, id: i64) -> Result<Option<Bookmark>> {
        self.find_first(&BookmarkQuery::by_id(id)).await
    }

    pub async fn update(&self, bookmark: &Bookmark) -> Result<u64> {
        self.update_many(std::slice::from_ref(bookmark)).await
    }

    /// Overwrites every stored column of each bookmark, matched by id.
    pub async fn update_many(&self, bookmarks: &[Bookmark]) -> Result<u64> {
        if bookmarks.is_empty() {
            return Err(BarkyError::invalid("no bookmarks to update"));
        }

        let query = r#"
            UPDATE bookmarks
            SET title = ?, url = ?, notes = ?, date_added = ?, date_edited = ?
            WHERE id = ?
        "#;

        let mut updated = 0;
        for bookmark in bookmarks {
            let affected = self
                .conn
                .execute(
                    query,
                    libsql::params![
                        bookmark.title.clone(),
                        bookmark.url.clone(),
                        bookmark.notes.clone(),
                        format_timestamp(&bookmark.date_added),
                        format_timestamp(&bookmark.date_edited),
                        bookmark.id
                    ],
                )
                .await?;

            if affected == 0 {
                return Err(BarkyError::NotFound(bookmark.id));
            }
            updated += affected;
        }

        Ok(updated)
    }

    pub async fn find_first(&mut self, query: &BookmarkQuery) -> Result<Option<Bookmark>> {
        let query = query.clone().limit(1);
        Ok(self.find_all(&query).await?.into_iter().next())
    }

    pub async fn find_all(&mut self, query: &BookmarkQuery) -> Result<Vec<Bookmark>> {
        let (sql, params) = query.to_sql();
        let mut rows = self.conn.query(&sql, params).await?;
        let mut bookmarks = Vec::new();

        while let Some(row) = rows.next().await? {
            let bookmark = row_to_bookmark(&row)?;
            self.seen.insert(bookmark.id);
            bookmarks.push(bookmark);
        }

        Ok(bookmarks)
    }
}

fn row_to_bookmark(row: &libsql::Row) -> Result<Bookmark> {
    let date_added: String = row.get(4)?;
    let date_edited: String = row.get(5)?;

    Ok(Bookmark {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        notes: row.get(3)?,
        date_added: decode_timestamp(&date_added)?,
        date_edited: decode_timestamp(&date_edited)?,
    })
}

fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(s).map_err(|e| BarkyError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::{Duration, TimeZone};

    fn new_bookmark(title: &str, minutes: i64) -> NewBookmark {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes);
        NewBookmark::new(title.to_string(), format!("https://{}.example", title), None, ts)
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let db = Database::in_memory().await.unwrap();
        let mut seen = HashSet::new();
        let mut repo = BookmarkRepository::new(db.connection(), &mut seen);

        let added = repo.add_one(new_bookmark("alpha", 0)).await.unwrap();
        assert!(added.id > 0);

        let fetched = repo.get(added.id).await.unwrap().unwrap();
        assert_eq!(fetched, added);
        assert!(repo.get(added.id + 100).await.unwrap().is_none());

        drop(repo);
        assert!(seen.contains(&added.id));
    }

    #[tokio::test]
    async fn test_find_all_filters_and_sorts() {
        let db = Database::in_memory().await.unwrap();
        let mut seen = HashSet::new();
        let mut repo = BookmarkRepository::new(db.connection(), &mut seen);

        repo.add_many(vec![
            new_bookmark("charlie", 0),
            new_bookmark("alpha", 1),
            new_bookmark("bravo", 2),
        ])
        .await
        .unwrap();

        let asc = repo
            .find_all(&BookmarkQuery::all().order_by(BookmarkField::Title, SortDirection::Asc))
            .await
            .unwrap();
        let titles: Vec<_> = asc.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["alpha", "bravo", "charlie"]);

        let desc = repo
            .find_all(&BookmarkQuery::all().order_by(BookmarkField::DateAdded, SortDirection::Desc))
            .await
            .unwrap();
        let titles: Vec<_> = desc.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["bravo", "alpha", "charlie"]);

        let by_title = repo.find_all(&BookmarkQuery::by_title("bravo")).await.unwrap();
        assert_eq!(by_title.len(), 1);

        let added_at = format_timestamp(&by_title[0].date_added);
        let by_date = repo
            .find_all(&BookmarkQuery::where_field(BookmarkField::DateAdded, &added_at).unwrap())
            .await
            .unwrap();
        assert_eq!(by_date, by_title);
    }

    #[tokio::test]
    async fn test_where_field_rejects_bad_values() {
        assert!(matches!(
            BookmarkQuery::where_field(BookmarkField::Id, "five"),
            Err(BarkyError::InvalidInput(_))
        ));
        assert!(BookmarkQuery::where_field(BookmarkField::DateEdited, "last tuesday").is_err());
        assert!(matches!(
            BookmarkQuery::where_field(BookmarkField::DateAdded, "2024-01-02T03:04:05.123456789Z"),
            Err(BarkyError::InvalidInput(_))
        ));
        assert!(BookmarkQuery::where_field(BookmarkField::DateAdded, "2024-01-02T03:04:05.123456Z").is_ok());
        assert!(BookmarkQuery::where_field(BookmarkField::DateEdited, "2024-01-02T03:04:05.123456000Z").is_ok());
        assert_eq!(
            BookmarkQuery::where_field(BookmarkField::Id, " 5 ").unwrap(),
            BookmarkQuery::by_id(5)
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::in_memory().await.unwrap();
        let mut seen = HashSet::new();
        let mut repo = BookmarkRepository::new(db.connection(), &mut seen);

        let mut bookmark = repo.add_one(new_bookmark("alpha", 0)).await.unwrap();
        bookmark.notes = Some("read later".to_string());
        assert_eq!(repo.update(&bookmark).await.unwrap(), 1);
        assert_eq!(repo.get(bookmark.id).await.unwrap().unwrap().notes.as_deref(), Some("read later"));

        let mut ghost = bookmark.clone();
        ghost.id = 999;
        assert!(matches!(repo.update(&ghost).await, Err(BarkyError::NotFound(999))));
        assert!(matches!(repo.update_many(&[]).await, Err(BarkyError::InvalidInput(_))));

        assert_eq!(repo.delete_many(&[]).await.unwrap(), 0);
        assert_eq!(repo.delete_one(999).await.unwrap(), 0);
        assert_eq!(repo.delete_one(bookmark.id).await.unwrap(), 1);
        assert!(repo.find_all(&BookmarkQuery::all()).await.unwrap().is_empty());
    }
}
