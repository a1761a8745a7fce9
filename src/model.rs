use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BarkyError, Result};

/// A saved url with its metadata, as stored in the `bookmarks` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub notes: Option<String>,
    pub date_added: DateTime<Utc>,
    pub date_edited: DateTime<Utc>,
}

impl Bookmark {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// Insert shape; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub notes: Option<String>,
    pub date_added: DateTime<Utc>,
    pub date_edited: DateTime<Utc>,
}

impl NewBookmark {
    pub fn new(title: String, url: String, notes: Option<String>, now: DateTime<Utc>) -> Self {
        NewBookmark {
            title,
            url,
            notes,
            date_added: now,
            date_edited: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkField {
    Id,
    Title,
    DateAdded,
    DateEdited,
}

impl BookmarkField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkField::Id => "id",
            BookmarkField::Title => "title",
            BookmarkField::DateAdded => "date_added",
            BookmarkField::DateEdited => "date_edited",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "id" => Ok(BookmarkField::Id),
            "title" => Ok(BookmarkField::Title),
            "date_added" => Ok(BookmarkField::DateAdded),
            "date_edited" => Ok(BookmarkField::DateEdited),
            _ => Err(BarkyError::invalid(format!("unknown bookmark field: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(BarkyError::invalid(format!("unknown sort order: {}", s))),
        }
    }
}

/// Current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// The edit stamp following `previous`: now, or one microsecond past
/// `previous` when the clock has not moved beyond it.
pub fn next_edit_stamp(previous: &DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > *previous {
        now
    } else {
        *previous + Duration::microseconds(1)
    }
}

/// Canonical TEXT form of a timestamp in the store. Fixed width, so lexical
/// order matches chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BarkyError::invalid(format!("invalid timestamp {}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Bookmark {
        Bookmark {
            id: 42,
            title: "Rust Book".to_string(),
            url: "https://doc.rust-lang.org/book/".to_string(),
            notes: Some("chapter 10".to_string()),
            date_added: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            date_edited: Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_json_round_trip_keeps_server_fields() {
        let bookmark = sample();
        let json = bookmark.to_json().unwrap();
        let back = Bookmark::from_json(&json).unwrap();

        assert_eq!(back, bookmark);
        assert_eq!(back.id, 42);
        assert_eq!(back.date_added, bookmark.date_added);
    }

    #[test]
    fn test_json_uses_field_names() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(value["title"], "Rust Book");
        assert_eq!(value["notes"], "chapter 10");
        assert!(value.get("date_edited").is_some());
    }

    #[test]
    fn test_field_and_direction_parsing() {
        assert_eq!(BookmarkField::parse("date_added").unwrap(), BookmarkField::DateAdded);
        assert!(matches!(
            BookmarkField::parse("url"),
            Err(BarkyError::InvalidInput(_))
        ));
        assert_eq!(SortDirection::parse("DESC").unwrap(), SortDirection::Desc);
        assert_eq!(SortDirection::default(), SortDirection::Asc);
        assert!(SortDirection::parse("sideways").is_err());
    }

    #[test]
    fn test_edit_stamp_always_advances() {
        let future = now() + Duration::hours(1);
        assert_eq!(next_edit_stamp(&future), future + Duration::microseconds(1));

        let past = now() - Duration::hours(1);
        let stamp = next_edit_stamp(&past);
        assert!(stamp > past);
        assert_eq!(stamp, stamp.trunc_subsecs(6));
    }

    #[test]
    fn test_timestamp_text_is_canonical() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-05T08:00:00.000000Z");
        let parsed = parse_timestamp("2024-01-05T09:00:00+01:00").unwrap();
        assert_eq!(parsed, ts);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
