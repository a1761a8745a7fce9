use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::command::{AddBookmarkCommand, EditBookmarkCommand, ListBookmarksCommand};
use crate::error::{BarkyError, Result};
use crate::model::{BookmarkField, SortDirection};

/// A JSON request body whose rejections (bad syntax, missing fields, wrong
/// content type) surface as [`BarkyError::InvalidInput`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(BarkyError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for BarkyError {
    fn from(rejection: JsonRejection) -> Self {
        BarkyError::InvalidInput(rejection.body_text())
    }
}

/// Body of `POST /api/add`. Timestamps are assigned by the server, so any
/// `date_added` sent by the client is ignored.
#[derive(Debug, Deserialize)]
pub struct AddBookmarkRequest {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AddBookmarkRequest {
    pub fn into_command(self) -> AddBookmarkCommand {
        AddBookmarkCommand {
            title: self.title,
            url: self.url,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EditBookmarkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl EditBookmarkRequest {
    pub fn into_command(self, id: i64) -> EditBookmarkCommand {
        EditBookmarkCommand {
            id,
            title: self.title,
            url: self.url,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    /// Applies `?sort=&order=` to `cmd`. An order without a sort field orders
    /// by id.
    pub fn apply(self, cmd: ListBookmarksCommand) -> Result<ListBookmarksCommand> {
        let direction = match &self.order {
            Some(order) => SortDirection::parse(order)?,
            None => SortDirection::default(),
        };

        match (self.sort, self.order) {
            (Some(sort), _) => Ok(cmd.sorted_by(BookmarkField::parse(&sort)?, direction)),
            (None, Some(_)) => Ok(cmd.sorted_by(BookmarkField::Id, direction)),
            (None, None) => Ok(cmd),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

pub fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| BarkyError::invalid(format!("invalid bookmark id: {}", raw)))
}

impl BarkyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BarkyError::NotFound(_) => StatusCode::NOT_FOUND,
            BarkyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BarkyError::Store(_) | BarkyError::Decode(_) | BarkyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BarkyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %crate::unpack_error(&self), "request failed");
        } else {
            tracing::info!(error = %self, "request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(BarkyError::NotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(BarkyError::invalid("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            BarkyError::Internal("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_list_params_apply_sort_and_order() {
        let params = ListParams {
            sort: Some("title".to_string()),
            order: Some("DESC".to_string()),
        };
        let cmd = params.apply(ListBookmarksCommand::all()).unwrap();
        assert_eq!(
            cmd,
            ListBookmarksCommand::all().sorted_by(BookmarkField::Title, SortDirection::Desc)
        );

        let order_only = ListParams {
            sort: None,
            order: Some("desc".to_string()),
        };
        assert_eq!(
            order_only.apply(ListBookmarksCommand::all()).unwrap(),
            ListBookmarksCommand::all().sorted_by(BookmarkField::Id, SortDirection::Desc)
        );

        let bad = ListParams {
            sort: Some("url".to_string()),
            order: None,
        };
        assert!(bad.apply(ListBookmarksCommand::all()).is_err());
    }

    #[test]
    fn test_requests_ignore_unknown_fields() {
        let req: AddBookmarkRequest = serde_json::from_str(
            r#"{"title": "t", "url": "https://t.example", "date_added": "2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(req.notes, None);

        let edit: EditBookmarkRequest = serde_json::from_str(r#"{"notes": "n"}"#).unwrap();
        let cmd = edit.into_command(3);
        assert_eq!(cmd.id, 3);
        assert_eq!(cmd.title, None);
        assert_eq!(cmd.notes.as_deref(), Some("n"));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(matches!(parse_id("twelve"), Err(BarkyError::InvalidInput(_))));
    }
}
