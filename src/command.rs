//! Commands describe one requested operation on bookmarks. They are built by
//! the API layer and consumed by exactly one handler through the
//! [`MessageBus`](crate::bus::MessageBus).

use crate::model::{BookmarkField, SortDirection};

#[derive(Debug, Clone, PartialEq)]
pub struct AddBookmarkCommand {
    pub title: String,
    pub url: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: BookmarkField,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sort {
    pub field: BookmarkField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListBookmarksCommand {
    pub filter: Option<FieldFilter>,
    pub sort: Option<Sort>,
}

impl ListBookmarksCommand {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(field: BookmarkField, value: impl Into<String>) -> Self {
        ListBookmarksCommand {
            filter: Some(FieldFilter {
                field,
                value: value.into(),
            }),
            sort: None,
        }
    }

    pub fn sorted_by(mut self, field: BookmarkField, direction: SortDirection) -> Self {
        self.sort = Some(Sort { field, direction });
        self
    }
}

/// Partial update: `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBookmarkCommand {
    pub id: i64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeleteBookmarkCommand {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(AddBookmarkCommand),
    List(ListBookmarksCommand),
    Edit(EditBookmarkCommand),
    Delete(DeleteBookmarkCommand),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add(_) => "add_bookmark",
            Command::List(_) => "list_bookmarks",
            Command::Edit(_) => "edit_bookmark",
            Command::Delete(_) => "delete_bookmark",
        }
    }
}

impl From<AddBookmarkCommand> for Command {
    fn from(cmd: AddBookmarkCommand) -> Self {
        Command::Add(cmd)
    }
}

impl From<ListBookmarksCommand> for Command {
    fn from(cmd: ListBookmarksCommand) -> Self {
        Command::List(cmd)
    }
}

impl From<EditBookmarkCommand> for Command {
    fn from(cmd: EditBookmarkCommand) -> Self {
        Command::Edit(cmd)
    }
}

impl From<DeleteBookmarkCommand> for Command {
    fn from(cmd: DeleteBookmarkCommand) -> Self {
        Command::Delete(cmd)
    }
}
