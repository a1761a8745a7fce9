//! Command handlers. Each one runs inside exactly one [`UnitOfWork`]: it
//! commits when the handler succeeds and rolls back on any error.

use crate::command::{AddBookmarkCommand, DeleteBookmarkCommand, EditBookmarkCommand, ListBookmarksCommand};
use crate::db::Database;
use crate::error::{BarkyError, Result};
use crate::model::{Bookmark, NewBookmark, next_edit_stamp, now};
use crate::repository::BookmarkQuery;
use crate::unit_of_work::UnitOfWork;

#[derive(Debug, Clone, PartialEq)]
pub struct Added {
    pub bookmark: Bookmark,
    /// `false` when a bookmark with the same title already existed.
    pub created: bool,
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BarkyError::invalid(format!("{} must not be empty", name)));
    }
    Ok(())
}

/// Titles are unique: adding a title that is already stored returns the
/// stored bookmark and writes nothing.
pub async fn add_bookmark(cmd: AddBookmarkCommand, db: &Database) -> Result<Added> {
    require_non_empty("title", &cmd.title)?;
    require_non_empty("url", &cmd.url)?;

    let mut uow = UnitOfWork::begin(db).await?;
    let result = do_add_bookmark(&mut uow, cmd).await;
    uow.finish(result).await
}

async fn do_add_bookmark(uow: &mut UnitOfWork<'_>, cmd: AddBookmarkCommand) -> Result<Added> {
    let mut bookmarks = uow.bookmarks();

    if let Some(existing) = bookmarks.find_first(&BookmarkQuery::by_title(&cmd.title)).await? {
        tracing::info!(id = existing.id, title = %existing.title, "bookmark already exists, skipping add");
        return Ok(Added {
            bookmark: existing,
            created: false,
        });
    }

    let bookmark = bookmarks
        .add_one(NewBookmark::new(cmd.title, cmd.url, cmd.notes, now()))
        .await?;
    tracing::info!(id = bookmark.id, title = %bookmark.title, "added bookmark");

    Ok(Added {
        bookmark,
        created: true,
    })
}

pub async fn list_bookmarks(cmd: ListBookmarksCommand, db: &Database) -> Result<Vec<Bookmark>> {
    let mut query = match &cmd.filter {
        Some(filter) => BookmarkQuery::where_field(filter.field, &filter.value)?,
        None => BookmarkQuery::all(),
    };
    if let Some(sort) = cmd.sort {
        query = query.order_by(sort.field, sort.direction);
    }

    let mut uow = UnitOfWork::begin(db).await?;
    let result = uow.bookmarks().find_all(&query).await;
    uow.finish(result).await
}

/// Overlays the fields present in `cmd` onto the stored bookmark and stamps
/// `date_edited`.
pub async fn edit_bookmark(cmd: EditBookmarkCommand, db: &Database) -> Result<Bookmark> {
    if let Some(title) = &cmd.title {
        require_non_empty("title", title)?;
    }
    if let Some(url) = &cmd.url {
        require_non_empty("url", url)?;
    }

    let mut uow = UnitOfWork::begin(db).await?;
    let result = do_edit_bookmark(&mut uow, cmd).await;
    uow.finish(result).await
}

async fn do_edit_bookmark(uow: &mut UnitOfWork<'_>, cmd: EditBookmarkCommand) -> Result<Bookmark> {
    let mut bookmarks = uow.bookmarks();
    let mut bookmark = bookmarks.get(cmd.id).await?.ok_or(BarkyError::NotFound(cmd.id))?;

    if let Some(title) = cmd.title {
        bookmark.title = title;
    }
    if let Some(url) = cmd.url {
        bookmark.url = url;
    }
    if let Some(notes) = cmd.notes {
        bookmark.notes = Some(notes);
    }
    bookmark.date_edited = next_edit_stamp(&bookmark.date_edited);

    bookmarks.update(&bookmark).await?;
    tracing::info!(id = bookmark.id, "edited bookmark");
    Ok(bookmark)
}

/// Returns the number of bookmarks removed; deleting an unknown id is a no-op.
pub async fn delete_bookmark(cmd: DeleteBookmarkCommand, db: &Database) -> Result<u64> {
    let mut uow = UnitOfWork::begin(db).await?;
    let result = uow.bookmarks().delete_one(cmd.id).await;
    let deleted = uow.finish(result).await?;

    if deleted > 0 {
        tracing::info!(id = cmd.id, "deleted bookmark");
    } else {
        tracing::debug!(id = cmd.id, "no bookmark to delete");
    }
    Ok(deleted)
}
