use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use tracing::info;

use crate::api::{AddBookmarkRequest, DeleteResponse, EditBookmarkRequest, JsonBody, ListParams, parse_id};
use crate::bus::{CommandOutcome, MessageBus};
use crate::command::{Command, DeleteBookmarkCommand, ListBookmarksCommand};
use crate::error::{BarkyError, Result};
use crate::model::{Bookmark, BookmarkField};

#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<MessageBus>,
}

fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn unexpected(outcome: CommandOutcome) -> BarkyError {
    BarkyError::Internal(format!("unexpected command outcome: {:?}", outcome))
}

async fn list(state: &AppState, cmd: ListBookmarksCommand) -> Result<Vec<Bookmark>> {
    match state.bus.handle(Command::List(cmd)).await? {
        CommandOutcome::Listed(bookmarks) => Ok(bookmarks),
        other => Err(unexpected(other)),
    }
}

fn bookmarks_or_no_content(bookmarks: Vec<Bookmark>) -> Response {
    if bookmarks.is_empty() {
        return no_content();
    }
    (StatusCode::OK, Json(bookmarks)).into_response()
}

fn first_or_no_content(bookmarks: Vec<Bookmark>) -> Response {
    match bookmarks.into_iter().next() {
        Some(bookmark) => (StatusCode::OK, Json(bookmark)).into_response(),
        None => no_content(),
    }
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    "Barky API"
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let bookmarks = list(&state, ListBookmarksCommand::filtered(BookmarkField::Id, id)).await?;
    Ok(first_or_no_content(bookmarks))
}

pub async fn get_all(State(state): State<AppState>, Query(params): Query<ListParams>) -> Result<Response> {
    let cmd = params.apply(ListBookmarksCommand::all())?;
    let bookmarks = list(&state, cmd).await?;

    info!(count = bookmarks.len(), "listed bookmarks");
    Ok(bookmarks_or_no_content(bookmarks))
}

pub async fn get_first(
    State(state): State<AppState>,
    Path((filter, value, sort)): Path<(String, String, String)>,
    Query(params): Query<ListParams>,
) -> Result<Response> {
    let params = ListParams {
        sort: Some(sort),
        order: params.order,
    };
    let cmd = params.apply(ListBookmarksCommand::filtered(BookmarkField::parse(&filter)?, value))?;
    let bookmarks = list(&state, cmd).await?;
    Ok(first_or_no_content(bookmarks))
}

pub async fn add_bookmark(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AddBookmarkRequest>,
) -> Result<Response> {
    match state.bus.handle(Command::Add(payload.into_command())).await? {
        CommandOutcome::Added(added) if added.created => Ok((StatusCode::CREATED, Json(added.bookmark)).into_response()),
        CommandOutcome::Added(added) => Ok((StatusCode::OK, Json(added.bookmark)).into_response()),
        other => Err(unexpected(other)),
    }
}

pub async fn edit_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<EditBookmarkRequest>,
) -> Result<Response> {
    let id = parse_id(&id)?;
    match state.bus.handle(Command::Edit(payload.into_command(id))).await? {
        CommandOutcome::Edited(bookmark) => Ok((StatusCode::OK, Json(bookmark)).into_response()),
        other => Err(unexpected(other)),
    }
}

pub async fn delete_bookmark(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let id = parse_id(&id)?;
    match state.bus.handle(Command::Delete(DeleteBookmarkCommand { id })).await? {
        CommandOutcome::Deleted(0) => Ok(no_content()),
        CommandOutcome::Deleted(deleted) => Ok((StatusCode::OK, Json(DeleteResponse { deleted })).into_response()),
        other => Err(unexpected(other)),
    }
}
