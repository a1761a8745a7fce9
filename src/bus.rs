//! The message bus routes each [`Command`] to its handler in [`services`].
//!
//! It is built once at startup by [`bootstrap`] and shared with the HTTP
//! layer through [`AppState`](crate::handler::AppState).
//!
//! ```rust,ignore
//! let db = Arc::new(Database::new(&cfg, &data_dir).await?);
//! let bus = bootstrap(db);
//!
//! let outcome = bus.handle(Command::Delete(DeleteBookmarkCommand { id: 3 })).await?;
//! ```

use std::sync::Arc;

use crate::command::Command;
use crate::db::Database;
use crate::error::Result;
use crate::model::Bookmark;
use crate::services::{self, Added};

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Added(Added),
    Listed(Vec<Bookmark>),
    Edited(Bookmark),
    Deleted(u64),
}

pub struct MessageBus {
    db: Arc<Database>,
}

pub fn bootstrap(db: Arc<Database>) -> MessageBus {
    MessageBus::new(db)
}

impl MessageBus {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn handle(&self, cmd: Command) -> Result<CommandOutcome> {
        tracing::debug!(command = cmd.name(), "dispatching command");

        match cmd {
            Command::Add(cmd) => services::add_bookmark(cmd, &self.db).await.map(CommandOutcome::Added),
            Command::List(cmd) => services::list_bookmarks(cmd, &self.db).await.map(CommandOutcome::Listed),
            Command::Edit(cmd) => services::edit_bookmark(cmd, &self.db).await.map(CommandOutcome::Edited),
            Command::Delete(cmd) => services::delete_bookmark(cmd, &self.db).await.map(CommandOutcome::Deleted),
        }
    }
}
