use std::collections::HashSet;

use libsql::Connection;
use tokio::sync::MutexGuard;

use crate::db::Database;
use crate::error::Result;
use crate::repository::BookmarkRepository;

/// One transactional scope over the store. Holds the database's transaction
/// lock from `begin` until `commit`/`rollback`, so scopes never interleave on
/// the shared connection.
pub struct UnitOfWork<'a> {
    conn: &'a Connection,
    seen: HashSet<i64>,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> UnitOfWork<'a> {
    pub async fn begin(db: &'a Database) -> Result<Self> {
        let guard = db.tx_lock().lock().await;
        let conn = db.connection();

        // a scope whose future was dropped mid-flight never reached COMMIT/ROLLBACK
        if !conn.is_autocommit() {
            tracing::warn!("rolling back transaction left open by an abandoned unit of work");
            conn.execute("ROLLBACK", ()).await?;
        }

        conn.execute("BEGIN TRANSACTION", ()).await?;

        Ok(UnitOfWork {
            conn,
            seen: HashSet::new(),
            _guard: guard,
        })
    }

    pub fn bookmarks(&mut self) -> BookmarkRepository<'_> {
        BookmarkRepository::new(self.conn, &mut self.seen)
    }

    /// Ids of every bookmark read through this scope.
    pub fn seen(&self) -> &HashSet<i64> {
        &self.seen
    }

    pub async fn commit(self) -> Result<()> {
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            let _ = self.conn.execute("ROLLBACK", ()).await;
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.conn.execute("ROLLBACK", ()).await?;
        Ok(())
    }

    /// Commits when `result` is `Ok`, rolls back otherwise, and hands the
    /// result back.
    pub async fn finish<T>(self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::error!(error = %rollback_err, "failed to roll back unit of work");
                }
                Err(e)
            }
        }
    }
}
