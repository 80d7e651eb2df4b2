//! SQLite persistence.
//!
//! Raw SQL with rusqlite, one repository per table group. Request handlers
//! never share a connection: [`Database::run`] opens one per call on the
//! blocking pool.

pub mod init;
pub mod meetings;
pub mod users;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;

use crate::error::MeetResult;

pub use init::migrate;
pub use meetings::MeetingRepository;
pub use users::{NewUser, UserRecord, UserRepository};

/// Location of the database file plus connection setup.
#[derive(Debug, Clone)]
pub struct Database {
    path: Arc<PathBuf>,
}

impl Database {
    /// Create the parent directory if needed and bring the schema up to date.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let db = Self {
            path: Arc::new(path),
        };
        let conn = db.connect()?;
        migrate(&conn)?;

        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> Result<Connection> {
        let conn =
            Connection::open(self.path.as_path()).context("Failed to open database connection")?;
        conn.pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")?;
        conn.busy_timeout(Duration::from_secs(5))
            .context("Failed to set busy timeout")?;
        Ok(conn)
    }

    /// Run `f` against a fresh connection on the blocking thread pool.
    pub async fn run<T, F>(&self, f: F) -> MeetResult<T>
    where
        F: FnOnce(&Connection) -> MeetResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.connect()?;
            f(&conn)
        })
        .await
        .map_err(|e| anyhow!("Database task panicked: {}", e))?
    }
}
