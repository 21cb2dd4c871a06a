//! Local record store for templates and delivery logs.
//!
//! A single SQLite file. Each call opens its own connection, so the store is
//! cheap to clone into handlers and background jobs.

pub mod logs;
pub mod templates;

use crate::error::StoreResult;
use log::info;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS templates (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    subject     TEXT NOT NULL,
    from_name   TEXT NOT NULL,
    reply_to    TEXT,
    cc          TEXT,
    bcc         TEXT,
    to_email    TEXT,
    content     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS logs (
    log_id        TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,
    status        TEXT NOT NULL,
    template_id   TEXT NOT NULL,
    service_id    TEXT NOT NULL,
    email_address TEXT NOT NULL,
    name          TEXT NOT NULL DEFAULT '',
    message       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS logs_template_idx ON logs (template_id, created_at);
CREATE INDEX IF NOT EXISTS logs_created_idx ON logs (created_at);
";

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Opens (creating if needed) the database at `path` and makes sure the
    /// schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.connect()?.execute_batch(SCHEMA)?;
        info!("Record store ready at {}", store.path.display());
        Ok(store)
    }

    pub(crate) fn connect(&self) -> StoreResult<Connection> {
        Ok(Connection::open(&self.path)?)
    }
}
