//! SQLite persistence.
//!
//! Each submodule owns one table and exposes free functions over a
//! `&Connection`, so the service can run several of them inside a single
//! `Transaction` (which derefs to `Connection`).

pub mod adventures;
pub mod participants;
pub mod users;
pub mod waypoints;

use std::path::Path;

use rusqlite::{Connection, Transaction};
use tracing::debug;

use crate::error::AdventureResult;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    registered_on TEXT NOT NULL,
    role          INTEGER NOT NULL DEFAULT 0,
    confirmed     INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS adventures (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    creator_id INTEGER NOT NULL,
    date       TEXT NOT NULL,
    info       TEXT NOT NULL,
    joined     INTEGER NOT NULL DEFAULT 1,
    mode       INTEGER NOT NULL DEFAULT 0,
    views      INTEGER NOT NULL DEFAULT 0,
    searched   INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS adventures_creator ON adventures (creator_id);
CREATE INDEX IF NOT EXISTS adventures_date ON adventures (date);

CREATE TABLE IF NOT EXISTS adventure_participants (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    adventure_id INTEGER NOT NULL REFERENCES adventures (id),
    user_id      INTEGER NOT NULL,
    UNIQUE (adventure_id, user_id)
);
CREATE INDEX IF NOT EXISTS participants_user ON adventure_participants (user_id);

CREATE TABLE IF NOT EXISTS coordinates (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    adventure_id INTEGER NOT NULL REFERENCES adventures (id),
    path_point   INTEGER NOT NULL,
    latitude     REAL NOT NULL,
    longitude    REAL NOT NULL,
    UNIQUE (adventure_id, path_point)
);
CREATE INDEX IF NOT EXISTS coordinates_position ON coordinates (latitude, longitude);
";

/// Owns the SQLite connection and the schema.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> AdventureResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        debug!(path = %path.display(), "opening adventure store");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> AdventureResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> AdventureResult<Self> {
        // Children must be removed before their adventure row.
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Start a transaction. Dropping it without `commit` rolls back.
    pub fn transaction(&mut self) -> AdventureResult<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}
