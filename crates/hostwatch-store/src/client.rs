//! SQLite connection management and cycle-scoped transactions.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store connection lock poisoned")]
    Poisoned,

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS assets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    ip_address  TEXT NOT NULL,
    mac_address TEXT NOT NULL DEFAULT 'N/A',
    asset_type  TEXT NOT NULL DEFAULT 'Other',
    status      TEXT NOT NULL DEFAULT 'Offline',
    condition   TEXT NOT NULL DEFAULT 'Monitored',
    first_seen  TEXT NOT NULL,
    last_seen   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_assets_ip ON assets (ip_address);
CREATE INDEX IF NOT EXISTS idx_assets_mac ON assets (mac_address);

CREATE TABLE IF NOT EXISTS alerts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    category   TEXT NOT NULL,
    message    TEXT NOT NULL
);
"#;

/// Thread-safe SQLite store client.
///
/// Clone is cheap (inner Arc). The mutex serializes writers: a
/// reconciliation cycle holds it for its whole transaction, so a full
/// cycle and a status cycle can never interleave on the same rows.
#[derive(Clone)]
pub struct StoreClient {
    conn: Arc<Mutex<Connection>>,
}

impl StoreClient {
    /// Open (or create) the inventory database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "Opened inventory database");
        Self::init(conn)
    }

    /// In-memory store, used by tests and one-shot dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` inside one cycle-scoped transaction.
    ///
    /// Every mutation the closure performs becomes visible atomically on
    /// commit; any error rolls the whole cycle back. The connection lock
    /// is held for the duration, so at most one cycle writes at a time.
    pub fn with_cycle<T>(
        &self,
        f: impl FnOnce(&CycleTxn<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let txn = guard.transaction()?;
        let cycle = CycleTxn { txn };
        match f(&cycle) {
            Ok(value) => {
                cycle.txn.commit()?;
                Ok(value)
            }
            // Transaction rolls back on drop.
            Err(e) => Err(e),
        }
    }

    /// Run a read-only closure against the raw connection.
    pub(crate) fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&guard)
    }
}

/// Handle to an open cycle transaction.
///
/// All per-cycle queries and mutations hang off this type; see the
/// `queries` and `mutations` modules.
pub struct CycleTxn<'c> {
    pub(crate) txn: rusqlite::Transaction<'c>,
}

impl CycleTxn<'_> {
    pub(crate) fn conn(&self) -> &Connection {
        &self.txn
    }
}
