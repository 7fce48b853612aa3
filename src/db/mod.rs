//! Store layer backing the recurrence and lifecycle core.
//!
//! Templates and completion logs live in SQLite. All core operations are
//! synchronous per-request computations over this store; the unique index on
//! `(user_id, template_id, log_date)` is the one concurrency-sensitive
//! invariant, and the upsert in [`logs`] is written so `completed = true`
//! always wins over repeated or out-of-order writes.

pub mod ledger;
pub mod logs;
pub mod templates;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL so concurrent readers (other tabs/devices syncing) don't block
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        let report = embedded::migrations::runner().run(&mut conn)?;
        debug!(
            applied = report.applied_migrations().len(),
            "schema migrations checked"
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute a function with exclusive access to the connection.
    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }
}

/// Current timestamp in milliseconds, for audit fields.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
