//! The SQLite handle behind the key-value store.
//!
//! Flowsmith keeps a single table, so there is no migration history: the
//! schema is created with `IF NOT EXISTS` every time a database is opened and
//! stamped into `PRAGMA user_version`.  A file stamped by a newer build is
//! refused instead of being silently written to.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Schema revision written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS kv_state (
        key        TEXT PRIMARY KEY,
        value      TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );
";

/// Shared SQLite connection.
///
/// Every call holds the connection mutex for its whole closure, so a closure
/// that reads and then writes is never interleaved with another one.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file at `path` with the schema in place.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let conn = tokio::task::spawn_blocking(move || {
            info!(path = %path.display(), "opening database");
            prepare(Connection::open(&path)?, &path)
        })
        .await??;
        Ok(Self::wrap(conn))
    }

    /// A private in-memory database, used by tests and throwaway runs.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = prepare(Connection::open_in_memory()?, Path::new(":memory:"))?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// The schema revision stamped in the file.
    pub async fn schema_version(&self) -> StoreResult<i32> {
        self.execute(|conn| Ok(read_version(conn)?)).await
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn execute<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.execute_mut(move |conn| f(conn)).await
    }

    /// Like [`Database::execute`], but hands out `&mut Connection` so the
    /// closure can open a transaction.
    pub async fn execute_mut<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut *guard)
        })
        .await?
    }
}

fn lock(conn: &Mutex<Connection>) -> StoreResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::TaskJoin(format!("connection mutex poisoned: {e}")))
}

/// Apply connection settings and make sure `kv_state` exists.
fn prepare(conn: Connection, origin: &Path) -> StoreResult<Connection> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    // A second CLI invocation may hold the write lock for a moment.
    conn.pragma_update(None, "busy_timeout", 5_000_i32)?;

    let found = read_version(&conn)?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(SCHEMA)?;
    if found < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        debug!(origin = %origin.display(), from = found, to = SCHEMA_VERSION, "schema stamped");
    }
    Ok(conn)
}

fn read_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}
