pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod scope;
pub mod scoped;

pub use error::StoreError;
pub use scope::{AuthScope, Resource};
pub use scoped::Page;

use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Budget for one store call: waiting for the connection plus running it.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// VM steps between deadline checks while a statement runs.
const PROGRESS_STEPS: i32 = 1000;
const LOCK_RETRY: Duration = Duration::from_millis(2);

pub struct Database {
    conn: Mutex<Connection>,
    query_timeout: Duration,
}

impl Database {
    pub fn open(path: &Path, query_timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let db = Self::init(conn, query_timeout)?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open_in_memory_with_timeout(DEFAULT_QUERY_TIMEOUT)
    }

    pub fn open_in_memory_with_timeout(query_timeout: Duration) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, query_timeout)
    }

    fn init(conn: Connection, query_timeout: Duration) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(query_timeout)?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            query_timeout,
        })
    }

    /// Run `f` against the connection within `query_timeout`. Past the
    /// deadline the call fails with `Timeout`: either it never got the
    /// connection, or SQLite interrupted the statement and rolled it back.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let deadline = Instant::now() + self.query_timeout;
        let conn = self.lock_until(deadline)?;

        conn.progress_handler(PROGRESS_STEPS, Some(move || Instant::now() >= deadline));
        let result = f(&conn);
        conn.progress_handler(PROGRESS_STEPS, None::<fn() -> bool>);

        result.map_err(|e| match e {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::OperationInterrupted =>
            {
                warn!("statement interrupted after {:?}", self.query_timeout);
                StoreError::Timeout
            }
            other => other,
        })
    }

    fn lock_until(&self, deadline: Instant) -> Result<MutexGuard<'_, Connection>, StoreError> {
        loop {
            match self.conn.try_lock() {
                Ok(conn) => return Ok(conn),
                Err(TryLockError::Poisoned(_)) => return Err(StoreError::LockPoisoned),
                Err(TryLockError::WouldBlock) if Instant::now() >= deadline => {
                    warn!("connection busy for {:?}", self.query_timeout);
                    return Err(StoreError::Timeout);
                }
                Err(TryLockError::WouldBlock) => thread::sleep(LOCK_RETRY),
            }
        }
    }

    /// Round-trip a trivial statement; used by the health check.
    pub fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}
