//! SQLite storage of the cookie grants.

use std::{path::Path, sync::Mutex};

use log::info;
use rusqlite::{Connection, ErrorCode, params};

use crate::cookies::LedgerError;

/// A cookie given by `from_user` to `to_user` during `release`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieGrant {
    pub from_user: String,
    pub to_user: String,
    /// Version of the release cycle, e.g. `38`
    pub release: String,
}

/// Append-only table of grants.
///
/// The connection is only locked for a single statement at a time.
pub struct CookieStore {
    conn: Mutex<Connection>,
}

impl CookieStore {
    /// Opens or creates the database at `path`.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = Self::from_connection(conn)?;
        info!("cookie database opened at {}", path.display());
        Ok(store)
    }

    /// Opens a database living in memory only.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, LedgerError> {
        migrate(&conn)?;
        Ok(CookieStore {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| LedgerError::Poisoned)?;
        Ok(f(&conn)?)
    }

    /// Whether this exact grant was already recorded.
    pub fn has_grant(&self, grant: &CookieGrant) -> Result<bool, LedgerError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM cookies WHERE from_user = ?1 AND to_user = ?2 AND release = ?3)",
                params![grant.from_user, grant.to_user, grant.release],
                |row| row.get(0),
            )
        })
    }

    /// Records a grant.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DuplicateGrant`] when the grant already exists.
    pub fn insert_grant(&self, grant: &CookieGrant) -> Result<(), LedgerError> {
        let result = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cookies (from_user, to_user, release) VALUES (?1, ?2, ?3)",
                params![grant.from_user, grant.to_user, grant.release],
            )
        });

        match result {
            Ok(_) => Ok(()),
            Err(LedgerError::Storage(rusqlite::Error::SqliteFailure(error, _)))
                if error.code == ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::DuplicateGrant)
            }
            Err(e) => Err(e),
        }
    }

    /// Number of cookies `user` received, all releases included.
    pub fn count_for(&self, user: &str) -> Result<u64, LedgerError> {
        let count: i64 = self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM cookies WHERE to_user = ?1",
                params![user],
                |row| row.get(0),
            )
        })?;
        Ok(count.unsigned_abs())
    }
}

fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cookies (
            from_user   TEXT NOT NULL,
            to_user     TEXT NOT NULL,
            release     TEXT NOT NULL,
            UNIQUE(from_user, to_user, release)
        );

        CREATE INDEX IF NOT EXISTS idx_cookies_to_user
            ON cookies(to_user);
        ",
    )
}
