//! SQLite connection wrapper (lightweight for CLI usage).

use crate::db::initialize::init_db;
use crate::errors::AppResult;
use rusqlite::{Connection, Result};
use std::path::Path;
use std::time::Duration;

/// How long a writer waits when `sync watch` and another command hit the file together.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(Path::new(path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Open the database and bring the schema up to date.
    pub fn open(path: &str) -> AppResult<Self> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let pool = Self::new(path)?;
        init_db(&pool.conn)?;
        Ok(pool)
    }

    /// Private in-memory database with the full schema (tests, dry runs).
    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self { conn })
    }
}
