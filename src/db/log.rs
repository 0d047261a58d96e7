use crate::errors::AppResult;
use chrono::Local;
use rusqlite::Connection;
use rusqlite::params;

/// Write an internal audit line into the `log` table.
pub fn ttlog(conn: &Connection, operation: &str, target: &str, message: &str) -> AppResult<()> {
    // Timestamp locale, formattato in ISO 8601
    let now = Local::now().to_rfc3339();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![now, operation, target, message])?;

    Ok(())
}

/// Same as [`ttlog`] but never fails: audit lines must not break the operation
/// that produced them.
pub fn ttlog_quiet(conn: &Connection, operation: &str, target: &str, message: &str) {
    if let Err(e) = ttlog(conn, operation, target, message) {
        log::warn!("failed to write audit log ({operation}): {e}");
    }
}

/// Load the audit log, oldest first.
pub fn load_log(conn: &Connection) -> AppResult<Vec<(i64, String, String, String, String)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, operation, target, message FROM log ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
