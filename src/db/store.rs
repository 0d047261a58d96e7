//! Local Record Store: one key/value table per record type.
//!
//! Rows hold the JSON body of the record plus a `sync_state` marker. These
//! functions never touch `sync_queue`; the mutation path in `db::queue`
//! combines both writes in one transaction.

use crate::errors::AppResult;
use crate::models::sync::SyncStatus;
use crate::models::table::{Record, RecordPayload, Table};
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

fn now_str() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn upsert_raw(
    conn: &Connection,
    table: Table,
    id: &str,
    body: &str,
    state: SyncStatus,
) -> AppResult<()> {
    let sql = format!(
        "INSERT INTO {t} (id, data, sync_state, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             data = excluded.data,
             sync_state = excluded.sync_state,
             updated_at = excluded.updated_at",
        t = table.name()
    );
    conn.prepare_cached(&sql)?
        .execute(params![id, body, state.to_db_str(), now_str()])?;
    Ok(())
}

/// Upsert a record keyed by its id.
pub fn put(conn: &Connection, payload: &RecordPayload, state: SyncStatus) -> AppResult<()> {
    let body = serde_json::to_string(&payload.to_json()?)?;
    upsert_raw(conn, payload.table(), payload.id(), &body, state)
}

pub fn get(conn: &Connection, table: Table, id: &str) -> AppResult<Option<RecordPayload>> {
    let sql = format!("SELECT data FROM {} WHERE id = ?1", table.name());
    let body: Option<String> = conn
        .prepare_cached(&sql)?
        .query_row([id], |row| row.get(0))
        .optional()?;

    body.map(|b| RecordPayload::from_json(table, &b)).transpose()
}

/// All records of a table, in insertion order.
pub fn get_all(conn: &Connection, table: Table) -> AppResult<Vec<RecordPayload>> {
    let sql = format!("SELECT data FROM {} ORDER BY rowid ASC", table.name());
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(RecordPayload::from_json(table, &r?)?);
    }
    Ok(out)
}

/// Empty a table. Returns the number of removed rows.
pub fn clear(conn: &Connection, table: Table) -> AppResult<usize> {
    let n = conn.execute(&format!("DELETE FROM {}", table.name()), [])?;
    Ok(n)
}

/// Remove one record. Returns whether a row was deleted.
pub fn delete(conn: &Connection, table: Table, id: &str) -> AppResult<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
    let n = conn.prepare_cached(&sql)?.execute([id])?;
    Ok(n > 0)
}

pub fn get_record<R: Record>(conn: &Connection, id: &str) -> AppResult<Option<R>> {
    let sql = format!("SELECT data FROM {} WHERE id = ?1", R::TABLE.name());
    let body: Option<String> = conn
        .prepare_cached(&sql)?
        .query_row([id], |row| row.get(0))
        .optional()?;

    match body {
        Some(b) => Ok(Some(serde_json::from_str(&b)?)),
        None => Ok(None),
    }
}

pub fn all_records<R: Record>(conn: &Connection) -> AppResult<Vec<R>> {
    let sql = format!("SELECT data FROM {} ORDER BY rowid ASC", R::TABLE.name());
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(serde_json::from_str(&r?)?);
    }
    Ok(out)
}

/// Sync marker of a row, `None` when the row does not exist.
pub fn sync_state(conn: &Connection, table: Table, id: &str) -> AppResult<Option<SyncStatus>> {
    let sql = format!("SELECT sync_state FROM {} WHERE id = ?1", table.name());
    let state: Option<String> = conn
        .prepare_cached(&sql)?
        .query_row([id], |row| row.get(0))
        .optional()?;

    Ok(state.as_deref().and_then(SyncStatus::from_db_str))
}

/// Flip the row marker to `synced`. Missing rows are ignored.
pub fn mark_synced(conn: &Connection, table: Table, id: &str) -> AppResult<()> {
    let sql = format!(
        "UPDATE {} SET sync_state = 'synced' WHERE id = ?1",
        table.name()
    );
    conn.prepare_cached(&sql)?.execute([id])?;
    Ok(())
}

pub fn count(conn: &Connection, table: Table) -> AppResult<i64> {
    let n = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |row| {
        row.get(0)
    })?;
    Ok(n)
}

pub fn count_pending(conn: &Connection, table: Table) -> AppResult<i64> {
    let n = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE sync_state = 'pending'",
            table.name()
        ),
        [],
        |row| row.get(0),
    )?;
    Ok(n)
}
