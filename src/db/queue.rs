//! Sync Queue: durable FIFO of mutations not yet confirmed by the remote store.

use crate::db::pool::DbPool;
use crate::db::store;
use crate::errors::{AppError, AppResult};
use crate::models::sync::{Mutation, SyncAction, SyncPayload, SyncQueueEntry, SyncStatus};
use crate::models::table::Table;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(col: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        col,
        rusqlite::types::Type::Text,
        Box::new(AppError::Other(msg)),
    )
}

fn parse_ts(col: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| conversion_error(col, format!("Invalid timestamp: {s}")))
}

fn map_row(row: &Row) -> rusqlite::Result<SyncQueueEntry> {
    let table_str: String = row.get("table_name")?;
    let table = Table::from_name(&table_str)
        .map_err(|_| conversion_error(1, format!("Invalid table: {table_str}")))?;

    let action_str: String = row.get("action")?;
    let action = SyncAction::from_db_str(&action_str)
        .ok_or_else(|| conversion_error(3, format!("Invalid action: {action_str}")))?;

    let payload_str: String = row.get("payload")?;
    let payload: SyncPayload = serde_json::from_str(&payload_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status_str: String = row.get("status")?;
    let status = SyncStatus::from_db_str(&status_str)
        .ok_or_else(|| conversion_error(5, format!("Invalid status: {status_str}")))?;

    let enqueued_str: String = row.get("enqueued_at")?;
    let next_str: Option<String> = row.get("next_attempt_at")?;

    Ok(SyncQueueEntry {
        id: row.get("id")?,
        table,
        action,
        payload,
        status,
        enqueued_at: parse_ts(6, &enqueued_str)?,
        attempts: row.get("attempts")?,
        last_error: row.get("last_error")?,
        next_attempt_at: next_str.as_deref().map(|s| parse_ts(9, s)).transpose()?,
    })
}

fn append(
    conn: &Connection,
    table: Table,
    action: SyncAction,
    payload: &SyncPayload,
    now: DateTime<Utc>,
) -> AppResult<i64> {
    let body = serde_json::to_string(payload)?;
    conn.prepare_cached(
        "INSERT INTO sync_queue (table_name, record_id, action, payload, status, enqueued_at)
         VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
    )?
    .execute(params![
        table.name(),
        payload.id(),
        action.to_db_str(),
        body,
        ts(now)
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Apply a mutation to its table and append the matching queue entry.
///
/// The table write always comes first; the caller owns the transaction.
pub fn enqueue_in(conn: &Connection, mutation: &Mutation, now: DateTime<Utc>) -> AppResult<i64> {
    let table = mutation.table();

    match mutation {
        Mutation::Insert(p) => {
            store::put(conn, p, SyncStatus::Pending)?;
            append(conn, table, SyncAction::Insert, &SyncPayload::Record(p.clone()), now)
        }
        Mutation::Update(p) => {
            if store::sync_state(conn, table, p.id())?.is_none() {
                return Err(AppError::not_found(table.name(), p.id()));
            }
            store::put(conn, p, SyncStatus::Pending)?;
            append(conn, table, SyncAction::Update, &SyncPayload::Record(p.clone()), now)
        }
        Mutation::Delete { id, .. } => {
            if !store::delete(conn, table, id)? {
                return Err(AppError::not_found(table.name(), id.as_str()));
            }
            let key = SyncPayload::Key { id: id.clone() };
            append(conn, table, SyncAction::Delete, &key, now)
        }
    }
}

/// Mutation path: table write + queue append, committed together.
pub fn enqueue(pool: &mut DbPool, mutation: Mutation) -> AppResult<i64> {
    let tx = pool.conn.transaction()?;
    let id = enqueue_in(&tx, &mutation, Utc::now())?;
    tx.commit()?;

    log::debug!(
        "queued {} {}/{} as #{id}",
        mutation.action().to_db_str(),
        mutation.table(),
        mutation.record_id()
    );
    Ok(id)
}

/// Pending entries, oldest first across all tables.
pub fn list_pending(conn: &Connection) -> AppResult<Vec<SyncQueueEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM sync_queue
         WHERE status = 'pending'
         ORDER BY enqueued_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn get_entry(conn: &Connection, queue_id: i64) -> AppResult<Option<SyncQueueEntry>> {
    let entry = conn
        .prepare_cached("SELECT * FROM sync_queue WHERE id = ?1")?
        .query_row([queue_id], map_row)
        .optional()?;
    Ok(entry)
}

/// Remove a confirmed entry. Calling it again for the same id is a no-op.
pub fn mark_synced(conn: &Connection, queue_id: i64) -> AppResult<bool> {
    let n = conn
        .prepare_cached("DELETE FROM sync_queue WHERE id = ?1")?
        .execute([queue_id])?;
    Ok(n > 0)
}

/// Keep the entry pending and schedule its next attempt.
pub fn record_failure(
    conn: &Connection,
    queue_id: i64,
    error: &str,
    next_attempt_at: DateTime<Utc>,
) -> AppResult<()> {
    conn.prepare_cached(
        "UPDATE sync_queue
         SET attempts = attempts + 1, last_error = ?2, next_attempt_at = ?3
         WHERE id = ?1",
    )?
    .execute(params![queue_id, error, ts(next_attempt_at)])?;
    Ok(())
}

pub fn pending_count(conn: &Connection) -> AppResult<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM sync_queue WHERE status = 'pending'",
        [],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Whether any pending entry still refers to the given record.
pub fn has_pending_for(conn: &Connection, table: Table, record_id: &str) -> AppResult<bool> {
    let exists = conn
        .prepare_cached(
            "SELECT 1 FROM sync_queue
             WHERE status = 'pending' AND table_name = ?1 AND record_id = ?2
             LIMIT 1",
        )?
        .exists(params![table.name(), record_id])?;
    Ok(exists)
}
