use crate::models::table::Table;
use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists. Applied migrations are recorded there.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// One key/value table per record type: the JSON body plus the sync marker.
fn create_record_tables(conn: &Connection) -> Result<()> {
    for table in Table::ALL {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {t} (
                id          TEXT PRIMARY KEY NOT NULL,
                data        TEXT NOT NULL,
                sync_state  TEXT NOT NULL DEFAULT 'pending'
                            CHECK(sync_state IN ('pending','synced')),
                updated_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{t}_sync_state ON {t}(sync_state);
            "#,
            t = table.name()
        ))?;
    }
    Ok(())
}

fn create_sync_queue(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sync_queue (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            table_name   TEXT NOT NULL,
            record_id    TEXT NOT NULL,
            action       TEXT NOT NULL CHECK(action IN ('insert','update','delete')),
            payload      TEXT NOT NULL,
            status       TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending','synced')),
            enqueued_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sync_queue_order ON sync_queue(status, enqueued_at, id);
        CREATE INDEX IF NOT EXISTS idx_sync_queue_record ON sync_queue(table_name, record_id);
        "#,
    )?;
    Ok(())
}

fn add_retry_columns(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        ALTER TABLE sync_queue ADD COLUMN attempts INTEGER NOT NULL DEFAULT 0;
        ALTER TABLE sync_queue ADD COLUMN last_error TEXT;
        ALTER TABLE sync_queue ADD COLUMN next_attempt_at TEXT;
        "#,
    )?;
    Ok(())
}

fn create_duty_state(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS duty_state (
            id                   INTEGER PRIMARY KEY CHECK(id = 1),
            mode                 TEXT NOT NULL DEFAULT 'idle'
                                 CHECK(mode IN ('idle','driving','resting')),
            started_at           TEXT,
            driving_alert_fired  INTEGER NOT NULL DEFAULT 0,
            rest_alert_fired     INTEGER NOT NULL DEFAULT 0,
            updated_at           TEXT NOT NULL
        );

        INSERT OR IGNORE INTO duty_state (id, mode, updated_at)
        VALUES (1, 'idle', datetime('now'));
        "#,
    )?;
    Ok(())
}

type MigrationFn = fn(&Connection) -> Result<()>;

/// Ordered list of schema migrations: (version, description, body).
const MIGRATIONS: &[(&str, &str, MigrationFn)] = &[
    (
        "20250301_0001_create_record_tables",
        "Created record tables (trips, expenses, vehicles, maintenance_items, duty_logs)",
        create_record_tables,
    ),
    (
        "20250301_0002_create_sync_queue",
        "Created sync_queue table",
        create_sync_queue,
    ),
    (
        "20250412_0003_add_retry_columns",
        "Added attempts/last_error/next_attempt_at to sync_queue",
        add_retry_columns,
    ),
    (
        "20250520_0004_create_duty_state",
        "Created duty_state table",
        create_duty_state,
    ),
];

/// Public entry point: run all pending migrations.
///
/// Each migration and its `migration_applied` marker are committed together,
/// so an interrupted upgrade is retried from the failed step on next start.
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    for (version, message, apply) in MIGRATIONS {
        if is_applied(conn, version)? {
            continue;
        }

        conn.execute_batch("BEGIN;")?;
        let outcome = apply(conn).and_then(|_| mark_applied(conn, version, message));
        match outcome {
            Ok(()) => conn.execute_batch("COMMIT;")?,
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK;");
                return Err(e);
            }
        }

        log::debug!("migration applied: {version}");
    }

    Ok(())
}

/// Versions already recorded in the log table (used by `db --info`).
pub fn applied_versions(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Announce migrations applied during `init` / `db --migrate`.
pub fn report_applied(conn: &Connection) -> Result<()> {
    for version in applied_versions(conn)? {
        success(format!("Migration applied: {version}"));
    }
    Ok(())
}
