use crate::db::pool::DbPool;
use crate::db::{migrate, queue, store};
use crate::errors::AppResult;
use crate::models::table::Table;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) RECORDS PER TABLE
    //
    println!("{}• Records:{}", CYAN, RESET);
    for table in Table::ALL {
        let total = store::count(&pool.conn, table)?;
        let pending = store::count_pending(&pool.conn, table)?;
        let pending_fmt = if pending > 0 {
            format!("{YELLOW}{pending} not yet synced{RESET}")
        } else {
            format!("{GREY}all synced{RESET}")
        };
        println!(
            "    {:<18} {}{:>6}{}  ({})",
            table.name(),
            GREEN,
            total,
            RESET,
            pending_fmt
        );
    }

    //
    // 3) SYNC QUEUE
    //
    let pending = queue::pending_count(&pool.conn)?;
    let oldest: Option<String> = pool
        .conn
        .query_row(
            "SELECT enqueued_at FROM sync_queue WHERE status = 'pending'
             ORDER BY enqueued_at ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    println!(
        "{}• Sync queue:{} {}{}{} pending",
        CYAN, RESET, GREEN, pending, RESET
    );
    if let Some(o) = oldest {
        println!("    oldest: {}", o);
    }

    //
    // 4) SCHEMA
    //
    let versions = migrate::applied_versions(&pool.conn)?;
    let last = versions
        .last()
        .cloned()
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));
    println!(
        "{}• Schema:{} {} migrations, latest {}",
        CYAN,
        RESET,
        versions.len(),
        last
    );

    println!();
    Ok(())
}
