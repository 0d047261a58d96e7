/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

use crate::models::sync::SyncStatus;

/// Pending rows in yellow, synced rows greyed out.
pub fn color_for_sync(state: SyncStatus) -> &'static str {
    match state {
        SyncStatus::Pending => YELLOW,
        SyncStatus::Synced => GREY,
    }
}

/// Ritorna formattazione colorata di un valore opzionale.
///
/// Esempio:
/// `colorize_optional("")` → "<grey>--<reset>"
pub fn colorize_optional(value: &str) -> String {
    if value.trim().is_empty() {
        format!("{GREY}--{RESET}")
    } else {
        value.to_string()
    }
}

/// Green while under `limit`, yellow in the last 10%, red once reached.
pub fn color_for_progress(elapsed: i64, limit: i64) -> &'static str {
    if limit <= 0 || elapsed >= limit {
        RED
    } else if elapsed * 10 >= limit * 9 {
        YELLOW
    } else {
        GREEN
    }
}
