//! Time utilities: elapsed-seconds formatting for the duty timer.

/// `HH:MM:SS`, hours not capped at 24.
pub fn format_seconds(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let s = secs.abs();
    format!("{}{:02}:{:02}:{:02}", sign, s / 3600, (s % 3600) / 60, s % 60)
}

/// Text progress bar, e.g. `[#####-----]`.
pub fn progress_bar(elapsed: i64, limit: i64, width: usize) -> String {
    let ratio = if limit <= 0 {
        1.0
    } else {
        (elapsed.max(0) as f64 / limit as f64).min(1.0)
    };
    let filled = (ratio * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
