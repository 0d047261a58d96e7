//! Formatting utilities used for CLI and export outputs.

pub fn money(v: f64) -> String {
    format!("{:.2}", v)
}

/// Short id for tables: the first 8 characters of a UUID are enough to tell
/// rows apart on screen.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn secs2readable(secs: i64) -> String {
    let abs_s = secs.abs();
    let hours = abs_s / 3600;
    let minutes = (abs_s % 3600) / 60;
    // es: 05h 30m
    format!("{:02}h {:02}m", hours, minutes)
}
