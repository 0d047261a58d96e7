use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse an optional `YYYY-MM-DD` argument, defaulting to today.
pub fn parse_date_or_today(s: Option<&str>) -> AppResult<NaiveDate> {
    match s {
        None => Ok(today()),
        Some("today") => Ok(today()),
        Some(v) => parse_date(v).ok_or_else(|| AppError::InvalidDate(v.to_string())),
    }
}
