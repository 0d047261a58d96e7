//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO / storage
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing / validation
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown table: {0}")]
    InvalidTable(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("A vehicle with plate {0} already exists")]
    DuplicatePlate(String),

    #[error("No {table} record with id {id}")]
    NotFound { table: String, id: String },

    // ---------------------------
    // Remote store
    // ---------------------------
    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Remote store answered {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Remote store is not configured (set remote_url in the config file)")]
    RemoteNotConfigured,

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    pub fn not_found(table: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::NotFound {
            table: table.into(),
            id: id.into(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Remote(format!("request timed out: {e}"))
        } else {
            AppError::Remote(e.to_string())
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
