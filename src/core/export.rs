// src/core/export.rs

use crate::db::pool::DbPool;
use crate::db::store;
use crate::errors::{AppError, AppResult};
use crate::models::table::Table;
use crate::utils::prompt::ensure_writable;
use clap::ValueEnum;
use serde_json::Value;
use std::path::Path;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

pub struct ExportLogic;

impl ExportLogic {
    /// Export the owner's records of one table. Returns the number of rows.
    pub fn export(
        pool: &mut DbPool,
        owner_id: &str,
        table: Table,
        format: ExportFormat,
        file: &str,
        force: bool,
    ) -> AppResult<usize> {
        let path = Path::new(file);
        ensure_writable(path, force)?;

        let mut rows = Vec::new();
        for record in store::get_all(&pool.conn, table)? {
            let v = record.to_json()?;
            if v.get("owner_id").and_then(Value::as_str) == Some(owner_id) {
                rows.push(v);
            }
        }

        match format {
            ExportFormat::Json => std::fs::write(path, serde_json::to_string_pretty(&rows)?)?,
            ExportFormat::Csv => write_csv(path, &rows)?,
        }

        Ok(rows.len())
    }
}

/// Columns are the union of the record keys, in order of first appearance.
fn write_csv(path: &Path, rows: &[Value]) -> AppResult<()> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for k in map.keys() {
                if !columns.contains(k) {
                    columns.push(k.clone());
                }
            }
        }
    }

    let mut wtr = csv::Writer::from_path(path).map_err(|e| AppError::Export(e.to_string()))?;
    wtr.write_record(&columns)
        .map_err(|e| AppError::Export(e.to_string()))?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|c| match row.get(c) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            })
            .collect();
        wtr.write_record(&record)
            .map_err(|e| AppError::Export(e.to_string()))?;
    }

    wtr.flush()?;
    Ok(())
}
