use crate::config::Config;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::{queue, store};
use crate::errors::{AppError, AppResult};
use crate::models::sync::SyncQueueEntry;
use crate::models::table::Table;
use crate::utils::prompt::ensure_writable;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::FileOptions;

/// Single structured document holding the whole local store.
#[derive(Debug, Serialize)]
pub struct BackupDocument {
    pub app: &'static str,
    pub version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub owner_id: String,
    pub tables: BTreeMap<&'static str, Vec<Value>>,
    pub pending_sync: Vec<SyncQueueEntry>,
}

impl BackupDocument {
    pub fn collect(pool: &DbPool, owner_id: &str) -> AppResult<Self> {
        let mut tables = BTreeMap::new();
        for table in Table::ALL {
            let mut rows = Vec::new();
            for record in store::get_all(&pool.conn, table)? {
                rows.push(record.to_json()?);
            }
            tables.insert(table.name(), rows);
        }

        Ok(Self {
            app: "fleetlog",
            version: env!("CARGO_PKG_VERSION"),
            generated_at: Utc::now(),
            owner_id: owner_id.to_string(),
            tables,
            pending_sync: queue::list_pending(&pool.conn)?,
        })
    }

    pub fn record_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

pub struct BackupLogic;

impl BackupLogic {
    /// Write the backup document to `dest_file` (optionally zipped).
    /// Returns the path actually written.
    pub fn backup(
        pool: &mut DbPool,
        cfg: &Config,
        dest_file: &str,
        compress: bool,
        force: bool,
    ) -> AppResult<PathBuf> {
        let dest = Path::new(dest_file);

        // 1️⃣ Ensure destination folder exists
        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // 2️⃣ Overwrite guard
        let final_path = if compress {
            dest.with_extension("zip")
        } else {
            dest.to_path_buf()
        };
        ensure_writable(&final_path, force)?;

        // 3️⃣ Collect + serialize
        let doc = BackupDocument::collect(pool, &cfg.owner_id)?;
        let json = serde_json::to_vec_pretty(&doc)?;

        // 4️⃣ Write (plain or zip)
        if compress {
            write_zip(&final_path, dest, &json)?;
        } else {
            fs::write(&final_path, &json)?;
        }

        // 5️⃣ Log in DB
        ttlog_quiet(
            &pool.conn,
            "backup",
            &final_path.to_string_lossy(),
            &format!(
                "Backup of {} records{}",
                doc.record_count(),
                if compress { " (compressed)" } else { "" }
            ),
        );

        Ok(final_path)
    }
}

/// Store `json` inside a zip archive, named after the uncompressed file.
fn write_zip(zip_path: &Path, inner: &Path, json: &[u8]) -> AppResult<()> {
    let file = fs::File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);

    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let inner_name = inner
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "fleetlog-backup.json".to_string());

    zip.start_file(inner_name, options)
        .map_err(|e| AppError::Export(format!("zip: {e}")))?;
    zip.write_all(json)?;
    zip.finish()
        .map_err(|e| AppError::Export(format!("zip: {e}")))?;

    Ok(())
}
