use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

pub mod migrate; // use submodule at src/config/migrate.rs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_owner_id")]
    pub owner_id: String,

    // ---- remote store ----
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub remote_api_key: Option<String>,
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout_secs: u64,

    // ---- reconciliation ----
    #[serde(default = "default_retry_base")]
    pub retry_base_secs: u64,
    #[serde(default = "default_retry_max")]
    pub retry_max_secs: u64,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    // ---- duty timer ----
    #[serde(default = "default_driving_limit")]
    pub driving_limit_secs: i64,
    #[serde(default = "default_rest_target")]
    pub rest_target_secs: i64,
}

pub(crate) fn default_owner_id() -> String {
    "local-driver".to_string()
}
pub(crate) fn default_remote_timeout() -> u64 {
    10
}
pub(crate) fn default_retry_base() -> u64 {
    5
}
pub(crate) fn default_retry_max() -> u64 {
    900
}
pub(crate) fn default_sync_interval() -> u64 {
    60
}
pub(crate) fn default_driving_limit() -> i64 {
    19_800 // 5h30m
}
pub(crate) fn default_rest_target() -> i64 {
    1_800 // 30m
}

impl Default for Config {
    fn default() -> Self {
        let db_path = Self::database_file();
        Self {
            database: db_path.to_string_lossy().to_string(),
            owner_id: default_owner_id(),
            remote_url: None,
            remote_api_key: None,
            remote_timeout_secs: default_remote_timeout(),
            retry_base_secs: default_retry_base(),
            retry_max_secs: default_retry_max(),
            sync_interval_secs: default_sync_interval(),
            driving_limit_secs: default_driving_limit(),
            rest_target_secs: default_rest_target(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("fleetlog")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".fleetlog")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("fleetlog.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("fleetlog.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_yaml::from_str(&content).map_err(|e| {
                AppError::Config(format!("cannot parse {}: {}", path.display(), e))
            })
        } else {
            Ok(Config::default())
        }
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs.max(1))
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_db: Option<String>, owner: Option<String>, is_test: bool) -> io::Result<Self> {
        let dir = Self::config_dir();
        if !is_test {
            fs::create_dir_all(&dir)?;
        }

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_db {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            Self::database_file()
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            owner_id: owner.unwrap_or_else(default_owner_id),
            ..Config::default()
        };

        // Write config file
        if !is_test {
            let yaml = serde_yaml::to_string(&config)
                .map_err(|e| io::Error::other(format!("cannot serialize config: {e}")))?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        Ok(config)
    }
}
