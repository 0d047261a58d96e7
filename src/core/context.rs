//! Process-wide context handed to every command handler.

use crate::config::Config;
use crate::core::sync::{RetryPolicy, SyncScheduler};
use crate::core::timer::{Alert, DutyLimits, Notifier, Severity};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};

/// Prints alerts on the terminal.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, alert: &Alert) {
        let line = format!("{}: {}", alert.title, alert.message);
        match alert.severity {
            Severity::Warning => warning(line),
            Severity::Info => success(line),
        }
        log::info!("alert fired: {:?}", alert.kind);
    }
}

/// Created once in `run()`, dropped at exit.
pub struct AppContext {
    pub cfg: Config,
    pub pool: DbPool,
    pub notifier: Box<dyn Notifier>,
    pub scheduler: SyncScheduler,
}

impl AppContext {
    pub fn open(cfg: Config) -> AppResult<Self> {
        let pool = DbPool::open(&cfg.database)?;
        Ok(Self::with_parts(cfg, pool, Box::new(ConsoleNotifier)))
    }

    pub fn with_parts(cfg: Config, pool: DbPool, notifier: Box<dyn Notifier>) -> Self {
        Self {
            cfg,
            pool,
            notifier,
            scheduler: SyncScheduler::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.cfg.owner_id
    }

    pub fn limits(&self) -> DutyLimits {
        DutyLimits {
            driving_limit_secs: self.cfg.driving_limit_secs,
            rest_target_secs: self.cfg.rest_target_secs,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.cfg)
    }
}
