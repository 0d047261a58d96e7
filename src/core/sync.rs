//! Reconciliation driver: drains the sync queue into the remote store.

use crate::config::Config;
use crate::core::remote::RemoteStore;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::{queue, store};
use crate::errors::{AppError, AppResult};
use crate::models::sync::{SyncAction, SyncPayload, SyncQueueEntry};
use crate::models::table::Table;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration as StdDuration, Instant};

/// Bounded exponential backoff between attempts of the same entry.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::seconds(5),
            max: Duration::minutes(15),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        let base = Duration::seconds(cfg.retry_base_secs.max(1) as i64);
        let max = Duration::seconds(cfg.retry_max_secs as i64).max(base);
        Self { base, max }
    }

    /// Delay after the `failures`-th consecutive failure (1-based):
    /// base, 2·base, 4·base … capped at `max`.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(30);
        let factor = 1i32 << exp;
        self.base
            .checked_mul(factor)
            .map_or(self.max, |d| d.min(self.max))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Entries sent to the remote store in this pass.
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
    /// Entries still waiting for their backoff deadline, or held back behind
    /// an earlier entry of the same record.
    pub deferred: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted, {} synced, {} failed, {} deferred",
            self.attempted, self.synced, self.failed, self.deferred
        )
    }
}

pub struct Reconciler<'a> {
    remote: &'a dyn RemoteStore,
    policy: RetryPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(remote: &'a dyn RemoteStore, policy: RetryPolicy) -> Self {
        Self { remote, policy }
    }

    /// One pass over the entries that are due at `now`.
    pub fn drain(&self, pool: &mut DbPool, now: DateTime<Utc>) -> AppResult<SyncReport> {
        self.run(pool, now, false)
    }

    /// One pass over every pending entry, ignoring the backoff schedule.
    pub fn drain_forced(&self, pool: &mut DbPool, now: DateTime<Utc>) -> AppResult<SyncReport> {
        self.run(pool, now, true)
    }

    fn run(&self, pool: &mut DbPool, now: DateTime<Utc>, force: bool) -> AppResult<SyncReport> {
        // snapshot: entries queued while draining wait for the next pass
        let snapshot = queue::list_pending(&pool.conn)?;
        let mut report = SyncReport::default();

        // Records with an entry that failed or was deferred in this pass.
        // Their later entries must not overtake the earlier one.
        let mut held: HashSet<(Table, String)> = HashSet::new();

        for entry in snapshot {
            let key = (entry.table, entry.record_id().to_string());

            if held.contains(&key) || (!force && !entry.is_due(now)) {
                report.deferred += 1;
                held.insert(key);
                continue;
            }

            report.attempted += 1;

            match self.apply(&entry) {
                Ok(()) => {
                    confirm(pool, &entry)?;
                    report.synced += 1;
                    debug!(
                        "synced #{} {} {}/{}",
                        entry.id,
                        entry.action.to_db_str(),
                        entry.table,
                        key.1
                    );
                }
                Err(e) => {
                    let failures = entry.attempts + 1;
                    let next = now + self.policy.delay_for(failures);
                    queue::record_failure(&pool.conn, entry.id, &e.to_string(), next)?;
                    report.failed += 1;
                    held.insert(key);
                    warn!(
                        "sync of #{} ({} {}/{}) failed (attempt {}), retry after {}: {}",
                        entry.id,
                        entry.action.to_db_str(),
                        entry.table,
                        entry.record_id(),
                        failures,
                        next.to_rfc3339(),
                        e
                    );
                }
            }
        }

        if report.attempted > 0 {
            info!("sync pass: {report}");
            ttlog_quiet(&pool.conn, "sync", "", &report.to_string());
        }

        Ok(report)
    }

    /// Send every pending entry to the remote without touching the queue.
    /// Used with a `MemoryRemote` to show what a real pass would push.
    pub fn rehearse(&self, conn: &rusqlite::Connection) -> AppResult<SyncReport> {
        let mut report = SyncReport::default();
        let mut held: HashSet<(Table, String)> = HashSet::new();

        for entry in queue::list_pending(conn)? {
            let key = (entry.table, entry.record_id().to_string());
            if held.contains(&key) {
                report.deferred += 1;
                continue;
            }
            report.attempted += 1;
            match self.apply(&entry) {
                Ok(()) => report.synced += 1,
                Err(_) => {
                    report.failed += 1;
                    held.insert(key);
                }
            }
        }
        Ok(report)
    }

    fn apply(&self, entry: &SyncQueueEntry) -> AppResult<()> {
        let id = entry.record_id();
        match (entry.action, &entry.payload) {
            (SyncAction::Insert, SyncPayload::Record(p)) => {
                self.remote.insert(entry.table, &p.to_json()?)
            }
            (SyncAction::Update, SyncPayload::Record(p)) => {
                self.remote.update(entry.table, id, &p.to_json()?)
            }
            (SyncAction::Delete, _) => self.remote.delete(entry.table, id),
            (action, SyncPayload::Key { .. }) => Err(AppError::Other(format!(
                "queue entry #{} ({}) has no record body",
                entry.id,
                action.to_db_str()
            ))),
        }
    }
}

/// Remove the confirmed entry; flag the row as synced once nothing else is
/// pending for it.
fn confirm(pool: &mut DbPool, entry: &SyncQueueEntry) -> AppResult<()> {
    let tx = pool.conn.transaction()?;
    queue::mark_synced(&tx, entry.id)?;
    if entry.action != SyncAction::Delete
        && !queue::has_pending_for(&tx, entry.table, entry.record_id())?
    {
        store::mark_synced(&tx, entry.table, entry.record_id())?;
    }
    tx.commit()?;
    Ok(())
}

impl SyncReport {
    /// Every attempted entry failed: most likely the remote is down.
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failed == self.attempted
    }
}

/// What asked for a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Periodic,
    Connectivity,
}

/// Wait at most `within` for the remote to come back, polling every `poll`.
///
/// Returns `Connectivity` when an unreachable remote starts answering again.
/// A remote that answers from the start (failures were HTTP errors, not an
/// outage) gets the plain wait and `Periodic`.
pub fn wait_for_connectivity(
    remote: &dyn RemoteStore,
    within: StdDuration,
    poll: StdDuration,
) -> Trigger {
    if remote.is_reachable() {
        thread::sleep(within);
        return Trigger::Periodic;
    }

    let deadline = Instant::now() + within;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Trigger::Periodic;
        }
        thread::sleep(poll.min(left));

        if remote.is_reachable() {
            info!("remote store reachable again");
            return Trigger::Connectivity;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed(SyncReport),
    AlreadyRunning,
}

/// Serializes reconciliation passes: at most one drain in flight.
#[derive(Debug, Default)]
pub struct SyncScheduler {
    in_flight: AtomicBool,
}

struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run `drain` unless another pass is already in flight.
    pub fn trigger<F>(&self, trigger: Trigger, drain: F) -> AppResult<DrainOutcome>
    where
        F: FnOnce() -> AppResult<SyncReport>,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("{trigger:?} trigger ignored: a sync pass is already running");
            return Ok(DrainOutcome::AlreadyRunning);
        }
        let _guard = FlightGuard(&self.in_flight);

        debug!("sync pass started ({trigger:?})");
        drain().map(DrainOutcome::Completed)
    }
}
