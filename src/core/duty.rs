//! Persistence around the duty timer: state row, session logs, history.

use crate::core::timer::{
    Alert, DutyLimits, DutyMode, DutyTimer, Notifier, TransitionOutcome,
};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::{queue, store};
use crate::errors::{AppError, AppResult};
use crate::models::duty_log::{DutyKind, DutyLog};
use crate::models::sync::Mutation;
use crate::models::table::Record;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, params};

/// Proof that the user confirmed a destructive clear.
///
/// The CLI builds it only after `--yes` or an explicit y/N answer.
#[derive(Debug)]
pub struct ClearConfirmation(());

impl ClearConfirmation {
    pub fn confirmed() -> Self {
        ClearConfirmation(())
    }
}

/// Daily totals, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DutyTotals {
    pub driving_secs: i64,
    pub resting_secs: i64,
}

pub struct DutyLogic;

impl DutyLogic {
    pub fn load_state(conn: &Connection, limits: DutyLimits) -> AppResult<DutyTimer> {
        let (mode_str, started, driving_fired, rest_fired): (String, Option<String>, bool, bool) =
            conn.query_row(
                "SELECT mode, started_at, driving_alert_fired, rest_alert_fired
                 FROM duty_state WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let mode = DutyMode::from_db_str(&mode_str).ok_or_else(|| AppError::InvalidValue {
            field: "duty_state.mode",
            value: mode_str.clone(),
        })?;

        let started_at = started
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|_| AppError::InvalidDate(s))
            })
            .transpose()?;

        Ok(DutyTimer {
            mode,
            started_at,
            driving_alert_fired: driving_fired,
            rest_alert_fired: rest_fired,
            limits,
        })
    }

    fn save_state(conn: &Connection, timer: &DutyTimer) -> AppResult<()> {
        conn.execute(
            "UPDATE duty_state
             SET mode = ?1, started_at = ?2, driving_alert_fired = ?3,
                 rest_alert_fired = ?4, updated_at = ?5
             WHERE id = 1",
            params![
                timer.mode.to_db_str(),
                timer
                    .started_at
                    // nanosecondi: il troncamento falserebbe le durate
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::Nanos, true)),
                timer.driving_alert_fired,
                timer.rest_alert_fired,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Apply a user-requested transition.
    ///
    /// State change and the closed session's DutyLog (through the mutation
    /// path) are committed together; the alert is delivered afterwards.
    pub fn transition(
        pool: &mut DbPool,
        limits: DutyLimits,
        to: DutyMode,
        now: DateTime<Utc>,
        owner_id: &str,
        notifier: &dyn Notifier,
    ) -> AppResult<TransitionOutcome> {
        let tx = pool.conn.transaction()?;
        let mut timer = Self::load_state(&tx, limits)?;
        let from = timer.mode;

        let outcome = timer.transition(to, now, owner_id);
        if !outcome.changed {
            return Ok(outcome);
        }

        if let Some(log) = &outcome.log {
            queue::enqueue_in(&tx, &Mutation::Insert(log.clone().into_payload()), now)?;
        }
        Self::save_state(&tx, &timer)?;

        let message = match &outcome.log {
            Some(log) => format!("{from} → {to} ({}s {})", log.duration_seconds, log.kind.as_str()),
            None => format!("{from} → {to}"),
        };
        ttlog_quiet(&tx, "duty", to.to_db_str(), &message);

        tx.commit()?;

        if let Some(alert) = &outcome.alert {
            notifier.notify(alert);
        }
        Ok(outcome)
    }

    /// Re-evaluate thresholds at `now`; persists the fired flag when an
    /// alert goes out.
    pub fn tick(
        pool: &mut DbPool,
        limits: DutyLimits,
        now: DateTime<Utc>,
        notifier: &dyn Notifier,
    ) -> AppResult<(DutyTimer, Option<Alert>)> {
        let mut timer = Self::load_state(&pool.conn, limits)?;
        let alert = timer.tick(now);

        if let Some(a) = &alert {
            Self::save_state(&pool.conn, &timer)?;
            notifier.notify(a);
        }
        Ok((timer, alert))
    }

    /// Logs of one owner, optionally limited to a calendar date, by start time.
    pub fn logs(conn: &Connection, owner_id: &str, date: Option<NaiveDate>) -> AppResult<Vec<DutyLog>> {
        let mut logs: Vec<DutyLog> = store::all_records::<DutyLog>(conn)?
            .into_iter()
            .filter(|l| l.owner_id == owner_id)
            .filter(|l| date.is_none_or(|d| l.date == d))
            .collect();
        logs.sort_by_key(|l| l.start_time);
        Ok(logs)
    }

    pub fn totals(logs: &[DutyLog]) -> DutyTotals {
        logs.iter().fold(DutyTotals::default(), |mut t, l| {
            match l.kind {
                DutyKind::Driving => t.driving_secs += l.duration_seconds,
                DutyKind::Resting => t.resting_secs += l.duration_seconds,
            }
            t
        })
    }

    /// Delete the owner's DutyLog rows (one date, or all of them).
    ///
    /// Local-only: other tables and the sync queue are left untouched.
    pub fn clear_history(
        pool: &mut DbPool,
        owner_id: &str,
        date: Option<NaiveDate>,
        _confirmation: ClearConfirmation,
    ) -> AppResult<usize> {
        let victims = Self::logs(&pool.conn, owner_id, date)?;
        let whole_table =
            date.is_none() && victims.len() as i64 == store::count(&pool.conn, DutyLog::TABLE)?;

        let tx = pool.conn.transaction()?;
        let mut removed = 0;
        if whole_table {
            removed = store::clear(&tx, DutyLog::TABLE)?;
        } else {
            for log in &victims {
                if store::delete(&tx, DutyLog::TABLE, &log.id)? {
                    removed += 1;
                }
            }
        }

        let scope = date.map_or_else(|| "all dates".to_string(), |d| d.to_string());
        ttlog_quiet(
            &tx,
            "duty_clear",
            &scope,
            &format!("Removed {removed} duty logs for {owner_id}"),
        );
        tx.commit()?;

        Ok(removed)
    }
}
