//! Driving / rest timer.
//!
//! The timer owns no clock: every call receives `now` from the caller, and
//! elapsed time is always recomputed as `now - started_at`. Only
//! [`DutyTimer::transition`] changes the mode; thresholds just raise alerts.

use crate::models::duty_log::{DutyKind, DutyLog};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyMode {
    Idle,
    Driving,
    Resting,
}

impl DutyMode {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DutyMode::Idle => "idle",
            DutyMode::Driving => "driving",
            DutyMode::Resting => "resting",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(DutyMode::Idle),
            "driving" => Some(DutyMode::Driving),
            "resting" => Some(DutyMode::Resting),
            _ => None,
        }
    }

    /// The log kind produced when this mode ends (`None` for Idle).
    pub fn log_kind(&self) -> Option<DutyKind> {
        match self {
            DutyMode::Idle => None,
            DutyMode::Driving => Some(DutyKind::Driving),
            DutyMode::Resting => Some(DutyKind::Resting),
        }
    }
}

impl fmt::Display for DutyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// Regulatory thresholds, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyLimits {
    pub driving_limit_secs: i64,
    pub rest_target_secs: i64,
}

impl Default for DutyLimits {
    fn default() -> Self {
        Self {
            driving_limit_secs: 19_800,
            rest_target_secs: 1_800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DrivingLimitReached,
    RestComplete,
}

/// One-shot threshold notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Alert {
    fn driving_limit(limit_secs: i64) -> Self {
        Self {
            kind: AlertKind::DrivingLimitReached,
            title: "Driving limit reached".into(),
            message: format!(
                "You have been driving for {}. Stop and take a rest.",
                crate::utils::time::format_seconds(limit_secs)
            ),
            severity: Severity::Warning,
        }
    }

    fn rest_complete(target_secs: i64) -> Self {
        Self {
            kind: AlertKind::RestComplete,
            title: "Rest complete".into(),
            message: format!(
                "{} of rest done. You may resume driving.",
                crate::utils::time::format_seconds(target_secs)
            ),
            severity: Severity::Info,
        }
    }
}

/// Receives threshold alerts, decoupled from how they are rendered.
pub trait Notifier {
    fn notify(&self, alert: &Alert);
}

/// Result of a transition request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransitionOutcome {
    /// Session closed by the transition (≥ 1 s).
    pub log: Option<DutyLog>,
    /// Alert whose threshold was crossed before the transition.
    pub alert: Option<Alert>,
    /// False for same-mode requests, which are ignored.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DutyTimer {
    pub mode: DutyMode,
    pub started_at: Option<DateTime<Utc>>,
    pub driving_alert_fired: bool,
    pub rest_alert_fired: bool,
    pub limits: DutyLimits,
}

impl DutyTimer {
    pub fn new(limits: DutyLimits) -> Self {
        Self {
            mode: DutyMode::Idle,
            started_at: None,
            driving_alert_fired: false,
            rest_alert_fired: false,
            limits,
        }
    }

    /// Seconds spent in the current mode (0 while idle, never negative).
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        match (self.mode, self.started_at) {
            (DutyMode::Idle, _) | (_, None) => 0,
            (_, Some(start)) => (now - start).num_seconds().max(0),
        }
    }

    /// Seconds left before the current threshold (`None` while idle).
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        let limit = match self.mode {
            DutyMode::Idle => return None,
            DutyMode::Driving => self.limits.driving_limit_secs,
            DutyMode::Resting => self.limits.rest_target_secs,
        };
        Some((limit - self.elapsed_secs(now)).max(0))
    }

    /// Re-evaluate thresholds at `now`. Each alert fires once per entry into
    /// its mode.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Alert> {
        let elapsed = self.elapsed_secs(now);
        match self.mode {
            DutyMode::Driving
                if !self.driving_alert_fired && elapsed >= self.limits.driving_limit_secs =>
            {
                self.driving_alert_fired = true;
                Some(Alert::driving_limit(self.limits.driving_limit_secs))
            }
            DutyMode::Resting
                if !self.rest_alert_fired && elapsed >= self.limits.rest_target_secs =>
            {
                self.rest_alert_fired = true;
                Some(Alert::rest_complete(self.limits.rest_target_secs))
            }
            _ => None,
        }
    }

    /// Move to `to` at `now`.
    ///
    /// Leaving Driving or Resting closes the session into a [`DutyLog`] when
    /// it lasted at least one second. Entering Driving or Resting restarts
    /// the clock and re-arms both alerts. Same-mode requests are no-ops.
    pub fn transition(
        &mut self,
        to: DutyMode,
        now: DateTime<Utc>,
        owner_id: &str,
    ) -> TransitionOutcome {
        if to == self.mode {
            return TransitionOutcome::default();
        }

        let alert = self.tick(now);

        let log = match (self.mode.log_kind(), self.started_at) {
            (Some(kind), Some(start)) => DutyLog::from_session(kind, start, now, owner_id),
            _ => None,
        };

        self.mode = to;
        self.driving_alert_fired = false;
        self.rest_alert_fired = false;
        self.started_at = match to {
            DutyMode::Idle => None,
            DutyMode::Driving | DutyMode::Resting => Some(now),
        };

        TransitionOutcome {
            log,
            alert,
            changed: true,
        }
    }
}
