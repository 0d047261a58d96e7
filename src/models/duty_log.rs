use super::table::{Record, RecordPayload, Table, new_id};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyKind {
    Driving,
    Resting,
}

impl DutyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DutyKind::Driving => "driving",
            DutyKind::Resting => "resting",
        }
    }
}

/// A finished driving or resting session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyLog {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
    pub kind: DutyKind,
    pub date: NaiveDate, // ⇔ data locale di start_time
    pub owner_id: String,
}

impl DutyLog {
    /// Build the log for a session, or `None` when it lasted less than a second.
    pub fn from_session(
        kind: DutyKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        owner_id: &str,
    ) -> Option<Self> {
        let duration_seconds = (end - start).num_seconds();
        if duration_seconds < 1 {
            return None;
        }

        Some(Self {
            id: new_id(),
            start_time: start,
            end_time: end,
            duration_seconds,
            kind,
            date: start.with_timezone(&Local).date_naive(),
            owner_id: owner_id.to_string(),
        })
    }
}

impl Record for DutyLog {
    const TABLE: Table = Table::DutyLogs;

    fn id(&self) -> &str {
        &self.id
    }

    fn into_payload(self) -> RecordPayload {
        RecordPayload::DutyLogs(self)
    }
}
