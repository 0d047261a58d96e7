use super::table::{RecordPayload, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Insert,
    Update,
    Delete,
}

impl SyncAction {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SyncAction::Insert => "insert",
            SyncAction::Update => "update",
            SyncAction::Delete => "delete",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "insert" => Some(SyncAction::Insert),
            "update" => Some(SyncAction::Update),
            "delete" => Some(SyncAction::Delete),
            _ => None,
        }
    }
}

/// Marker stored both on queue entries and on table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Synced,
}

impl SyncStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SyncStatus::Pending),
            "synced" => Some(SyncStatus::Synced),
            _ => None,
        }
    }
}

/// What a queue entry carries: the full record, or just the id of a deleted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncPayload {
    Record(RecordPayload),
    Key { id: String },
}

impl SyncPayload {
    pub fn id(&self) -> &str {
        match self {
            SyncPayload::Record(r) => r.id(),
            SyncPayload::Key { id } => id,
        }
    }
}

/// A mutation requested by the presentation layer.
#[derive(Debug, Clone)]
pub enum Mutation {
    Insert(RecordPayload),
    Update(RecordPayload),
    Delete { table: Table, id: String },
}

impl Mutation {
    pub fn table(&self) -> Table {
        match self {
            Mutation::Insert(p) | Mutation::Update(p) => p.table(),
            Mutation::Delete { table, .. } => *table,
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            Mutation::Insert(p) | Mutation::Update(p) => p.id(),
            Mutation::Delete { id, .. } => id,
        }
    }

    pub fn action(&self) -> SyncAction {
        match self {
            Mutation::Insert(_) => SyncAction::Insert,
            Mutation::Update(_) => SyncAction::Update,
            Mutation::Delete { .. } => SyncAction::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncQueueEntry {
    pub id: i64,
    pub table: Table,
    pub action: SyncAction,
    pub payload: SyncPayload,
    pub status: SyncStatus,
    pub enqueued_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl SyncQueueEntry {
    pub fn record_id(&self) -> &str {
        self.payload.id()
    }

    /// Whether the retry schedule allows an attempt at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_attempt_at.is_none_or(|t| t <= now)
    }
}
