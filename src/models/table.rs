use crate::errors::{AppError, AppResult};
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The record tables mirrored between the device and the remote store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Trips,
    Expenses,
    Vehicles,
    #[value(name = "maintenance")]
    MaintenanceItems,
    #[value(name = "duty-logs")]
    DutyLogs,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Trips,
        Table::Expenses,
        Table::Vehicles,
        Table::MaintenanceItems,
        Table::DutyLogs,
    ];

    /// SQLite table name, identical to the remote table name.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Trips => "trips",
            Table::Expenses => "expenses",
            Table::Vehicles => "vehicles",
            Table::MaintenanceItems => "maintenance_items",
            Table::DutyLogs => "duty_logs",
        }
    }

    pub fn from_name(s: &str) -> AppResult<Self> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| AppError::InvalidTable(s.to_string()))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record persisted in one of the local tables.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const TABLE: Table;

    fn id(&self) -> &str;

    /// Wrap the record into the queue payload union.
    fn into_payload(self) -> RecordPayload;
}

/// Generate a fresh record id (used as idempotency key on the remote side).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// One record of any known table, typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "record", rename_all = "snake_case")]
pub enum RecordPayload {
    Trips(super::trip::Trip),
    Expenses(super::expense::Expense),
    Vehicles(super::vehicle::Vehicle),
    MaintenanceItems(super::maintenance::MaintenanceItem),
    DutyLogs(super::duty_log::DutyLog),
}

impl RecordPayload {
    pub fn table(&self) -> Table {
        match self {
            RecordPayload::Trips(_) => Table::Trips,
            RecordPayload::Expenses(_) => Table::Expenses,
            RecordPayload::Vehicles(_) => Table::Vehicles,
            RecordPayload::MaintenanceItems(_) => Table::MaintenanceItems,
            RecordPayload::DutyLogs(_) => Table::DutyLogs,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RecordPayload::Trips(r) => r.id(),
            RecordPayload::Expenses(r) => r.id(),
            RecordPayload::Vehicles(r) => r.id(),
            RecordPayload::MaintenanceItems(r) => r.id(),
            RecordPayload::DutyLogs(r) => r.id(),
        }
    }

    /// The bare record body as it should appear remotely.
    pub fn to_json(&self) -> AppResult<serde_json::Value> {
        let v = match self {
            RecordPayload::Trips(r) => serde_json::to_value(r)?,
            RecordPayload::Expenses(r) => serde_json::to_value(r)?,
            RecordPayload::Vehicles(r) => serde_json::to_value(r)?,
            RecordPayload::MaintenanceItems(r) => serde_json::to_value(r)?,
            RecordPayload::DutyLogs(r) => serde_json::to_value(r)?,
        };
        Ok(v)
    }

    /// Rebuild a payload from a table name and a stored JSON body.
    pub fn from_json(table: Table, body: &str) -> AppResult<Self> {
        let p = match table {
            Table::Trips => RecordPayload::Trips(serde_json::from_str(body)?),
            Table::Expenses => RecordPayload::Expenses(serde_json::from_str(body)?),
            Table::Vehicles => RecordPayload::Vehicles(serde_json::from_str(body)?),
            Table::MaintenanceItems => {
                RecordPayload::MaintenanceItems(serde_json::from_str(body)?)
            }
            Table::DutyLogs => RecordPayload::DutyLogs(serde_json::from_str(body)?),
        };
        Ok(p)
    }
}
