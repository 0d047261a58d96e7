use super::table::{Record, RecordPayload, Table, new_id};
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "scheduled",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub agreed_price: f64,
    pub commission_pct: f64,
    pub commission_value: f64, // sempre agreed_price * commission_pct / 100
    pub cargo_type: String,
    pub date: NaiveDate,
    pub status: TripStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub owner_id: String,
}

impl Trip {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        origin: &str,
        destination: &str,
        distance_km: f64,
        agreed_price: f64,
        commission_pct: f64,
        cargo_type: &str,
        date: NaiveDate,
        owner_id: &str,
    ) -> Self {
        let mut trip = Self {
            id: new_id(),
            origin: origin.trim().to_string(),
            destination: destination.trim().to_string(),
            distance_km,
            agreed_price,
            commission_pct,
            commission_value: 0.0,
            cargo_type: cargo_type.trim().to_string(),
            date,
            status: TripStatus::Scheduled,
            notes: None,
            owner_id: owner_id.to_string(),
        };
        trip.recompute_commission();
        trip
    }

    pub fn recompute_commission(&mut self) {
        let value = self.agreed_price * self.commission_pct / 100.0;
        self.commission_value = (value * 100.0).round() / 100.0;
    }

    /// Price left to the fleet once the driver commission is paid.
    pub fn net_revenue(&self) -> f64 {
        self.agreed_price - self.commission_value
    }
}

impl Record for Trip {
    const TABLE: Table = Table::Trips;

    fn id(&self) -> &str {
        &self.id
    }

    fn into_payload(self) -> RecordPayload {
        RecordPayload::Trips(self)
    }
}
