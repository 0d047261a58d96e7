use super::table::{Record, RecordPayload, Table, new_id};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// A part or service bought for a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceItem {
    pub id: String,
    pub name: String,
    pub vehicle_id: String,
    pub odometer_km: u32,
    pub warranty_months: u32,
    pub purchase_date: NaiveDate,
    pub cost: f64,
    pub owner_id: String,
}

impl MaintenanceItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        vehicle_id: &str,
        odometer_km: u32,
        warranty_months: u32,
        purchase_date: NaiveDate,
        cost: f64,
        owner_id: &str,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.trim().to_string(),
            vehicle_id: vehicle_id.to_string(),
            odometer_km,
            warranty_months,
            purchase_date,
            cost,
            owner_id: owner_id.to_string(),
        }
    }

    /// Last day covered by the warranty (purchase date + warranty months).
    pub fn warranty_expires(&self) -> NaiveDate {
        self.purchase_date
            .checked_add_months(Months::new(self.warranty_months))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn warranty_expired(&self, today: NaiveDate) -> bool {
        self.warranty_expires() < today
    }
}

impl Record for MaintenanceItem {
    const TABLE: Table = Table::MaintenanceItems;

    fn id(&self) -> &str {
        &self.id
    }

    fn into_payload(self) -> RecordPayload {
        RecordPayload::MaintenanceItems(self)
    }
}
