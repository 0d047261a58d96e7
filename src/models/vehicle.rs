use super::table::{Record, RecordPayload, Table, new_id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub plate: String,
    pub model: String,
    pub year: i32,
    pub odometer_km: u32,
    pub axles: u8,
    pub default_cargo_type: String,
    pub owner_id: String,
}

impl Vehicle {
    pub fn new(
        plate: &str,
        model: &str,
        year: i32,
        odometer_km: u32,
        axles: u8,
        default_cargo_type: &str,
        owner_id: &str,
    ) -> Self {
        Self {
            id: new_id(),
            plate: Self::normalize_plate(plate),
            model: model.trim().to_string(),
            year,
            odometer_km,
            axles,
            default_cargo_type: default_cargo_type.trim().to_string(),
            owner_id: owner_id.to_string(),
        }
    }

    /// Plates compare case-insensitively and without surrounding blanks.
    pub fn normalize_plate(plate: &str) -> String {
        plate.trim().to_uppercase()
    }

    pub fn same_plate(&self, other: &str) -> bool {
        Self::normalize_plate(&self.plate) == Self::normalize_plate(other)
    }
}

impl Record for Vehicle {
    const TABLE: Table = Table::Vehicles;

    fn id(&self) -> &str {
        &self.id
    }

    fn into_payload(self) -> RecordPayload {
        RecordPayload::Vehicles(self)
    }
}
