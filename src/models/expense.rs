use super::table::{Record, RecordPayload, Table, new_id};
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Fuel,
    Toll,
    Maintenance,
    Food,
    Lodging,
    Tires,
    Fines,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Fuel => "fuel",
            ExpenseCategory::Toll => "toll",
            ExpenseCategory::Maintenance => "maintenance",
            ExpenseCategory::Food => "food",
            ExpenseCategory::Lodging => "lodging",
            ExpenseCategory::Tires => "tires",
            ExpenseCategory::Fines => "fines",
            ExpenseCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    pub owner_id: String,
}

impl Expense {
    pub fn new(
        description: &str,
        amount: f64,
        category: ExpenseCategory,
        date: NaiveDate,
        trip_id: Option<String>,
        owner_id: &str,
    ) -> Self {
        Self {
            id: new_id(),
            description: description.trim().to_string(),
            amount,
            category,
            date,
            trip_id,
            owner_id: owner_id.to_string(),
        }
    }
}

impl Record for Expense {
    const TABLE: Table = Table::Expenses;

    fn id(&self) -> &str {
        &self.id
    }

    fn into_payload(self) -> RecordPayload {
        RecordPayload::Expenses(self)
    }
}
