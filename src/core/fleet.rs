//! Business rules for trips, expenses, vehicles and maintenance items.

use crate::core::mutation::MutationLogic;
use crate::db::pool::DbPool;
use crate::db::store;
use crate::errors::{AppError, AppResult};
use crate::models::expense::Expense;
use crate::models::maintenance::MaintenanceItem;
use crate::models::table::{Record, Table};
use crate::models::trip::{Trip, TripStatus};
use crate::models::vehicle::Vehicle;

fn check_amount(field: &'static str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::InvalidAmount(format!("{field} = {value}")));
    }
    Ok(())
}

fn require<R: Record>(pool: &DbPool, id: &str) -> AppResult<R> {
    store::get_record::<R>(&pool.conn, id)?.ok_or_else(|| AppError::not_found(R::TABLE.name(), id))
}

pub struct FleetLogic;

impl FleetLogic {
    // ------------------------------------------------
    // Trips
    // ------------------------------------------------

    pub fn add_trip(pool: &mut DbPool, mut trip: Trip) -> AppResult<Trip> {
        check_amount("distance", trip.distance_km)?;
        check_amount("price", trip.agreed_price)?;
        if !(0.0..=100.0).contains(&trip.commission_pct) {
            return Err(AppError::InvalidValue {
                field: "commission",
                value: trip.commission_pct.to_string(),
            });
        }
        trip.recompute_commission();

        MutationLogic::insert(pool, trip.clone())?;
        Ok(trip)
    }

    pub fn set_trip_status(pool: &mut DbPool, id: &str, status: TripStatus) -> AppResult<Trip> {
        let mut trip: Trip = require(pool, id)?;
        trip.status = status;
        MutationLogic::update(pool, trip.clone())?;
        Ok(trip)
    }

    pub fn trips(pool: &DbPool, owner_id: &str) -> AppResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = store::all_records(&pool.conn)?;
        trips.retain(|t| t.owner_id == owner_id);
        trips.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(trips)
    }

    // ------------------------------------------------
    // Expenses
    // ------------------------------------------------

    pub fn add_expense(pool: &mut DbPool, expense: Expense) -> AppResult<Expense> {
        check_amount("amount", expense.amount)?;
        if let Some(trip_id) = &expense.trip_id {
            require::<Trip>(pool, trip_id)?;
        }

        MutationLogic::insert(pool, expense.clone())?;
        Ok(expense)
    }

    pub fn expenses(pool: &DbPool, owner_id: &str) -> AppResult<Vec<Expense>> {
        let mut expenses: Vec<Expense> = store::all_records(&pool.conn)?;
        expenses.retain(|e| e.owner_id == owner_id);
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    // ------------------------------------------------
    // Vehicles
    // ------------------------------------------------

    pub fn add_vehicle(pool: &mut DbPool, vehicle: Vehicle) -> AppResult<Vehicle> {
        let taken = Self::vehicles(pool, &vehicle.owner_id)?
            .iter()
            .any(|v| v.same_plate(&vehicle.plate));
        if taken {
            return Err(AppError::DuplicatePlate(vehicle.plate));
        }

        MutationLogic::insert(pool, vehicle.clone())?;
        Ok(vehicle)
    }

    /// Record a new odometer reading. Readings never go backwards.
    pub fn update_odometer(pool: &mut DbPool, id: &str, odometer_km: u32) -> AppResult<Vehicle> {
        let mut vehicle: Vehicle = require(pool, id)?;
        if odometer_km < vehicle.odometer_km {
            return Err(AppError::InvalidValue {
                field: "odometer",
                value: format!("{odometer_km} < current {}", vehicle.odometer_km),
            });
        }
        vehicle.odometer_km = odometer_km;
        MutationLogic::update(pool, vehicle.clone())?;
        Ok(vehicle)
    }

    pub fn vehicles(pool: &DbPool, owner_id: &str) -> AppResult<Vec<Vehicle>> {
        let mut vehicles: Vec<Vehicle> = store::all_records(&pool.conn)?;
        vehicles.retain(|v| v.owner_id == owner_id);
        vehicles.sort_by(|a, b| a.plate.cmp(&b.plate));
        Ok(vehicles)
    }

    /// Look a vehicle up by id or by plate.
    pub fn find_vehicle(pool: &DbPool, owner_id: &str, key: &str) -> AppResult<Vehicle> {
        if let Some(v) = Self::vehicles(pool, owner_id)?
            .into_iter()
            .find(|v| v.same_plate(key))
        {
            return Ok(v);
        }
        let id = Self::resolve_id(pool, Table::Vehicles, key)?;
        require(pool, &id)
    }

    // ------------------------------------------------
    // Maintenance
    // ------------------------------------------------

    pub fn add_maintenance(pool: &mut DbPool, item: MaintenanceItem) -> AppResult<MaintenanceItem> {
        check_amount("cost", item.cost)?;
        require::<Vehicle>(pool, &item.vehicle_id)?;

        MutationLogic::insert(pool, item.clone())?;
        Ok(item)
    }

    pub fn maintenance(
        pool: &DbPool,
        owner_id: &str,
        vehicle_id: Option<&str>,
    ) -> AppResult<Vec<MaintenanceItem>> {
        let mut items: Vec<MaintenanceItem> = store::all_records(&pool.conn)?;
        items.retain(|m| m.owner_id == owner_id && vehicle_id.is_none_or(|v| m.vehicle_id == v));
        items.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        Ok(items)
    }

    // ------------------------------------------------
    // Lookup
    // ------------------------------------------------

    /// Full id of the record whose id is `key` or starts with `key`
    /// (lists only show the first characters). Ambiguous prefixes fail.
    pub fn resolve_id(pool: &DbPool, table: Table, key: &str) -> AppResult<String> {
        if store::get(&pool.conn, table, key)?.is_some() {
            return Ok(key.to_string());
        }

        let mut matches: Vec<String> = store::get_all(&pool.conn, table)?
            .into_iter()
            .map(|p| p.id().to_string())
            .filter(|id| !key.is_empty() && id.starts_with(key))
            .collect();

        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(AppError::not_found(table.name(), key)),
            n => Err(AppError::InvalidValue {
                field: "id",
                value: format!("'{key}' matches {n} {table} records"),
            }),
        }
    }

    // ------------------------------------------------
    // Deletion
    // ------------------------------------------------

    /// Delete a record. A vehicle with maintenance items cannot be deleted.
    pub fn delete(pool: &mut DbPool, table: Table, id: &str) -> AppResult<i64> {
        if table == Table::Vehicles {
            let vehicle: Vehicle = require(pool, id)?;
            let items = Self::maintenance(pool, &vehicle.owner_id, Some(id))?;
            if !items.is_empty() {
                return Err(AppError::InvalidValue {
                    field: "vehicle",
                    value: format!(
                        "{} still has {} maintenance items",
                        vehicle.plate,
                        items.len()
                    ),
                });
            }
        }

        MutationLogic::delete(pool, table, id)
    }
}
