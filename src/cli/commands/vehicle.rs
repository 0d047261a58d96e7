use crate::cli::parser::VehicleAction;
use crate::core::context::AppContext;
use crate::core::fleet::FleetLogic;
use crate::db::store;
use crate::errors::AppResult;
use crate::models::sync::SyncStatus;
use crate::models::table::Table;
use crate::models::vehicle::Vehicle;
use crate::ui::messages::{info, success};
use crate::utils::colors::{RESET, color_for_sync};
use crate::utils::formatting::short_id;
use crate::utils::prompt::ask_confirmation;
use crate::utils::table::{Column, TextTable};

pub fn handle(action: &VehicleAction, ctx: &mut AppContext) -> AppResult<()> {
    let owner = ctx.owner().to_string();

    match action {
        VehicleAction::Add {
            plate,
            model,
            year,
            odometer,
            axles,
            cargo,
        } => {
            let vehicle = FleetLogic::add_vehicle(
                &mut ctx.pool,
                Vehicle::new(plate, model, *year, *odometer, *axles, cargo, &owner),
            )?;
            success(format!(
                "Vehicle {} ({} {}) registered ({})",
                vehicle.plate,
                vehicle.model,
                vehicle.year,
                short_id(&vehicle.id)
            ));
        }

        VehicleAction::List => {
            let vehicles = FleetLogic::vehicles(&ctx.pool, &owner)?;
            if vehicles.is_empty() {
                info("No vehicles registered.");
                return Ok(());
            }

            let mut table = TextTable::new(vec![
                Column::new("ID", 8),
                Column::new("PLATE", 10),
                Column::new("MODEL", 20),
                Column::new("YEAR", 4),
                Column::new("ODOMETER", 10),
                Column::new("AXLES", 5),
                Column::new("CARGO", 12),
                Column::new("SYNC", 7),
            ]);

            for v in &vehicles {
                let state = store::sync_state(&ctx.pool.conn, Table::Vehicles, &v.id)?
                    .unwrap_or(SyncStatus::Pending);
                table.add_row(vec![
                    short_id(&v.id).to_string(),
                    v.plate.clone(),
                    v.model.clone(),
                    v.year.to_string(),
                    format!("{} km", v.odometer_km),
                    v.axles.to_string(),
                    v.default_cargo_type.clone(),
                    format!("{}{}{}", color_for_sync(state), state.to_db_str(), RESET),
                ]);
            }

            print!("{}", table.render());
        }

        VehicleAction::Odometer { vehicle, km } => {
            let current = FleetLogic::find_vehicle(&ctx.pool, &owner, vehicle)?;
            let updated = FleetLogic::update_odometer(&mut ctx.pool, &current.id, *km)?;
            success(format!(
                "{}: odometer {} → {} km",
                updated.plate, current.odometer_km, updated.odometer_km
            ));
        }

        VehicleAction::Del { vehicle, yes } => {
            let v = FleetLogic::find_vehicle(&ctx.pool, &owner, vehicle)?;
            if !*yes && !ask_confirmation(&format!("Delete vehicle {}?", v.plate)) {
                info("Cancelled.");
                return Ok(());
            }
            FleetLogic::delete(&mut ctx.pool, Table::Vehicles, &v.id)?;
            success(format!("Vehicle {} deleted", v.plate));
        }
    }

    Ok(())
}
