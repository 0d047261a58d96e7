use crate::cli::parser::MaintenanceAction;
use crate::core::context::AppContext;
use crate::core::fleet::FleetLogic;
use crate::errors::AppResult;
use crate::models::maintenance::MaintenanceItem;
use crate::models::table::Table;
use crate::ui::messages::{info, success};
use crate::utils::colors::{GREEN, RED, RESET};
use crate::utils::date::{parse_date_or_today, today};
use crate::utils::formatting::short_id;
use crate::utils::money;
use crate::utils::prompt::ask_confirmation;
use crate::utils::table::{Column, TextTable};
use std::collections::HashMap;

pub fn handle(action: &MaintenanceAction, ctx: &mut AppContext) -> AppResult<()> {
    let owner = ctx.owner().to_string();

    match action {
        MaintenanceAction::Add {
            vehicle,
            name,
            odometer,
            warranty,
            date,
            cost,
        } => {
            let v = FleetLogic::find_vehicle(&ctx.pool, &owner, vehicle)?;
            let date = parse_date_or_today(date.as_deref())?;
            let item = MaintenanceItem::new(
                name,
                &v.id,
                odometer.unwrap_or(v.odometer_km),
                *warranty,
                date,
                *cost,
                &owner,
            );

            let item = FleetLogic::add_maintenance(&mut ctx.pool, item)?;
            success(format!(
                "{} for {} saved ({}), warranty until {}",
                item.name,
                v.plate,
                short_id(&item.id),
                item.warranty_expires()
            ));
        }

        MaintenanceAction::List { vehicle } => {
            let vehicle_id = match vehicle {
                Some(key) => Some(FleetLogic::find_vehicle(&ctx.pool, &owner, key)?.id),
                None => None,
            };

            let items = FleetLogic::maintenance(&ctx.pool, &owner, vehicle_id.as_deref())?;
            if items.is_empty() {
                info("No maintenance items recorded.");
                return Ok(());
            }

            let plates: HashMap<String, String> = FleetLogic::vehicles(&ctx.pool, &owner)?
                .into_iter()
                .map(|v| (v.id, v.plate))
                .collect();

            let mut table = TextTable::new(vec![
                Column::new("ID", 8),
                Column::new("VEHICLE", 10),
                Column::new("ITEM", 24),
                Column::new("PURCHASED", 10),
                Column::new("ODOMETER", 10),
                Column::new("COST", 10),
                Column::new("WARRANTY", 12),
            ]);

            let now = today();
            let mut total = 0.0;
            for m in &items {
                let expires = m.warranty_expires();
                let warranty = if m.warranty_months == 0 {
                    "--".to_string()
                } else if m.warranty_expired(now) {
                    format!("{RED}{expires}{RESET}")
                } else {
                    format!("{GREEN}{expires}{RESET}")
                };

                table.add_row(vec![
                    short_id(&m.id).to_string(),
                    plates
                        .get(&m.vehicle_id)
                        .cloned()
                        .unwrap_or_else(|| short_id(&m.vehicle_id).to_string()),
                    m.name.clone(),
                    m.purchase_date.to_string(),
                    format!("{} km", m.odometer_km),
                    money(m.cost),
                    warranty,
                ]);
                total += m.cost;
            }

            print!("{}", table.render());
            println!("\n{} item(s) · total {}", items.len(), money(total));
        }

        MaintenanceAction::Del { id, yes } => {
            let id = FleetLogic::resolve_id(&ctx.pool, Table::MaintenanceItems, id)?;
            if !*yes && !ask_confirmation(&format!("Delete maintenance item {}?", short_id(&id)))
            {
                info("Cancelled.");
                return Ok(());
            }
            FleetLogic::delete(&mut ctx.pool, Table::MaintenanceItems, &id)?;
            success(format!("Maintenance item {} deleted", short_id(&id)));
        }
    }

    Ok(())
}
