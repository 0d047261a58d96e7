use crate::cli::parser::TripAction;
use crate::core::context::AppContext;
use crate::core::fleet::FleetLogic;
use crate::db::store;
use crate::errors::AppResult;
use crate::models::sync::SyncStatus;
use crate::models::table::Table;
use crate::models::trip::{Trip, TripStatus};
use crate::ui::messages::{info, success};
use crate::utils::colors::{RESET, color_for_sync};
use crate::utils::date::parse_date_or_today;
use crate::utils::formatting::short_id;
use crate::utils::prompt::ask_confirmation;
use crate::utils::table::{Column, TextTable};
use crate::utils::money;

pub fn handle(action: &TripAction, ctx: &mut AppContext) -> AppResult<()> {
    let owner = ctx.owner().to_string();

    match action {
        TripAction::Add {
            origin,
            destination,
            distance,
            price,
            commission,
            cargo,
            date,
            status,
            notes,
            id,
        } => {
            let date = parse_date_or_today(date.as_deref())?;
            let mut trip = Trip::new(
                origin,
                destination,
                *distance,
                *price,
                *commission,
                cargo,
                date,
                &owner,
            );
            if let Some(s) = status {
                trip.status = *s;
            }
            if let Some(custom) = id {
                trip.id = custom.clone();
            }
            trip.notes = notes.clone();

            let trip = FleetLogic::add_trip(&mut ctx.pool, trip)?;
            success(format!(
                "Trip {} → {} on {} saved ({}), commission {}",
                trip.origin,
                trip.destination,
                trip.date,
                short_id(&trip.id),
                money(trip.commission_value)
            ));
        }

        TripAction::List { status } => {
            let trips: Vec<Trip> = FleetLogic::trips(&ctx.pool, &owner)?
                .into_iter()
                .filter(|t| status.is_none_or(|s| t.status == s))
                .collect();

            if trips.is_empty() {
                info("No trips recorded.");
                return Ok(());
            }

            let mut table = TextTable::new(vec![
                Column::new("ID", 8),
                Column::new("DATE", 10),
                Column::new("ROUTE", 28),
                Column::new("KM", 8),
                Column::new("PRICE", 10),
                Column::new("COMM.", 9),
                Column::new("NET", 10),
                Column::new("STATUS", 11),
                Column::new("SYNC", 7),
            ]);

            let mut gross = 0.0;
            let mut net = 0.0;
            let mut km = 0.0;
            for t in &trips {
                let state = store::sync_state(&ctx.pool.conn, Table::Trips, &t.id)?
                    .unwrap_or(SyncStatus::Pending);
                table.add_row(vec![
                    short_id(&t.id).to_string(),
                    t.date.to_string(),
                    format!("{} → {}", t.origin, t.destination),
                    format!("{:.1}", t.distance_km),
                    money(t.agreed_price),
                    money(t.commission_value),
                    money(t.net_revenue()),
                    t.status.as_str().to_string(),
                    format!("{}{}{}", color_for_sync(state), state.to_db_str(), RESET),
                ]);
                if t.status != TripStatus::Cancelled {
                    gross += t.agreed_price;
                    net += t.net_revenue();
                    km += t.distance_km;
                }
            }

            print!("{}", table.render());
            println!(
                "\n{} trip(s) · {:.1} km · gross {} · net {}",
                trips.len(),
                km,
                money(gross),
                money(net)
            );
        }

        TripAction::Status { id, status } => {
            let id = FleetLogic::resolve_id(&ctx.pool, Table::Trips, id)?;
            let trip = FleetLogic::set_trip_status(&mut ctx.pool, &id, *status)?;
            success(format!(
                "Trip {} is now {}",
                short_id(&trip.id),
                trip.status.as_str()
            ));
        }

        TripAction::Del { id, yes } => {
            let id = FleetLogic::resolve_id(&ctx.pool, Table::Trips, id)?;
            if !*yes && !ask_confirmation(&format!("Delete trip {}?", short_id(&id))) {
                info("Cancelled.");
                return Ok(());
            }
            FleetLogic::delete(&mut ctx.pool, Table::Trips, &id)?;
            success(format!("Trip {} deleted", short_id(&id)));
        }
    }

    Ok(())
}

