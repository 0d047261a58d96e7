use crate::cli::parser::ExpenseAction;
use crate::core::context::AppContext;
use crate::core::fleet::FleetLogic;
use crate::db::store;
use crate::errors::AppResult;
use crate::models::expense::Expense;
use crate::models::sync::SyncStatus;
use crate::models::table::Table;
use crate::ui::messages::{info, success};
use crate::utils::colors::{RESET, color_for_sync, colorize_optional};
use crate::utils::date::parse_date_or_today;
use crate::utils::formatting::short_id;
use crate::utils::money;
use crate::utils::prompt::ask_confirmation;
use crate::utils::table::{Column, TextTable};
use std::collections::BTreeMap;

pub fn handle(action: &ExpenseAction, ctx: &mut AppContext) -> AppResult<()> {
    let owner = ctx.owner().to_string();

    match action {
        ExpenseAction::Add {
            description,
            amount,
            category,
            date,
            trip,
        } => {
            let date = parse_date_or_today(date.as_deref())?;
            let trip_id = trip
                .as_deref()
                .map(|t| FleetLogic::resolve_id(&ctx.pool, Table::Trips, t))
                .transpose()?;

            let expense = FleetLogic::add_expense(
                &mut ctx.pool,
                Expense::new(description, *amount, *category, date, trip_id, &owner),
            )?;
            success(format!(
                "Expense '{}' of {} ({}) saved ({})",
                expense.description,
                money(expense.amount),
                expense.category.as_str(),
                short_id(&expense.id)
            ));
        }

        ExpenseAction::List { category, trip } => {
            let trip_id = trip
                .as_deref()
                .map(|t| FleetLogic::resolve_id(&ctx.pool, Table::Trips, t))
                .transpose()?;

            let expenses: Vec<Expense> = FleetLogic::expenses(&ctx.pool, &owner)?
                .into_iter()
                .filter(|e| category.is_none_or(|c| e.category == c))
                .filter(|e| trip_id.is_none() || e.trip_id == trip_id)
                .collect();

            if expenses.is_empty() {
                info("No expenses recorded.");
                return Ok(());
            }

            let mut table = TextTable::new(vec![
                Column::new("ID", 8),
                Column::new("DATE", 10),
                Column::new("CATEGORY", 11),
                Column::new("DESCRIPTION", 28),
                Column::new("AMOUNT", 10),
                Column::new("TRIP", 8),
                Column::new("SYNC", 7),
            ]);

            let mut per_category: BTreeMap<&'static str, f64> = BTreeMap::new();
            for e in &expenses {
                let state = store::sync_state(&ctx.pool.conn, Table::Expenses, &e.id)?
                    .unwrap_or(SyncStatus::Pending);
                table.add_row(vec![
                    short_id(&e.id).to_string(),
                    e.date.to_string(),
                    e.category.as_str().to_string(),
                    e.description.clone(),
                    money(e.amount),
                    colorize_optional(e.trip_id.as_deref().map(short_id).unwrap_or("")),
                    format!("{}{}{}", color_for_sync(state), state.to_db_str(), RESET),
                ]);
                *per_category.entry(e.category.as_str()).or_default() += e.amount;
            }

            print!("{}", table.render());

            let total: f64 = per_category.values().sum();
            println!();
            for (cat, sum) in &per_category {
                println!("  {:<12} {:>10}", cat, money(*sum));
            }
            println!("  {:<12} {:>10}", "TOTAL", money(total));
        }

        ExpenseAction::Del { id, yes } => {
            let id = FleetLogic::resolve_id(&ctx.pool, Table::Expenses, id)?;
            if !*yes && !ask_confirmation(&format!("Delete expense {}?", short_id(&id))) {
                info("Cancelled.");
                return Ok(());
            }
            FleetLogic::delete(&mut ctx.pool, Table::Expenses, &id)?;
            success(format!("Expense {} deleted", short_id(&id)));
        }
    }

    Ok(())
}

