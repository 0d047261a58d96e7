use crate::cli::parser::DutyAction;
use crate::core::context::AppContext;
use crate::core::duty::{ClearConfirmation, DutyLogic};
use crate::core::timer::{DutyMode, DutyTimer};
use crate::errors::AppResult;
use crate::models::duty_log::DutyKind;
use crate::ui::messages::{info, success};
use crate::utils::colors::{CYAN, GREY, RESET, color_for_progress};
use crate::utils::date::{parse_date_or_today, today};
use crate::utils::formatting::short_id;
use crate::utils::prompt::ask_confirmation;
use crate::utils::secs2readable;
use crate::utils::table::{Column, TextTable};
use crate::utils::time::{format_seconds, progress_bar};
use chrono::{DateTime, Local, Utc};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

const BAR_WIDTH: usize = 30;

pub fn handle(action: &DutyAction, ctx: &mut AppContext) -> AppResult<()> {
    let owner = ctx.owner().to_string();
    let limits = ctx.limits();

    match action {
        DutyAction::Drive | DutyAction::Rest | DutyAction::Stop => {
            let to = match action {
                DutyAction::Drive => DutyMode::Driving,
                DutyAction::Rest => DutyMode::Resting,
                _ => DutyMode::Idle,
            };

            let outcome = DutyLogic::transition(
                &mut ctx.pool,
                limits,
                to,
                Utc::now(),
                &owner,
                ctx.notifier.as_ref(),
            )?;

            if !outcome.changed {
                info(format!("Already {to}, nothing to do."));
                return Ok(());
            }

            if let Some(log) = &outcome.log {
                info(format!(
                    "{} session closed: {}",
                    log.kind.as_str(),
                    format_seconds(log.duration_seconds)
                ));
            }
            success(format!("Duty timer: {to}"));
        }

        DutyAction::Status => {
            let now = Utc::now();
            let (timer, _) = DutyLogic::tick(&mut ctx.pool, limits, now, ctx.notifier.as_ref())?;
            print_status(&timer, now);

            let logs = DutyLogic::logs(&ctx.pool.conn, &owner, Some(today()))?;
            let totals = DutyLogic::totals(&logs);
            println!(
                "{CYAN}Today:{RESET} driving {} · resting {} ({} session(s))",
                secs2readable(totals.driving_secs),
                secs2readable(totals.resting_secs),
                logs.len()
            );
        }

        DutyAction::Watch { interval, ticks } => {
            let mut done: u64 = 0;
            loop {
                let now = Utc::now();
                let (timer, alert) =
                    DutyLogic::tick(&mut ctx.pool, limits, now, ctx.notifier.as_ref())?;

                if alert.is_some() {
                    println!();
                }
                print!("\r{}", status_line(&timer, now));
                io::stdout().flush()?;

                done += 1;
                if ticks.is_some_and(|max| done >= max) {
                    println!();
                    break;
                }
                thread::sleep(Duration::from_secs((*interval).max(1)));
            }
        }

        DutyAction::List { date } => {
            let date = date
                .as_deref()
                .map(|d| parse_date_or_today(Some(d)))
                .transpose()?;
            let logs = DutyLogic::logs(&ctx.pool.conn, &owner, date)?;

            if logs.is_empty() {
                info("No duty logs recorded.");
                return Ok(());
            }

            let mut table = TextTable::new(vec![
                Column::new("ID", 8),
                Column::new("DATE", 10),
                Column::new("KIND", 8),
                Column::new("START", 8),
                Column::new("END", 8),
                Column::new("DURATION", 9),
            ]);
            for l in &logs {
                table.add_row(vec![
                    short_id(&l.id).to_string(),
                    l.date.to_string(),
                    l.kind.as_str().to_string(),
                    local_time(l.start_time),
                    local_time(l.end_time),
                    format_seconds(l.duration_seconds),
                ]);
            }
            print!("{}", table.render());

            let totals = DutyLogic::totals(&logs);
            println!(
                "\n{} {} · {} {}",
                DutyKind::Driving.as_str(),
                secs2readable(totals.driving_secs),
                DutyKind::Resting.as_str(),
                secs2readable(totals.resting_secs)
            );
        }

        DutyAction::Clear { date, yes } => {
            let date = date
                .as_deref()
                .map(|d| parse_date_or_today(Some(d)))
                .transpose()?;
            let scope = date.map_or_else(|| "ALL duty logs".to_string(), |d| {
                format!("the duty logs of {d}")
            });

            if !*yes && !ask_confirmation(&format!("Delete {scope}? Other records are kept.")) {
                info("Cancelled.");
                return Ok(());
            }

            let removed = DutyLogic::clear_history(
                &mut ctx.pool,
                &owner,
                date,
                ClearConfirmation::confirmed(),
            )?;
            success(format!("{removed} duty log(s) removed"));
        }
    }

    Ok(())
}

fn local_time(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn limit_for(timer: &DutyTimer) -> i64 {
    match timer.mode {
        DutyMode::Driving => timer.limits.driving_limit_secs,
        _ => timer.limits.rest_target_secs,
    }
}

fn status_line(timer: &DutyTimer, now: DateTime<Utc>) -> String {
    if timer.mode == DutyMode::Idle {
        return format!("{GREY}idle{RESET}");
    }

    let elapsed = timer.elapsed_secs(now);
    let limit = limit_for(timer);
    format!(
        "{:<8} {} {}{}{} left {}",
        timer.mode.to_db_str(),
        format_seconds(elapsed),
        color_for_progress(elapsed, limit),
        progress_bar(elapsed, limit, BAR_WIDTH),
        RESET,
        format_seconds(timer.remaining_secs(now).unwrap_or(0))
    )
}

fn print_status(timer: &DutyTimer, now: DateTime<Utc>) {
    println!("{CYAN}Mode:{RESET} {}", status_line(timer, now));
    if let Some(start) = timer.started_at {
        println!("{CYAN}Since:{RESET} {}", local_time(start));
    }
}
