use crate::cli::parser::SyncCommand;
use crate::core::context::AppContext;
use crate::core::remote::{MemoryRemote, RemoteStore, RestRemote};
use crate::core::sync::{DrainOutcome, Reconciler, SyncReport, Trigger, wait_for_connectivity};
use crate::db::queue;
use crate::errors::AppResult;
use crate::ui::messages::{header, info, success, warning};
use crate::utils::colors::{GREY, RED, RESET, YELLOW, colorize_optional};
use crate::utils::formatting::short_id;
use crate::utils::table::{Column, TextTable};
use chrono::{Local, Utc};
use std::thread;
use std::time::Duration;

const CONNECTIVITY_POLL: Duration = Duration::from_secs(5);

pub fn handle(cmd: &SyncCommand, ctx: &mut AppContext) -> AppResult<()> {
    match cmd {
        SyncCommand::Run { force, dry_run } => {
            if *dry_run {
                return rehearse(ctx);
            }

            let remote = RestRemote::from_config(&ctx.cfg)?;
            let outcome = run_pass(ctx, &remote, Trigger::Manual, *force)?;
            print_outcome(&outcome);
        }

        SyncCommand::Status => print_queue(ctx)?,

        SyncCommand::Watch { interval, passes } => {
            let remote = RestRemote::from_config(&ctx.cfg)?;
            let every = Duration::from_secs(interval.unwrap_or(ctx.cfg.sync_interval_secs).max(1));

            info(format!(
                "Syncing every {}s (Ctrl+C to stop)",
                every.as_secs()
            ));

            let mut done: u64 = 0;
            let mut trigger = Trigger::Periodic;
            loop {
                // entries that failed while offline are still inside their backoff
                let force = trigger == Trigger::Connectivity;
                let outcome = run_pass(ctx, &remote, trigger, force)?;
                print!("{} ", Local::now().format("%H:%M:%S"));
                print_outcome(&outcome);

                done += 1;
                if passes.is_some_and(|max| done >= max) {
                    break;
                }

                // offline: retry as soon as the remote answers again
                trigger = match &outcome {
                    DrainOutcome::Completed(r) if r.all_failed() => {
                        wait_for_connectivity(&remote, every, CONNECTIVITY_POLL)
                    }
                    _ => {
                        thread::sleep(every);
                        Trigger::Periodic
                    }
                };
                if trigger == Trigger::Connectivity {
                    info("Remote reachable again, syncing now.");
                }
            }
        }
    }

    Ok(())
}

/// One reconciliation pass behind the single-flight guard.
pub fn run_pass(
    ctx: &mut AppContext,
    remote: &dyn RemoteStore,
    trigger: Trigger,
    force: bool,
) -> AppResult<DrainOutcome> {
    let reconciler = Reconciler::new(remote, ctx.retry_policy());
    let pool = &mut ctx.pool;

    ctx.scheduler.trigger(trigger, || {
        let now = Utc::now();
        if force {
            reconciler.drain_forced(pool, now)
        } else {
            reconciler.drain(pool, now)
        }
    })
}

fn print_outcome(outcome: &DrainOutcome) {
    match outcome {
        DrainOutcome::AlreadyRunning => info("A sync pass is already running."),
        DrainOutcome::Completed(report) if report.attempted == 0 && report.deferred == 0 => {
            success("Nothing to sync.")
        }
        DrainOutcome::Completed(report) if report.failed > 0 => {
            warning(format!("Sync pass: {report}"))
        }
        DrainOutcome::Completed(report) if report.attempted == 0 => {
            info(format!("Sync pass: {report} (waiting for retry)"))
        }
        DrainOutcome::Completed(report) => success(format!("Sync pass: {report}")),
    }
}

/// Push the pending entries into an in-memory remote. The queue is not touched.
fn rehearse(ctx: &mut AppContext) -> AppResult<()> {
    let remote = MemoryRemote::new();
    let report: SyncReport =
        Reconciler::new(&remote, ctx.retry_policy()).rehearse(&ctx.pool.conn)?;

    header("Dry run");
    for call in remote.calls() {
        println!("  {call}");
    }
    info(format!("{report} (nothing was sent, queue unchanged)"));
    Ok(())
}

fn print_queue(ctx: &mut AppContext) -> AppResult<()> {
    let entries = queue::list_pending(&ctx.pool.conn)?;

    match ctx.cfg.remote_url.as_deref() {
        Some(url) if !url.trim().is_empty() => info(format!("Remote: {url}")),
        _ => warning("Remote store not configured (remote_url)."),
    }

    if entries.is_empty() {
        success("Sync queue is empty: everything is synced.");
        return Ok(());
    }

    let now = Utc::now();
    let mut table = TextTable::new(vec![
        Column::new("#", 5),
        Column::new("TABLE", 17),
        Column::new("RECORD", 8),
        Column::new("ACTION", 6),
        Column::new("QUEUED", 19),
        Column::new("TRIES", 5),
        Column::new("NEXT", 8),
        Column::new("LAST ERROR", 40),
    ]);

    for e in &entries {
        let next = match e.next_attempt_at {
            Some(t) if t > now => format!("{YELLOW}{}{RESET}", t.with_timezone(&Local).format("%H:%M:%S")),
            _ => format!("{GREY}now{RESET}"),
        };
        let last_error = e
            .last_error
            .as_deref()
            .map(|s| format!("{RED}{}{RESET}", s.chars().take(40).collect::<String>()))
            .unwrap_or_default();

        table.add_row(vec![
            e.id.to_string(),
            e.table.name().to_string(),
            short_id(e.record_id()).to_string(),
            e.action.to_db_str().to_string(),
            e.enqueued_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            e.attempts.to_string(),
            next,
            colorize_optional(&last_error),
        ]);
    }

    print!("{}", table.render());
    println!("\n{} pending entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
    Ok(())
}
