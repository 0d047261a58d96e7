//! fleetlog library root.
//! Exposes the CLI parser, the high-level run() function and the internal
//! modules (local store, sync queue, reconciliation, duty timer).

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use crate::cli::commands;
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::context::AppContext;
use crate::errors::AppResult;
use crate::utils::path::expand_tilde;
use clap::Parser;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, ctx: &mut AppContext) -> AppResult<()> {
    match &cli.command {
        Commands::Init { .. } => commands::init::handle(cli),
        Commands::Config { .. } => commands::config::handle(&cli.command, &ctx.cfg),
        Commands::Db { .. } => commands::db::handle(&cli.command, ctx),
        Commands::Log { .. } => commands::log::handle(&cli.command, ctx),
        Commands::Trip { action } => commands::trip::handle(action, ctx),
        Commands::Expense { action } => commands::expense::handle(action, ctx),
        Commands::Vehicle { action } => commands::vehicle::handle(action, ctx),
        Commands::Maintenance { action } => commands::maintenance::handle(action, ctx),
        Commands::Duty { action } => commands::duty::handle(action, ctx),
        Commands::Sync { action } => commands::sync::handle(action, ctx),
        Commands::Backup { .. } => commands::backup::handle(&cli.command, ctx),
        Commands::Export { .. } => commands::export::handle(&cli.command, ctx),
    }
}

/// Entry point usato da main.rs
pub fn run() -> AppResult<()> {
    // 1️⃣ parse CLI
    let cli = Cli::parse();

    // init crea config e DB: niente contesto prima
    if matches!(cli.command, Commands::Init { .. }) {
        return commands::init::handle(&cli);
    }

    // 2️⃣ carica config UNA sola volta
    let mut cfg = Config::load()?;

    // 3️⃣ applica eventuale override del DB da riga di comando
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
    log::debug!("database: {}", cfg.database);

    // 4️⃣ contesto unico (config + DB + notifier), poi dispatch
    let mut ctx = AppContext::open(cfg)?;
    dispatch(&cli, &mut ctx)
}
