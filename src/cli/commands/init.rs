use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::db::log;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file (skipped in test mode)
///  - the SQLite database and all pending migrations
pub fn handle(cli: &Cli) -> AppResult<()> {
    let owner = match &cli.command {
        Commands::Init { owner } => owner.clone(),
        _ => None,
    };
    let cfg = Config::init_all(cli.db.clone(), owner, cli.test)?;

    println!("⚙️  Initializing fleetlog…");
    if !cli.test {
        println!("📄 Config file : {}", Config::config_file().display());
    }
    println!("🗄️  Database   : {}", &cfg.database);
    println!("👤 Owner      : {}", &cfg.owner_id);

    // tabelle + migrazioni
    let pool = DbPool::open(&cfg.database)?;

    if let Err(e) = log::ttlog(
        &pool.conn,
        "init",
        &cfg.owner_id,
        &format!("Database initialized at {}", &cfg.database),
    ) {
        warning(format!("Failed to write internal log: {e}"));
    }

    success(format!("Database initialized at {}", &cfg.database));
    Ok(())
}
