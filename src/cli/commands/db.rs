use crate::cli::parser::Commands;
use crate::core::context::AppContext;
use crate::db::log::ttlog_quiet;
use crate::db::migrate::{report_applied, run_pending_migrations};
use crate::db::stats;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, RED, RESET};

pub fn handle(cmd: &Commands, ctx: &mut AppContext) -> AppResult<()> {
    let Commands::Db {
        migrate,
        check,
        vacuum,
        info,
    } = cmd
    else {
        return Ok(());
    };

    let db_path = ctx.cfg.database.clone();
    let pool = &mut ctx.pool;

    //
    // 1) MIGRATE
    //
    if *migrate {
        println!("{}▶ Running migrations…{}", CYAN, RESET);
        run_pending_migrations(&pool.conn)?;
        report_applied(&pool.conn)?;
        println!("{}✔ Migration completed.{}\n", GREEN, RESET);
    }

    //
    // 2) INFO
    //
    if *info {
        stats::print_db_info(pool, &db_path)?;
    }

    //
    // 3) CHECK
    //
    if *check {
        println!("{}▶ Running integrity check…{}", CYAN, RESET);

        let integrity: String = pool
            .conn
            .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

        if integrity == "ok" {
            println!("{}✔ Integrity check passed.{}\n", GREEN, RESET);
        } else {
            println!("{}✘ Integrity check failed:{} {}\n", RED, RESET, integrity);
        }
    }

    //
    // 4) VACUUM
    //
    if *vacuum {
        println!("{}▶ Running VACUUM…{}", CYAN, RESET);
        pool.conn.execute_batch("VACUUM;")?;
        ttlog_quiet(&pool.conn, "vacuum", &db_path, "Database optimized");
        println!("{}✔ Vacuum completed.{}\n", GREEN, RESET);
    }

    Ok(())
}
