use crate::cli::parser::Commands;
use crate::core::backup::BackupLogic;
use crate::core::context::AppContext;
use crate::errors::AppResult;
use crate::ui::messages::success;

pub fn handle(cmd: &Commands, ctx: &mut AppContext) -> AppResult<()> {
    if let Commands::Backup {
        file,
        compress,
        force,
    } = cmd
    {
        let written = BackupLogic::backup(&mut ctx.pool, &ctx.cfg, file, *compress, *force)?;
        success(format!("Backup written to {}", written.display()));
    }

    Ok(())
}
