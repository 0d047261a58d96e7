use crate::cli::parser::Commands;
use crate::core::context::AppContext;
use crate::core::log::LogLogic;
use crate::errors::AppResult;
use crate::ui::messages::info;

pub fn handle(cmd: &Commands, ctx: &mut AppContext) -> AppResult<()> {
    if matches!(cmd, Commands::Log { print: true }) {
        LogLogic::print_log(&mut ctx.pool)?;
    } else {
        info("Nothing to do. Use `fleetlog log --print`.");
    }
    Ok(())
}
