use crate::cli::parser::Commands;
use crate::core::context::AppContext;
use crate::core::export::ExportLogic;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};

pub fn handle(cmd: &Commands, ctx: &mut AppContext) -> AppResult<()> {
    if let Commands::Export {
        table,
        format,
        file,
        force,
    } = cmd
    {
        let owner = ctx.owner().to_string();
        let rows = ExportLogic::export(&mut ctx.pool, &owner, *table, *format, file, *force)?;

        if rows == 0 {
            warning(format!("No {} records to export, wrote an empty file.", table));
        }
        success(format!(
            "Exported {} {} record(s) as {} to {}",
            rows,
            table,
            format.as_str(),
            file
        ));
    }
    Ok(())
}
