//! Interactive confirmations.

use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, warning};
use std::io::{self, Write};
use std::path::Path;

/// Ask a yes/no confirmation from the user
pub fn ask_confirmation(prompt: &str) -> bool {
    warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        matches!(s.trim().to_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

/// Verifica se un file può essere creato o sovrascritto.
///
/// - file missing → Ok
/// - file exists and `force` → Ok
/// - file exists otherwise → ask the user
pub fn ensure_writable(path: &Path, force: bool) -> AppResult<()> {
    if !path.exists() || force {
        return Ok(());
    }

    if ask_confirmation(&format!("The file '{}' already exists. Overwrite?", path.display())) {
        info("Existing file will be overwritten.");
        Ok(())
    } else {
        Err(AppError::from(io::Error::other(
            "Cancelled: existing file not overwritten",
        )))
    }
}
