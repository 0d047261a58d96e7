use crate::cli::parser::Commands;
use crate::config::{Config, migrate};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, info, success, warning};
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Config {
        print_config,
        check,
        edit_config,
        editor,
    } = cmd
    else {
        return Ok(());
    };

    // Path del file di configurazione
    let path = Config::config_file();

    // ---- PRINT CONFIG ----
    if *print_config {
        println!("📄 Current configuration:\n");
        let yaml = serde_yaml::to_string(cfg)
            .map_err(|e| AppError::Config(format!("cannot serialize config: {e}")))?;
        println!("{yaml}");
    }

    // ---- CHECK CONFIG ----
    if *check {
        if !path.exists() {
            warning(format!(
                "No configuration file at {} (run `fleetlog init`)",
                path.display()
            ));
        } else {
            let added = migrate::fill_missing_keys(&path, false)?;
            if added.is_empty() {
                success("Configuration file is complete.");
            } else {
                for key in &added {
                    info(format!("Added missing key '{key}' with its default value"));
                }
                success(format!("{} key(s) added to {}", added.len(), path.display()));
            }
        }
    }

    // ---- EDIT CONFIG ----
    if *edit_config {
        let default_editor = std::env::var("EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else {
                    "nano".to_string()
                }
            });

        // --editor vince sul default
        let editor_to_use = editor.clone().unwrap_or_else(|| default_editor.clone());

        match Command::new(&editor_to_use).arg(&path).status() {
            Ok(s) if s.success() => {
                success(format!(
                    "Configuration file edited successfully using '{editor_to_use}'"
                ));
            }
            Ok(_) | Err(_) => {
                warning(format!(
                    "Editor '{editor_to_use}' not available, falling back to '{default_editor}'"
                ));

                match Command::new(&default_editor).arg(&path).status() {
                    Ok(s) if s.success() => success(format!(
                        "Configuration file edited successfully using fallback '{default_editor}'"
                    )),
                    Ok(_) | Err(_) => error(format!(
                        "Failed to edit configuration file using fallback '{default_editor}'"
                    )),
                }
            }
        }
    }

    Ok(())
}
