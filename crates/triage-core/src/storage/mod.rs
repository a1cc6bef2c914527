pub mod config;
pub mod database;
pub mod migrations;
pub mod records;

pub use config::Config;
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Directory holding `config.toml` and `triage.db`.
///
/// `TRIAGE_DATA_DIR` wins when set. Otherwise `~/.config/triage`, or
/// `~/.config/triage-dev` when `TRIAGE_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TRIAGE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base = dirs::home_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join(".config");
            let env = std::env::var("TRIAGE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base.join("triage-dev")
            } else {
                base.join("triage")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
