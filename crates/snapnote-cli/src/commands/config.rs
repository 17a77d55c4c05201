use std::path::{Path, PathBuf};

use snapnote_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::config::{default_config_path, CliConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    let path = default_config_path()?;
    match command {
        ConfigCommands::Show => {
            let config = CliConfig::load_from_path(&path)?;
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Set {
            db_path,
            export_dir,
            default_category,
        } => {
            apply_config_update(&path, db_path, export_dir, default_category)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Merge the given values into the config at `path`; `None` keeps the stored value
/// and an empty value clears it.
pub fn apply_config_update(
    path: &Path,
    db_path: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    default_category: Option<String>,
) -> Result<CliConfig, CliError> {
    let mut config = CliConfig::load_from_path(path)?;

    if let Some(db_path) = db_path {
        config.db_path = Some(db_path).filter(|path| !path.as_os_str().is_empty());
    }
    if let Some(export_dir) = export_dir {
        config.export_dir = Some(export_dir).filter(|path| !path.as_os_str().is_empty());
    }
    if let Some(default_category) = default_category {
        config.default_category = normalize_text_option(Some(default_category));
    }

    config.save_to_path(path)?;
    tracing::info!("Saved CLI config to {}", path.display());
    Ok(config)
}
