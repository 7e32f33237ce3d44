use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::register_defaults;
use crate::host::MemorySettings;

const CONFIG_DIR: &str = "precision-gamepad";
const SETTINGS_FILE: &str = "overlay.toml";

/// `<config dir>/precision-gamepad/overlay.toml`, falling back to the working directory.
pub fn default_settings_path() -> PathBuf {
    let mut path = match dirs::config_dir() {
        Some(dir) => dir,
        None => {
            warn!("No config directory found, using current directory");
            PathBuf::from(".")
        }
    };
    path.push(CONFIG_DIR);
    path.push(SETTINGS_FILE);
    path
}

/// Loads explicit values from `path` and registers the schema defaults.
///
/// A missing file yields a store holding only defaults.
pub async fn load_settings(path: &Path) -> Result<MemorySettings> {
    let mut settings = if tokio::fs::try_exists(path)
        .await
        .map_err(|e| eyre!("Failed to check settings file {}: {}", path.display(), e))?
    {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read settings file {}: {}", path.display(), e))?;
        let settings: MemorySettings = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse settings file {}: {}", path.display(), e))?;
        info!("Loaded settings from {}", path.display());
        settings
    } else {
        info!("No settings at {}, using defaults", path.display());
        MemorySettings::new()
    };

    register_defaults(&mut settings);
    Ok(settings)
}

/// Loads `path`, writing the full default schema there first if it does not exist.
pub async fn load_or_init_settings(path: &Path) -> Result<MemorySettings> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| eyre!("Failed to check settings file {}: {}", path.display(), e))?;
    let mut settings = load_settings(path).await?;

    if !exists {
        settings.materialize_defaults();
        save_settings(path, &settings).await?;
        info!("Wrote default settings to {}", path.display());
    }
    Ok(settings)
}

/// Writes the explicit values of `settings` to `path`, creating parent directories.
pub async fn save_settings(path: &Path, settings: &MemorySettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create settings directory: {}", e))?;
        }
    }

    let content = toml::to_string_pretty(settings)
        .map_err(|e| eyre!("Failed to serialize settings: {}", e))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| eyre!("Failed to write settings file {}: {}", path.display(), e))?;

    debug!("Saved settings to {}", path.display());
    Ok(())
}
