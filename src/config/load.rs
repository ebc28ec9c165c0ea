use std::path::{Path, PathBuf};

use crate::app_dirs;

use super::CONFIG_FILE_NAME;
use super::errors::ConfigError;
use super::map_app_dir_error;
use super::types::AnalysisSettings;

/// Resolve the settings file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load settings from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<AnalysisSettings, ConfigError> {
    load_from(&config_path()?)
}

/// Load and validate settings from `path`; a missing file yields defaults.
pub fn load_from(path: &Path) -> Result<AnalysisSettings, ConfigError> {
    if !path.exists() {
        tracing::debug!("No settings at {}; using defaults", path.display());
        return Ok(AnalysisSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: AnalysisSettings =
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
    settings.validate()?;
    tracing::info!("Loaded analysis settings from {}", path.display());
    Ok(settings)
}
