//! Analysis settings persisted as TOML in the app directory.

use crate::app_dirs;

mod errors;
mod load;
mod save;
mod types;


/// Default filename of the settings file.
pub const CONFIG_FILE_NAME: &str = "analysis.toml";

pub use errors::ConfigError;
pub use load::{config_path, load_from, load_or_default};
pub use save::{save, save_to};
pub use types::{
    AnalysisSettings, GeometrySettings, NormalizationSettings, SimilaritySettings,
};

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}
