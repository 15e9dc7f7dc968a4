//! Configuration module

mod site;

use std::path::PathBuf;
use thiserror::Error;

pub use site::normalize_prefix;
pub use site::DirConfig;
pub use site::SettingsOverride;
pub use site::SiteSettings;

/// Errors raised while loading a project settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}
