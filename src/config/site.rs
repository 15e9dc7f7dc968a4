//! Site settings (directories and URL path prefix)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::ConfigError;

/// Directory layout of a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirConfig {
    /// Input root, relative to the project directory
    pub input: String,
    /// Output root, relative to the project directory
    pub output: String,
    /// Layout directory, relative to the input root
    pub includes: String,
    /// Global data directory, relative to the input root
    pub data: String,
}

impl Default for DirConfig {
    fn default() -> Self {
        Self {
            input: ".".to_string(),
            output: "_site".to_string(),
            includes: "_includes".to_string(),
            data: "_data".to_string(),
        }
    }
}

/// Static configuration record handed to the build pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub dir: DirConfig,
    /// Prefix applied to every site-relative URL
    #[serde(alias = "pathPrefix")]
    pub path_prefix: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            dir: DirConfig::default(),
            path_prefix: "/".to_string(),
        }
    }
}

/// Partial settings read from `site.yml` / `site.toml`.
///
/// Every field is optional so a project file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsOverride {
    pub dir: DirOverride,
    #[serde(alias = "pathPrefix")]
    pub path_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DirOverride {
    pub input: Option<String>,
    pub output: Option<String>,
    pub includes: Option<String>,
    pub data: Option<String>,
}

impl SettingsOverride {
    /// Load overrides from a YAML or TOML file, chosen by extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            _ => serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
}

impl SiteSettings {
    /// Apply project file overrides on top of these settings
    pub fn apply(mut self, overrides: SettingsOverride) -> Self {
        let dir = overrides.dir;
        if let Some(input) = dir.input {
            self.dir.input = input;
        }
        if let Some(output) = dir.output {
            self.dir.output = output;
        }
        if let Some(includes) = dir.includes {
            self.dir.includes = includes;
        }
        if let Some(data) = dir.data {
            self.dir.data = data;
        }
        if let Some(prefix) = overrides.path_prefix {
            self.path_prefix = prefix;
        }
        self.path_prefix = normalize_prefix(&self.path_prefix);
        self
    }

    /// Look for `site.yml`, `site.yaml` or `site.toml` in `base_dir` and
    /// apply the first one found
    pub fn with_project_file<P: AsRef<Path>>(self, base_dir: P) -> Result<Self, ConfigError> {
        for name in ["site.yml", "site.yaml", "site.toml"] {
            let path = base_dir.as_ref().join(name);
            if path.exists() {
                let overrides = SettingsOverride::load(&path)?;
                tracing::debug!("Loaded settings override from {:?}", path);
                return Ok(self.apply(overrides));
            }
        }
        Ok(self)
    }
}

/// Ensure a path prefix starts and ends with a single slash
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
