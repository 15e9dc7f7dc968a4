//! movsci-site: static site builder for the Movement Science Club blog
//!
//! A [`configurator::SiteConfigurator`] declares passthrough directories,
//! collections, template filters and directory settings. [`Site`] reads
//! those declarations once and the [`generator`] runs the build pipeline:
//! passthrough copy, content discovery, collection resolution, rendering.

pub mod collections;
pub mod commands;
pub mod config;
pub mod configurator;
pub mod content;
pub mod data;
pub mod filters;
pub mod generator;
pub mod passthrough;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{normalize_prefix, SiteSettings};
use configurator::{BuildConfig, MovSciConfig, SiteConfigurator};

/// A site on disk together with its build configuration
#[derive(Clone)]
pub struct Site {
    /// Source of the declarations, kept so watch mode can re-read them
    configurator: Arc<dyn SiteConfigurator + Send + Sync>,
    /// Declarations read from the configurator
    pub config: BuildConfig,
    /// Project root
    pub base_dir: PathBuf,
    /// Input root (templates, posts, assets)
    pub input_dir: PathBuf,
    /// Output root
    pub output_dir: PathBuf,
    /// Layouts
    pub includes_dir: PathBuf,
    /// Global data files
    pub data_dir: PathBuf,
}

impl Site {
    /// Read a configurator and resolve directories against `base_dir`.
    ///
    /// A `site.yml` / `site.toml` in `base_dir` overrides the configurator's
    /// settings.
    pub fn new<P, C>(base_dir: P, configurator: C) -> Result<Self>
    where
        P: AsRef<Path>,
        C: SiteConfigurator + Send + Sync + 'static,
    {
        Self::with_configurator(base_dir.as_ref(), Arc::new(configurator))
    }

    fn with_configurator(
        base_dir: &Path,
        configurator: Arc<dyn SiteConfigurator + Send + Sync>,
    ) -> Result<Self> {
        let base_dir = base_dir.to_path_buf();

        let mut config = BuildConfig::from_configurator(configurator.as_ref());
        config.settings = config.settings.with_project_file(&base_dir)?;
        config.settings.path_prefix = normalize_prefix(&config.settings.path_prefix);

        let dir = &config.settings.dir;
        let input_dir = base_dir.join(&dir.input);
        let output_dir = base_dir.join(&dir.output);
        let includes_dir = input_dir.join(&dir.includes);
        let data_dir = input_dir.join(&dir.data);

        Ok(Self {
            configurator,
            config,
            base_dir,
            input_dir,
            output_dir,
            includes_dir,
            data_dir,
        })
    }

    /// Open the club site rooted at `base_dir`
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        Self::new(base_dir, MovSciConfig)
    }

    /// Re-read the configurator and project file from scratch
    pub fn reload(&self) -> Result<Self> {
        Self::with_configurator(&self.base_dir, Arc::clone(&self.configurator))
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.config.settings
    }

    /// Build the site
    pub fn build(&self) -> Result<generator::BuildReport> {
        commands::build::run(self)
    }

    /// Remove the output directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// `path` relative to the project root, `/`-separated
    pub fn relative_to_base(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);
        content::loader::to_slash(relative)
    }
}
