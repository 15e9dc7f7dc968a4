//! Site build configuration
//!
//! A [`SiteConfigurator`] declares what the build pipeline should do:
//! directories to copy verbatim, named collections, template filters and the
//! directory/prefix settings. The pipeline reads those declarations once into
//! a [`BuildConfig`] and passes that object around by reference; nothing is
//! registered in global state.

mod movsci;

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::collections::Collection;
use crate::config::SiteSettings;
use crate::filters::{Filter, FilterRegistry};

pub use movsci::MovSciConfig;

/// A directory copied unchanged into the output tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Passthrough {
    /// Source directory, relative to the project root (e.g. `src/assets`)
    pub source: PathBuf,
}

impl Passthrough {
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        let source: PathBuf = source
            .as_ref()
            .components()
            .filter(|c| !matches!(c, std::path::Component::CurDir))
            .collect();
        Self { source }
    }
}

/// Declarations a site hands to the build pipeline.
///
/// The pipeline calls these in a fixed order: `settings`,
/// `list_passthroughs`, `list_collections`, `list_filters`.
pub trait SiteConfigurator {
    /// Directory and URL prefix settings
    fn settings(&self) -> SiteSettings;

    /// Directories to copy verbatim
    fn list_passthroughs(&self) -> Vec<Passthrough>;

    /// Named collections
    fn list_collections(&self) -> Vec<Collection>;

    /// Template filters
    fn list_filters(&self) -> Vec<Filter>;
}

/// Registry built once from a configurator and read during the build
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub settings: SiteSettings,
    passthroughs: Vec<Passthrough>,
    collections: IndexMap<String, Collection>,
    filters: FilterRegistry,
}

impl BuildConfig {
    pub fn new(settings: SiteSettings) -> Self {
        Self {
            settings,
            passthroughs: Vec::new(),
            collections: IndexMap::new(),
            filters: FilterRegistry::new(),
        }
    }

    /// Read every declaration from a configurator
    pub fn from_configurator(configurator: &dyn SiteConfigurator) -> Self {
        let mut config = Self::new(configurator.settings());
        for passthrough in configurator.list_passthroughs() {
            config.add_passthrough_copy(passthrough);
        }
        for collection in configurator.list_collections() {
            config.add_collection(collection);
        }
        for filter in configurator.list_filters() {
            config.add_filter(filter);
        }
        config
    }

    /// Copy a directory verbatim. Registering the same source twice keeps one rule.
    pub fn add_passthrough_copy(&mut self, passthrough: Passthrough) {
        if !self.passthroughs.contains(&passthrough) {
            self.passthroughs.push(passthrough);
        }
    }

    /// Register a collection, replacing one with the same name
    pub fn add_collection(&mut self, collection: Collection) {
        if self.collections.contains_key(collection.name()) {
            tracing::debug!("Collection `{}` re-registered, replacing", collection.name());
        }
        self.collections
            .insert(collection.name().to_string(), collection);
    }

    /// Register a filter, replacing one with the same name
    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.insert(filter);
    }

    pub fn passthroughs(&self) -> &[Passthrough] {
        &self.passthroughs
    }

    pub fn collections(&self) -> Vec<Collection> {
        self.collections.values().cloned().collect()
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    /// User filters only
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Built-in filters with the user filters layered on top
    pub fn template_filters(&self) -> FilterRegistry {
        let mut registry = FilterRegistry::builtin(&self.settings.path_prefix);
        registry.extend(&self.filters);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_passthrough_normalizes_dot() {
        assert_eq!(Passthrough::new("./src/assets"), Passthrough::new("src/assets"));
    }

    #[test]
    fn test_registration_is_idempotent() {
        let first = BuildConfig::from_configurator(&MovSciConfig);
        let mut second = BuildConfig::from_configurator(&MovSciConfig);

        // Re-run every registration on an already populated registry
        for p in MovSciConfig.list_passthroughs() {
            second.add_passthrough_copy(p);
        }
        for c in MovSciConfig.list_collections() {
            second.add_collection(c);
        }
        for f in MovSciConfig.list_filters() {
            second.add_filter(f);
        }

        assert_eq!(first.passthroughs(), second.passthroughs());
        assert_eq!(first.collection_names(), second.collection_names());
        assert_eq!(first.filters().names(), second.filters().names());
        assert_eq!(first.settings, second.settings);
    }

    #[test]
    fn test_user_filter_overrides_builtin() {
        let mut config = BuildConfig::new(SiteSettings::default());
        config.add_filter(Filter::new("url", |_, _| Ok(json!("custom"))));
        let registry = config.template_filters();
        assert_eq!(registry.names(), ["url", "slugify"]);
        let out = registry
            .get("url")
            .unwrap()
            .apply(&json!("/x/"), &HashMap::new())
            .unwrap();
        assert_eq!(out, json!("custom"));
    }
}
