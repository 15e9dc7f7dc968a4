//! Named collections of content items
//!
//! A collection is a name plus a selector. Selectors receive a
//! [`CollectionApi`] over the items discovered for the current build and
//! return an ordered sequence; they run again on every build.

use glob::{MatchOptions, Pattern};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::content::ContentItem;

/// Selector signature
pub type SelectorFn = dyn Fn(&CollectionApi) -> Vec<ContentItem> + Send + Sync;

/// A named, lazily evaluated collection
#[derive(Clone)]
pub struct Collection {
    name: String,
    selector: Arc<SelectorFn>,
}

impl Collection {
    pub fn new<F>(name: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&CollectionApi) -> Vec<ContentItem> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            selector: Arc::new(selector),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the selector against this build's items
    pub fn resolve(&self, api: &CollectionApi) -> Vec<ContentItem> {
        (self.selector)(api)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}

/// Query capability handed to collection selectors
pub struct CollectionApi<'a> {
    items: &'a [ContentItem],
}

impl<'a> CollectionApi<'a> {
    /// `items` must already be in default discovery order
    pub fn new(items: &'a [ContentItem]) -> Self {
        Self { items }
    }

    /// Every item, in discovery order
    pub fn get_all(&self) -> Vec<ContentItem> {
        self.items.to_vec()
    }

    /// Every item sorted by date ascending (the discovery order)
    pub fn get_all_sorted(&self) -> Vec<ContentItem> {
        self.get_all()
    }

    /// Items whose input path matches `pattern`, in discovery order.
    ///
    /// Patterns are relative to the project root; a leading `./` is ignored.
    /// An invalid pattern matches nothing.
    pub fn get_filtered_by_glob(&self, pattern: &str) -> Vec<ContentItem> {
        let pattern = pattern.trim_start_matches("./");
        let compiled = match Pattern::new(pattern) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Invalid collection glob {:?}: {}", pattern, e);
                return Vec::new();
            }
        };

        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        self.items
            .iter()
            .filter(|item| compiled.matches_with(&item.input_path, options))
            .cloned()
            .collect()
    }

    /// Items tagged with `tag`, in discovery order
    pub fn get_filtered_by_tag(&self, tag: &str) -> Vec<ContentItem> {
        self.items
            .iter()
            .filter(|item| item.has_tag(tag))
            .cloned()
            .collect()
    }
}

/// Resolved collections for one build, keyed by name
pub type ResolvedCollections = IndexMap<String, Vec<ContentItem>>;

/// Resolve `all`, one collection per tag, then the user collections.
///
/// User collections replace built-ins that share their name.
pub fn resolve_all(items: &[ContentItem], user: &[Collection]) -> ResolvedCollections {
    let api = CollectionApi::new(items);
    let mut resolved = ResolvedCollections::new();

    resolved.insert("all".to_string(), api.get_all());

    for item in items {
        for tag in &item.data.tags {
            if !resolved.contains_key(tag) {
                resolved.insert(tag.clone(), api.get_filtered_by_tag(tag));
            }
        }
    }

    for collection in user {
        let result = collection.resolve(&api);
        tracing::debug!(
            "Collection `{}` resolved to {} items",
            collection.name(),
            result.len()
        );
        resolved.insert(collection.name().to_string(), result);
    }

    resolved
}
