//! Template filters
//!
//! A filter is a named pure function `(value, args) -> value` callable from
//! templates as `{{ value | name(arg=...) }}`. The registry keeps insertion
//! order; registering an existing name replaces the earlier filter.

pub mod date;
pub mod url;

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tera::Value;
use thiserror::Error;

/// Errors produced by filters at render time
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("filter `{filter}`: {value} is not a date")]
    NotADate { filter: String, value: String },

    #[error("filter `{filter}`: missing argument `{arg}`")]
    MissingArg { filter: String, arg: String },

    #[error("filter `{filter}`: invalid argument `{arg}`: {message}")]
    InvalidArg {
        filter: String,
        arg: String,
        message: String,
    },

    #[error("filter `{filter}`: expected {expected}, got {value}")]
    InvalidType {
        filter: String,
        expected: &'static str,
        value: String,
    },
}

pub type FilterResult = Result<Value, FilterError>;

/// Signature shared by every filter
pub type FilterFn = dyn Fn(&Value, &HashMap<String, Value>) -> FilterResult + Send + Sync;

/// A named filter
#[derive(Clone)]
pub struct Filter {
    name: String,
    func: Arc<FilterFn>,
}

impl Filter {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &HashMap<String, Value>) -> FilterResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the filter directly
    pub fn apply(&self, value: &Value, args: &HashMap<String, Value>) -> FilterResult {
        (self.func)(value, args)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("name", &self.name).finish()
    }
}

impl tera::Filter for Filter {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        self.apply(value, args)
            .map_err(|e| tera::Error::msg(e.to_string()))
    }

    fn is_safe(&self) -> bool {
        false
    }
}

/// Ordered name -> filter map
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: IndexMap<String, Filter>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters the build pipeline always provides
    pub fn builtin(path_prefix: &str) -> Self {
        let mut registry = Self::new();
        registry.insert(url::url_filter(path_prefix));
        registry.insert(url::slugify_filter());
        registry
    }

    /// Add a filter, replacing any earlier filter with the same name
    pub fn insert(&mut self, filter: Filter) {
        if self.filters.contains_key(filter.name()) {
            tracing::debug!("Filter `{}` re-registered, replacing", filter.name());
        }
        self.filters.insert(filter.name().to_string(), filter);
    }

    /// Layer another registry on top of this one
    pub fn extend(&mut self, other: &FilterRegistry) {
        for filter in other.iter() {
            self.insert(filter.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Register every filter with a Tera instance
    pub fn register_into(&self, tera: &mut tera::Tera) {
        for filter in self.iter() {
            tera.register_filter(filter.name(), filter.clone());
        }
    }
}

/// Fetch a required string argument
pub(crate) fn string_arg(
    filter: &str,
    args: &HashMap<String, Value>,
    name: &str,
) -> Result<String, FilterError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(FilterError::InvalidArg {
            filter: filter.to_string(),
            arg: name.to_string(),
            message: format!("expected a string, got {}", other),
        }),
        None => Err(FilterError::MissingArg {
            filter: filter.to_string(),
            arg: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shout() -> Filter {
        Filter::new("shout", |v, _| match v {
            Value::String(s) => Ok(json!(s.to_uppercase())),
            other => Err(FilterError::InvalidType {
                filter: "shout".into(),
                expected: "a string",
                value: other.to_string(),
            }),
        })
    }

    #[test]
    fn test_insert_overwrites_same_name() {
        let mut registry = FilterRegistry::new();
        registry.insert(shout());
        registry.insert(Filter::new("shout", |_, _| Ok(json!("replaced"))));
        assert_eq!(registry.len(), 1);
        let out = registry
            .get("shout")
            .unwrap()
            .apply(&json!("hi"), &HashMap::new())
            .unwrap();
        assert_eq!(out, json!("replaced"));
    }

    #[test]
    fn test_builtin_names() {
        let registry = FilterRegistry::builtin("/club/");
        assert_eq!(registry.names(), ["url", "slugify"]);
    }

    #[test]
    fn test_registered_filter_renders_in_tera() {
        let mut registry = FilterRegistry::new();
        registry.insert(shout());
        let mut tera = tera::Tera::default();
        registry.register_into(&mut tera);
        tera.add_raw_template("t", "{{ word | shout }}").unwrap();
        let mut context = tera::Context::new();
        context.insert("word", "squat");
        assert_eq!(tera.render("t", &context).unwrap(), "SQUAT");
    }

    #[test]
    fn test_filter_error_surfaces_in_render() {
        let mut registry = FilterRegistry::new();
        registry.insert(shout());
        let mut tera = tera::Tera::default();
        registry.register_into(&mut tera);
        tera.add_raw_template("t", "{{ n | shout }}").unwrap();
        let mut context = tera::Context::new();
        context.insert("n", &3);
        assert!(tera.render("t", &context).is_err());
    }
}
