//! URL filters

use serde_json::json;
use tera::Value;

use super::{Filter, FilterError};

/// Prefix a site-relative URL with the path prefix.
///
/// Absolute URLs, protocol-relative URLs, fragments, queries and relative
/// paths pass through unchanged.
pub fn apply_prefix(path_prefix: &str, url: &str) -> String {
    let is_external = url.starts_with("//") || url.contains("://") || url.starts_with("mailto:");
    if is_external || !url.starts_with('/') {
        return url.to_string();
    }

    let prefix = path_prefix.trim_end_matches('/');
    if prefix.is_empty() {
        url.to_string()
    } else {
        format!("{}/{}", prefix, url.trim_start_matches('/'))
    }
}

/// `url`: apply the configured path prefix
pub fn url_filter(path_prefix: &str) -> Filter {
    let prefix = path_prefix.to_string();
    Filter::new("url", move |value, _args| match value {
        Value::String(url) => Ok(json!(apply_prefix(&prefix, url))),
        Value::Null => Ok(json!(apply_prefix(&prefix, "/"))),
        other => Err(FilterError::InvalidType {
            filter: "url".to_string(),
            expected: "a string",
            value: other.to_string(),
        }),
    })
}

/// `slugify`: URL-safe lowercase slug
pub fn slugify_filter() -> Filter {
    Filter::new("slugify", |value, _args| match value {
        Value::String(s) => Ok(json!(slug::slugify(s))),
        other => Err(FilterError::InvalidType {
            filter: "slugify".to_string(),
            expected: "a string",
            value: other.to_string(),
        }),
    })
}
