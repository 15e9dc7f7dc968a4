//! Front-matter parsing

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Scalars read as strings: `2024` and `true` are as good as `"2024"`
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accept either a single scalar or a list of scalars
fn string_or_vec(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => Some(Vec::new()),
        Value::Array(items) => Some(items.iter().filter_map(scalar_string).collect()),
        other => scalar_string(other).map(|s| vec![s]),
    }
}

/// `permalink:` front-matter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Permalink {
    /// `permalink: false` disables writing; `true` keeps the default
    Enabled(bool),
    Path(String),
}

/// Front-matter data of a template
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub layout: Option<String>,
    pub permalink: Option<Permalink>,
    pub tags: Vec<String>,

    /// Everything else, exposed to templates as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FrontMatter {
    /// Split a source file into front matter and body
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let trimmed = content.trim_start();

        if trimmed.starts_with("---") {
            return Ok(Self::parse_yaml(trimmed));
        }

        if trimmed.starts_with(";;;") || starts_json_object(trimmed) {
            return Self::parse_json(trimmed);
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> (Self, &str) {
        let rest = content[3..].trim_start_matches([' ', '\t']);
        let rest = match rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) {
            Some(rest) => rest,
            // "---text" is not a front-matter fence
            None => return (FrontMatter::default(), content),
        };

        // Closing fence can be the very first line when the block is empty
        let (yaml, body) = if let Some(body) = rest.strip_prefix("---") {
            ("", body)
        } else if let Some(end) = rest.find("\n---") {
            (&rest[..end], &rest[end + 4..])
        } else {
            return (FrontMatter::default(), content);
        };
        let body = body.trim_start_matches(['\n', '\r']);

        if yaml.trim().is_empty() {
            return (FrontMatter::default(), body);
        }

        match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Object(map)) => (Self::from_map(map), body),
            Ok(Value::Null) => (FrontMatter::default(), body),
            Ok(_) => {
                tracing::warn!("YAML front-matter is not a mapping, ignoring it");
                (FrontMatter::default(), body)
            }
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, ignoring it: {}", e);
                (FrontMatter::default(), body)
            }
        }
    }

    fn parse_json(content: &str) -> Result<(Self, &str)> {
        // ;;;{...};;;
        if let Some(rest) = content.strip_prefix(";;;") {
            let end = rest
                .find(";;;")
                .ok_or_else(|| anyhow!("Unterminated JSON front-matter"))?;
            let value: Value = serde_json::from_str(&rest[..end])
                .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;
            let fm = Self::from_json(value)?;
            return Ok((fm, rest[end + 3..].trim_start_matches(['\n', '\r'])));
        }

        // A bare object at the start; the body begins where the object ends
        let mut stream = serde_json::Deserializer::from_str(content).into_iter::<Value>();
        let value = stream
            .next()
            .ok_or_else(|| anyhow!("Invalid JSON front-matter"))?
            .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;
        let rest = &content[stream.byte_offset()..];
        Ok((Self::from_json(value)?, rest.trim_start_matches(['\n', '\r'])))
    }

    fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            _ => Err(anyhow!("JSON front-matter must be an object")),
        }
    }

    /// Pick the known fields out of a front-matter mapping.
    ///
    /// A field of the wrong shape is dropped on its own; the rest survive.
    fn from_map(map: Map<String, Value>) -> Self {
        let mut fm = FrontMatter::default();

        for (key, value) in map {
            let accepted = match key.as_str() {
                "title" => set_scalar(&mut fm.title, &value),
                "date" => set_scalar(&mut fm.date, &value),
                "layout" => set_scalar(&mut fm.layout, &value),
                "permalink" => {
                    fm.permalink = match &value {
                        Value::Bool(enabled) => Some(Permalink::Enabled(*enabled)),
                        other => scalar_string(other).map(Permalink::Path),
                    };
                    fm.permalink.is_some() || value.is_null()
                }
                "tags" => match string_or_vec(&value) {
                    Some(tags) => {
                        fm.tags = tags;
                        true
                    }
                    None => false,
                },
                _ => {
                    fm.extra.insert(key.clone(), value.clone());
                    true
                }
            };

            if !accepted {
                tracing::warn!("Ignoring front-matter field `{}`: unexpected value {}", key, value);
            }
        }

        fm
    }

    /// The `date` field as a UTC timestamp, if present and parsable
    pub fn parse_date(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(parse_date_string)
    }

    /// Whether the template asked not to be written
    pub fn is_disabled(&self) -> bool {
        matches!(self.permalink, Some(Permalink::Enabled(false)))
    }

    /// Explicit permalink path, if any
    pub fn permalink_path(&self) -> Option<&str> {
        match &self.permalink {
            Some(Permalink::Path(p)) => Some(p.as_str()),
            _ => None,
        }
    }

    /// Front matter as a JSON object for template contexts
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn set_scalar(slot: &mut Option<String>, value: &Value) -> bool {
    *slot = scalar_string(value);
    slot.is_some() || value.is_null()
}

/// `{"title": ...}` opens JSON front matter; `{{`/`{%` open a template tag
fn starts_json_object(content: &str) -> bool {
    content
        .strip_prefix('{')
        .map(|rest| {
            let rest = rest.trim_start();
            rest.starts_with('"') || rest.starts_with('}')
        })
        .unwrap_or(false)
}

/// Parse a date string in the formats accepted in front matter.
///
/// Naive values are taken as UTC.
pub fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Squat Mechanics
date: 2024-03-05
layout: post.html
tags:
  - posts
  - strength
author: Dana
---

Knees track over toes.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Squat Mechanics"));
        assert_eq!(fm.layout.as_deref(), Some("post.html"));
        assert_eq!(fm.tags, vec!["posts", "strength"]);
        assert_eq!(fm.extra.get("author"), Some(&serde_json::json!("Dana")));
        assert!(body.starts_with("Knees track"));
    }

    #[test]
    fn test_single_string_tag() {
        let (fm, _) = FrontMatter::parse("---\ntags: posts\n---\nbody").unwrap();
        assert_eq!(fm.tags, vec!["posts"]);
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, body) = FrontMatter::parse("# Just markdown").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(body, "# Just markdown");
    }

    #[test]
    fn test_empty_frontmatter() {
        let (fm, body) = FrontMatter::parse("---\n---\nbody").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_json_frontmatter() {
        let content = ";;;{\"title\": \"Sprint drills\", \"permalink\": false};;;\nbody";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Sprint drills"));
        assert!(fm.is_disabled());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_permalink_path() {
        let (fm, _) = FrontMatter::parse("---\npermalink: /feed.xml\n---\n").unwrap();
        assert_eq!(fm.permalink_path(), Some("/feed.xml"));
        assert!(!fm.is_disabled());
    }

    #[test]
    fn test_invalid_yaml_is_ignored() {
        let (fm, body) = FrontMatter::parse("---\ntitle: [unclosed\n---\nbody").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_numeric_tag_keeps_other_fields() {
        let content = "---\ntitle: Deadlift cues\ndate: 2019-06-01\nlayout: post\ntags: [2024, strength]\n---\nB";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["2024", "strength"]);
        assert_eq!(fm.layout.as_deref(), Some("post"));
        assert_eq!(fm.title.as_deref(), Some("Deadlift cues"));
        assert_eq!(fm.date.as_deref(), Some("2019-06-01"));
        assert_eq!(body, "B");
    }

    #[test]
    fn test_non_string_scalars_are_coerced() {
        let content = "---\ntitle: 1984\nlayout: {name: post}\ntags: 7\nreps: 12\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("1984"));
        assert_eq!(fm.tags, vec!["7"]);
        // A mapping is no layout name; only that field is dropped
        assert!(fm.layout.is_none());
        assert_eq!(fm.extra.get("reps"), Some(&serde_json::json!(12)));
    }

    #[test]
    fn test_bare_json_frontmatter() {
        let content = "{\"title\": \"Mobility\", \"tags\": [\"posts\"]}\nStretch {daily}.";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Mobility"));
        assert_eq!(fm.tags, vec!["posts"]);
        assert_eq!(body, "Stretch {daily}.");
    }

    #[test]
    fn test_template_tag_is_not_json() {
        let content = "{{ title }}\n{% if page %}x{% endif %}";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = "2024-03-05";
        for s in [
            "2024-03-05",
            "2024/03/05",
            "2024-03-05 10:30:00",
            "2024-03-05T10:30:00Z",
            "2024-03-05T10:30:00.250",
        ] {
            let dt = parse_date_string(s).unwrap();
            assert_eq!(dt.format("%Y-%m-%d").to_string(), expected, "input {}", s);
        }
        assert!(parse_date_string("last tuesday").is_none());
    }
}
