//! Content item model

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

use super::FrontMatter;

/// Kind of template, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Markdown,
    Html,
}

impl TemplateKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

/// A source document discovered under the input directory
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    /// Path relative to the project root, `/`-separated (e.g. `src/posts/a.md`)
    pub input_path: String,

    /// Absolute path on disk
    #[serde(skip)]
    pub full_path: PathBuf,

    /// File name without extension
    pub file_slug: String,

    /// Front-matter date, else file creation/modification time
    pub date: DateTime<Utc>,

    pub kind: TemplateKind,

    /// Parsed front matter
    pub data: FrontMatter,

    /// Template body with front matter removed
    pub raw: String,

    /// Body text before `<!-- more -->`, unrendered
    pub excerpt: Option<String>,

    /// Site-relative URL without the path prefix; `None` when not written
    pub url: Option<String>,

    /// Destination file; `None` when not written
    pub output_path: Option<PathBuf>,
}

impl ContentItem {
    /// Whether this item carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.data.tags.iter().any(|t| t == tag)
    }

    /// URL as served, including the path prefix
    pub fn public_url(&self, path_prefix: &str) -> Option<String> {
        self.url
            .as_deref()
            .map(|url| crate::filters::url::apply_prefix(path_prefix, url))
    }

    /// The `page` object exposed to templates
    pub fn page_json(&self) -> serde_json::Value {
        json!({
            "url": self.url,
            "inputPath": self.input_path,
            "fileSlug": self.file_slug,
            "date": self.date.to_rfc3339_opts(SecondsFormat::Secs, true),
            "outputPath": self.output_path.as_ref().map(|p| p.to_string_lossy().to_string()),
        })
    }

    /// Entry used in `collections.*` listings
    pub fn summary_json(&self) -> serde_json::Value {
        json!({
            "url": self.url,
            "inputPath": self.input_path,
            "fileSlug": self.file_slug,
            "date": self.date.to_rfc3339_opts(SecondsFormat::Secs, true),
            "outputPath": self.output_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            "data": self.data.to_json(),
        })
    }
}
