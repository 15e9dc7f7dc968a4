//! Content loader - discovers templates under the input directory

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{ContentItem, FrontMatter, MarkdownRenderer, TemplateKind};
use crate::Site;

/// Discovers content items for one build
pub struct ContentLoader<'a> {
    site: &'a Site,
}

impl<'a> ContentLoader<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Load every template under the input directory.
    ///
    /// Items come back in default discovery order: ascending by date, ties
    /// broken by input path.
    pub fn load_all(&self) -> Result<Vec<ContentItem>> {
        let input_dir = &self.site.input_dir;
        if !input_dir.exists() {
            tracing::warn!("Input directory {:?} does not exist", input_dir);
            return Ok(Vec::new());
        }

        let excluded = self.excluded_dirs();
        let mut items = Vec::new();

        for entry in WalkDir::new(input_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !is_hidden_or_private(e.path(), input_dir))
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || excluded.iter().any(|dir| path.starts_with(dir)) {
                continue;
            }

            let Some(kind) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(TemplateKind::from_extension)
            else {
                continue;
            };

            match self.load_item(path, kind) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!("Failed to load {:?}: {}", path, e),
            }
        }

        sort_default(&mut items);
        tracing::debug!("Discovered {} templates", items.len());

        Ok(items)
    }

    /// Load a single template file
    pub fn load_item(&self, path: &Path, kind: TemplateKind) -> Result<ContentItem> {
        let content = fs::read_to_string(path)?;
        let (data, body) = FrontMatter::parse(&content)?;

        let date = data
            .parse_date()
            .or_else(|| {
                if data.date.is_some() {
                    tracing::warn!("Unparsable date in {:?}, using file time", path);
                }
                file_time(path)
            })
            .unwrap_or_else(Utc::now);

        let file_slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        let relative_to_input = to_slash(path.strip_prefix(&self.site.input_dir).unwrap_or(path));

        let url = if data.is_disabled() {
            None
        } else {
            Some(match data.permalink_path() {
                Some(permalink) => normalize_permalink(permalink),
                None => default_url(&relative_to_input),
            })
        };
        let output_path = url.as_deref().map(|u| output_path_for(&self.site.output_dir, u));

        Ok(ContentItem {
            input_path: self.site.relative_to_base(path),
            full_path: path.to_path_buf(),
            file_slug,
            date,
            kind,
            data,
            raw: body.to_string(),
            excerpt: MarkdownRenderer::split_excerpt(body).map(str::to_string),
            url,
            output_path,
        })
    }

    /// Directories under the input root that never hold templates
    fn excluded_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![
            self.site.includes_dir.clone(),
            self.site.data_dir.clone(),
            self.site.output_dir.clone(),
        ];
        dirs.extend(
            self.site
                .config
                .passthroughs()
                .iter()
                .map(|p| self.site.base_dir.join(&p.source)),
        );
        dirs
    }
}

/// Sort ascending by date, then by input path
pub fn sort_default(items: &mut [ContentItem]) {
    items.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.input_path.cmp(&b.input_path)));
}

/// Skip `_foo` and `.foo` entries below the input root
fn is_hidden_or_private(path: &Path, root: &Path) -> bool {
    path != root
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('_') || n.starts_with('.'))
            .unwrap_or(false)
}

/// Creation time if the platform records it, otherwise modification time
fn file_time(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = fs::metadata(path).ok()?;
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// URL for a template path relative to the input root.
///
/// `index.md` -> `/`, `about/index.md` -> `/about/`, `posts/a.md` -> `/posts/a/`
pub fn default_url(relative: &str) -> String {
    let stem = match relative.rfind('.') {
        Some(dot) if !relative[dot..].contains('/') => &relative[..dot],
        _ => relative,
    };

    if stem == "index" {
        "/".to_string()
    } else if let Some(dir) = stem.strip_suffix("/index") {
        format!("/{}/", dir)
    } else {
        format!("/{}/", stem)
    }
}

fn normalize_permalink(permalink: &str) -> String {
    format!("/{}", permalink.trim().trim_start_matches('/'))
}

/// Where a URL lands in the output tree
pub fn output_path_for(output_dir: &Path, url: &str) -> PathBuf {
    let relative = url.trim_start_matches('/');
    if url.ends_with('/') {
        output_dir.join(relative).join("index.html")
    } else {
        output_dir.join(relative)
    }
}
