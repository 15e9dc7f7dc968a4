//! Generator - runs the build pipeline
//!
//! Phases run in a fixed order: passthrough copy, content discovery,
//! collection resolution, then rendering each item to its output path.

use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tera::Context;

use crate::collections::{self, ResolvedCollections};
use crate::content::{ContentItem, ContentLoader};
use crate::templates::TemplateRenderer;
use crate::{data, passthrough, Site};

/// What a build produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Files copied by passthrough rules
    pub copied: usize,
    /// Pages written
    pub written: usize,
    /// Items with `permalink: false`
    pub skipped: usize,
    /// Item count per resolved collection
    pub collections: IndexMap<String, usize>,
}

/// Static site generator
pub struct Generator<'a> {
    site: &'a Site,
}

impl<'a> Generator<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Build the entire site
    pub fn generate(&self) -> Result<BuildReport> {
        let mut report = BuildReport::default();

        fs::create_dir_all(&self.site.output_dir)?;

        report.copied = passthrough::copy_all(self.site)?;

        let items = ContentLoader::new(self.site).load_all()?;
        check_output_conflicts(&items)?;

        let resolved = collections::resolve_all(&items, &self.site.config.collections());
        report.collections = resolved
            .iter()
            .map(|(name, items)| (name.clone(), items.len()))
            .collect();

        let global_data = data::load_global_data(&self.site.data_dir)?;
        let renderer = TemplateRenderer::new(self.site, &items)?;
        let base_context = self.base_context(&resolved, global_data, &renderer)?;

        for item in &items {
            let Some(output_path) = &item.output_path else {
                tracing::debug!("Skipping {} (permalink: false)", item.input_path);
                report.skipped += 1;
                continue;
            };

            let context = item_context(&base_context, item);
            let html = renderer.render_item(item, &context)?;

            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(output_path, html)?;
            tracing::debug!("Wrote {} -> {:?}", item.input_path, output_path);
            report.written += 1;
        }

        Ok(report)
    }

    /// Context shared by every page: global data, `site`, `collections`
    fn base_context(
        &self,
        resolved: &ResolvedCollections,
        global_data: Map<String, Value>,
        renderer: &TemplateRenderer,
    ) -> Result<Context> {
        let mut context = Context::new();

        for (key, value) in global_data {
            context.insert(key, &value);
        }

        let settings = self.site.settings();
        context.insert(
            "site",
            &json!({
                "pathPrefix": settings.path_prefix,
                "input": settings.dir.input,
                "output": settings.dir.output,
            }),
        );

        let mut collections = Map::new();
        for (name, items) in resolved {
            let mut summaries = Vec::with_capacity(items.len());
            for item in items {
                let mut summary = item.summary_json();
                summary["excerpt"] = json!(renderer.render_excerpt(item)?);
                summaries.push(summary);
            }
            collections.insert(name.clone(), Value::Array(summaries));
        }
        context.insert("collections", &collections);

        Ok(context)
    }
}

/// Page context: base context, then front matter, then `page`
fn item_context(base: &Context, item: &ContentItem) -> Context {
    let mut context = base.clone();
    if let Value::Object(map) = item.data.to_json() {
        for (key, value) in map {
            context.insert(key, &value);
        }
    }
    context.insert("page", &item.page_json());
    context
}

/// Two items writing the same file is a build error
fn check_output_conflicts(items: &[ContentItem]) -> Result<()> {
    let mut seen: HashMap<&PathBuf, &str> = HashMap::new();
    for item in items {
        if let Some(path) = &item.output_path {
            if let Some(previous) = seen.insert(path, &item.input_path) {
                return Err(anyhow!(
                    "Output conflict: {} and {} both write {:?}",
                    previous,
                    item.input_path,
                    path
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::test_item;

    #[test]
    fn test_output_conflict_detected() {
        let mut a = test_item("src/posts/a.md", 1);
        let mut b = test_item("src/posts/a.html", 2);
        a.output_path = Some(PathBuf::from("_site/posts/a/index.html"));
        b.output_path = Some(PathBuf::from("_site/posts/a/index.html"));
        let err = check_output_conflicts(&[a, b]).unwrap_err();
        assert!(err.to_string().contains("src/posts/a.html"));
    }

    #[test]
    fn test_item_context_page_overrides_front_matter() {
        let mut item = test_item("src/posts/a.md", 1);
        item.data.title = Some("Hip Hinge".to_string());
        item.data
            .extra
            .insert("page".to_string(), serde_json::json!("shadowed"));
        let context = item_context(&Context::new(), &item);
        let json = context.into_json();
        assert_eq!(json["title"], "Hip Hinge");
        assert_eq!(json["page"]["fileSlug"], "a");
    }
}
