//! Template rendering with Tera
//!
//! Every content item body is itself a Tera template. Markdown items are
//! converted to HTML after the template pass, then wrapped in their layout
//! chain from the includes directory.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::error::Error as _;
use std::fs;
use tera::{Context, Tera};
use walkdir::WalkDir;

use crate::content::loader::to_slash;
use crate::content::{ContentItem, FrontMatter, MarkdownRenderer, TemplateKind};
use crate::Site;

/// Layout chains deeper than this are treated as cycles
const MAX_LAYOUT_DEPTH: usize = 10;

/// Renders content items and their layouts
pub struct TemplateRenderer {
    tera: Tera,
    markdown: MarkdownRenderer,
    /// Front matter of each layout, keyed by template name
    layouts: HashMap<String, FrontMatter>,
}

impl TemplateRenderer {
    /// Load layouts, register filters and compile every item body
    pub fn new(site: &Site, items: &[ContentItem]) -> Result<Self> {
        let mut tera = Tera::default();

        // Output is HTML we generate ourselves; escaping would mangle `content`
        tera.autoescape_on(vec![]);

        site.config.template_filters().register_into(&mut tera);

        let mut templates: Vec<(String, String)> = Vec::new();
        let mut layouts = HashMap::new();

        if site.includes_dir.is_dir() {
            for entry in WalkDir::new(&site.includes_dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let name = to_slash(path.strip_prefix(&site.includes_dir)?);
                let source = fs::read_to_string(path)?;
                let (data, body) = FrontMatter::parse(&source)?;
                templates.push((name.clone(), body.to_string()));
                layouts.insert(name, data);
            }
        }

        for item in items {
            templates.push((item_template_name(item), item.raw.clone()));
        }

        tera.add_raw_templates(templates)
            .map_err(|e| anyhow!("Failed to compile templates: {}", describe(&e)))?;

        tracing::debug!("Loaded {} layouts", layouts.len());

        Ok(Self {
            tera,
            markdown: MarkdownRenderer::new(),
            layouts,
        })
    }

    /// Render an item body, convert markdown, then apply its layouts
    pub fn render_item(&self, item: &ContentItem, context: &Context) -> Result<String> {
        let name = item_template_name(item);
        let body = self
            .tera
            .render(&name, context)
            .map_err(|e| anyhow!("Failed to render {}: {}", item.input_path, describe(&e)))?;

        let html = match item.kind {
            TemplateKind::Markdown => self.markdown.render(&body)?,
            TemplateKind::Html => body,
        };

        match item.data.layout.as_deref() {
            Some(layout) => self.apply_layouts(layout, html, context),
            None => Ok(html),
        }
    }

    /// The item's excerpt as HTML. Template tags in it are not evaluated.
    pub fn render_excerpt(&self, item: &ContentItem) -> Result<Option<String>> {
        let Some(excerpt) = item.excerpt.as_deref() else {
            return Ok(None);
        };
        let html = match item.kind {
            TemplateKind::Markdown => self.markdown.render(excerpt)?,
            TemplateKind::Html => excerpt.to_string(),
        };
        Ok(Some(html))
    }

    /// Wrap `content` in `layout` and whatever layouts it names in turn
    pub fn apply_layouts(&self, layout: &str, content: String, context: &Context) -> Result<String> {
        let mut context = context.clone();
        let mut content = content;
        let mut next = Some(layout.to_string());
        let mut depth = 0;

        while let Some(requested) = next.take() {
            depth += 1;
            if depth > MAX_LAYOUT_DEPTH {
                return Err(anyhow!(
                    "Layout chain starting at `{}` is deeper than {}",
                    layout,
                    MAX_LAYOUT_DEPTH
                ));
            }

            let name = self
                .resolve_layout(&requested)
                .ok_or_else(|| anyhow!("Layout `{}` not found in includes", requested))?;
            let data = &self.layouts[name];

            // Page data wins over layout data
            if let serde_json::Value::Object(map) = data.to_json() {
                for (key, value) in map {
                    if !value.is_null() && !context.contains_key(&key) {
                        context.insert(key, &value);
                    }
                }
            }
            context.insert("content", &content);

            content = self
                .tera
                .render(name, &context)
                .map_err(|e| anyhow!("Failed to render layout {}: {}", name, describe(&e)))?;
            next = data.layout.clone();
        }

        Ok(content)
    }

    /// Layout names may omit the `.html` extension
    fn resolve_layout(&self, requested: &str) -> Option<&str> {
        let with_html = format!("{}.html", requested);
        let found = [requested, with_html.as_str()]
            .into_iter()
            .find_map(|candidate| self.layouts.get_key_value(candidate))
            .map(|(name, _)| name.as_str());
        found
    }

    pub fn layout_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.layouts.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

fn item_template_name(item: &ContentItem) -> String {
    format!("__item__/{}", item.input_path)
}

/// Tera nests the useful message in the source chain
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
