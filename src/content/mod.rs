//! Content module - discovers and parses templates under the input directory

mod frontmatter;
mod item;
pub mod loader;
mod markdown;

pub use frontmatter::{parse_date_string, FrontMatter, Permalink};
pub use item::{ContentItem, TemplateKind};
pub use loader::ContentLoader;
pub use markdown::MarkdownRenderer;

#[cfg(test)]
pub(crate) use item::tests::item as test_item;
