//! Movement Science Club site configuration

use crate::collections::Collection;
use crate::config::{DirConfig, SiteSettings};
use crate::filters::{date, Filter};

use super::{Passthrough, SiteConfigurator};

/// Name of the blog post collection
pub const POSTS_COLLECTION: &str = "movsciposts";

/// Glob selecting blog posts, relative to the project root
pub const POSTS_GLOB: &str = "src/posts/*.md";

/// The club blog: assets copied as-is, posts newest first, a `date` filter
#[derive(Debug, Clone, Copy, Default)]
pub struct MovSciConfig;

impl SiteConfigurator for MovSciConfig {
    fn settings(&self) -> SiteSettings {
        SiteSettings {
            dir: DirConfig {
                input: "src".to_string(),
                output: "_site".to_string(),
                ..DirConfig::default()
            },
            path_prefix: "/movement_science_club/".to_string(),
        }
    }

    fn list_passthroughs(&self) -> Vec<Passthrough> {
        vec![Passthrough::new("src/assets")]
    }

    fn list_collections(&self) -> Vec<Collection> {
        vec![Collection::new(POSTS_COLLECTION, |api| {
            let mut posts = api.get_filtered_by_glob(POSTS_GLOB);
            posts.reverse();
            posts
        })]
    }

    fn list_filters(&self) -> Vec<Filter> {
        vec![date::date_filter()]
    }
}
