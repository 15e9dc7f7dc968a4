//! List what the site declares and contains

use anyhow::Result;

use crate::collections;
use crate::content::ContentLoader;
use crate::Site;

/// Render a listing of `kind` as text
pub fn render(site: &Site, kind: &str) -> Result<String> {
    let mut out = String::new();

    match kind {
        "collection" | "collections" => {
            let items = ContentLoader::new(site).load_all()?;
            let resolved = collections::resolve_all(&items, &site.config.collections());
            out.push_str(&format!("Collections ({}):\n", resolved.len()));
            for (name, members) in &resolved {
                out.push_str(&format!("  {} ({})\n", name, members.len()));
                for item in members {
                    out.push_str(&format!(
                        "    {} [{}]\n",
                        item.date.format("%Y-%m-%d"),
                        item.input_path
                    ));
                }
            }
        }
        "filter" | "filters" => {
            let filters = site.config.template_filters();
            out.push_str(&format!("Filters ({}):\n", filters.len()));
            for name in filters.names() {
                out.push_str(&format!("  {}\n", name));
            }
        }
        "passthrough" | "passthroughs" => {
            let passthroughs = site.config.passthroughs();
            out.push_str(&format!("Passthrough copies ({}):\n", passthroughs.len()));
            for p in passthroughs {
                out.push_str(&format!("  {}\n", p.source.display()));
            }
        }
        "item" | "items" => {
            let items = ContentLoader::new(site).load_all()?;
            out.push_str(&format!("Items ({}):\n", items.len()));
            for item in &items {
                let url = item
                    .public_url(&site.settings().path_prefix)
                    .unwrap_or_else(|| "(not written)".to_string());
                out.push_str(&format!(
                    "  {} - {} -> {}\n",
                    item.date.format("%Y-%m-%d"),
                    item.input_path,
                    url
                ));
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: collections, filters, passthroughs, items",
                kind
            );
        }
    }

    Ok(out)
}

/// Print a listing of `kind`
pub fn run(site: &Site, kind: &str) -> Result<()> {
    print!("{}", render(site, kind)?);
    Ok(())
}
