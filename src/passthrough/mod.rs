//! Passthrough copy - mirrors directories into the output tree

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::configurator::Passthrough;
use crate::Site;

/// Copy every registered passthrough directory, returning the file count
pub fn copy_all(site: &Site) -> Result<usize> {
    let mut copied = 0;
    for passthrough in site.config.passthroughs() {
        copied += copy_one(site, passthrough)?;
    }
    Ok(copied)
}

/// Copy one passthrough directory.
///
/// A missing source is skipped with a warning; an empty one copies nothing.
pub fn copy_one(site: &Site, passthrough: &Passthrough) -> Result<usize> {
    let source_dir = site.base_dir.join(&passthrough.source);
    if !source_dir.exists() {
        tracing::warn!("Passthrough source {:?} does not exist, skipping", source_dir);
        return Ok(0);
    }

    let dest_dir = destination(site, &source_dir);
    let mut copied = 0;

    for entry in WalkDir::new(&source_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let relative = path.strip_prefix(&source_dir)?;
        let dest = dest_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &dest)?;
        copied += 1;
    }

    tracing::debug!("Copied {} files from {:?} to {:?}", copied, source_dir, dest_dir);
    Ok(copied)
}

/// Sources inside the input root keep their path below it; others keep
/// their path below the project root.
fn destination(site: &Site, source_dir: &Path) -> PathBuf {
    let relative = source_dir
        .strip_prefix(&site.input_dir)
        .or_else(|_| source_dir.strip_prefix(&site.base_dir))
        .unwrap_or(source_dir);
    site.output_dir.join(relative)
}
