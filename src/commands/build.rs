//! Build the site, optionally rebuilding on changes

use anyhow::Result;
use notify::Watcher;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::generator::{BuildReport, Generator};
use crate::Site;

/// Run one full build
pub fn run(site: &Site) -> Result<BuildReport> {
    let start = Instant::now();

    let report = Generator::new(site).generate()?;

    tracing::info!(
        "Wrote {} pages, copied {} files in {:.2}s",
        report.written,
        report.copied,
        start.elapsed().as_secs_f64()
    );
    for (name, count) in &report.collections {
        tracing::debug!("  collection {}: {} items", name, count);
    }

    Ok(report)
}

/// Paths whose changes trigger a rebuild
pub fn watch_targets(site: &Site) -> Vec<PathBuf> {
    let mut targets = vec![site.input_dir.clone()];
    for passthrough in site.config.passthroughs() {
        let source = site.base_dir.join(&passthrough.source);
        if !source.starts_with(&site.input_dir) {
            targets.push(source);
        }
    }
    for name in ["site.yml", "site.yaml", "site.toml"] {
        let path = site.base_dir.join(name);
        if path.exists() {
            targets.push(path);
        }
    }
    targets
}

/// Events under the output directory or editor scratch files are ignored
pub fn is_relevant_change(site: &Site, path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    !path.starts_with(&site.output_dir)
        && !path_str.contains(".git")
        && !path_str.contains(".DS_Store")
        && !path_str.ends_with('~')
        && !path_str.ends_with(".swp")
}

/// Watch for file changes and rebuild.
///
/// Each rebuild re-reads the configurator so registrations start fresh.
pub fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    for target in watch_targets(site) {
        if target.exists() {
            let mode = if target.is_dir() {
                notify::RecursiveMode::Recursive
            } else {
                notify::RecursiveMode::NonRecursive
            };
            watcher.watch(&target, mode)?;
            tracing::debug!("Watching: {:?}", target);
        }
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let mut last_rebuild = Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if !event.paths.iter().any(|p| is_relevant_change(site, p)) {
                    continue;
                }
                // Debounce bursts of events from a single save
                if last_rebuild.elapsed() > Duration::from_millis(500) {
                    tracing::info!("File changed, rebuilding...");
                    match site.reload().and_then(|fresh| run(&fresh)) {
                        Ok(_) => {}
                        Err(e) => tracing::error!("Build failed: {:#}", e),
                    }
                    last_rebuild = Instant::now();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_targets_include_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.yml"), "pathPrefix: /x/\n").unwrap();
        let site = Site::open(dir.path()).unwrap();
        let targets = watch_targets(&site);
        assert_eq!(targets[0], site.input_dir);
        assert!(targets.contains(&dir.path().join("site.yml")));
        // src/assets lives inside the input root
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_output_changes_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::open(dir.path()).unwrap();
        assert!(!is_relevant_change(&site, &site.output_dir.join("index.html")));
        assert!(!is_relevant_change(&site, &site.input_dir.join("posts/.a.md.swp")));
        assert!(is_relevant_change(&site, &site.input_dir.join("posts/a.md")));
    }
}
