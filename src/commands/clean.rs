//! Clean the output directory

use anyhow::Result;
use std::fs;

use crate::Site;

/// Remove the output directory
pub fn run(site: &Site) -> Result<()> {
    if site.output_dir.exists() {
        fs::remove_dir_all(&site.output_dir)?;
        tracing::info!("Deleted: {:?}", site.output_dir);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_output_only() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::open(dir.path()).unwrap();
        fs::create_dir_all(site.output_dir.join("posts")).unwrap();
        fs::create_dir_all(&site.input_dir).unwrap();

        run(&site).unwrap();
        assert!(!site.output_dir.exists());
        assert!(site.input_dir.exists());

        // Nothing to remove the second time
        run(&site).unwrap();
    }
}
