//! Global data files (`_data/*.json`, `_data/*.yml`)

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Load every data file in `data_dir`, keyed by file stem.
///
/// A missing directory yields an empty map.
pub fn load_global_data(data_dir: &Path) -> Result<Map<String, Value>> {
    let mut data = Map::new();
    if !data_dir.is_dir() {
        return Ok(data);
    }

    let mut entries: Vec<_> = fs::read_dir(data_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

        let value: Value = match ext {
            "json" => {
                let content = fs::read_to_string(&path)?;
                serde_json::from_str(&content)
                    .map_err(|e| anyhow!("Failed to parse {:?}: {}", path, e))?
            }
            "yml" | "yaml" => {
                let content = fs::read_to_string(&path)?;
                serde_yaml::from_str(&content)
                    .map_err(|e| anyhow!("Failed to parse {:?}: {}", path, e))?
            }
            _ => {
                tracing::debug!("Ignoring data file {:?}", path);
                continue;
            }
        };

        tracing::debug!("Loaded global data `{}` from {:?}", stem, path);
        data.insert(stem.to_string(), value);
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_global_data(&dir.path().join("_data")).unwrap().is_empty());
    }

    #[test]
    fn test_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("club.json"), r#"{"name": "MovSci"}"#).unwrap();
        fs::write(dir.path().join("meetings.yml"), "- monday\n- thursday\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let data = load_global_data(dir.path()).unwrap();
        assert_eq!(data["club"], json!({"name": "MovSci"}));
        assert_eq!(data["meetings"], json!(["monday", "thursday"]));
        assert!(!data.contains_key("notes"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        assert!(load_global_data(dir.path()).is_err());
    }
}
