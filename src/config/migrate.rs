use super::Config;
use serde_yaml::Value;
use std::fs;
use std::io;
use std::path::Path;

/// Compare the YAML file against the current `Config` layout and add every
/// key that is missing, using its default value.
///
/// Returns the names of the keys that were added (empty → nothing to do).
/// With `dry_run` the file is left untouched.
pub fn fill_missing_keys(conf_file: &Path, dry_run: bool) -> io::Result<Vec<String>> {
    if !conf_file.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(conf_file)?;
    let mut yaml: Value = serde_yaml::from_str(&content)
        .map_err(|e| io::Error::other(format!("parse error in {:?}: {}", conf_file, e)))?;

    let defaults = serde_yaml::to_value(Config::default())
        .map_err(|e| io::Error::other(format!("serialize error: {}", e)))?;

    let (Some(map), Some(default_map)) = (yaml.as_mapping_mut(), defaults.as_mapping()) else {
        return Err(io::Error::other(format!(
            "{:?} is not a YAML mapping",
            conf_file
        )));
    };

    let mut added = Vec::new();
    for (key, value) in default_map {
        if !map.contains_key(key) {
            map.insert(key.clone(), value.clone());
            if let Some(k) = key.as_str() {
                added.push(k.to_string());
            }
        }
    }

    if !added.is_empty() && !dry_run {
        let serialized = serde_yaml::to_string(&yaml)
            .map_err(|e| io::Error::other(format!("serialize error: {}", e)))?;
        fs::write(conf_file, serialized)?;
    }

    Ok(added)
}
