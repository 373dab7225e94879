//! Environment file loading
//!
//! Deployments keep `CIVIC_CONFIG` and `CIVIC__...` overrides in a
//! `civic.env` file. Variables already present in the process environment
//! always win over the file.

use std::path::PathBuf;

use tracing::debug;

/// Candidate env file locations, in search order
pub fn env_file_candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/usr/local/etc/civic/civic.env")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("civic").join("civic.env"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join("civic").join("civic.env"));
    }
    paths
}

/// Load the first env file found and apply it. Returns the file used, if any.
pub fn load_env_file() -> Option<PathBuf> {
    let path = env_file_candidates().into_iter().find(|p| p.exists())?;
    let contents = std::fs::read_to_string(&path).ok()?;
    let applied = apply_env_pairs(parse_env_pairs(&contents));
    debug!("Applied {} variables from {}", applied, path.display());
    Some(path)
}

/// Parse `KEY=value` lines.
///
/// Accepts `export KEY=value`, double or single quoted values, blank lines
/// and `#` comments. Lines without `=` or with an empty key are skipped.
pub fn parse_env_pairs(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Set each variable that is not already defined. Returns how many were set.
pub fn apply_env_pairs(pairs: Vec<(String, String)>) -> usize {
    let mut applied = 0;
    for (key, value) in pairs {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(&key, value);
            applied += 1;
        }
    }
    applied
}
