//! Helm cache and config path resolution
//!
//! Matches helm's own resolution order: explicit env overrides first
//! (`HELM_REPOSITORY_CACHE`, `HELM_CACHE_HOME`, `HELM_CONFIG_HOME`), then
//! the platform defaults (`~/.cache/helm` / `~/.config/helm` on Linux and
//! macOS, `%APPDATA%\helm` on Windows).

use std::path::PathBuf;

/// Directory holding `*-index.yaml` repo caches
pub fn helm_cache_dir() -> Option<PathBuf> {
    if let Some(repo_cache) = env_path("HELM_REPOSITORY_CACHE") {
        return Some(repo_cache);
    }
    if let Some(cache_home) = env_path("HELM_CACHE_HOME") {
        return Some(cache_home.join("repository"));
    }
    if cfg!(windows) {
        return env_path("APPDATA").map(|p| p.join("helm").join("repository"));
    }
    dirs::cache_dir().map(|p| p.join("helm").join("repository"))
}

/// Directory holding `repositories.yaml`
pub fn helm_config_dir() -> Option<PathBuf> {
    if let Some(config_home) = env_path("HELM_CONFIG_HOME") {
        return Some(config_home);
    }
    if cfg!(windows) {
        return env_path("APPDATA").map(|p| p.join("helm"));
    }
    dirs::config_dir().map(|p| p.join("helm"))
}

/// Path of the known-repos file
pub fn repositories_file() -> Option<PathBuf> {
    helm_config_dir().map(|p| p.join("repositories.yaml"))
}

fn env_path(var: &str) -> Option<PathBuf> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_dir_resolves() {
        // Either an env override or the platform default should yield a path
        let dir = helm_cache_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("repository") || std::env::var("HELM_REPOSITORY_CACHE").is_ok());
    }

    #[test]
    fn test_repositories_file_under_config_dir() {
        let file = repositories_file().unwrap();
        assert!(file.ends_with("repositories.yaml"));
    }
}
