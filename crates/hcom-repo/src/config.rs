//! Known-repos configuration (`repositories.yaml`)

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

/// Helm's `repositories.yaml` file, read-only
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HelmRepositories {
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

/// One configured repository
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl HelmRepositories {
    /// Load from a specific path; a missing file yields the empty config
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// URL of a repository by name, if configured
    pub fn url_of(&self, name: &str) -> Option<&str> {
        self.repositories
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_repositories() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"apiVersion: ""
generated: "0001-01-01T00:00:00Z"
repositories:
  - name: bitnami
    url: https://charts.bitnami.com/bitnami
  - name: jetstack
    url: https://charts.jetstack.io
"#
        )
        .unwrap();

        let repos = HelmRepositories::load_from(file.path()).unwrap();
        assert_eq!(repos.repositories.len(), 2);
        assert_eq!(
            repos.url_of("bitnami"),
            Some("https://charts.bitnami.com/bitnami")
        );
        assert_eq!(repos.url_of("missing"), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let repos = HelmRepositories::load_from(Path::new("/nonexistent/repositories.yaml")).unwrap();
        assert!(repos.repositories.is_empty());
    }
}
