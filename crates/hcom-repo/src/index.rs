//! Repo index parsing (Helm `index.yaml` format)

use semver::Version;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{RepoError, Result};
use hcom_core::version::parse_version;

/// A parsed repository index: chart name to available versions, in the
/// order the index lists them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoIndex {
    #[serde(default)]
    pub entries: HashMap<String, Vec<ChartEntry>>,
}

/// One chart version available in a repository
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl ChartEntry {
    pub fn parsed_version(&self) -> Option<Version> {
        parse_version(&self.version)
    }
}

impl RepoIndex {
    /// Parse from YAML text
    pub fn from_yaml(yaml: &str, origin: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RepoError::IndexParse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load from an index file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content, &path.display().to_string())
    }

    /// All versions of a chart, in index order
    pub fn versions_of(&self, chart_name: &str) -> &[ChartEntry] {
        self.entries
            .get(chart_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Highest version of a chart by semver precedence
    pub fn latest_of(&self, chart_name: &str) -> Option<&ChartEntry> {
        self.versions_of(chart_name)
            .iter()
            .filter_map(|e| e.parsed_version().map(|v| (v, e)))
            .max_by(|(a, _), (b, _)| a.cmp_precedence(b))
            .map(|(_, e)| e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
apiVersion: v1
generated: "2024-01-01T00:00:00Z"
entries:
  nginx:
    - name: nginx
      version: "15.0.0"
      appVersion: "1.25.0"
      digest: "sha256:abc123"
      urls:
        - https://example.com/charts/nginx-15.0.0.tgz
    - name: nginx
      version: "14.2.10"
      appVersion: "1.24.0"
      urls:
        - https://example.com/charts/nginx-14.2.10.tgz
    - name: nginx
      version: "14.2.9"
      appVersion: "1.24.0"
      urls:
        - https://example.com/charts/nginx-14.2.9.tgz
  redis:
    - name: redis
      version: "17.0.0-rc.1"
      appVersion: "7.0.0"
      urls: []
    - name: redis
      version: "16.9.0"
      appVersion: "6.2.0"
      urls: []
"#;

    #[test]
    fn test_parse_index() {
        let index = RepoIndex::from_yaml(INDEX, "test").unwrap();
        assert_eq!(index.entries.len(), 2);
        assert_eq!(index.versions_of("nginx").len(), 3);
        assert!(index.versions_of("absent").is_empty());
    }

    #[test]
    fn test_latest_by_precedence() {
        let index = RepoIndex::from_yaml(INDEX, "test").unwrap();
        assert_eq!(index.latest_of("nginx").unwrap().version, "15.0.0");
        // 14.2.10 > 14.2.9 numerically, not lexicographically
        let nginx = index.versions_of("nginx");
        assert!(hcom_core::version::is_newer(&nginx[2].version, &nginx[1].version));
    }

    #[test]
    fn test_latest_prerelease_loses_to_release() {
        let index = RepoIndex::from_yaml(INDEX, "test").unwrap();
        // 17.0.0-rc.1 > 16.9.0 by precedence, so it is the latest here
        assert_eq!(index.latest_of("redis").unwrap().version, "17.0.0-rc.1");
    }

    #[test]
    fn test_parse_error() {
        let err = RepoIndex::from_yaml("entries: [not, a, map]", "broken").unwrap_err();
        assert!(matches!(err, RepoError::IndexParse { .. }));
    }
}
