//! Repo resolver: which repository did a chart come from?
//!
//! Scans the local Helm cache for `*-index.yaml` files and matches the
//! deployed chart against their entries. Parsed indexes are memoized for
//! the invocation; repo index files can be large.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::HelmRepositories;
use crate::error::Result;
use crate::index::RepoIndex;
use crate::paths;
use hcom_core::chart::ChartRef;
use hcom_core::owner::Confidence;

const INDEX_SUFFIX: &str = "-index.yaml";

/// A repository entry matching a deployed chart
#[derive(Debug, Clone, Serialize)]
pub struct SourceMatch {
    pub repo_name: String,
    pub repo_url: String,
    pub confidence: Confidence,
    pub reason: String,
}

/// Scans and queries the local repo index caches
pub struct RepoResolver {
    cache_dir: Option<PathBuf>,
    repos: HelmRepositories,
    indexes: HashMap<String, Option<RepoIndex>>,
}

impl RepoResolver {
    /// Resolver over the environment's Helm cache locations
    pub fn from_env() -> Self {
        let repos = paths::repositories_file()
            .map(|p| HelmRepositories::load_from(&p).unwrap_or_default())
            .unwrap_or_default();
        Self {
            cache_dir: paths::helm_cache_dir(),
            repos,
            indexes: HashMap::new(),
        }
    }

    /// Resolver over explicit locations (used by tests)
    pub fn new(cache_dir: PathBuf, repos: HelmRepositories) -> Self {
        Self {
            cache_dir: Some(cache_dir),
            repos,
            indexes: HashMap::new(),
        }
    }

    /// Names of repos with a cached index, sorted for deterministic output
    pub fn cached_repo_names(&self) -> Vec<String> {
        let Some(dir) = &self.cache_dir else {
            return Vec::new();
        };
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| {
                let file_name = entry.ok()?.file_name().into_string().ok()?;
                file_name
                    .strip_suffix(INDEX_SUFFIX)
                    .map(|name| name.to_string())
            })
            .collect();
        names.sort();
        names
    }

    /// Annotation keys a chart may carry that point at its origin
    const SOURCE_ANNOTATIONS: &'static [&'static str] =
        &["artifacthub.io/repository", "helm.sh/chart-url"];

    /// Every repository whose index matches the chart, in scan order.
    /// Chart annotations are checked first as origin hints.
    pub fn resolve_source(
        &mut self,
        chart: &ChartRef,
        annotations: &std::collections::BTreeMap<String, String>,
    ) -> Result<Vec<SourceMatch>> {
        let mut matches = Vec::new();

        for key in Self::SOURCE_ANNOTATIONS {
            if let Some(url) = annotations.get(*key) {
                matches.push(SourceMatch {
                    repo_name: "(annotation)".to_string(),
                    repo_url: url.clone(),
                    confidence: Confidence::Medium,
                    reason: format!("chart annotation {}", key),
                });
            }
        }

        for repo_name in self.cached_repo_names() {
            let exact = {
                let Some(index) = self.index_of(&repo_name)? else {
                    continue;
                };
                let entries = index.versions_of(&chart.name);
                if entries.is_empty() {
                    continue;
                }
                entries.iter().any(|e| match (&chart.digest, &e.digest) {
                    (Some(want), Some(have)) if want == have => true,
                    _ => e.version == chart.version && e.app_version == chart.app_version,
                })
            };

            let repo_url = self.repos.url_of(&repo_name).unwrap_or_default().to_string();
            if exact {
                matches.push(SourceMatch {
                    repo_name: repo_name.clone(),
                    repo_url,
                    confidence: Confidence::High,
                    reason: format!("exact version match in {} index", repo_name),
                });
            } else {
                matches.push(SourceMatch {
                    repo_name: repo_name.clone(),
                    repo_url,
                    confidence: Confidence::Medium,
                    reason: format!(
                        "chart found in {} (version {} not in cache)",
                        repo_name, chart.version
                    ),
                });
            }
        }

        Ok(matches)
    }

    /// All available versions of a chart, per repo
    pub fn versions_by_repo(&mut self, chart_name: &str) -> Result<Vec<(String, Vec<String>)>> {
        let mut result = Vec::new();
        for repo_name in self.cached_repo_names() {
            let Some(index) = self.index_of(&repo_name)? else {
                continue;
            };
            let versions: Vec<String> = index
                .versions_of(chart_name)
                .iter()
                .map(|e| e.version.clone())
                .collect();
            if !versions.is_empty() {
                result.push((repo_name, versions));
            }
        }
        Ok(result)
    }

    /// Parse (or recall) one repo index; unparseable indexes are skipped
    /// with a log line rather than failing the scan
    fn index_of(&mut self, repo_name: &str) -> Result<Option<&RepoIndex>> {
        if !self.indexes.contains_key(repo_name) {
            let loaded = match self.index_path(repo_name) {
                Some(path) => match RepoIndex::load(&path) {
                    Ok(index) => Some(index),
                    Err(e) => {
                        tracing::warn!(repo = %repo_name, error = %e, "skipping unparseable index");
                        None
                    }
                },
                None => None,
            };
            self.indexes.insert(repo_name.to_string(), loaded);
        }
        Ok(self.indexes.get(repo_name).and_then(Option::as_ref))
    }

    fn index_path(&self, repo_name: &str) -> Option<PathBuf> {
        let dir = self.cache_dir.as_deref()?;
        let path = dir.join(format!("{}{}", repo_name, INDEX_SUFFIX));
        path.exists().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;

    const BITNAMI_INDEX: &str = r#"
apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: "15.0.0"
      appVersion: "1.25.0"
      digest: "sha256:abc123"
      urls: ["https://charts.example.com/nginx-15.0.0.tgz"]
    - name: nginx
      version: "13.2.0"
      appVersion: "1.25.0"
      urls: ["https://charts.example.com/nginx-13.2.0.tgz"]
"#;

    const OTHER_INDEX: &str = r#"
apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: "9.9.9"
      appVersion: "1.20.0"
      urls: []
"#;

    fn chart(version: &str, app_version: &str) -> ChartRef {
        ChartRef {
            name: "nginx".to_string(),
            version: version.to_string(),
            app_version: app_version.to_string(),
            digest: None,
        }
    }

    fn fixture() -> (tempfile::TempDir, RepoResolver) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bitnami-index.yaml"), BITNAMI_INDEX).unwrap();
        fs::write(dir.path().join("other-index.yaml"), OTHER_INDEX).unwrap();

        let repos: HelmRepositories = serde_yaml::from_str(
            r#"
repositories:
  - name: bitnami
    url: https://charts.bitnami.com/bitnami
  - name: other
    url: https://other.example.com
"#,
        )
        .unwrap();

        let resolver = RepoResolver::new(dir.path().to_path_buf(), repos);
        (dir, resolver)
    }

    #[test]
    fn test_cached_repo_names_sorted() {
        let (_dir, resolver) = fixture();
        assert_eq!(resolver.cached_repo_names(), vec!["bitnami", "other"]);
    }

    #[test]
    fn test_exact_version_match_is_high_confidence() {
        let (_dir, mut resolver) = fixture();
        let matches = resolver
            .resolve_source(&chart("13.2.0", "1.25.0"), &BTreeMap::new())
            .unwrap();

        // bitnami has the exact version, other only carries the chart name
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].repo_name, "bitnami");
        assert_eq!(matches[0].confidence, Confidence::High);
        assert_eq!(matches[1].repo_name, "other");
        assert_eq!(matches[1].confidence, Confidence::Medium);
    }

    #[test]
    fn test_digest_match() {
        let (_dir, mut resolver) = fixture();
        let mut wanted = chart("0.0.0", "0.0.0");
        wanted.digest = Some("sha256:abc123".to_string());
        let matches = resolver.resolve_source(&wanted, &BTreeMap::new()).unwrap();
        assert_eq!(matches[0].confidence, Confidence::High);
    }

    #[test]
    fn test_annotation_hint_comes_first() {
        let (_dir, mut resolver) = fixture();
        let annotations: BTreeMap<String, String> = [(
            "artifacthub.io/repository".to_string(),
            "https://artifacthub.io/packages/helm/x/nginx".to_string(),
        )]
        .into();
        let matches = resolver
            .resolve_source(&chart("13.2.0", "1.25.0"), &annotations)
            .unwrap();
        assert_eq!(matches[0].repo_name, "(annotation)");
        assert_eq!(matches[0].confidence, Confidence::Medium);
    }

    #[test]
    fn test_unknown_chart_has_no_matches() {
        let (_dir, mut resolver) = fixture();
        let mut wanted = chart("1.0.0", "1.0.0");
        wanted.name = "does-not-exist".to_string();
        let matches = resolver.resolve_source(&wanted, &BTreeMap::new()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_versions_by_repo() {
        let (_dir, mut resolver) = fixture();
        let versions = resolver.versions_by_repo("nginx").unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].0, "bitnami");
        assert_eq!(versions[0].1, vec!["15.0.0", "13.2.0"]);
    }

    #[test]
    fn test_corrupt_index_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad-index.yaml"), "entries: [oops").unwrap();
        fs::write(dir.path().join("good-index.yaml"), BITNAMI_INDEX).unwrap();

        let mut resolver = RepoResolver::new(dir.path().to_path_buf(), HelmRepositories::default());
        let matches = resolver
            .resolve_source(&chart("13.2.0", "1.25.0"), &BTreeMap::new())
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].repo_name, "good");
    }
}
