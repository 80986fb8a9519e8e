//! Update checker: deployed chart versions vs. available versions

use serde::Serialize;

use crate::error::Result;
use crate::resolver::RepoResolver;
use hcom_core::release::HelmRelease;
use hcom_core::version::{UpdateType, classify_update, is_newer};

/// Per-release update result
#[derive(Debug, Clone, Serialize)]
pub struct UpdateInfo {
    pub release_name: String,
    pub namespace: String,
    pub chart_name: String,
    pub current_version: String,
    pub latest_version: String,
    /// Repo carrying the latest version; empty when already current
    pub repo: String,
    pub update_type: UpdateType,
    pub upgrade_available: bool,
}

/// Checks a set of releases against the local repo caches
pub struct UpdateChecker<'a> {
    resolver: &'a mut RepoResolver,
}

impl<'a> UpdateChecker<'a> {
    pub fn new(resolver: &'a mut RepoResolver) -> Self {
        Self { resolver }
    }

    /// Check every release with a known chart; releases without chart
    /// metadata are skipped
    pub fn check(&mut self, releases: &[HelmRelease]) -> Result<Vec<UpdateInfo>> {
        let mut results = Vec::new();
        for release in releases {
            if release.chart_name().is_empty() || release.chart_version().is_empty() {
                continue;
            }
            results.push(self.check_one(release)?);
        }
        Ok(results)
    }

    fn check_one(&mut self, release: &HelmRelease) -> Result<UpdateInfo> {
        let current = release.chart_version();
        let versions = self.resolver.versions_by_repo(release.chart_name())?;

        let mut latest = current.to_string();
        let mut repo = String::new();
        for (repo_name, repo_versions) in &versions {
            for candidate in repo_versions {
                if is_newer(&latest, candidate) {
                    latest = candidate.clone();
                    repo = repo_name.clone();
                }
            }
        }

        let update_type = classify_update(current, &latest);
        let upgrade_available = latest != current;

        Ok(UpdateInfo {
            release_name: release.name.clone(),
            namespace: release.namespace.clone(),
            chart_name: release.chart_name().to_string(),
            current_version: current.to_string(),
            latest_version: latest,
            repo,
            update_type,
            upgrade_available,
        })
    }
}
