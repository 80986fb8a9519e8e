//! Doctor engine: cross-release diagnostic checks
//!
//! Inputs are gathered once (storage object metadata plus the decoded
//! latest revision of each release); every check is a pure function over
//! them, so one failing check can never abort the others.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::client::ClusterClient;
use crate::error::Result;
use crate::store::{ListFilters, ReleaseStore, StorageMeta};
use hcom_core::doctor::{DoctorFinding, FindingCategory, Severity};
use hcom_core::release::{HelmRelease, ReleaseStatus, StorageKind};

/// Thresholds for the heuristic checks
#[derive(Debug, Clone)]
pub struct DoctorConfig {
    /// How long a pending operation may run before it counts as stuck
    pub stuck_after: Duration,
    /// Stored revisions per release before flagging bloat
    pub bloat_threshold: usize,
    /// Age an uninstalled single-revision secret must reach before it
    /// counts as orphaned
    pub orphan_retention: Duration,
}

impl Default for DoctorConfig {
    fn default() -> Self {
        Self {
            stuck_after: Duration::minutes(15),
            bloat_threshold: 10,
            orphan_retention: Duration::hours(24),
        }
    }
}

/// Everything the checks need, gathered up front
pub(crate) struct DoctorInputs {
    pub secrets: Vec<StorageMeta>,
    pub configmaps: Vec<StorageMeta>,
    pub releases: Vec<HelmRelease>,
    pub now: DateTime<Utc>,
}

/// Aggregate diagnostics over all releases and storage objects
pub struct DoctorEngine<'a> {
    client: &'a ClusterClient,
    config: DoctorConfig,
}

impl<'a> DoctorEngine<'a> {
    pub fn new(client: &'a ClusterClient) -> Self {
        Self {
            client,
            config: DoctorConfig::default(),
        }
    }

    pub fn with_config(client: &'a ClusterClient, config: DoctorConfig) -> Self {
        Self { client, config }
    }

    /// Run all checks and return findings sorted by severity (most severe
    /// first), then category
    pub async fn run(&self, namespace: Option<&str>) -> Result<Vec<DoctorFinding>> {
        let store = ReleaseStore::new(self.client);
        let objects = store.fetch_objects(namespace, None).await?;

        let mut secrets = Vec::new();
        let mut configmaps = Vec::new();
        for object in &objects {
            let meta = object.meta().clone();
            match meta.kind {
                StorageKind::Secret => secrets.push(meta),
                StorageKind::ConfigMap => configmaps.push(meta),
            }
        }

        let releases = store.list(namespace, &ListFilters::default()).await?;

        let inputs = DoctorInputs {
            secrets,
            configmaps,
            releases,
            now: Utc::now(),
        };

        let mut findings = run_checks(&inputs, &self.config);
        findings.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.category.as_str().cmp(b.category.as_str()))
                .then_with(|| a.subject.cmp(&b.subject))
        });
        Ok(findings)
    }
}

pub(crate) fn run_checks(inputs: &DoctorInputs, config: &DoctorConfig) -> Vec<DoctorFinding> {
    let mut findings = Vec::new();
    findings.extend(check_storage_mixed(inputs));
    findings.extend(check_failed(inputs));
    findings.extend(check_pending_stuck(inputs, config));
    findings.extend(check_no_deployed_revision(inputs));
    findings.extend(check_duplicate_chart(inputs));
    findings.extend(check_orphaned_secrets(inputs, config));
    findings.extend(check_revision_bloat(inputs, config));
    findings
}

fn check_storage_mixed(inputs: &DoctorInputs) -> Vec<DoctorFinding> {
    if inputs.secrets.is_empty() || inputs.configmaps.is_empty() {
        return Vec::new();
    }
    vec![
        DoctorFinding::new(
            Severity::Warn,
            FindingCategory::StorageMixed,
            "cluster",
            format!(
                "releases exist under both storage drivers: {} secrets, {} configmaps",
                inputs.secrets.len(),
                inputs.configmaps.len()
            ),
        )
        .with_suggestion("Migrated or misconfigured releases; consider standardizing on secrets."),
    ]
}

fn check_failed(inputs: &DoctorInputs) -> Vec<DoctorFinding> {
    inputs
        .releases
        .iter()
        .filter(|r| r.status == ReleaseStatus::Failed)
        .map(|r| {
            let detail = if r.description.is_empty() {
                String::new()
            } else {
                format!(": {}", r.description)
            };
            DoctorFinding::new(
                Severity::Error,
                FindingCategory::Failed,
                subject(r),
                format!("release is in failed state{}", detail),
            )
            .with_suggestion("Check the release description; consider rollback or uninstall.")
        })
        .collect()
}

fn check_pending_stuck(inputs: &DoctorInputs, config: &DoctorConfig) -> Vec<DoctorFinding> {
    inputs
        .releases
        .iter()
        .filter(|r| r.status.is_pending())
        .filter_map(|r| {
            // A pending release without a deploy timestamp cannot prove it
            // is still fresh, so it counts as stuck
            let message = match r.updated_at {
                Some(updated) => {
                    let age = inputs.now.signed_duration_since(updated);
                    if age <= config.stuck_after {
                        return None;
                    }
                    format!("stuck in '{}' for {} minutes", r.status, age.num_minutes())
                }
                None => format!(
                    "stuck in '{}' for an unknown duration (no deploy timestamp)",
                    r.status
                ),
            };
            Some(
                DoctorFinding::new(
                    Severity::Error,
                    FindingCategory::PendingStuck,
                    subject(r),
                    message,
                )
                .with_suggestion(
                    "The operation was likely interrupted; check pod status and consider rollback.",
                ),
            )
        })
        .collect()
}

fn check_no_deployed_revision(inputs: &DoctorInputs) -> Vec<DoctorFinding> {
    let mut statuses: BTreeMap<(String, String), Vec<ReleaseStatus>> = BTreeMap::new();
    for meta in inputs.secrets.iter().chain(&inputs.configmaps) {
        if meta.name.is_empty() {
            continue;
        }
        statuses
            .entry((meta.namespace.clone(), meta.name.clone()))
            .or_default()
            .push(meta.status);
    }

    statuses
        .into_iter()
        .filter(|(_, history)| !history.contains(&ReleaseStatus::Deployed))
        .map(|((namespace, name), _)| {
            DoctorFinding::new(
                Severity::Warn,
                FindingCategory::NoDeployedRevision,
                format!("{}/{}", namespace, name),
                "no stored revision has status 'deployed'",
            )
            .with_suggestion("The release may be orphaned or mid-operation; consider cleanup.")
        })
        .collect()
}

fn check_duplicate_chart(inputs: &DoctorInputs) -> Vec<DoctorFinding> {
    let mut by_chart: BTreeMap<(String, String), Vec<&str>> = BTreeMap::new();
    for release in &inputs.releases {
        if release.chart_name().is_empty() {
            continue;
        }
        by_chart
            .entry((release.namespace.clone(), release.chart_name().to_string()))
            .or_default()
            .push(&release.name);
    }

    by_chart
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|((namespace, chart), names)| {
            DoctorFinding::new(
                Severity::Warn,
                FindingCategory::DuplicateChart,
                format!("{}/{}", namespace, chart),
                format!(
                    "chart '{}' deployed {} times in namespace '{}': {}",
                    chart,
                    names.len(),
                    namespace,
                    names.join(", ")
                ),
            )
            .with_suggestion("Verify that multiple instances are intentional.")
        })
        .collect()
}

fn check_orphaned_secrets(inputs: &DoctorInputs, config: &DoctorConfig) -> Vec<DoctorFinding> {
    let mut groups: BTreeMap<(String, String), Vec<&StorageMeta>> = BTreeMap::new();
    for meta in &inputs.secrets {
        if meta.name.is_empty() {
            continue;
        }
        groups
            .entry((meta.namespace.clone(), meta.name.clone()))
            .or_default()
            .push(meta);
    }

    groups
        .into_iter()
        .filter_map(|((namespace, name), revisions)| {
            if revisions.len() != 1 {
                return None;
            }
            let only = revisions[0];
            if only.status != ReleaseStatus::Uninstalled {
                return None;
            }
            let created = only.created?;
            if inputs.now.signed_duration_since(created) <= config.orphan_retention {
                return None;
            }
            Some(
                DoctorFinding::new(
                    Severity::Warn,
                    FindingCategory::OrphanedSecret,
                    format!("{}/{}", namespace, name),
                    format!(
                        "single uninstalled revision secret '{}' left behind",
                        only.object_name
                    ),
                )
                .with_suggestion("Leftover from an uninstall with --keep-history; safe to delete."),
            )
        })
        .collect()
}

fn check_revision_bloat(inputs: &DoctorInputs, config: &DoctorConfig) -> Vec<DoctorFinding> {
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for meta in inputs.secrets.iter().chain(&inputs.configmaps) {
        if meta.name.is_empty() {
            continue;
        }
        *counts
            .entry((meta.namespace.clone(), meta.name.clone()))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > config.bloat_threshold)
        .map(|((namespace, name), count)| {
            DoctorFinding::new(
                Severity::Info,
                FindingCategory::RevisionBloat,
                format!("{}/{}", namespace, name),
                format!("{} stored revisions", count),
            )
            .with_suggestion("Set --history-max on helm upgrade to bound stored revisions.")
        })
        .collect()
}

fn subject(release: &HelmRelease) -> String {
    format!("{}/{}", release.namespace, release.name)
}
