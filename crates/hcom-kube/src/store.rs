//! Release store: label-indexed listing with latest-revision selection
//!
//! Enumeration works on storage labels alone (`name`, `status`, `version`),
//! so only the selected object of each release pays the payload decode.
//! Secrets and ConfigMaps are merged: the storage driver is a per-object
//! attribute and revisions group by `(name, namespace)` regardless of
//! driver.

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::client::ClusterClient;
use crate::decode::{decode_configmap, decode_secret, release_from_labels};
use crate::error::Result;
use hcom_core::release::{HelmRelease, ReleaseStatus, StorageKind};

/// Filters applied by `list`
#[derive(Debug, Default)]
pub struct ListFilters {
    /// Regex matched against release name and chart name (union)
    pub filter: Option<Regex>,
    /// Status category filter
    pub only: Option<StatusCategory>,
    /// Case-insensitive exact status match
    pub status: Option<String>,
}

/// Status categories accepted by `--only`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Deployed,
    Failed,
    Pending,
    /// Failed, pending, or superseded with no deployed revision anywhere
    /// in the history
    Problematic,
}

impl StatusCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "deployed" => Some(Self::Deployed),
            "failed" => Some(Self::Failed),
            "pending" => Some(Self::Pending),
            "problematic" => Some(Self::Problematic),
            _ => None,
        }
    }
}

/// Label metadata of one storage object, extracted without decoding
#[derive(Debug, Clone)]
pub(crate) struct StorageMeta {
    pub name: String,
    pub namespace: String,
    pub status: ReleaseStatus,
    pub revision: u32,
    pub object_name: String,
    pub created: Option<DateTime<Utc>>,
    pub kind: StorageKind,
}

impl StorageMeta {
    fn from_object_meta(meta: &ObjectMeta, kind: StorageKind) -> Self {
        let labels = meta.labels.clone().unwrap_or_default();
        Self {
            name: labels.get("name").cloned().unwrap_or_default(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            status: labels
                .get("status")
                .map(|s| ReleaseStatus::parse(s))
                .unwrap_or_default(),
            revision: labels
                .get("version")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            object_name: meta.name.clone().unwrap_or_default(),
            created: meta.creation_timestamp.as_ref().map(|t| t.0),
            kind,
        }
    }
}

/// One storage object plus its extracted label metadata
pub(crate) enum StoredObject {
    Secret(Box<Secret>, StorageMeta),
    ConfigMap(Box<ConfigMap>, StorageMeta),
}

impl StoredObject {
    pub(crate) fn meta(&self) -> &StorageMeta {
        match self {
            Self::Secret(_, m) | Self::ConfigMap(_, m) => m,
        }
    }

    /// Run the full decode pipeline; a failure degrades to the label fast
    /// path with status `unknown` and a diagnostic note
    fn decode_or_degrade(&self, context: &str) -> HelmRelease {
        let result = match self {
            Self::Secret(secret, _) => decode_secret(secret, context),
            Self::ConfigMap(cm, _) => decode_configmap(cm, context),
        };
        match result {
            Ok(release) => release,
            Err(e) => {
                let meta = self.meta();
                tracing::warn!(object = %meta.object_name, error = %e, "release decode failed");
                let mut partial = release_from_labels(
                    meta.kind,
                    &meta.object_name,
                    &meta.namespace,
                    &labels_map(meta),
                    context,
                );
                partial.status = ReleaseStatus::Unknown;
                partial.diagnostic = Some(e.to_string());
                partial
            }
        }
    }
}

fn labels_map(meta: &StorageMeta) -> BTreeMap<String, String> {
    [
        ("name".to_string(), meta.name.clone()),
        ("status".to_string(), meta.status.as_str().to_string()),
        ("version".to_string(), meta.revision.to_string()),
    ]
    .into()
}

/// Fetches Helm releases from the cluster's object store
pub struct ReleaseStore<'a> {
    client: &'a ClusterClient,
}

impl<'a> ReleaseStore<'a> {
    pub fn new(client: &'a ClusterClient) -> Self {
        Self { client }
    }

    /// List the current (highest) revision of each release, ordered by
    /// `(namespace, name)`
    pub async fn list(
        &self,
        namespace: Option<&str>,
        filters: &ListFilters,
    ) -> Result<Vec<HelmRelease>> {
        let objects = self.fetch_objects(namespace, None).await?;
        let context = self.client.context();

        let mut releases = Vec::new();
        for (_, group) in group_objects(objects) {
            let statuses: Vec<ReleaseStatus> = group.iter().map(|o| o.meta().status).collect();
            let latest = &group[select_latest(&group)];

            if let Some(category) = filters.only {
                if !matches_category(latest.meta().status, &statuses, category) {
                    continue;
                }
            }

            let release = latest.decode_or_degrade(context);

            if let Some(re) = &filters.filter {
                if !matches_filter(&release, re) {
                    continue;
                }
            }
            if let Some(wanted) = &filters.status {
                if !release.status.as_str().eq_ignore_ascii_case(wanted) {
                    continue;
                }
            }

            releases.push(release);
        }

        Ok(releases)
    }

    /// Get the highest-revision release matching the name
    pub async fn get(&self, name: &str, namespace: Option<&str>) -> Result<Option<HelmRelease>> {
        let objects = self.fetch_objects(namespace, Some(name)).await?;
        if objects.is_empty() {
            return Ok(None);
        }
        let latest = &objects[select_latest(&objects)];
        Ok(Some(latest.decode_or_degrade(self.client.context())))
    }

    /// All revisions of a release, descending by revision
    pub async fn history(&self, name: &str, namespace: Option<&str>) -> Result<Vec<HelmRelease>> {
        let objects = self.fetch_objects(namespace, Some(name)).await?;
        let context = self.client.context();

        let mut revisions: Vec<HelmRelease> = objects
            .iter()
            .map(|o| o.decode_or_degrade(context))
            .collect();
        revisions.sort_by(|a, b| b.revision.cmp(&a.revision));
        Ok(revisions)
    }

    /// Fetch Secrets and ConfigMaps concurrently and merge them
    pub(crate) async fn fetch_objects(
        &self,
        namespace: Option<&str>,
        release_name: Option<&str>,
    ) -> Result<Vec<StoredObject>> {
        let (secrets, configmaps) = futures::join!(
            self.client.list_helm_secrets(namespace, release_name),
            self.client.list_helm_configmaps(namespace, release_name),
        );

        let mut objects = Vec::new();
        for secret in secrets? {
            let meta = StorageMeta::from_object_meta(&secret.metadata, StorageKind::Secret);
            objects.push(StoredObject::Secret(Box::new(secret), meta));
        }
        for cm in configmaps? {
            let meta = StorageMeta::from_object_meta(&cm.metadata, StorageKind::ConfigMap);
            objects.push(StoredObject::ConfigMap(Box::new(cm), meta));
        }
        Ok(objects)
    }
}

/// Group storage objects by `(namespace, name)`; the BTreeMap key order
/// gives the output ordering
pub(crate) fn group_objects(
    objects: Vec<StoredObject>,
) -> BTreeMap<(String, String), Vec<StoredObject>> {
    let mut grouped: BTreeMap<(String, String), Vec<StoredObject>> = BTreeMap::new();
    for object in objects {
        let key = (object.meta().namespace.clone(), object.meta().name.clone());
        grouped.entry(key).or_default().push(object);
    }
    grouped
}

/// Index of the latest revision within a group: highest `version` label,
/// ties broken by newer creation timestamp, then lexicographic object name
pub(crate) fn select_latest(group: &[StoredObject]) -> usize {
    let mut best = 0;
    for (i, candidate) in group.iter().enumerate().skip(1) {
        if revision_order(candidate.meta(), group[best].meta()) == Ordering::Greater {
            best = i;
        }
    }
    best
}

fn revision_order(a: &StorageMeta, b: &StorageMeta) -> Ordering {
    a.revision
        .cmp(&b.revision)
        .then_with(|| a.created.cmp(&b.created))
        .then_with(|| b.object_name.cmp(&a.object_name))
}

/// Union match: the release is retained when the regex matches either
/// its name or its chart name
fn matches_filter(release: &HelmRelease, re: &Regex) -> bool {
    re.is_match(&release.name) || re.is_match(release.chart_name())
}

fn matches_category(
    latest: ReleaseStatus,
    history: &[ReleaseStatus],
    category: StatusCategory,
) -> bool {
    match category {
        StatusCategory::Deployed => latest == ReleaseStatus::Deployed,
        StatusCategory::Failed => latest == ReleaseStatus::Failed,
        StatusCategory::Pending => latest.is_pending(),
        StatusCategory::Problematic => {
            latest == ReleaseStatus::Failed
                || latest.is_pending()
                || (latest == ReleaseStatus::Superseded
                    && !history.contains(&ReleaseStatus::Deployed))
        }
    }
}
