//! Drift engine: compare stored manifests with live cluster state
//!
//! Stored documents and live objects are masked identically before the
//! structural comparison, so server-managed noise never shows up as drift.
//! Maps compare key-wise, sequences position-wise, scalars by equality with
//! numeric/string coercion. An empty mapping or sequence is equal to an
//! absent key at the same path.

use futures::stream::{self, StreamExt};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

use crate::client::{ClusterClient, LiveLookup};
use crate::error::Result;
use hcom_core::diff::{DiffEntry, DriftReport, FieldChange};
use hcom_core::manifest::{ManifestResource, ResourceId, parse_manifest};
use hcom_core::release::HelmRelease;

/// Server-managed metadata stripped from both sides before comparison
const MASKED_PATHS: &[&str] = &[
    "metadata.resourceVersion",
    "metadata.uid",
    "metadata.generation",
    "metadata.creationTimestamp",
    "metadata.managedFields",
    "metadata.selfLink",
];

/// Annotations set by tooling, not part of the desired state
const MASKED_ANNOTATIONS: &[&str] = &[
    "kubectl.kubernetes.io/last-applied-configuration",
    "deployment.kubernetes.io/revision",
];

/// In-flight live fetches per release diff
const LIVE_FETCH_CONCURRENCY: usize = 8;

/// Drift engine over a cluster client
pub struct DriftEngine<'a> {
    client: &'a ClusterClient,
}

impl<'a> DriftEngine<'a> {
    pub fn new(client: &'a ClusterClient) -> Self {
        Self { client }
    }

    /// Compare every stored resource of a release with its live
    /// counterpart. Live fetches run concurrently; entries are ordered by
    /// `(namespace, kind, name)`.
    pub async fn diff(&self, release: &HelmRelease) -> Result<DriftReport> {
        let resources = parse_manifest(&release.manifest);
        let discovery = self.client.discovery().await?;

        let discovery = &discovery;
        let lookups: Vec<_> = stream::iter(resources.iter())
            .map(|resource| {
                let id = resource.id(&release.namespace);
                async move {
                    let lookup = self.client.get_resource(discovery, &id).await;
                    (resource, id, lookup)
                }
            })
            .buffered(LIVE_FETCH_CONCURRENCY)
            .collect()
            .await;

        let mut entries = Vec::new();
        let mut stored_ids = BTreeSet::new();

        for (resource, id, lookup) in lookups {
            stored_ids.insert(id.clone());

            let entry = match lookup {
                Ok(LiveLookup::Found(live)) => {
                    let stored = resolve_namespace(&resource.tree, &id.namespace);
                    let changes = diff_masked(&stored, &live);
                    if changes.is_empty() {
                        DiffEntry::unchanged(id)
                    } else {
                        DiffEntry::modified(id, changes)
                    }
                }
                Ok(LiveLookup::NotFound) => DiffEntry::missing_live(id, None),
                Ok(LiveLookup::Denied) => {
                    DiffEntry::missing_live(id, Some("access denied".to_string()))
                }
                Err(e) => {
                    tracing::warn!(resource = %id, error = %e, "live fetch failed");
                    DiffEntry::missing_live(id, Some(format!("fetch failed: {}", e)))
                }
            };
            entries.push(entry);
        }

        // Best-effort: live resources labeled for this release that are
        // not in the stored manifest
        match self.find_extra_live(release, &stored_ids).await {
            Ok(extra) => entries.extend(extra),
            Err(e) => {
                tracing::debug!(error = %e, "skipping extra-resource detection");
            }
        }

        entries.sort_by(|a, b| {
            (&a.id.namespace, &a.id.kind, &a.id.name).cmp(&(&b.id.namespace, &b.id.kind, &b.id.name))
        });

        Ok(DriftReport {
            release_name: release.name.clone(),
            namespace: release.namespace.clone(),
            entries,
        })
    }

    async fn find_extra_live(
        &self,
        release: &HelmRelease,
        stored_ids: &BTreeSet<ResourceId>,
    ) -> Result<Vec<DiffEntry>> {
        let selector = format!("app.kubernetes.io/instance={}", release.name);
        let live = self
            .client
            .list_labeled_workloads(&release.namespace, &selector)
            .await?;

        let mut extra = Vec::new();
        for tree in live {
            let Some(resource) = ManifestResource::from_tree(tree) else {
                continue;
            };
            let id = resource.id(&release.namespace);
            // Helm's own storage secrets carry the instance label too
            if id.kind == "Secret" && id.name.starts_with("sh.helm.release.v1.") {
                continue;
            }
            if !stored_ids.contains(&id) {
                extra.push(DiffEntry::extra_live(id));
            }
        }
        Ok(extra)
    }
}

/// Stored documents may omit `metadata.namespace`; live objects always
/// carry it. Resolve the identity namespace onto the stored side so the
/// comparison is symmetric.
fn resolve_namespace(stored: &JsonValue, namespace: &str) -> JsonValue {
    let mut tree = stored.clone();
    if !namespace.is_empty() {
        if let Some(metadata) = tree.get_mut("metadata").and_then(JsonValue::as_object_mut) {
            metadata
                .entry("namespace")
                .or_insert_with(|| namespace.into());
        }
    }
    tree
}

/// Mask both sides, then diff
fn diff_masked(stored: &JsonValue, live: &JsonValue) -> Vec<FieldChange> {
    let mut stored = stored.clone();
    let mut live = live.clone();
    mask(&mut stored);
    mask(&mut live);
    diff_trees(&stored, &live)
}

/// Strip server-managed fields, tooling annotations and the whole
/// `status` subtree
pub fn mask(tree: &mut JsonValue) {
    for path in MASKED_PATHS {
        remove_path(tree, &path.split('.').collect::<Vec<_>>());
    }

    if let Some(annotations) = tree
        .get_mut("metadata")
        .and_then(|m| m.get_mut("annotations"))
        .and_then(JsonValue::as_object_mut)
    {
        for key in MASKED_ANNOTATIONS {
            annotations.remove(*key);
        }
    }

    if let Some(map) = tree.as_object_mut() {
        map.remove("status");
    }
}

fn remove_path(tree: &mut JsonValue, path: &[&str]) {
    let Some(map) = tree.as_object_mut() else {
        return;
    };
    match path {
        [] => {}
        [leaf] => {
            map.remove(*leaf);
        }
        [head, rest @ ..] => {
            if let Some(child) = map.get_mut(*head) {
                remove_path(child, rest);
            }
        }
    }
}

/// Structural diff of two trees; returns changed paths with old and new
/// values
pub fn diff_trees(stored: &JsonValue, live: &JsonValue) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    diff_at("", Some(stored), Some(live), &mut changes);
    changes
}

fn diff_at(path: &str, old: Option<&JsonValue>, new: Option<&JsonValue>, out: &mut Vec<FieldChange>) {
    // Empty-to-absent equivalence
    if is_effectively_absent(old) && is_effectively_absent(new) {
        return;
    }

    match (old, new) {
        (Some(JsonValue::Object(a)), Some(JsonValue::Object(b))) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for key in keys {
                let child_path = join_path(path, key);
                diff_at(&child_path, a.get(key), b.get(key), out);
            }
        }
        (Some(JsonValue::Array(a)), Some(JsonValue::Array(b))) => {
            for i in 0..a.len().max(b.len()) {
                let child_path = format!("{}[{}]", path, i);
                diff_at(&child_path, a.get(i), b.get(i), out);
            }
        }
        (a, b) => {
            if !scalar_eq(a, b) {
                out.push(FieldChange {
                    path: path.to_string(),
                    old: a.cloned(),
                    new: b.cloned(),
                });
            }
        }
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn is_effectively_absent(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::Object(map)) => map.is_empty(),
        Some(JsonValue::Array(items)) => items.is_empty(),
        _ => false,
    }
}

/// Scalar equality with numeric/string coercion: `"3"` equals `3`, but
/// only when both sides parse to the same number
fn scalar_eq(a: Option<&JsonValue>, b: Option<&JsonValue>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            if a == b {
                return true;
            }
            match (as_number(a), as_number(b)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (None, None) => true,
        _ => false,
    }
}

fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployment(replicas: u32) -> JsonValue {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web", "namespace": "default"},
            "spec": {"replicas": replicas}
        })
    }

    #[test]
    fn test_masking_symmetry() {
        // diff(mask(d), mask(d)) is unchanged for any document
        let doc = json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {
                "name": "web",
                "resourceVersion": "12345",
                "uid": "abc",
                "annotations": {
                    "kubectl.kubernetes.io/last-applied-configuration": "{}"
                }
            },
            "spec": {"ports": [{"port": 80}]},
            "status": {"loadBalancer": {}}
        });
        let mut a = doc.clone();
        let mut b = doc;
        mask(&mut a);
        mask(&mut b);
        assert!(diff_trees(&a, &b).is_empty());
    }

    #[test]
    fn test_mask_strips_server_fields() {
        let mut doc = json!({
            "metadata": {
                "name": "web",
                "resourceVersion": "1",
                "uid": "u",
                "generation": 2,
                "creationTimestamp": "2024-01-01T00:00:00Z",
                "managedFields": [{"manager": "helm"}],
                "selfLink": "/api/v1/x"
            },
            "status": {"ready": true}
        });
        mask(&mut doc);
        let metadata = doc.get("metadata").unwrap().as_object().unwrap();
        assert_eq!(metadata.len(), 1);
        assert!(metadata.contains_key("name"));
        assert!(doc.get("status").is_none());
    }

    #[test]
    fn test_unchanged_modulo_noise() {
        let stored = deployment(3);
        let mut live = deployment(3);
        live["metadata"]["resourceVersion"] = json!("99");
        live["metadata"]["uid"] = json!("live-uid");
        live["status"] = json!({"availableReplicas": 3});

        assert!(diff_masked(&stored, &live).is_empty());
    }

    #[test]
    fn test_modified_replicas() {
        let changes = diff_masked(&deployment(3), &deployment(5));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "spec.replicas");
        assert_eq!(changes[0].old, Some(json!(3)));
        assert_eq!(changes[0].new, Some(json!(5)));
    }

    #[test]
    fn test_numeric_string_coercion() {
        let a = json!({"spec": {"replicas": 3}});
        let b = json!({"spec": {"replicas": "3"}});
        assert!(diff_trees(&a, &b).is_empty());

        let c = json!({"spec": {"replicas": "4"}});
        assert_eq!(diff_trees(&a, &c).len(), 1);
    }

    #[test]
    fn test_no_coercion_for_unequal_strings() {
        let a = json!({"spec": {"mode": "fast"}});
        let b = json!({"spec": {"mode": "slow"}});
        assert_eq!(diff_trees(&a, &b).len(), 1);
    }

    #[test]
    fn test_empty_equals_absent() {
        let a = json!({"metadata": {"name": "x", "labels": {}}});
        let b = json!({"metadata": {"name": "x"}});
        assert!(diff_trees(&a, &b).is_empty());

        let c = json!({"spec": {"args": []}});
        let d = json!({"spec": {}});
        assert!(diff_trees(&c, &d).is_empty());
    }

    #[test]
    fn test_added_and_removed_keys() {
        let a = json!({"spec": {"old": 1}});
        let b = json!({"spec": {"new": 2}});
        let changes = diff_trees(&a, &b);
        assert_eq!(changes.len(), 2);
        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert!(paths.contains(&"spec.old"));
        assert!(paths.contains(&"spec.new"));
    }

    #[test]
    fn test_sequence_position_wise() {
        let a = json!({"spec": {"ports": [{"port": 80}, {"port": 443}]}});
        let b = json!({"spec": {"ports": [{"port": 80}]}});
        let changes = diff_trees(&a, &b);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "spec.ports[1]");
        assert!(changes[0].new.is_none());
    }

    #[test]
    fn test_resolve_namespace_symmetry() {
        // stored omits the namespace, live carries it
        let stored = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "cfg"},
            "data": {"k": "v"}
        });
        let live = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "cfg", "namespace": "web"},
            "data": {"k": "v"}
        });
        let resolved = resolve_namespace(&stored, "web");
        assert!(diff_masked(&resolved, &live).is_empty());

        // an explicit namespace is left alone
        let explicit = json!({"metadata": {"name": "cfg", "namespace": "other"}});
        let resolved = resolve_namespace(&explicit, "web");
        assert_eq!(resolved["metadata"]["namespace"], json!("other"));
    }

    #[test]
    fn test_type_change_is_reported() {
        let a = json!({"spec": {"value": {"nested": true}}});
        let b = json!({"spec": {"value": "flat"}});
        let changes = diff_trees(&a, &b);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "spec.value");
    }
}
