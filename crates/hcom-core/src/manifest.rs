//! Parse multi-document YAML manifests into individual resources

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Kinds that never carry a namespace
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "Namespace",
    "Node",
    "PersistentVolume",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "StorageClass",
    "PriorityClass",
    "IngressClass",
    "MutatingWebhookConfiguration",
    "ValidatingWebhookConfiguration",
];

/// Return true if the resource kind is cluster-scoped
pub fn is_cluster_scoped(kind: &str, namespace: &str) -> bool {
    if CLUSTER_SCOPED_KINDS.contains(&kind) {
        return true;
    }
    // Unknown Cluster*-prefixed kinds with no namespace are assumed
    // cluster-scoped
    kind.starts_with("Cluster") && namespace.is_empty()
}

/// One resource document from a rendered manifest (or a live object)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestResource {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    /// Empty for cluster-scoped kinds and documents that omit it
    pub namespace: String,
    /// The full document tree
    pub tree: JsonValue,
}

impl ManifestResource {
    /// Build from a parsed document tree; returns None for documents
    /// without a `kind`
    pub fn from_tree(tree: JsonValue) -> Option<Self> {
        let kind = tree.get("kind")?.as_str()?.to_string();
        if kind.is_empty() {
            return None;
        }
        let api_version = tree
            .get("apiVersion")
            .and_then(JsonValue::as_str)
            .unwrap_or("v1")
            .to_string();
        let metadata = tree.get("metadata");
        let name = metadata
            .and_then(|m| m.get("name"))
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();
        let namespace = metadata
            .and_then(|m| m.get("namespace"))
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self {
            api_version,
            kind,
            name,
            namespace,
            tree,
        })
    }

    /// Identity key, resolving the namespace against the owning release
    pub fn id(&self, release_namespace: &str) -> ResourceId {
        let namespace = if is_cluster_scoped(&self.kind, &self.namespace) {
            String::new()
        } else if self.namespace.is_empty() {
            release_namespace.to_string()
        } else {
            self.namespace.clone()
        };
        ResourceId {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            namespace,
            name: self.name.clone(),
        }
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        string_map(&self.tree, "labels")
    }

    pub fn annotations(&self) -> BTreeMap<String, String> {
        string_map(&self.tree, "annotations")
    }
}

fn string_map(tree: &JsonValue, key: &str) -> BTreeMap<String, String> {
    tree.get("metadata")
        .and_then(|m| m.get(key))
        .and_then(JsonValue::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Identity of a Kubernetes object: `(apiVersion, kind, namespace, name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub api_version: String,
    pub kind: String,
    /// Empty for cluster-scoped kinds
    pub namespace: String,
    pub name: String,
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}/{}", self.kind, self.name)
        } else {
            write!(f, "{}/{}/{}", self.namespace, self.kind, self.name)
        }
    }
}

/// Split a rendered manifest into resources, discarding empty documents
/// and those without a top-level `kind`
pub fn parse_manifest(manifest: &str) -> Vec<ManifestResource> {
    let mut resources = Vec::new();
    if manifest.trim().is_empty() {
        return resources;
    }

    for document in serde_yaml::Deserializer::from_str(manifest) {
        let Ok(tree) = JsonValue::deserialize(document) else {
            continue;
        };
        if !tree.is_object() {
            continue;
        }
        if let Some(resource) = ManifestResource::from_tree(tree) {
            resources.push(resource);
        }
    }
    resources
}

/// Count resources by kind in a manifest string
pub fn resource_counts(manifest: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for resource in parse_manifest(manifest) {
        *counts.entry(resource.kind).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"---
apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: prod
spec:
  ports:
    - port: 80
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 3
---
# comment-only document
---
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: reader
"#;

    #[test]
    fn test_parse_manifest() {
        let resources = parse_manifest(MANIFEST);
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[0].kind, "Service");
        assert_eq!(resources[0].namespace, "prod");
        assert_eq!(resources[1].kind, "Deployment");
        assert_eq!(resources[1].namespace, "");
        assert_eq!(resources[2].kind, "ClusterRole");
    }

    #[test]
    fn test_parse_manifest_empty() {
        assert!(parse_manifest("").is_empty());
        assert!(parse_manifest("---\n---\n").is_empty());
    }

    #[test]
    fn test_id_inherits_release_namespace() {
        let resources = parse_manifest(MANIFEST);
        let deployment = &resources[1];
        let id = deployment.id("web");
        assert_eq!(id.namespace, "web");
    }

    #[test]
    fn test_id_cluster_scoped_has_no_namespace() {
        let resources = parse_manifest(MANIFEST);
        let role = &resources[2];
        let id = role.id("web");
        assert_eq!(id.namespace, "");
        assert_eq!(id.to_string(), "ClusterRole/reader");
    }

    #[test]
    fn test_is_cluster_scoped() {
        assert!(is_cluster_scoped("Namespace", ""));
        assert!(is_cluster_scoped("CustomResourceDefinition", ""));
        assert!(is_cluster_scoped("ClusterIssuer", ""));
        assert!(!is_cluster_scoped("Service", "default"));
        assert!(!is_cluster_scoped("Deployment", ""));
    }

    #[test]
    fn test_resource_counts() {
        let counts = resource_counts(MANIFEST);
        assert_eq!(counts.get("Service"), Some(&1));
        assert_eq!(counts.get("Deployment"), Some(&1));
        assert_eq!(counts.get("ClusterRole"), Some(&1));
    }

    #[test]
    fn test_labels_and_annotations() {
        let manifest = r#"
apiVersion: v1
kind: Service
metadata:
  name: web
  labels:
    app.kubernetes.io/instance: web
  annotations:
    argocd.argoproj.io/tracking-id: "apps:web"
"#;
        let resources = parse_manifest(manifest);
        assert_eq!(
            resources[0].labels().get("app.kubernetes.io/instance"),
            Some(&"web".to_string())
        );
        assert_eq!(
            resources[0].annotations().get("argocd.argoproj.io/tracking-id"),
            Some(&"apps:web".to_string())
        );
    }
}
