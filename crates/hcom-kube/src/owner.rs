//! Owner detector
//!
//! Classifies which system manages a release by checking rules in priority
//! order: Argo CD, Flux CD, k3s HelmChart, a foreign managed-by marker,
//! then native Helm as the fallback. CRD existence checks are cached for
//! the invocation so scanning many releases pays the cost once. A CRD
//! check denied by RBAC is demoted to "not present"; the demotion is noted
//! in the evidence.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::client::ClusterClient;
use hcom_core::manifest::{ManifestResource, parse_manifest};
use hcom_core::owner::{Confidence, Owner, OwnerVerdict};
use hcom_core::release::HelmRelease;

const ARGOCD_INSTANCE_LABEL: &str = "argocd.argoproj.io/instance";
const ARGOCD_TRACKING_ANNOTATION: &str = "argocd.argoproj.io/tracking-id";
const FLUX_NAME_LABEL: &str = "helm.toolkit.fluxcd.io/name";
const MANAGED_BY: &str = "app.kubernetes.io/managed-by";

const FLUX_CRD: &str = "helmreleases.helm.toolkit.fluxcd.io";
const K3S_CRD: &str = "helmcharts.helm.cattle.io";

#[derive(Clone, Copy)]
struct CrdPresence {
    present: bool,
    denied: bool,
}

/// Per-invocation owner classifier with a CRD cache
pub struct OwnerDetector<'a> {
    client: &'a ClusterClient,
    crd_cache: Mutex<HashMap<String, CrdPresence>>,
}

impl<'a> OwnerDetector<'a> {
    pub fn new(client: &'a ClusterClient) -> Self {
        Self {
            client,
            crd_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Classify the owner of a release
    pub async fn detect(&self, release: &HelmRelease) -> OwnerVerdict {
        let resources = parse_manifest(&release.manifest);
        let mut notes: Vec<String> = Vec::new();

        if let Some(verdict) = check_argocd(&resources) {
            return verdict;
        }

        if let Some(verdict) = check_flux_labels(&resources) {
            return verdict;
        }
        if let Some(verdict) = self.check_flux_crd(release, &mut notes).await {
            return with_notes(verdict, notes);
        }

        if let Some(verdict) = self.check_k3s_crd(release, &mut notes).await {
            return with_notes(verdict, notes);
        }

        if let Some(verdict) = check_managed_by(&resources) {
            return with_notes(verdict, notes);
        }

        with_notes(OwnerVerdict::native_helm(), notes)
    }

    async fn crd_presence(&self, name: &str) -> CrdPresence {
        if let Some(cached) = self.crd_cache.lock().unwrap().get(name) {
            return *cached;
        }

        let presence = match self.client.crd_exists(name).await {
            Ok(present) => CrdPresence {
                present,
                denied: false,
            },
            Err(e) if e.is_access_denied() => CrdPresence {
                present: false,
                denied: true,
            },
            Err(e) => {
                tracing::debug!(crd = %name, error = %e, "crd lookup failed");
                CrdPresence {
                    present: false,
                    denied: false,
                }
            }
        };

        self.crd_cache
            .lock()
            .unwrap()
            .insert(name.to_string(), presence);
        presence
    }

    async fn check_flux_crd(
        &self,
        release: &HelmRelease,
        notes: &mut Vec<String>,
    ) -> Option<OwnerVerdict> {
        let presence = self.crd_presence(FLUX_CRD).await;
        if presence.denied {
            notes.push(format!("crd check for {} denied, treated as absent", FLUX_CRD));
        }
        if !presence.present {
            return None;
        }

        // Stored API version differs across Flux releases
        let items = match self
            .client
            .list_custom_resources("helm.toolkit.fluxcd.io", "v2", "helmreleases", None)
            .await
        {
            Ok(items) => items,
            Err(_) => self
                .client
                .list_custom_resources("helm.toolkit.fluxcd.io", "v2beta1", "helmreleases", None)
                .await
                .unwrap_or_default(),
        };

        for item in &items {
            if flux_chart_matches(item, &release.name) {
                let object = object_name(item);
                return Some(OwnerVerdict::new(
                    Owner::Flux,
                    Confidence::High,
                    vec![format!(
                        "flux HelmRelease '{}' has status.helmChart naming this release",
                        object
                    )],
                ));
            }
        }
        None
    }

    async fn check_k3s_crd(
        &self,
        release: &HelmRelease,
        notes: &mut Vec<String>,
    ) -> Option<OwnerVerdict> {
        let presence = self.crd_presence(K3S_CRD).await;
        if presence.denied {
            notes.push(format!("crd check for {} denied, treated as absent", K3S_CRD));
        }
        if !presence.present {
            return None;
        }

        let items = self
            .client
            .list_custom_resources("helm.cattle.io", "v1", "helmcharts", Some("kube-system"))
            .await
            .unwrap_or_default();

        for item in &items {
            if object_name(item) == release.name {
                return Some(OwnerVerdict::new(
                    Owner::K3sHelmchart,
                    Confidence::High,
                    vec![format!(
                        "HelmChart '{}' in kube-system matches this release",
                        release.name
                    )],
                ));
            }
        }
        None
    }
}

fn with_notes(mut verdict: OwnerVerdict, notes: Vec<String>) -> OwnerVerdict {
    verdict.evidence.extend(notes);
    verdict
}

fn object_name(item: &JsonValue) -> String {
    item.get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}

/// `status.helmChart` carries `namespace/name` of the chart object
fn flux_chart_matches(item: &JsonValue, release_name: &str) -> bool {
    let chart = item
        .get("status")
        .and_then(|s| s.get("helmChart"))
        .and_then(JsonValue::as_str)
        .unwrap_or_default();
    if chart.is_empty() {
        return object_name(item) == release_name;
    }
    chart == release_name || chart.ends_with(&format!("/{}", release_name))
}

/// Rule 1: Argo CD labels or tracking annotations on rendered resources
pub(crate) fn check_argocd(resources: &[ManifestResource]) -> Option<OwnerVerdict> {
    for resource in resources {
        if let Some(instance) = resource.labels().get(ARGOCD_INSTANCE_LABEL) {
            return Some(OwnerVerdict::new(
                Owner::Argocd,
                Confidence::High,
                vec![format!(
                    "label {}={} on {} '{}'",
                    ARGOCD_INSTANCE_LABEL, instance, resource.kind, resource.name
                )],
            ));
        }
        if resource.annotations().contains_key(ARGOCD_TRACKING_ANNOTATION) {
            return Some(OwnerVerdict::new(
                Owner::Argocd,
                Confidence::High,
                vec![format!(
                    "annotation {} on {} '{}'",
                    ARGOCD_TRACKING_ANNOTATION, resource.kind, resource.name
                )],
            ));
        }
    }
    None
}

/// Rule 2a: Flux labels on rendered resources
pub(crate) fn check_flux_labels(resources: &[ManifestResource]) -> Option<OwnerVerdict> {
    for resource in resources {
        if let Some(name) = resource.labels().get(FLUX_NAME_LABEL) {
            return Some(OwnerVerdict::new(
                Owner::Flux,
                Confidence::High,
                vec![format!(
                    "label {}={} on {} '{}'",
                    FLUX_NAME_LABEL, name, resource.kind, resource.name
                )],
            ));
        }
    }
    None
}

/// Rule 4: a managed-by marker naming something other than Helm
pub(crate) fn check_managed_by(resources: &[ManifestResource]) -> Option<OwnerVerdict> {
    for resource in resources {
        let manager = resource
            .labels()
            .get(MANAGED_BY)
            .cloned()
            .or_else(|| resource.annotations().get(MANAGED_BY).cloned())
            .unwrap_or_default();
        if !manager.is_empty() && !manager.eq_ignore_ascii_case("helm") {
            return Some(OwnerVerdict::new(
                Owner::Unknown,
                Confidence::Medium,
                vec![format!(
                    "managed-by: {} (on {} '{}')",
                    manager.to_lowercase(),
                    resource.kind,
                    resource.name
                )],
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources(manifest: &str) -> Vec<ManifestResource> {
        parse_manifest(manifest)
    }

    #[test]
    fn test_argocd_label_wins_over_managed_by() {
        // a resource carrying both Argo CD and managed-by markers
        let manifest = r#"
apiVersion: v1
kind: Service
metadata:
  name: app1
  labels:
    argocd.argoproj.io/instance: app1
    app.kubernetes.io/managed-by: Helm
"#;
        let res = resources(manifest);
        let verdict = check_argocd(&res).unwrap();
        assert_eq!(verdict.owner, Owner::Argocd);
        assert_eq!(verdict.confidence, Confidence::High);
        assert!(verdict.evidence[0].contains("argocd.argoproj.io/instance"));
    }

    #[test]
    fn test_argocd_priority_over_flux() {
        let manifest = r#"
apiVersion: v1
kind: Service
metadata:
  name: app1
  labels:
    argocd.argoproj.io/instance: app1
    helm.toolkit.fluxcd.io/name: app1
"#;
        let res = resources(manifest);
        // the detector checks Argo CD first, so both present resolves to argocd
        assert!(check_argocd(&res).is_some());
        assert!(check_flux_labels(&res).is_some());
        assert_eq!(check_argocd(&res).unwrap().owner, Owner::Argocd);
    }

    #[test]
    fn test_argocd_tracking_annotation() {
        let manifest = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: cfg
  annotations:
    argocd.argoproj.io/tracking-id: "apps:cfg"
"#;
        let verdict = check_argocd(&resources(manifest)).unwrap();
        assert_eq!(verdict.owner, Owner::Argocd);
    }

    #[test]
    fn test_flux_label() {
        let manifest = r#"
apiVersion: v1
kind: Service
metadata:
  name: app1
  labels:
    helm.toolkit.fluxcd.io/name: app1
"#;
        let verdict = check_flux_labels(&resources(manifest)).unwrap();
        assert_eq!(verdict.owner, Owner::Flux);
        assert_eq!(verdict.confidence, Confidence::High);
    }

    #[test]
    fn test_managed_by_foreign_value() {
        let manifest = r#"
apiVersion: v1
kind: Service
metadata:
  name: app1
  labels:
    app.kubernetes.io/managed-by: Kustomize
"#;
        let verdict = check_managed_by(&resources(manifest)).unwrap();
        assert_eq!(verdict.owner, Owner::Unknown);
        assert_eq!(verdict.confidence, Confidence::Medium);
        assert!(verdict.evidence[0].contains("managed-by: kustomize"));
    }

    #[test]
    fn test_managed_by_helm_is_not_a_match() {
        let manifest = r#"
apiVersion: v1
kind: Service
metadata:
  name: app1
  labels:
    app.kubernetes.io/managed-by: Helm
"#;
        assert!(check_managed_by(&resources(manifest)).is_none());
    }

    #[test]
    fn test_flux_chart_matches() {
        let item = serde_json::json!({
            "metadata": {"name": "podinfo", "namespace": "flux-system"},
            "status": {"helmChart": "flux-system/podinfo"}
        });
        assert!(flux_chart_matches(&item, "podinfo"));
        assert!(!flux_chart_matches(&item, "other"));
    }

    #[test]
    fn test_flux_match_falls_back_to_name() {
        let item = serde_json::json!({
            "metadata": {"name": "podinfo"},
            "status": {}
        });
        assert!(flux_chart_matches(&item, "podinfo"));
    }
}
