//! Read-only Kubernetes client for Helm Commander
//!
//! Wraps a `kube::Client` with the operations the diagnostic engines need:
//! listing Helm storage objects, fetching arbitrary typed resources through
//! API discovery, and CRD listings. The client selects its context from an
//! explicit override when given, otherwise from the standard kubeconfig
//! discovery (`KUBECONFIG`, then in-cluster). Every request carries a
//! default timeout; there are no retries.

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, DynamicObject, ListParams};
use kube::config::{Config, KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, GroupVersionKind};
use kube::discovery::{Discovery, Scope};
use kube::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::{KubeError, Result};
use hcom_core::manifest::ResourceId;

/// Label selector identifying Helm release storage objects
pub const HELM_OWNER_SELECTOR: &str = "owner=helm";

/// Secret type used by the Helm secrets driver
pub const HELM_SECRET_TYPE: &str = "helm.sh/release.v1";

/// Per-call read timeout
const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Connect timeout; kept short so unreachable clusters fail fast
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a single live-resource fetch
#[derive(Debug, Clone)]
pub enum LiveLookup {
    Found(JsonValue),
    NotFound,
    Denied,
}

/// Read-only cluster access layer
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
    context: String,
}

impl ClusterClient {
    /// Connect using an explicit context override, or the environment's
    /// standard kubeconfig discovery
    pub async fn connect(context: Option<&str>) -> Result<Self> {
        let mut config = match context {
            Some(name) => Config::from_kubeconfig(&KubeConfigOptions {
                context: Some(name.to_string()),
                ..Default::default()
            })
            .await
            .map_err(|e| KubeError::ClusterUnreachable {
                message: format!("context '{}': {}", name, e),
            })?,
            None => Config::infer()
                .await
                .map_err(|e| KubeError::ClusterUnreachable {
                    message: e.to_string(),
                })?,
        };

        config.connect_timeout = Some(CONNECT_TIMEOUT);
        config.read_timeout = Some(READ_TIMEOUT);

        let client = Client::try_from(config)?;
        let context = match context {
            Some(name) => name.to_string(),
            None => active_context_name(),
        };

        tracing::debug!(context = %context, "connected to cluster");
        Ok(Self { client, context })
    }

    /// Wrap an existing client (used by tests and embedders)
    pub fn with_client(client: Client, context: impl Into<String>) -> Self {
        Self {
            client,
            context: context.into(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Name of the active kubeconfig context
    pub fn context(&self) -> &str {
        &self.context
    }

    /// List Helm release Secrets, cluster-wide unless a namespace is given
    pub async fn list_helm_secrets(
        &self,
        namespace: Option<&str>,
        release_name: Option<&str>,
    ) -> Result<Vec<Secret>> {
        let lp = ListParams::default()
            .labels(&helm_selector(release_name))
            .fields(&format!("type={}", HELM_SECRET_TYPE));

        let api: Api<Secret> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };

        let list = api
            .list(&lp)
            .await
            .map_err(|e| KubeError::classify(e, "helm release secrets"))?;
        Ok(list.items)
    }

    /// List Helm release ConfigMaps (legacy storage driver)
    pub async fn list_helm_configmaps(
        &self,
        namespace: Option<&str>,
        release_name: Option<&str>,
    ) -> Result<Vec<ConfigMap>> {
        let lp = ListParams::default().labels(&helm_selector(release_name));

        let api: Api<ConfigMap> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };

        let list = api
            .list(&lp)
            .await
            .map_err(|e| KubeError::classify(e, "helm release configmaps"))?;
        Ok(list.items)
    }

    /// Run API discovery once; callers hold the result for the invocation
    pub async fn discovery(&self) -> Result<Discovery> {
        Discovery::new(self.client.clone())
            .run()
            .await
            .map_err(|e| KubeError::classify(e, "api discovery"))
    }

    /// Fetch one live resource by identity. Not-found and access-denied are
    /// reported as lookup outcomes rather than errors so batch operations
    /// can degrade per item.
    pub async fn get_resource(&self, discovery: &Discovery, id: &ResourceId) -> Result<LiveLookup> {
        let (group, version) = split_api_version(&id.api_version);
        let gvk = GroupVersionKind::gvk(&group, &version, &id.kind);

        let Some((ar, caps)) = discovery.resolve_gvk(&gvk) else {
            // API not served by this cluster; the resource cannot exist
            tracing::debug!(kind = %id.kind, api_version = %id.api_version, "api not served");
            return Ok(LiveLookup::NotFound);
        };

        let api: Api<DynamicObject> = if caps.scope == Scope::Cluster {
            Api::all_with(self.client.clone(), &ar)
        } else {
            Api::namespaced_with(self.client.clone(), &id.namespace, &ar)
        };

        match api.get(&id.name).await {
            Ok(obj) => Ok(LiveLookup::Found(serde_json::to_value(&obj)?)),
            Err(e) => match KubeError::classify(e, &id.to_string()) {
                KubeError::NotFound { .. } => Ok(LiveLookup::NotFound),
                KubeError::AccessDenied { .. } => Ok(LiveLookup::Denied),
                other => Err(other),
            },
        }
    }

    /// List instances of a custom resource, cluster-wide unless a
    /// namespace is given
    pub async fn list_custom_resources(
        &self,
        group: &str,
        version: &str,
        plural: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<JsonValue>> {
        let ar = ApiResource {
            group: group.to_string(),
            version: version.to_string(),
            api_version: format!("{}/{}", group, version),
            kind: String::new(),
            plural: plural.to_string(),
        };

        let api: Api<DynamicObject> = match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        };

        let what = format!("{}.{}", plural, group);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| KubeError::classify(e, &what))?;

        list.items
            .iter()
            .map(|obj| serde_json::to_value(obj).map_err(Into::into))
            .collect()
    }

    /// Check whether a CRD exists by its full name
    /// (e.g. `helmcharts.helm.cattle.io`)
    pub async fn crd_exists(&self, name: &str) -> Result<bool> {
        let api: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        match api.get(name).await {
            Ok(_) => Ok(true),
            Err(e) => match KubeError::classify(e, name) {
                KubeError::NotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    /// Names of all CRDs installed on the cluster
    pub async fn list_crds(&self) -> Result<Vec<String>> {
        let api: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| KubeError::classify(e, "customresourcedefinitions"))?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|crd| crd.metadata.name)
            .collect())
    }

    /// List resources of common workload kinds carrying the given label
    /// selector in a namespace. Used for best-effort extra-resource
    /// detection; kinds that fail to list are skipped.
    pub async fn list_labeled_workloads(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<JsonValue>> {
        let kinds: &[(&str, &str)] = &[
            ("v1", "ConfigMap"),
            ("v1", "Secret"),
            ("v1", "Service"),
            ("v1", "ServiceAccount"),
            ("apps/v1", "Deployment"),
            ("apps/v1", "StatefulSet"),
            ("apps/v1", "DaemonSet"),
            ("batch/v1", "Job"),
            ("batch/v1", "CronJob"),
        ];

        let lp = ListParams::default().labels(label_selector);
        let mut found = Vec::new();

        for (api_version, kind) in kinds {
            let ar = match *kind {
                "ConfigMap" => ApiResource::erase::<ConfigMap>(&()),
                "Secret" => ApiResource::erase::<Secret>(&()),
                "Service" => ApiResource::erase::<k8s_openapi::api::core::v1::Service>(&()),
                "ServiceAccount" => {
                    ApiResource::erase::<k8s_openapi::api::core::v1::ServiceAccount>(&())
                }
                "Deployment" => ApiResource::erase::<k8s_openapi::api::apps::v1::Deployment>(&()),
                "StatefulSet" => ApiResource::erase::<k8s_openapi::api::apps::v1::StatefulSet>(&()),
                "DaemonSet" => ApiResource::erase::<k8s_openapi::api::apps::v1::DaemonSet>(&()),
                "Job" => ApiResource::erase::<k8s_openapi::api::batch::v1::Job>(&()),
                "CronJob" => ApiResource::erase::<k8s_openapi::api::batch::v1::CronJob>(&()),
                _ => continue,
            };

            let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &ar);
            match api.list(&lp).await {
                Ok(list) => {
                    for obj in &list.items {
                        let mut tree = serde_json::to_value(obj)?;
                        // DynamicObject drops typing for erased APIs
                        if let Some(map) = tree.as_object_mut() {
                            map.insert("apiVersion".to_string(), (*api_version).into());
                            map.insert("kind".to_string(), (*kind).into());
                        }
                        found.push(tree);
                    }
                }
                Err(e) => {
                    tracing::debug!(kind = %kind, error = %e, "skipping extra-resource listing");
                    continue;
                }
            }
        }

        Ok(found)
    }
}

fn helm_selector(release_name: Option<&str>) -> String {
    match release_name {
        Some(name) => format!("{},name={}", HELM_OWNER_SELECTOR, name),
        None => HELM_OWNER_SELECTOR.to_string(),
    }
}

/// Split an apiVersion into (group, version); the core API has no group
fn split_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// Resolve the active context name from the environment's kubeconfig
fn active_context_name() -> String {
    match Kubeconfig::read() {
        Ok(kubeconfig) => kubeconfig
            .current_context
            .unwrap_or_else(|| "default".to_string()),
        Err(_) => "in-cluster".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helm_selector() {
        assert_eq!(helm_selector(None), "owner=helm");
        assert_eq!(helm_selector(Some("nginx")), "owner=helm,name=nginx");
    }

    #[test]
    fn test_split_api_version() {
        assert_eq!(
            split_api_version("apps/v1"),
            ("apps".to_string(), "v1".to_string())
        );
        assert_eq!(split_api_version("v1"), (String::new(), "v1".to_string()));
        assert_eq!(
            split_api_version("networking.k8s.io/v1"),
            ("networking.k8s.io".to_string(), "v1".to_string())
        );
    }
}
