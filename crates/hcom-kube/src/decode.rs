//! Release decoder
//!
//! Reconstructs a `HelmRelease` from its storage object. Two pipelines share
//! a final JSON-to-record step:
//!
//! - **Secret**: the `release` data field holds base64 text of a gzip
//!   stream (the cluster client has already reversed the transport layer).
//!   Some client paths deliver a double-encoded payload, so the gzip magic
//!   is checked after the first decode and a second decode applied if
//!   needed.
//! - **ConfigMap**: the `release` value is a string with one extra base64
//!   layer on top of the Secret pipeline.
//!
//! The label fast path synthesizes a partial release from the object's
//! `name`/`status`/`version` labels without touching the payload.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::io::Read;

use crate::client::HELM_SECRET_TYPE;
use crate::error::{KubeError, Result};
use hcom_core::chart::ChartMetadata;
use hcom_core::release::{HelmRelease, ReleaseStatus, StorageKind};
use hcom_core::values::Values;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decode a Helm release Secret into a full `HelmRelease`
pub fn decode_secret(secret: &Secret, context: &str) -> Result<HelmRelease> {
    let object_name = secret.metadata.name.clone().unwrap_or_default();
    let namespace = secret.metadata.namespace.clone().unwrap_or_default();

    if secret.type_.as_deref() != Some(HELM_SECRET_TYPE) {
        return Err(KubeError::UnknownStorage {
            object: object_name,
        });
    }

    let payload = secret
        .data
        .as_ref()
        .and_then(|d| d.get("release"))
        .ok_or_else(|| KubeError::UnknownStorage {
            object: object_name.clone(),
        })?;

    let json = decode_payload(&payload.0, &object_name)?;
    map_release(
        json,
        StorageKind::Secret,
        object_name,
        &namespace,
        context,
    )
}

/// Decode a Helm release ConfigMap into a full `HelmRelease`
pub fn decode_configmap(cm: &ConfigMap, context: &str) -> Result<HelmRelease> {
    let object_name = cm.metadata.name.clone().unwrap_or_default();
    let namespace = cm.metadata.namespace.clone().unwrap_or_default();

    let payload = cm
        .data
        .as_ref()
        .and_then(|d| d.get("release"))
        .ok_or_else(|| KubeError::UnknownStorage {
            object: object_name.clone(),
        })?;

    // ConfigMap values are plain strings, so there is one extra base64
    // layer before the Secret pipeline applies
    let inner = BASE64
        .decode(payload.as_bytes())
        .map_err(|e| corrupt(&object_name, format!("outer base64: {}", e)))?;
    let json = decode_payload(&inner, &object_name)?;
    map_release(
        json,
        StorageKind::ConfigMap,
        object_name,
        &namespace,
        context,
    )
}

/// Synthesize a partial release from storage labels alone. The manifest,
/// values and hooks are empty; callers needing them must decode fully.
pub fn release_from_labels(
    kind: StorageKind,
    object_name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
    context: &str,
) -> HelmRelease {
    let status = labels
        .get("status")
        .map(|s| ReleaseStatus::parse(s))
        .unwrap_or_default();
    let revision = labels
        .get("version")
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0);

    HelmRelease {
        name: labels.get("name").cloned().unwrap_or_default(),
        namespace: namespace.to_string(),
        revision,
        status,
        chart: ChartMetadata::default(),
        updated_at: None,
        description: String::new(),
        values_user: Values::new(),
        values_computed: Values::new(),
        manifest: String::new(),
        hooks: Vec::new(),
        storage: kind,
        storage_object_name: object_name.to_string(),
        context: context.to_string(),
        diagnostic: None,
    }
}

/// base64 (once or twice) -> gzip -> JSON
fn decode_payload(raw: &[u8], object: &str) -> Result<JsonValue> {
    let mut decoded = BASE64
        .decode(raw)
        .map_err(|e| corrupt(object, format!("base64: {}", e)))?;

    // Double-encoded payloads show up when the transport layer was not
    // reversed; detect by the absence of the gzip magic
    if !decoded.starts_with(&GZIP_MAGIC) {
        decoded = BASE64
            .decode(&decoded)
            .map_err(|e| corrupt(object, format!("inner base64: {}", e)))?;
    }
    if !decoded.starts_with(&GZIP_MAGIC) {
        return Err(corrupt(object, "payload is not gzip data".to_string()));
    }

    let mut decompressed = Vec::new();
    GzDecoder::new(decoded.as_slice())
        .read_to_end(&mut decompressed)
        .map_err(|e| corrupt(object, format!("gzip: {}", e)))?;

    serde_json::from_slice(&decompressed).map_err(|e| corrupt(object, format!("json: {}", e)))
}

fn corrupt(object: &str, message: String) -> KubeError {
    KubeError::CorruptPayload {
        object: object.to_string(),
        message,
    }
}

/// Shared JSON-to-record step for both pipelines
fn map_release(
    payload: JsonValue,
    kind: StorageKind,
    object_name: String,
    object_namespace: &str,
    context: &str,
) -> Result<HelmRelease> {
    let required_str = |key: &str| -> Result<String> {
        payload
            .get(key)
            .and_then(JsonValue::as_str)
            .map(String::from)
            .ok_or_else(|| KubeError::UnsupportedSchema {
                object: object_name.clone(),
                message: format!("missing field '{}'", key),
            })
    };

    let name = required_str("name")?;
    let revision = payload
        .get("version")
        .and_then(JsonValue::as_u64)
        .ok_or_else(|| KubeError::UnsupportedSchema {
            object: object_name.clone(),
            message: "missing field 'version'".to_string(),
        })? as u32;

    let info = payload.get("info").cloned().unwrap_or(JsonValue::Null);
    let status_str = info
        .get("status")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| KubeError::UnsupportedSchema {
            object: object_name.clone(),
            message: "missing field 'info.status'".to_string(),
        })?;
    let status = ReleaseStatus::parse(status_str);

    let chart_node = payload.get("chart").cloned().unwrap_or(JsonValue::Null);
    let chart = ChartMetadata::from_json(chart_node.get("metadata").unwrap_or(&JsonValue::Null));
    if status != ReleaseStatus::Unknown && (chart.name.is_empty() || chart.version.is_empty()) {
        return Err(KubeError::UnsupportedSchema {
            object: object_name,
            message: "missing chart metadata".to_string(),
        });
    }

    // namespace from the payload, falling back to the storage object's
    let mut namespace = payload
        .get("namespace")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();
    if namespace.is_empty() {
        namespace = object_namespace.to_string();
    }

    let values_user = Values::from_json(payload.get("config").cloned().unwrap_or(JsonValue::Null));
    let chart_defaults =
        Values::from_json(chart_node.get("values").cloned().unwrap_or(JsonValue::Null));
    let values_computed = Values::merged(chart_defaults, &values_user);

    let updated_at = info
        .get("last_deployed")
        .and_then(JsonValue::as_str)
        .and_then(parse_timestamp);

    let hooks = payload
        .get("hooks")
        .and_then(JsonValue::as_array)
        .cloned()
        .unwrap_or_default();

    Ok(HelmRelease {
        name,
        namespace,
        revision,
        status,
        chart,
        updated_at,
        description: info
            .get("description")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string(),
        values_user,
        values_computed,
        manifest: payload
            .get("manifest")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string(),
        hooks,
        storage: kind,
        storage_object_name: object_name,
        context: context.to_string(),
        diagnostic: None,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use k8s_openapi::ByteString;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;
    use std::io::Write;

    fn sample_payload() -> JsonValue {
        json!({
            "name": "nginx",
            "namespace": "web",
            "version": 3,
            "info": {
                "status": "deployed",
                "last_deployed": "2024-01-01T00:00:00Z",
                "description": "Upgrade complete"
            },
            "chart": {
                "metadata": {
                    "name": "nginx",
                    "version": "13.2.0",
                    "appVersion": "1.25.0"
                },
                "values": {"replicaCount": 1, "image": {"tag": "1.25"}}
            },
            "config": {"replicaCount": 3},
            "manifest": "---\nkind: Service\napiVersion: v1\nmetadata:\n  name: nginx\n"
        })
    }

    /// gzip + base64, the encoding Helm itself applies
    fn helm_encode(payload: &JsonValue) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(payload.to_string().as_bytes())
            .unwrap();
        let compressed = encoder.finish().unwrap();
        BASE64.encode(compressed).into_bytes()
    }

    fn sample_secret(payload: &JsonValue) -> Secret {
        let mut data = std::collections::BTreeMap::new();
        data.insert("release".to_string(), ByteString(helm_encode(payload)));
        Secret {
            metadata: ObjectMeta {
                name: Some("sh.helm.release.v1.nginx.v3".to_string()),
                namespace: Some("web".to_string()),
                ..Default::default()
            },
            type_: Some(HELM_SECRET_TYPE.to_string()),
            data: Some(data),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_secret() {
        let release = decode_secret(&sample_secret(&sample_payload()), "kind-test").unwrap();
        assert_eq!(release.name, "nginx");
        assert_eq!(release.namespace, "web");
        assert_eq!(release.revision, 3);
        assert_eq!(release.status, ReleaseStatus::Deployed);
        assert_eq!(release.chart_version(), "13.2.0");
        assert_eq!(release.app_version(), "1.25.0");
        assert_eq!(release.storage, StorageKind::Secret);
        assert!(release.manifest.contains("kind: Service"));
        assert_eq!(release.context, "kind-test");
    }

    #[test]
    fn test_decode_is_idempotent() {
        let secret = sample_secret(&sample_payload());
        let a = decode_secret(&secret, "ctx").unwrap();
        let b = decode_secret(&secret, "ctx").unwrap();
        assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::to_value(&b).unwrap());
    }

    #[test]
    fn test_values_merge() {
        let release = decode_secret(&sample_secret(&sample_payload()), "ctx").unwrap();
        // user value wins
        assert_eq!(release.values_computed.get("replicaCount"), Some(&json!(3)));
        // chart default survives
        assert_eq!(release.values_computed.get("image.tag"), Some(&json!("1.25")));
        // user values carried separately
        assert_eq!(release.values_user.get("replicaCount"), Some(&json!(3)));
        assert_eq!(release.values_user.get("image"), None);
    }

    #[test]
    fn test_decode_double_encoded_secret() {
        let mut secret = sample_secret(&sample_payload());
        let once = secret.data.as_ref().unwrap()["release"].0.clone();
        secret
            .data
            .as_mut()
            .unwrap()
            .insert("release".to_string(), ByteString(BASE64.encode(once).into_bytes()));

        let release = decode_secret(&secret, "ctx").unwrap();
        assert_eq!(release.name, "nginx");
    }

    #[test]
    fn test_decode_configmap() {
        let payload = sample_payload();
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some("nginx.v3".to_string()),
                namespace: Some("web".to_string()),
                ..Default::default()
            },
            data: Some(
                [(
                    "release".to_string(),
                    BASE64.encode(helm_encode(&payload)),
                )]
                .into(),
            ),
            ..Default::default()
        };

        let release = decode_configmap(&cm, "ctx").unwrap();
        assert_eq!(release.name, "nginx");
        assert_eq!(release.storage, StorageKind::ConfigMap);
    }

    #[test]
    fn test_corrupt_payload() {
        let mut secret = sample_secret(&sample_payload());
        secret
            .data
            .as_mut()
            .unwrap()
            .insert("release".to_string(), ByteString(b"!!not base64!!".to_vec()));

        let err = decode_secret(&secret, "ctx").unwrap_err();
        assert!(matches!(err, KubeError::CorruptPayload { .. }));
    }

    #[test]
    fn test_unsupported_schema() {
        let payload = json!({"name": "x", "version": 1, "info": {}});
        let secret = sample_secret(&payload);
        let err = decode_secret(&secret, "ctx").unwrap_err();
        assert!(matches!(err, KubeError::UnsupportedSchema { .. }));
    }

    #[test]
    fn test_unknown_storage() {
        let mut secret = sample_secret(&sample_payload());
        secret.type_ = Some("Opaque".to_string());
        let err = decode_secret(&secret, "ctx").unwrap_err();
        assert!(matches!(err, KubeError::UnknownStorage { .. }));
    }

    #[test]
    fn test_release_from_labels() {
        let labels: BTreeMap<String, String> = [
            ("name".to_string(), "nginx".to_string()),
            ("status".to_string(), "Deployed".to_string()),
            ("version".to_string(), "7".to_string()),
            ("owner".to_string(), "helm".to_string()),
        ]
        .into();

        let release = release_from_labels(
            StorageKind::Secret,
            "sh.helm.release.v1.nginx.v7",
            "web",
            &labels,
            "ctx",
        );
        assert_eq!(release.name, "nginx");
        assert_eq!(release.revision, 7);
        assert_eq!(release.status, ReleaseStatus::Deployed);
        assert!(release.manifest.is_empty());
        assert!(release.is_partial());
    }
}
