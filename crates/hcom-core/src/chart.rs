//! Chart metadata decoded from a release payload

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Chart metadata as stored in the release payload (`chart.metadata`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub home: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl ChartMetadata {
    /// Build from the decoded `chart.metadata` sub-tree
    pub fn from_json(meta: &JsonValue) -> Self {
        let str_field = |key: &str| {
            meta.get(key)
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let str_list = |key: &str| {
            meta.get(key)
                .and_then(JsonValue::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(JsonValue::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default()
        };

        let annotations = meta
            .get("annotations")
            .and_then(JsonValue::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: str_field("name"),
            version: str_field("version"),
            app_version: str_field("appVersion"),
            description: str_field("description"),
            home: str_field("home"),
            sources: str_list("sources"),
            keywords: str_list("keywords"),
            annotations,
        }
    }

    /// Reference identifying this chart build
    pub fn chart_ref(&self) -> ChartRef {
        ChartRef {
            name: self.name.clone(),
            version: self.version.clone(),
            app_version: self.app_version.clone(),
            digest: self.annotations.get("helm.sh/chart-digest").cloned(),
        }
    }
}

/// Identity of a chart build, used to match repo index entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRef {
    pub name: String,
    pub version: String,
    pub app_version: String,
    pub digest: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_maps_fields() {
        let meta = json!({
            "name": "nginx",
            "version": "13.2.0",
            "appVersion": "1.25.0",
            "description": "NGINX Open Source",
            "sources": ["https://github.com/nginx"],
        });
        let chart = ChartMetadata::from_json(&meta);
        assert_eq!(chart.name, "nginx");
        assert_eq!(chart.version, "13.2.0");
        assert_eq!(chart.app_version, "1.25.0");
        assert_eq!(chart.sources.len(), 1);
    }

    #[test]
    fn test_from_json_tolerates_missing_fields() {
        let chart = ChartMetadata::from_json(&json!({"name": "redis", "version": "17.0.0"}));
        assert_eq!(chart.app_version, "");
        assert!(chart.annotations.is_empty());
    }

    #[test]
    fn test_chart_ref() {
        let chart = ChartMetadata {
            name: "nginx".into(),
            version: "13.2.0".into(),
            app_version: "1.25.0".into(),
            ..Default::default()
        };
        let r = chart.chart_ref();
        assert_eq!(r.name, "nginx");
        assert!(r.digest.is_none());
    }
}
