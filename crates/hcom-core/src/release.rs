//! Helm release types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::chart::ChartMetadata;
use crate::values::Values;

/// One revision of a Helm release, reconstructed from its storage object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelmRelease {
    /// Release name
    pub name: String,

    /// Kubernetes namespace
    pub namespace: String,

    /// Revision number (1-indexed)
    pub revision: u32,

    /// Release status
    pub status: ReleaseStatus,

    /// Chart metadata at deploy time
    pub chart: ChartMetadata,

    /// When this revision was last deployed
    pub updated_at: Option<DateTime<Utc>>,

    /// Status description from Helm (may be empty)
    #[serde(default)]
    pub description: String,

    /// User-supplied values (`config` in the payload)
    #[serde(default)]
    pub values_user: Values,

    /// Chart defaults merged with user values
    #[serde(default)]
    pub values_computed: Values,

    /// Concatenated rendered YAML documents
    #[serde(default)]
    pub manifest: String,

    /// Hook documents, kept as opaque sub-trees
    #[serde(default)]
    pub hooks: Vec<JsonValue>,

    /// Which storage driver holds this revision
    pub storage: StorageKind,

    /// Name of the backing Secret or ConfigMap
    pub storage_object_name: String,

    /// Kubeconfig context this release was read from
    #[serde(default)]
    pub context: String,

    /// Set when the payload could not be decoded and only label
    /// metadata is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl HelmRelease {
    pub fn chart_name(&self) -> &str {
        &self.chart.name
    }

    pub fn chart_version(&self) -> &str {
        &self.chart.version
    }

    pub fn app_version(&self) -> &str {
        &self.chart.app_version
    }

    /// True when only the label fast path populated this release
    pub fn is_partial(&self) -> bool {
        self.diagnostic.is_some() || (self.manifest.is_empty() && self.chart.name.is_empty())
    }

    /// Short human-readable timestamp for table output
    pub fn updated_short(&self) -> String {
        self.updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

/// Helm v3 release status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStatus {
    Unknown,
    Deployed,
    Uninstalled,
    Superseded,
    Failed,
    Uninstalling,
    PendingInstall,
    PendingUpgrade,
    PendingRollback,
}

impl ReleaseStatus {
    /// Parse a status string (case-insensitive); anything unrecognized
    /// maps to `Unknown`
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "deployed" => Self::Deployed,
            "uninstalled" => Self::Uninstalled,
            "superseded" => Self::Superseded,
            "failed" => Self::Failed,
            "uninstalling" => Self::Uninstalling,
            "pending-install" => Self::PendingInstall,
            "pending-upgrade" => Self::PendingUpgrade,
            "pending-rollback" => Self::PendingRollback,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Deployed => "deployed",
            Self::Uninstalled => "uninstalled",
            Self::Superseded => "superseded",
            Self::Failed => "failed",
            Self::Uninstalling => "uninstalling",
            Self::PendingInstall => "pending-install",
            Self::PendingUpgrade => "pending-upgrade",
            Self::PendingRollback => "pending-rollback",
        }
    }

    /// True for any `pending-*` status
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::PendingInstall | Self::PendingUpgrade | Self::PendingRollback
        )
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ReleaseStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Storage driver backing a release revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Secret,
    #[serde(rename = "configmap")]
    ConfigMap,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secret => "secret",
            Self::ConfigMap => "configmap",
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for s in [
            "unknown",
            "deployed",
            "uninstalled",
            "superseded",
            "failed",
            "uninstalling",
            "pending-install",
            "pending-upgrade",
            "pending-rollback",
        ] {
            assert_eq!(ReleaseStatus::parse(s).as_str(), s);
        }
    }

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!(ReleaseStatus::parse("DEPLOYED"), ReleaseStatus::Deployed);
        assert_eq!(
            ReleaseStatus::parse("Pending-Upgrade"),
            ReleaseStatus::PendingUpgrade
        );
    }

    #[test]
    fn test_status_parse_unrecognized() {
        assert_eq!(ReleaseStatus::parse("wedged"), ReleaseStatus::Unknown);
        assert_eq!(ReleaseStatus::parse(""), ReleaseStatus::Unknown);
    }

    #[test]
    fn test_is_pending() {
        assert!(ReleaseStatus::PendingInstall.is_pending());
        assert!(ReleaseStatus::PendingRollback.is_pending());
        assert!(!ReleaseStatus::Uninstalling.is_pending());
        assert!(!ReleaseStatus::Deployed.is_pending());
    }
}
