//! Drift detection result types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::manifest::ResourceId;

/// Comparison outcome for a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffVerdict {
    Unchanged,
    Modified,
    MissingLive,
    ExtraLive,
}

impl std::fmt::Display for DiffVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unchanged => "unchanged",
            Self::Modified => "modified",
            Self::MissingLive => "missing_live",
            Self::ExtraLive => "extra_live",
        };
        f.write_str(s)
    }
}

/// One changed path within a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Dotted path from the resource root, e.g. `spec.replicas`
    pub path: String,
    pub old: Option<JsonValue>,
    pub new: Option<JsonValue>,
}

/// Comparison result for one resource of a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffEntry {
    #[serde(flatten)]
    pub id: ResourceId,
    pub verdict: DiffVerdict,
    /// Present only when the verdict is `modified`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
    /// Distinguishing marker, e.g. for access-denied fetches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DiffEntry {
    pub fn unchanged(id: ResourceId) -> Self {
        Self {
            id,
            verdict: DiffVerdict::Unchanged,
            changes: Vec::new(),
            note: None,
        }
    }

    pub fn modified(id: ResourceId, changes: Vec<FieldChange>) -> Self {
        Self {
            id,
            verdict: DiffVerdict::Modified,
            changes,
            note: None,
        }
    }

    pub fn missing_live(id: ResourceId, note: Option<String>) -> Self {
        Self {
            id,
            verdict: DiffVerdict::MissingLive,
            changes: Vec::new(),
            note,
        }
    }

    pub fn extra_live(id: ResourceId) -> Self {
        Self {
            id,
            verdict: DiffVerdict::ExtraLive,
            changes: Vec::new(),
            note: None,
        }
    }

    pub fn has_drift(&self) -> bool {
        self.verdict != DiffVerdict::Unchanged
    }
}

/// All diff entries for one release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub release_name: String,
    pub namespace: String,
    pub entries: Vec<DiffEntry>,
}

impl DriftReport {
    pub fn has_drift(&self) -> bool {
        self.entries.iter().any(DiffEntry::has_drift)
    }

    /// Counts per verdict, in verdict order
    pub fn summary(&self) -> Vec<(DiffVerdict, usize)> {
        let mut counts: Vec<(DiffVerdict, usize)> = Vec::new();
        for verdict in [
            DiffVerdict::Unchanged,
            DiffVerdict::Modified,
            DiffVerdict::MissingLive,
            DiffVerdict::ExtraLive,
        ] {
            let n = self.entries.iter().filter(|e| e.verdict == verdict).count();
            if n > 0 {
                counts.push((verdict, n));
            }
        }
        counts
    }
}
