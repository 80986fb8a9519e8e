//! Diagnostic finding types

use serde::{Deserialize, Serialize};

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Fixed diagnostic categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCategory {
    StorageMixed,
    Failed,
    PendingStuck,
    NoDeployedRevision,
    DuplicateChart,
    OrphanedSecret,
    RevisionBloat,
}

impl FindingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StorageMixed => "storage-mixed",
            Self::Failed => "failed",
            Self::PendingStuck => "pending-stuck",
            Self::NoDeployedRevision => "no-deployed-revision",
            Self::DuplicateChart => "duplicate-chart",
            Self::OrphanedSecret => "orphaned-secret",
            Self::RevisionBloat => "revision-bloat",
        }
    }
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorFinding {
    pub severity: Severity,
    pub category: FindingCategory,
    /// What the finding is about, usually `namespace/release`
    pub subject: String,
    pub message: String,
    /// Remediation hint, when one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl DoctorFinding {
    pub fn new(
        severity: Severity,
        category: FindingCategory,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            subject: subject.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}
