//! Release ownership classification types

use serde::{Deserialize, Serialize};

/// The higher-level system managing a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Owner {
    Argocd,
    Flux,
    K3sHelmchart,
    NativeHelm,
    Unknown,
}

impl Owner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Argocd => "argocd",
            Self::Flux => "flux",
            Self::K3sHelmchart => "k3s-helmchart",
            Self::NativeHelm => "native-helm",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How certain the classification is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

/// Classification result with the evidence that led to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerVerdict {
    pub owner: Owner,
    pub confidence: Confidence,
    /// Ordered observations, most significant first
    pub evidence: Vec<String>,
}

impl OwnerVerdict {
    pub fn new(owner: Owner, confidence: Confidence, evidence: Vec<String>) -> Self {
        Self {
            owner,
            confidence,
            evidence,
        }
    }

    /// The fallback verdict when no controller evidence is found
    pub fn native_helm() -> Self {
        Self {
            owner: Owner::NativeHelm,
            confidence: Confidence::Low,
            evidence: vec!["no controller labels or annotations detected".to_string()],
        }
    }
}
