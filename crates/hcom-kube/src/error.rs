//! Error types for hcom-kube

use thiserror::Error;

/// Result type for hcom-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while reading cluster state
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error that is neither not-found nor access-denied
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// The cluster could not be reached at all
    #[error("cluster unreachable: {message}")]
    ClusterUnreachable { message: String },

    /// The API server rejected the request for lack of permissions
    #[error("access denied: {what}")]
    AccessDenied { what: String },

    /// The requested object does not exist
    #[error("not found: {what}")]
    NotFound { what: String },

    /// A decode stage of the release payload failed
    #[error("corrupt release payload in '{object}': {message}")]
    CorruptPayload { object: String, message: String },

    /// The decoded JSON lacks required release fields
    #[error("unsupported release schema in '{object}': {message}")]
    UnsupportedSchema { object: String, message: String },

    /// The storage object lacks the Helm markers
    #[error("'{object}' is not a Helm release storage object")]
    UnknownStorage { object: String },

    /// Per-call or invocation deadline exceeded
    #[error("operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Classify a raw kube error into the taxonomy, attaching what was
    /// being fetched
    pub fn classify(e: kube::Error, what: &str) -> Self {
        match e {
            kube::Error::Api(ref resp) if resp.code == 404 => KubeError::NotFound {
                what: what.to_string(),
            },
            kube::Error::Api(ref resp) if resp.code == 401 || resp.code == 403 => {
                KubeError::AccessDenied {
                    what: what.to_string(),
                }
            }
            kube::Error::Api(_) => KubeError::Api(e),
            other => KubeError::ClusterUnreachable {
                message: other.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::NotFound { .. })
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, KubeError::AccessDenied { .. })
    }

    /// True when the whole invocation should abort with exit code 3
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KubeError::ClusterUnreachable { .. } | KubeError::AccessDenied { .. }
        )
    }

    /// Short taxonomy name for structured error output
    pub fn kind(&self) -> &'static str {
        match self {
            KubeError::Api(_) => "API_ERROR",
            KubeError::ClusterUnreachable { .. } => "CLUSTER_UNREACHABLE",
            KubeError::AccessDenied { .. } => "ACCESS_DENIED",
            KubeError::NotFound { .. } => "NOT_FOUND",
            KubeError::CorruptPayload { .. } => "CORRUPT_PAYLOAD",
            KubeError::UnsupportedSchema { .. } => "UNSUPPORTED_SCHEMA",
            KubeError::UnknownStorage { .. } => "UNKNOWN_STORAGE",
            KubeError::Timeout { .. } => "TIMEOUT",
            KubeError::Serialization(_) => "PARSE_ERROR",
        }
    }
}
