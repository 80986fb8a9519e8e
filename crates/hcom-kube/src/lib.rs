//! hcom-kube - Kubernetes integration for Helm Commander
//!
//! This crate provides:
//! - **Cluster client**: read-only access to Secrets, ConfigMaps, arbitrary
//!   typed resources and CRD listings, with context selection and timeouts
//! - **Release decoder**: the base64/gzip/JSON pipeline that reconstructs a
//!   `HelmRelease` from its storage object, plus the label fast path
//! - **Release store**: label-indexed listing with latest-revision selection,
//!   regex and status filters
//! - **Owner detector**: Argo CD / Flux / k3s / managed-by classification
//!   with a per-invocation CRD cache
//! - **Drift engine**: structural comparison of stored manifests against
//!   live cluster objects under a masking policy
//! - **Doctor engine**: cross-release diagnostic checks

pub mod client;
pub mod decode;
pub mod doctor;
pub mod drift;
pub mod error;
pub mod owner;
pub mod store;

pub use client::{ClusterClient, LiveLookup};
pub use decode::{decode_configmap, decode_secret, release_from_labels};
pub use doctor::{DoctorConfig, DoctorEngine};
pub use drift::{DriftEngine, diff_trees, mask};
pub use error::{KubeError, Result};
pub use owner::OwnerDetector;
pub use store::{ListFilters, ReleaseStore, StatusCategory};
