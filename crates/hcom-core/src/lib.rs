//! Core data model for Helm Commander
//!
//! This crate holds everything that does not need a cluster:
//! - **Release types**: `HelmRelease`, `ReleaseStatus`, `StorageKind`
//! - **Chart metadata**: decoded `chart.metadata` and `ChartRef`
//! - **Manifest parsing**: multi-document YAML into `ManifestResource`
//! - **Drift types**: `DiffEntry`, `DiffVerdict`, `FieldChange`
//! - **Diagnostics**: `DoctorFinding`, `Severity`, `FindingCategory`
//! - **Ownership**: `OwnerVerdict`, `Owner`, `Confidence`
//! - **Version comparison**: lenient semver parsing and update classification

pub mod chart;
pub mod diff;
pub mod doctor;
pub mod manifest;
pub mod owner;
pub mod release;
pub mod values;
pub mod version;

pub use chart::{ChartMetadata, ChartRef};
pub use diff::{DiffEntry, DiffVerdict, DriftReport, FieldChange};
pub use doctor::{DoctorFinding, FindingCategory, Severity};
pub use manifest::{ManifestResource, ResourceId, is_cluster_scoped, parse_manifest, resource_counts};
pub use owner::{Confidence, Owner, OwnerVerdict};
pub use release::{HelmRelease, ReleaseStatus, StorageKind};
pub use values::Values;
pub use version::{UpdateType, classify_update, is_newer, parse_version};
