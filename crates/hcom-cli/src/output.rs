//! Output format handling for JSON and YAML modes
//!
//! Structured output is always an object carrying the payload under a
//! command-specific key plus an `errors` array with per-item failures, so
//! a corrupt release never silently vanishes from machine-readable output.

use clap::ValueEnum;
use console::Style;
use serde::Serialize;
use serde_json::json;

use crate::error::Result;
use hcom_core::release::HelmRelease;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// A per-item failure surfaced alongside results
#[derive(Debug, Clone, Serialize)]
pub struct ErrorItem {
    pub item: String,
    pub kind: String,
    pub message: String,
}

/// Collect per-release decode diagnostics into error items
pub fn errors_from_releases(releases: &[HelmRelease]) -> Vec<ErrorItem> {
    releases
        .iter()
        .filter_map(|r| {
            r.diagnostic.as_ref().map(|message| ErrorItem {
                item: format!("{}/{}", r.namespace, r.name),
                kind: "CORRUPT_PAYLOAD".to_string(),
                message: message.clone(),
            })
        })
        .collect()
}

/// Print a payload as JSON or YAML with its errors array
pub fn emit<T: Serialize>(
    format: OutputFormat,
    key: &str,
    payload: &T,
    errors: &[ErrorItem],
) -> Result<()> {
    let value = json!({
        key: payload,
        "errors": errors,
    });
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&value)?),
        OutputFormat::Table => unreachable!("table output is rendered by the command"),
    }
    Ok(())
}

/// Style for a status cell in table output
pub fn status_style(status: &str) -> Style {
    match status {
        "deployed" => Style::new().green(),
        "failed" => Style::new().red(),
        s if s.starts_with("pending") => Style::new().yellow(),
        "unknown" => Style::new().red().dim(),
        _ => Style::new().dim(),
    }
}

/// Serializable view of a release for list output
#[derive(Debug, Serialize)]
pub struct ReleaseRow {
    pub name: String,
    pub namespace: String,
    pub context: String,
    pub revision: u32,
    pub status: String,
    pub chart: String,
    pub chart_version: String,
    pub app_version: String,
    pub updated: String,
}

impl From<&HelmRelease> for ReleaseRow {
    fn from(r: &HelmRelease) -> Self {
        Self {
            name: r.name.clone(),
            namespace: r.namespace.clone(),
            context: r.context.clone(),
            revision: r.revision,
            status: r.status.as_str().to_string(),
            chart: r.chart_name().to_string(),
            chart_version: r.chart_version().to_string(),
            app_version: r.app_version().to_string(),
            updated: r.updated_short(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcom_core::chart::ChartMetadata;
    use hcom_core::release::{ReleaseStatus, StorageKind};
    use hcom_core::values::Values;

    fn release(diagnostic: Option<String>) -> HelmRelease {
        HelmRelease {
            name: "web".to_string(),
            namespace: "prod".to_string(),
            revision: 2,
            status: ReleaseStatus::Deployed,
            chart: ChartMetadata::default(),
            updated_at: None,
            description: String::new(),
            values_user: Values::new(),
            values_computed: Values::new(),
            manifest: String::new(),
            hooks: Vec::new(),
            storage: StorageKind::Secret,
            storage_object_name: String::new(),
            context: "kind".to_string(),
            diagnostic,
        }
    }

    #[test]
    fn test_errors_from_releases() {
        let releases = vec![
            release(None),
            release(Some("corrupt release payload".to_string())),
        ];
        let errors = errors_from_releases(&releases);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].item, "prod/web");
        assert_eq!(errors[0].kind, "CORRUPT_PAYLOAD");
    }

    #[test]
    fn test_release_row() {
        let row = ReleaseRow::from(&release(None));
        assert_eq!(row.name, "web");
        assert_eq!(row.status, "deployed");
        assert_eq!(row.context, "kind");
    }
}
