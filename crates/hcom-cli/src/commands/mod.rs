//! CLI command implementations

pub mod doctor;
pub mod drift;
pub mod history;
pub mod info;
pub mod list;
pub mod source;
pub mod updates;

use hcom_kube::ClusterClient;

use crate::Global;
use crate::error::{CliError, Result};

/// Connect to the cluster honoring the shared `--context` flag
pub(crate) async fn connect(global: &Global) -> Result<ClusterClient> {
    ClusterClient::connect(global.context.as_deref())
        .await
        .map_err(CliError::from)
}

/// Parse the shared `--filter` regex (case-insensitive)
pub(crate) fn parse_filter(filter: Option<&str>) -> Result<Option<regex::Regex>> {
    match filter {
        None => Ok(None),
        Some(pattern) => regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Some)
            .map_err(|e| {
                CliError::invocation_with_help(
                    format!("invalid --filter regex: {}", e),
                    "The filter is matched against release and chart names.",
                )
            }),
    }
}
