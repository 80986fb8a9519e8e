//! List command - list installed releases

use console::style;
use hcom_kube::{ListFilters, ReleaseStore, StatusCategory};

use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat, ReleaseRow};
use crate::{Global, exit_codes};

pub async fn run(
    global: &Global,
    filter: Option<&str>,
    only: Option<&str>,
    status: Option<String>,
) -> Result<i32> {
    let filters = ListFilters {
        filter: super::parse_filter(filter)?,
        only: match only {
            None => None,
            Some(raw) => Some(StatusCategory::parse(raw).ok_or_else(|| {
                CliError::invocation_with_help(
                    format!("unknown --only value '{}'", raw),
                    "Valid values: deployed, failed, pending, problematic.",
                )
            })?),
        },
        status,
    };

    let client = super::connect(global).await?;
    let store = ReleaseStore::new(&client);
    let releases = store.list(global.namespace.as_deref(), &filters).await?;

    if global.output != OutputFormat::Table {
        let rows: Vec<ReleaseRow> = releases.iter().map(ReleaseRow::from).collect();
        let errors = output::errors_from_releases(&releases);
        output::emit(global.output, "releases", &rows, &errors)?;
        return Ok(exit_codes::SUCCESS);
    }

    if releases.is_empty() {
        match global.namespace.as_deref() {
            Some(ns) => println!("No releases found in namespace {}", ns),
            None => println!("No releases found in any namespace"),
        }
        return Ok(exit_codes::SUCCESS);
    }

    println!(
        "{:<28} {:<16} {:<9} {:<16} {:<28} {:<12} {:<20}",
        style("NAME").bold(),
        style("NAMESPACE").bold(),
        style("REVISION").bold(),
        style("STATUS").bold(),
        style("CHART").bold(),
        style("APP VERSION").bold(),
        style("UPDATED").bold()
    );

    for release in &releases {
        let status = release.status.as_str();
        let glyph = if release.diagnostic.is_some() {
            format!(" {}", style("!").red().bold())
        } else {
            String::new()
        };
        let chart = if release.chart_name().is_empty() {
            "-".to_string()
        } else {
            format!("{}-{}", release.chart_name(), release.chart_version())
        };

        println!(
            "{:<28} {:<16} {:<9} {:<16} {:<28} {:<12} {:<20}{}",
            release.name,
            release.namespace,
            release.revision,
            output::status_style(status).apply_to(status),
            chart,
            release.app_version(),
            release.updated_short(),
            glyph
        );
    }

    Ok(exit_codes::SUCCESS)
}
