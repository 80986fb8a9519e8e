//! History command - show release revisions

use console::style;
use hcom_kube::ReleaseStore;

use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat, ReleaseRow};
use crate::{Global, exit_codes};

pub async fn run(global: &Global, name: &str, max: Option<usize>) -> Result<i32> {
    let client = super::connect(global).await?;
    let store = ReleaseStore::new(&client);

    let mut history = store.history(name, global.namespace.as_deref()).await?;
    if history.is_empty() {
        return Err(CliError::failure(format!("release '{}' not found", name)));
    }
    if let Some(max) = max {
        history.truncate(max);
    }

    if global.output != OutputFormat::Table {
        let rows: Vec<ReleaseRow> = history.iter().map(ReleaseRow::from).collect();
        let errors = output::errors_from_releases(&history);
        output::emit(global.output, "history", &rows, &errors)?;
        return Ok(exit_codes::SUCCESS);
    }

    println!(
        "Release history for {} in namespace {}:\n",
        style(name).cyan(),
        style(history[0].namespace.as_str()).yellow()
    );

    println!(
        "{:<9} {:<16} {:<28} {:<20} {}",
        style("REVISION").bold(),
        style("STATUS").bold(),
        style("CHART").bold(),
        style("UPDATED").bold(),
        style("DESCRIPTION").bold()
    );

    for release in &history {
        let status = release.status.as_str();
        let chart = if release.chart_name().is_empty() {
            "-".to_string()
        } else {
            format!("{}-{}", release.chart_name(), release.chart_version())
        };

        println!(
            "{:<9} {:<16} {:<28} {:<20} {}",
            release.revision,
            output::status_style(status).apply_to(status),
            chart,
            release.updated_short(),
            release.description
        );
    }

    Ok(exit_codes::SUCCESS)
}
