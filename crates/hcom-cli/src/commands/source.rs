//! Source command - detect which repository a chart came from

use console::style;
use hcom_kube::ReleaseStore;
use hcom_repo::RepoResolver;

use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat};
use crate::{Global, exit_codes};

pub async fn run(global: &Global, name: &str) -> Result<i32> {
    let client = super::connect(global).await?;
    let store = ReleaseStore::new(&client);

    let release = store
        .get(name, global.namespace.as_deref())
        .await?
        .ok_or_else(|| CliError::failure(format!("release '{}' not found", name)))?;

    let chart = release.chart.chart_ref();
    let mut resolver = RepoResolver::from_env();
    let matches = resolver.resolve_source(&chart, &release.chart.annotations)?;

    if global.output != OutputFormat::Table {
        let errors = output::errors_from_releases(std::slice::from_ref(&release));
        output::emit(global.output, "sources", &matches, &errors)?;
        return Ok(exit_codes::SUCCESS);
    }

    println!(
        "Source candidates for {} ({}-{}):\n",
        style(&release.name).cyan(),
        chart.name,
        chart.version
    );

    if matches.is_empty() {
        println!("No matching repository found in the local Helm cache");
        println!("Run 'helm repo update' to refresh index caches");
        return Ok(exit_codes::SUCCESS);
    }

    println!(
        "{:<20} {:<12} {:<44} {}",
        style("REPO").bold(),
        style("CONFIDENCE").bold(),
        style("URL").bold(),
        style("REASON").bold()
    );
    for m in &matches {
        println!(
            "{:<20} {:<12} {:<44} {}",
            m.repo_name, m.confidence, m.repo_url, m.reason
        );
    }

    Ok(exit_codes::SUCCESS)
}
