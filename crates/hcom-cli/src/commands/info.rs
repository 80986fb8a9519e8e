//! Info command - show release details, ownership, and resources

use console::style;
use serde_json::json;

use hcom_core::manifest::resource_counts;
use hcom_kube::{OwnerDetector, ReleaseStore};

use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat, ReleaseRow};
use crate::{Global, exit_codes};

pub async fn run(global: &Global, name: &str, show_values: bool) -> Result<i32> {
    let client = super::connect(global).await?;
    let store = ReleaseStore::new(&client);

    let release = store
        .get(name, global.namespace.as_deref())
        .await?
        .ok_or_else(|| CliError::failure(format!("release '{}' not found", name)))?;

    let owner = OwnerDetector::new(&client).detect(&release).await;
    let counts = resource_counts(&release.manifest);

    if global.output != OutputFormat::Table {
        let mut payload = json!({
            "release": ReleaseRow::from(&release),
            "description": release.description,
            "storage": release.storage.as_str(),
            "storage_object": release.storage_object_name,
            "chart_metadata": {
                "description": release.chart.description,
                "home": release.chart.home,
                "sources": release.chart.sources,
            },
            "owner": owner,
            "resource_counts": counts,
        });
        if show_values {
            payload["values"] = release.values_user.inner().clone();
        }
        let errors = output::errors_from_releases(std::slice::from_ref(&release));
        output::emit(global.output, "info", &payload, &errors)?;
        return Ok(exit_codes::SUCCESS);
    }

    println!("{}: {}", style("Name").bold(), release.name);
    println!("{}: {}", style("Namespace").bold(), release.namespace);
    println!("{}: {}", style("Context").bold(), release.context);
    println!("{}: {}", style("Revision").bold(), release.revision);
    let status = release.status.as_str();
    println!(
        "{}: {}",
        style("Status").bold(),
        output::status_style(status).apply_to(status)
    );
    if let Some(note) = &release.diagnostic {
        println!("{}: {}", style("Warning").red().bold(), note);
    }
    println!(
        "{}: {}-{}",
        style("Chart").bold(),
        release.chart_name(),
        release.chart_version()
    );
    println!("{}: {}", style("App Version").bold(), release.app_version());
    println!("{}: {}", style("Updated").bold(), release.updated_short());
    if !release.description.is_empty() {
        println!("{}: {}", style("Description").bold(), release.description);
    }
    println!(
        "{}: {} ({})",
        style("Storage").bold(),
        release.storage,
        release.storage_object_name
    );

    println!(
        "{}: {} ({})",
        style("Owner").bold(),
        owner.owner,
        owner.confidence
    );
    for evidence in &owner.evidence {
        println!("  - {}", evidence);
    }

    if !counts.is_empty() {
        println!("{}:", style("Resources").bold());
        for (kind, count) in &counts {
            println!("  {:<32} {}", kind, count);
        }
    }

    if !release.chart.description.is_empty() {
        println!(
            "{}: {}",
            style("Chart Description").bold(),
            release.chart.description
        );
    }
    if !release.chart.home.is_empty() {
        println!("{}: {}", style("Home").bold(), release.chart.home);
    }

    if show_values {
        println!("{}:", style("User Values").bold());
        let yaml = serde_yaml::to_string(release.values_user.inner())?;
        for line in yaml.lines() {
            println!("  {}", line);
        }
    }

    Ok(exit_codes::SUCCESS)
}
