//! Updates command - compare deployed versions with local repo caches

use console::style;
use hcom_core::version::UpdateType;
use hcom_kube::{ListFilters, ReleaseStore};
use hcom_repo::{RepoResolver, UpdateChecker};

use crate::error::Result;
use crate::output::{self, OutputFormat};
use crate::{Global, exit_codes};

pub async fn run(global: &Global, filter: Option<&str>) -> Result<i32> {
    let filters = ListFilters {
        filter: super::parse_filter(filter)?,
        ..Default::default()
    };

    let client = super::connect(global).await?;
    let store = ReleaseStore::new(&client);
    let releases = store.list(global.namespace.as_deref(), &filters).await?;

    let mut resolver = RepoResolver::from_env();
    let updates = UpdateChecker::new(&mut resolver).check(&releases)?;

    if global.output != OutputFormat::Table {
        let errors = output::errors_from_releases(&releases);
        output::emit(global.output, "updates", &updates, &errors)?;
        return Ok(exit_codes::SUCCESS);
    }

    if updates.is_empty() {
        println!("No releases with chart metadata found");
        return Ok(exit_codes::SUCCESS);
    }

    println!(
        "{:<28} {:<16} {:<24} {:<12} {:<12} {:<16} {}",
        style("NAME").bold(),
        style("NAMESPACE").bold(),
        style("CHART").bold(),
        style("CURRENT").bold(),
        style("LATEST").bold(),
        style("REPO").bold(),
        style("UPDATE").bold()
    );

    for update in &updates {
        let update_style = match update.update_type {
            UpdateType::Major => style(update.update_type.as_str()).red().bold(),
            UpdateType::Minor => style(update.update_type.as_str()).yellow(),
            UpdateType::Patch => style(update.update_type.as_str()).green(),
            UpdateType::UpToDate | UpdateType::Unknown => {
                style(update.update_type.as_str()).dim()
            }
        };

        println!(
            "{:<28} {:<16} {:<24} {:<12} {:<12} {:<16} {}",
            update.release_name,
            update.namespace,
            update.chart_name,
            update.current_version,
            update.latest_version,
            if update.repo.is_empty() { "-" } else { &update.repo },
            update_style
        );
    }

    Ok(exit_codes::SUCCESS)
}
