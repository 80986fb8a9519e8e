//! Drift command - compare stored manifests with live cluster state

use console::style;
use hcom_core::diff::DiffVerdict;
use hcom_kube::{DriftEngine, ReleaseStore};

use crate::error::{CliError, Result};
use crate::output::{self, ErrorItem, OutputFormat};
use crate::{Global, exit_codes};

pub async fn run(global: &Global, name: &str) -> Result<i32> {
    let client = super::connect(global).await?;
    let store = ReleaseStore::new(&client);

    let release = store
        .get(name, global.namespace.as_deref())
        .await?
        .ok_or_else(|| CliError::failure(format!("release '{}' not found", name)))?;

    if let Some(note) = &release.diagnostic {
        return Err(CliError::failure(format!(
            "cannot diff release '{}': {}",
            name, note
        )));
    }

    let report = DriftEngine::new(&client).diff(&release).await?;
    let exit = if report.has_drift() {
        exit_codes::PARTIAL
    } else {
        exit_codes::SUCCESS
    };

    if global.output != OutputFormat::Table {
        let errors: Vec<ErrorItem> = report
            .entries
            .iter()
            .filter_map(|entry| {
                entry.note.as_ref().map(|note| ErrorItem {
                    item: entry.id.to_string(),
                    kind: "ACCESS_DENIED".to_string(),
                    message: note.clone(),
                })
            })
            .collect();
        output::emit(global.output, "drift", &report, &errors)?;
        return Ok(exit);
    }

    println!(
        "Drift for {} in namespace {}:\n",
        style(&report.release_name).cyan(),
        style(&report.namespace).yellow()
    );

    if report.entries.is_empty() {
        println!("No resources in the stored manifest");
        return Ok(exit);
    }

    for entry in &report.entries {
        let (symbol, styled) = match entry.verdict {
            DiffVerdict::Unchanged => ("=", style("unchanged").dim()),
            DiffVerdict::Modified => ("~", style("modified").yellow().bold()),
            DiffVerdict::MissingLive => ("-", style("missing live").red().bold()),
            DiffVerdict::ExtraLive => ("+", style("extra live").cyan().bold()),
        };

        print!("{} {:<48} {}", style(symbol).bold(), entry.id.to_string(), styled);
        if let Some(note) = &entry.note {
            print!(" {}", style(format!("[{}]", note)).red());
        }
        println!();

        for change in &entry.changes {
            let old = change
                .old
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "(absent)".to_string());
            let new = change
                .new
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "(absent)".to_string());
            println!(
                "    {}: {} {} {}",
                change.path,
                style(old).red(),
                style("->").dim(),
                style(new).green()
            );
        }
    }

    let summary: Vec<String> = report
        .summary()
        .into_iter()
        .map(|(verdict, count)| format!("{} {}", count, verdict))
        .collect();
    println!("\n{}", summary.join(", "));

    Ok(exit)
}
