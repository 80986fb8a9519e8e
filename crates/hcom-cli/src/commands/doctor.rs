//! Doctor command - cross-release diagnostic checks

use console::style;
use hcom_core::doctor::Severity;
use hcom_kube::{DoctorConfig, DoctorEngine};

use crate::error::Result;
use crate::output::{self, OutputFormat};
use crate::{Global, exit_codes};

pub async fn run(
    global: &Global,
    stuck_minutes: Option<i64>,
    bloat: Option<usize>,
) -> Result<i32> {
    let mut config = DoctorConfig::default();
    if let Some(minutes) = stuck_minutes {
        config.stuck_after = chrono::Duration::minutes(minutes);
    }
    if let Some(threshold) = bloat {
        config.bloat_threshold = threshold;
    }

    let client = super::connect(global).await?;
    let findings = DoctorEngine::with_config(&client, config)
        .run(global.namespace.as_deref())
        .await?;

    let exit = if findings.is_empty() {
        exit_codes::SUCCESS
    } else {
        exit_codes::PARTIAL
    };

    if global.output != OutputFormat::Table {
        output::emit(global.output, "findings", &findings, &[])?;
        return Ok(exit);
    }

    if findings.is_empty() {
        println!("{} No problems detected", style("OK").green().bold());
        return Ok(exit);
    }

    for finding in &findings {
        let severity = match finding.severity {
            Severity::Error => style("ERROR").red().bold(),
            Severity::Warn => style("WARN").yellow().bold(),
            Severity::Info => style("INFO").dim(),
        };
        println!(
            "{:<14} {:<22} {:<32} {}",
            severity,
            finding.category,
            finding.subject,
            finding.message
        );
        if let Some(suggestion) = &finding.suggestion {
            println!("{:<14} {}", "", style(suggestion).dim());
        }
    }

    let errors = findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .count();
    let warns = findings
        .iter()
        .filter(|f| f.severity == Severity::Warn)
        .count();
    println!(
        "\n{} finding(s): {} error, {} warn, {} info",
        findings.len(),
        errors,
        warns,
        findings.len() - errors - warns
    );

    Ok(exit)
}
