//! Shared output formatting for check reports.

use anyhow::Result;
use importee_core::CheckReport;

use crate::OutputFormat;

/// Print a check report in the specified format.
pub fn print(report: &CheckReport, format: OutputFormat, quiet: bool) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report, quiet),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Compact => print_compact(report),
    }
    Ok(())
}

fn print_text(report: &CheckReport, quiet: bool) {
    for issue in &report.issues {
        println!(
            "{}:{}: \x1b[31m{}\x1b[0m {}",
            issue.path, issue.line, issue.rule_name, issue.message
        );
    }

    if quiet {
        return;
    }
    if report.is_clean() {
        println!(
            "\x1b[32mNo issues found.\x1b[0m ({} file(s) checked, {} from cache)",
            report.files_checked, report.cache_hits
        );
    } else {
        println!(
            "\x1b[31mFound {} issue(s) in {} file(s)\x1b[0m",
            report.issues.len(),
            report.files_checked
        );
    }
}

fn print_json(report: &CheckReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

fn print_compact(report: &CheckReport) {
    for issue in &report.issues {
        println!("{issue}");
    }
}
