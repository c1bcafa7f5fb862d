//! Report export.
//!
//! Turns a [`RunReport`] into consumer-facing artifacts: a CSV table of step
//! descriptions and outcomes, and a free-text write-up (date, environment,
//! enabled flags, one row per step) suitable for pasting into an issue
//! tracker.

use crate::executor::Outcome;
use crate::runner::RunReport;

/// Render the report as a CSV table: one row per step
pub fn csv_table(report: &RunReport) -> String {
    let mut out = String::from("step,action,description,outcome\n");
    for (index, result) in report.results.iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{}\n",
            index + 1,
            csv_field(result.step.action_name()),
            csv_field(result.step.description().unwrap_or_default()),
            outcome_label(result.outcome),
        ));
    }
    out
}

/// Render the report as a structured free-text write-up
pub fn issue_writeup(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Test: {}\n", report.script_name));
    if !report.script_description.is_empty() {
        out.push_str(&format!("Description: {}\n", report.script_description));
    }
    out.push_str(&format!(
        "Date: {}\n",
        report.started.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Environment: {}\n", environment_line(report)));
    if report.flags.is_empty() {
        out.push_str("Capability flags: none\n");
    } else {
        out.push_str(&format!("Capability flags: {}\n", report.flags.join(", ")));
    }
    out.push_str(&format!(
        "Result: {} steps, {} passed, {} failed\n\n",
        report.results.len(),
        report.passed_count(),
        report.failed_count()
    ));

    out.push_str("| # | Action | Value | Expected | Outcome |\n");
    out.push_str("|---|--------|-------|----------|--------|\n");
    for (index, result) in report.results.iter().enumerate() {
        let expected = result.step.description().unwrap_or_default();
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            index + 1,
            result.step.action_name(),
            result.step.primary_value().unwrap_or_default(),
            expected,
            outcome_cell(result.outcome, result.error_detail.as_deref()),
        ));
    }
    out
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "Passed",
        Outcome::Failed => "Failed",
    }
}

fn outcome_cell(outcome: Outcome, detail: Option<&str>) -> String {
    match (outcome, detail) {
        (Outcome::Failed, Some(detail)) => format!("Failed ({})", detail),
        _ => outcome_label(outcome).to_string(),
    }
}

fn environment_line(report: &RunReport) -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown-host".to_string());
    format!("{} / {} / {}", host, std::env::consts::OS, report.browser)
}

/// Escape one CSV field, quoting when it contains separators
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
