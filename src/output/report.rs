use crate::config::{OptionsRecord, OutputFormat};
use crate::discovery::GitInfo;
use crate::error::OutputError;
use crate::runner::{TaskResult, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::summary::RunSummary;

/// Everything persisted for one run.
#[derive(Debug, Serialize)]
pub struct TestReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Results grouped by project key
    pub projects: BTreeMap<String, Vec<TaskResult>>,
    pub summary: RunSummary,
    pub git_info: Option<GitInfo>,
    pub options: OptionsRecord,
    pub cancelled: Vec<String>,
}

impl TestReport {
    pub fn new(
        results: Vec<TaskResult>,
        summary: RunSummary,
        git_info: Option<GitInfo>,
        options: OptionsRecord,
        cancelled: Vec<String>,
    ) -> Self {
        let mut projects: BTreeMap<String, Vec<TaskResult>> = BTreeMap::new();
        for result in results {
            projects.entry(result.project.clone()).or_default().push(result);
        }

        Self {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            git_info,
            projects,
            summary,
            options,
            cancelled,
        }
    }
}

/// Write `test-report-<epoch-ms>.json` under `report_dir`
pub fn write_report(report_dir: &Path, report: &TestReport) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(report_dir).map_err(OutputError::CreateDir)?;

    let path = report_dir.join(format!(
        "test-report-{}.json",
        report.timestamp.timestamp_millis()
    ));
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).map_err(OutputError::WriteReport)?;
    Ok(path)
}

pub fn render(report: &TestReport, format: OutputFormat) -> Result<String, OutputError> {
    Ok(match format {
        OutputFormat::Console => render_console(report),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Markdown => render_markdown(report),
    })
}

fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Success => "✅",
        TaskStatus::Failed => "❌",
    }
}

fn counts_cell(result: &TaskResult) -> String {
    match result.counts {
        Some(c) => format!("{} passed, {} failed, {} skipped", c.passed, c.failed, c.skipped),
        None => "(unparsed)".to_string(),
    }
}

/// Live progress line printed as each task completes
pub fn format_task_line(result: &TaskResult) -> String {
    let mut line = format!(
        "{} {:<24} {:>7.1}s  {}",
        status_icon(result.status),
        result.key(),
        result.duration.as_secs_f64(),
        counts_cell(result)
    );
    if result.retries > 0 {
        line.push_str(&format!("  (retries: {})", result.retries));
    }
    if let Some(error) = &result.error {
        line.push_str(&format!("  [{}]", error));
    }
    line
}

fn render_console(report: &TestReport) -> String {
    let s = &report.summary;
    let mut out = String::new();

    out.push_str("\n=== Test Summary ===\n\n");
    if let Some(git) = &report.git_info {
        out.push_str(&format!(
            "Git:       {} @ {} ({})\n",
            git.branch, git.commit, git.author
        ));
    }

    for (project, results) in &report.projects {
        out.push_str(&format!("{}\n", project));
        for result in results {
            out.push_str(&format!(
                "  {} {:<14} {:>7.1}s  {}\n",
                status_icon(result.status),
                result.test_type,
                result.duration.as_secs_f64(),
                counts_cell(result)
            ));
        }
    }
    if !report.cancelled.is_empty() {
        out.push_str(&format!("Cancelled: {}\n", report.cancelled.join(", ")));
    }

    out.push('\n');
    out.push_str(&format!("Total:     {}\n", s.total));
    out.push_str(&format!("Passed:    {}\n", s.passed));
    out.push_str(&format!("Failed:    {}\n", s.failed));
    out.push_str(&format!("Skipped:   {}\n", s.skipped));
    out.push_str(&format!("Success:   {:.1}%\n", s.success_rate()));
    out.push_str(&format!(
        "Duration:  {:.1}s\n",
        s.duration_ms as f64 / 1000.0
    ));
    out
}

fn render_markdown(report: &TestReport) -> String {
    let s = &report.summary;
    let mut md = String::new();

    md.push_str("# Test Report\n\n");
    md.push_str(&format!("**Generated:** {}\n", report.timestamp.to_rfc3339()));
    md.push_str(&format!("**Run:** `{}`\n", report.run_id));
    if let Some(git) = &report.git_info {
        md.push_str(&format!(
            "**Git:** `{}` @ `{}` by {}\n",
            git.branch, git.commit, git.author
        ));
    }
    md.push_str(&format!(
        "**Duration:** {:.1}s\n\n",
        s.duration_ms as f64 / 1000.0
    ));

    md.push_str("## Totals\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Total | {} |\n", s.total));
    md.push_str(&format!("| Passed | {} |\n", s.passed));
    md.push_str(&format!("| Failed | {} |\n", s.failed));
    md.push_str(&format!("| Skipped | {} |\n", s.skipped));
    md.push_str(&format!("| Success rate | {:.1}% |\n\n", s.success_rate()));

    md.push_str("## Tasks\n\n");
    md.push_str("| Project | Type | Status | Tests | Retries | Duration |\n");
    md.push_str("|---------|------|--------|-------|---------|----------|\n");
    for results in report.projects.values() {
        for result in results {
            md.push_str(&format!(
                "| {} | {} | {} {} | {} | {} | {:.1}s |\n",
                result.project,
                result.test_type,
                status_icon(result.status),
                result.status,
                counts_cell(result),
                result.retries,
                result.duration.as_secs_f64()
            ));
        }
    }

    let failures: Vec<_> = report
        .projects
        .values()
        .flatten()
        .filter(|r| r.failed())
        .collect();
    if !failures.is_empty() {
        md.push_str("\n## Failures\n\n");
        for result in failures {
            md.push_str(&format!(
                "- `{}`: {}\n",
                result.key(),
                result.error.as_deref().unwrap_or("test failures")
            ));
        }
    }

    if !report.cancelled.is_empty() {
        md.push_str("\n## Cancelled (fail-fast)\n\n");
        for key in &report.cancelled {
            md.push_str(&format!("- `{}`\n", key));
        }
    }

    md
}
