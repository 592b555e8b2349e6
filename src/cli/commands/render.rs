//! Shared report rendering for run and triage commands.

use comfy_table::{presets::UTF8_FULL, Table};
use console::style;

use crate::cli::output::CommandOutput;
use crate::domain::models::{StepSummary, TaskResultStatus, WorkflowExecutionReport};

#[derive(Debug, serde::Serialize)]
pub struct RunOutput {
    report: WorkflowExecutionReport,
    step_summary: StepSummary,
}

impl RunOutput {
    pub fn new(report: &WorkflowExecutionReport, summary: &StepSummary) -> Self {
        Self { report: report.clone(), step_summary: summary.clone() }
    }
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let report = &self.report;
        let mut lines = vec![format!(
            "{} {} status: {}, phases: {}, efficiency: {:.2}",
            style("Run").bold(),
            report.run_id,
            report.overall_status.as_str(),
            report.phases_run,
            report.parallel_efficiency,
        )];

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Task", "Status", "Error"]);
        for (task_id, result) in &report.task_results {
            let status = match result.status {
                TaskResultStatus::Success => style("success").green().to_string(),
                TaskResultStatus::Error => style("error").red().to_string(),
                TaskResultStatus::Timeout => style("timeout").yellow().to_string(),
                TaskResultStatus::Skipped => style("skipped").dim().to_string(),
            };
            table.add_row(vec![
                task_id.clone(),
                status,
                result.error_message.clone().unwrap_or_default(),
            ]);
        }
        lines.push(table.to_string());

        if !report.narrative.is_empty() {
            lines.push(String::new());
            lines.push(report.narrative.clone());
        }
        if !self.step_summary.key_findings.is_empty() {
            lines.push(String::new());
            lines.push(style("Findings:").bold().to_string());
            for finding in &self.step_summary.key_findings {
                lines.push(format!("  - {finding}"));
            }
        }
        if !self.step_summary.recommendations.is_empty() {
            lines.push(style("Recommendations:").bold().to_string());
            for rec in &self.step_summary.recommendations {
                lines.push(format!("  - {rec}"));
            }
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
