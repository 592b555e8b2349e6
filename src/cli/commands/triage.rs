//! Triage CLI command.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::sync::Arc;

use crate::adapters::capability::oracle::ScriptedOracle;
use crate::adapters::capability::scripted::{ScriptedCapabilityExecutor, ScriptedResponse};
use crate::adapters::progress::IndicatifProgressSink;
use crate::adapters::registry::{InMemorySpecialistRegistry, InMemoryWorkflowRegistry};
use crate::application::DiagnosticOrchestrator;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, InvestigationContext, TriageReport};
use crate::domain::ports::{NullProgressSink, ProgressSink, SpecialistRegistry};

#[derive(Args, Debug)]
pub struct TriageArgs {
    /// Free-form problem description
    pub problem: String,
    /// Force a specific specialist role instead of classifying
    #[arg(long)]
    pub role: Option<String>,
    /// Time window, e.g. "-4h"
    #[arg(long)]
    pub time_window: Option<String>,
}

pub async fn execute(args: TriageArgs, config: Config, json: bool) -> Result<()> {
    let specialists =
        InMemorySpecialistRegistry::from_yaml_file(&config.definitions.specialists_path)
            .with_context(|| {
                format!(
                    "loading specialists from {}",
                    config.definitions.specialists_path
                )
            })?;

    // Scripted responses for every capability any specialist declares.
    let script = ScriptedCapabilityExecutor::new();
    for profile in specialists.profiles() {
        for task in &profile.tasks {
            for capability in &task.required_capabilities {
                script.set_response(
                    capability,
                    ScriptedResponse::success(serde_json::json!({"status": "ok"})),
                );
            }
        }
    }

    let oracle = match &args.role {
        Some(role) => ScriptedOracle::new().with_route(role.clone()),
        None => ScriptedOracle::new(),
    };

    let mut context = InvestigationContext::default();
    if let Some(window) = args.time_window {
        context = context.with_time_window(window);
    }

    let sink = if json {
        Arc::new(NullProgressSink) as Arc<dyn ProgressSink>
    } else {
        Arc::new(IndicatifProgressSink::new())
    };
    let orchestrator = DiagnosticOrchestrator::new(
        Arc::new(InMemoryWorkflowRegistry::new(Vec::new())),
        Arc::new(specialists),
        Arc::new(script),
        Arc::new(oracle),
        sink,
        config,
    );

    let report = orchestrator.run_triage(&args.problem, &context).await?;
    output(&TriageOutput { report }, json);
    Ok(())
}

#[derive(Debug, serde::Serialize)]
struct TriageOutput {
    report: TriageReport,
}

impl CommandOutput for TriageOutput {
    fn to_human(&self) -> String {
        let report = &self.report;
        let mut lines = vec![
            format!(
                "{} {} (final state: {})",
                style("Routed to").bold(),
                report.routing_decision.to_role,
                report.final_state.name(),
            ),
            String::new(),
        ];

        let run = super::render::RunOutput::new(
            &report.specialist_report,
            &report.step_summary,
        );
        lines.push(run.to_human());

        lines.push(String::new());
        lines.push(style("Audit trail:").bold().to_string());
        for decision in &report.audit_trail {
            lines.push(format!(
                "  {} {} -> {}: {}",
                decision.timestamp.format("%H:%M:%S"),
                decision.from_state,
                decision.to_role,
                decision.rationale,
            ));
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
