//! Workflow CLI commands: list, show, validate, run.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use console::style;
use std::sync::Arc;

use crate::adapters::capability::oracle::ScriptedOracle;
use crate::adapters::capability::scripted::{ScriptedCapabilityExecutor, ScriptedResponse};
use crate::adapters::progress::IndicatifProgressSink;
use crate::adapters::registry::{InMemorySpecialistRegistry, InMemoryWorkflowRegistry};
use crate::application::DiagnosticOrchestrator;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, InvestigationContext, WorkflowDefinition};
use crate::domain::ports::{NullProgressSink, WorkflowRegistry};
use crate::services::validator::WorkflowValidator;

#[derive(Args, Debug)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub command: WorkflowCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommands {
    /// List registered workflows
    List,
    /// Show one workflow's tasks and dependencies
    Show {
        /// Workflow id
        id: String,
    },
    /// Validate every registered workflow without running anything
    Validate,
    /// Run a workflow with scripted capability responses (dry run)
    Run {
        /// Workflow id
        id: String,
        /// Time window, e.g. "-24h"
        #[arg(long)]
        time_window: Option<String>,
    },
}

pub async fn execute(args: WorkflowArgs, config: Config, json: bool) -> Result<()> {
    let registry = InMemoryWorkflowRegistry::from_yaml_file(&config.definitions.workflows_path)
        .with_context(|| {
            format!("loading workflows from {}", config.definitions.workflows_path)
        })?;

    match args.command {
        WorkflowCommands::List => {
            let out = ListOutput {
                workflows: registry
                    .list()
                    .into_iter()
                    .map(|s| ListRow {
                        workflow_id: s.workflow_id,
                        name: s.name,
                        description: truncate(&s.description, 48),
                        task_count: s.task_count,
                    })
                    .collect(),
            };
            output(&out, json);
        }
        WorkflowCommands::Show { id } => {
            let workflow = registry
                .get(&id)
                .with_context(|| format!("workflow not found: {id}"))?;
            output(&DetailOutput::from(&workflow), json);
        }
        WorkflowCommands::Validate => {
            let validator = WorkflowValidator::new();
            let mut results = Vec::new();
            for summary in registry.list() {
                let verdict = registry
                    .get(&summary.workflow_id)
                    .map(|wf| match validator.validate(&wf) {
                        Ok(()) => "ok".to_string(),
                        Err(err) => err.to_string(),
                    })
                    .unwrap_or_else(|| "missing".to_string());
                results.push((summary.workflow_id, verdict));
            }
            output(&ValidateOutput { results }, json);
        }
        WorkflowCommands::Run { id, time_window } => {
            let workflow = registry
                .get(&id)
                .with_context(|| format!("workflow not found: {id}"))?;

            let mut context = InvestigationContext::default();
            if let Some(window) = time_window {
                context = context.with_time_window(window);
            }

            let sink = if json {
                Arc::new(NullProgressSink) as Arc<dyn crate::domain::ports::ProgressSink>
            } else {
                Arc::new(IndicatifProgressSink::new())
            };
            let orchestrator = DiagnosticOrchestrator::new(
                Arc::new(registry),
                Arc::new(InMemorySpecialistRegistry::new(Vec::new())),
                Arc::new(scripted_executor_for(&workflow)),
                Arc::new(ScriptedOracle::new()),
                sink,
                config,
            );

            let (report, summary) = orchestrator.run_workflow(&id, &context).await?;
            output(&super::render::RunOutput::new(&report, &summary), json);
        }
    }

    Ok(())
}

/// Seed a scripted executor with a success response for every capability
/// the workflow declares.
fn scripted_executor_for(workflow: &WorkflowDefinition) -> ScriptedCapabilityExecutor {
    let script = ScriptedCapabilityExecutor::new();
    for task in &workflow.tasks {
        for capability in &task.required_capabilities {
            script.set_response(
                capability,
                ScriptedResponse::success(serde_json::json!({"status": "ok"})),
            );
        }
    }
    script
}

// ── Output structs ──────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize)]
struct ListRow {
    workflow_id: String,
    name: String,
    description: String,
    task_count: usize,
}

#[derive(Debug, serde::Serialize)]
struct ListOutput {
    workflows: Vec<ListRow>,
}

impl CommandOutput for ListOutput {
    fn to_human(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["ID", "Name", "Description", "Tasks"]);
        for wf in &self.workflows {
            table.add_row(vec![
                wf.workflow_id.clone(),
                wf.name.clone(),
                wf.description.clone(),
                wf.task_count.to_string(),
            ]);
        }
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct DetailOutput {
    workflow_id: String,
    name: String,
    description: String,
    tasks: Vec<TaskRow>,
}

#[derive(Debug, serde::Serialize)]
struct TaskRow {
    id: String,
    name: String,
    capabilities: Vec<String>,
    dependencies: Vec<String>,
}

impl From<&WorkflowDefinition> for DetailOutput {
    fn from(workflow: &WorkflowDefinition) -> Self {
        Self {
            workflow_id: workflow.workflow_id.clone(),
            name: workflow.name.clone(),
            description: workflow.description.clone(),
            tasks: workflow
                .tasks
                .iter()
                .map(|t| TaskRow {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    capabilities: t.required_capabilities.clone(),
                    dependencies: t.dependencies.clone(),
                })
                .collect(),
        }
    }
}

impl CommandOutput for DetailOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{} - {}", style(&self.workflow_id).bold(), self.name),
            self.description.clone(),
            String::new(),
        ];
        for task in &self.tasks {
            let deps = if task.dependencies.is_empty() {
                "(none)".to_string()
            } else {
                task.dependencies.join(", ")
            };
            lines.push(format!(
                "  {} - {} [caps: {}] [deps: {}]",
                task.id,
                task.name,
                task.capabilities.join(", "),
                deps
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct ValidateOutput {
    results: Vec<(String, String)>,
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        self.results
            .iter()
            .map(|(id, verdict)| {
                if verdict == "ok" {
                    format!("{} {}", style("✓").green(), id)
                } else {
                    format!("{} {} - {}", style("✗").red(), id, verdict)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
