//! Command-line interface.
//!
//! Clap command definitions plus the shared human/JSON output plumbing.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use console::style;

pub use output::{output, CommandOutput};

#[derive(Parser)]
#[command(name = "sleuth")]
#[command(about = "Diagnostic workflow orchestrator", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a config file (overrides the default search chain)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Workflow management commands
    Workflow(commands::workflow::WorkflowArgs),

    /// Route a problem description to a specialist and run its workflow
    Triage(commands::triage::TriageArgs),
}

/// Print an error in the requested format and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        let body = serde_json::json!({
            "error": err.to_string(),
            "chain": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{body}");
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    std::process::exit(1);
}
