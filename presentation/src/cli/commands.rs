//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Strategy, plan status and the run note
    Summary,
    /// Summary plus step outputs and the memory ledger
    Full,
    /// JSON output
    Json,
}

/// CLI arguments for agent-crew
#[derive(Parser, Debug)]
#[command(name = "agent-crew")]
#[command(author, version, about = "Run a crew of LLM agents against a goal")]
#[command(long_about = r#"
agent-crew runs a configured crew of agents against a goal.

Each run first asks the model how to proceed:
1. plan_then_parallel: a planner writes a dependency-ordered plan, and
   independent steps run in parallel waves
2. direct_execution: every worker agent runs at once

Configuration files are loaded from (in priority order):
1. AGENT_CREW_* environment variables
2. --config <path>     Explicit config file
3. ./crew.toml         Project-level config
4. ~/.config/agent-crew/config.toml   Global config

Example:
  agent-crew run "Add a --json flag to the export command"
  agent-crew run --crew docs --output full "Document the public API"
  agent-crew crews
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the active crew against a goal
    Run(RunArgs),
    /// List configured crews and their agents
    Crews,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// What the crew should accomplish
    pub goal: String,

    /// Recent notes handed to the route and planning prompts
    #[arg(long, value_name = "TEXT")]
    pub notes: Option<String>,

    /// Crew to run instead of the configured selection
    #[arg(long, value_name = "CREW_ID")]
    pub crew: Option<String>,

    /// Output format (defaults to the config file, then summary)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Run reflection-role agents after execution
    #[arg(long)]
    pub reflect: bool,

    /// Write run events as JSONL to this file
    #[arg(long, value_name = "PATH")]
    pub telemetry: Option<PathBuf>,
}
