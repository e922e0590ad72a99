//! CLI entrypoint for agent-crew
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use crew_application::{
    CompositeTelemetry, LlmAgentWorker, Orchestrator, RunInput, RunOutput, RunTelemetry,
};
use crew_domain::Crew;
use crew_infrastructure::{
    ConfigLoader, FileConfig, FileConfigStore, FileOutputFormat, JsonlTelemetry, build_gateway,
};
use crew_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, RunArgs, SimpleProgress,
};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, config.logging.log_dir.as_deref());
    info!("Starting agent-crew");

    if !config.output.color {
        colored::control::set_override(false);
    }

    check_config(&config)?;

    match cli.command {
        Some(Command::Run(args)) => run(args, &config, cli.quiet).await,
        Some(Command::Crews) => {
            let active = Crew::resolve_active(&config.crews, config.selected_crew.as_deref());
            print!(
                "{}",
                ConsoleFormatter::format_crews(&config.crews, active.map(|c| c.id.as_str()))
            );
            Ok(())
        }
        None => bail!("A subcommand is required. Try `agent-crew run \"<goal>\"`."),
    }
}

fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "agent-crew.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

/// Warn about recoverable config issues, refuse to run on fatal ones.
fn check_config(config: &FileConfig) -> Result<()> {
    let mut fatal = Vec::new();
    for issue in config.validate() {
        if issue.is_fatal() {
            fatal.push(issue.to_string());
        } else {
            warn!("Config: {}", issue);
        }
    }
    if !fatal.is_empty() {
        bail!("Invalid configuration:\n  {}", fatal.join("\n  "));
    }
    Ok(())
}

async fn run(args: RunArgs, config: &FileConfig, quiet: bool) -> Result<()> {
    let mut store = FileConfigStore::new(config);
    if let Some(crew) = &args.crew {
        store = store.with_selected_crew(crew.clone());
    }

    let completion = config.llm.completion_options();
    let params = config
        .execution
        .params(completion.clone())
        .with_reflection(config.execution.enable_reflection || args.reflect);

    // === Dependency Injection ===
    let gateway = build_gateway(&config.llm).context("Failed to build LLM gateway")?;
    let worker = Arc::new(LlmAgentWorker::new(gateway.clone(), completion));

    let mut telemetry = CompositeTelemetry::default();
    if !quiet && config.output.show_progress {
        let progress: Arc<dyn RunTelemetry> = if std::io::stdout().is_terminal() {
            Arc::new(ProgressReporter::new())
        } else {
            Arc::new(SimpleProgress::new())
        };
        telemetry.push(progress);
    }
    let telemetry_path = args
        .telemetry
        .as_deref()
        .or(config.logging.telemetry_path.as_deref());
    if let Some(path) = telemetry_path {
        match JsonlTelemetry::new(path) {
            Some(sink) => {
                info!("Recording run telemetry to {}", sink.path().display());
                telemetry.push(Arc::new(sink));
            }
            None => warn!("Telemetry disabled: could not open {}", path.display()),
        }
    }

    let mut orchestrator = Orchestrator::from_store(&store, gateway, params)?.with_worker(worker);
    if !telemetry.is_empty() {
        orchestrator = orchestrator.with_telemetry(Arc::new(telemetry));
    }
    let orchestrator = Arc::new(orchestrator);

    let interrupt = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                orchestrator.abort("interrupted by user");
            }
        })
    };

    let mut input = RunInput::new(args.goal);
    if let Some(notes) = args.notes {
        input = input.with_notes(notes);
    }
    let result = orchestrator.run(input).await;
    interrupt.abort();
    let output = result?;

    let format = args
        .output
        .unwrap_or_else(|| from_config_format(config.output.format));
    println!("{}", render(&output, format));

    Ok(())
}

fn from_config_format(format: Option<FileOutputFormat>) -> OutputFormat {
    match format.unwrap_or_default() {
        FileOutputFormat::Summary => OutputFormat::Summary,
        FileOutputFormat::Full => OutputFormat::Full,
        FileOutputFormat::Json => OutputFormat::Json,
    }
}

fn render(output: &RunOutput, format: OutputFormat) -> String {
    match format {
        OutputFormat::Summary => ConsoleFormatter::format_summary(output),
        OutputFormat::Full => ConsoleFormatter::format_full(output),
        OutputFormat::Json => ConsoleFormatter::format_json(output),
    }
}
