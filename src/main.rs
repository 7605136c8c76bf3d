//! Weft CLI - workflow YAML to Oozie XML

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use weft::config::{load_configs, workflow_files};
use weft::{BatchReport, CompileOptions, Compiler, FixSuggestion, WeftError};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Compile dependency-based workflow YAML into Oozie workflow XML")]
#[command(version)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Workflow file or directory (repeatable)
    #[arg(short, long = "input", required = true)]
    input: Vec<PathBuf>,

    /// Config file or directory (repeatable)
    #[arg(short, long = "config")]
    config: Vec<PathBuf>,

    /// Low-precedence config file or directory (repeatable)
    #[arg(short = 'l', long = "low-priority-config")]
    low_priority_config: Vec<PathBuf>,

    /// Stop at the first failing workflow
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile workflows and write <name>.xml for each
    Compile {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write Graphviz files under dot/
        #[arg(short = 'g', long)]
        graphviz: bool,
    },

    /// Compile workflows without writing output
    Validate {
        #[command(flatten)]
        inputs: InputArgs,

        /// Summary format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.downcast_ref::<WeftError>().and_then(|w| w.fix_suggestion()) {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `Ok(false)` when any workflow failed
fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Compile {
            inputs,
            output,
            graphviz,
        } => {
            let options = CompileOptions {
                output_dir: output,
                graphviz,
                strict: inputs.strict,
                write: true,
            };
            let report = compile(&inputs, options)?;
            print_text(&report, "compiled");
            Ok(report.is_success())
        }
        Commands::Validate { inputs, format } => {
            let options = CompileOptions {
                strict: inputs.strict,
                ..Default::default()
            };
            let report = compile(&inputs, options)?;
            match format {
                Format::Text => print_text(&report, "valid"),
                Format::Json => print_json(&report)?,
            }
            Ok(report.is_success())
        }
    }
}

fn compile(inputs: &InputArgs, options: CompileOptions) -> anyhow::Result<BatchReport> {
    let config = load_configs(&inputs.config, &inputs.low_priority_config)
        .context("loading configuration")?;
    let files = workflow_files(&inputs.input).context("collecting workflow files")?;
    if files.is_empty() {
        anyhow::bail!("no workflow files found under the given inputs");
    }

    Ok(Compiler::new(config, options).compile_all(&files))
}

fn print_text(report: &BatchReport, verb: &str) {
    for file in &report.compiled {
        let target = file
            .output
            .as_ref()
            .map(|p| format!(" → {}", p.display()))
            .unwrap_or_default();
        println!(
            "{} {} {} ({} nodes, {} fork/join pairs){}",
            "✓".green(),
            file.workflow.bold(),
            verb,
            file.nodes,
            file.forks,
            target
        );
    }

    for failure in &report.failed {
        eprintln!("{} {}: {}", "✗".red(), failure.path.display(), failure.error);
        if let Some(suggestion) = failure.error.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
    }

    if report.skipped > 0 {
        eprintln!("{} {} file(s) skipped", "→".cyan(), report.skipped);
    }
}

fn print_json(report: &BatchReport) -> anyhow::Result<()> {
    let mut entries: Vec<serde_json::Value> = Vec::new();
    for file in &report.compiled {
        let mut value = serde_json::to_value(file)?;
        value["ok"] = serde_json::Value::Bool(true);
        entries.push(value);
    }
    for failure in &report.failed {
        entries.push(serde_json::json!({
            "path": failure.path,
            "ok": false,
            "error": failure.error.to_string(),
            "fix": failure.error.fix_suggestion(),
        }));
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "success": report.is_success(),
            "skipped": report.skipped,
            "workflows": entries,
        }))?
    );
    Ok(())
}
