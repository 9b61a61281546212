//! Dispatch Resolver Binary
//!
//! Run with: `dispatchc check [OPTIONS] <FILE>`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use dispatchc::emit::{group_by_module, render_module};
use dispatchc::report::Renderer;
use dispatchc::{check_source, CheckOutcome, Config, Heuristic};

#[derive(Parser)]
#[command(name = "dispatchc")]
#[command(about = "Validate overload sets and compile them into dispatch decision trees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short = 'c', long, global = true, env = "DISPATCHC_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a program file and build its decision trees
    Check {
        /// Program file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print the generated dispatcher source
        #[arg(long)]
        emit: bool,

        /// Test selection heuristic
        #[arg(long, value_enum)]
        heuristic: Option<Heuristic>,

        /// Worker threads (0 = available parallelism)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Disable colored diagnostics
        #[arg(long)]
        no_color: bool,
    },
    /// Print the default configuration
    Config,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Commands::Config => {
            print!("{}", Config::default().to_toml_string()?);
            Ok(())
        }
        Commands::Check {
            file,
            format,
            emit,
            heuristic,
            jobs,
            no_color,
        } => {
            let mut config = load_config(cli.config.as_deref())?;

            // Override with CLI options
            if let Some(heuristic) = heuristic {
                config.resolve.heuristic = *heuristic;
            }
            if let Some(jobs) = jobs {
                config.resolve.jobs = *jobs;
            }

            let failed = check_file(file, &config, *format, *emit, !*no_color)?;
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            debug!("Loading config: {}", path.display());
            Config::load(path).with_context(|| format!("Failed to load config file: {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Check one program file; returns whether validation failed.
fn check_file(path: &Path, config: &Config, format: OutputFormat, emit: bool, color: bool) -> Result<bool> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let filename = path.display().to_string();

    let outcome = match check_source(&source, config) {
        Ok(outcome) => outcome,
        Err(err) => {
            let renderer = Renderer::new(filename, &source).with_color(color);
            eprint!("{}", renderer.load_error(&err));
            return Ok(true);
        }
    };

    match format {
        OutputFormat::Text => print_text(&outcome, &filename, &source, config, emit, color),
        OutputFormat::Json => print_json(&outcome, config, emit)?,
    }

    info!(
        points = outcome.results.len(),
        errors = outcome.diagnostics.iter().filter(|d| d.is_error()).count(),
        "check finished"
    );
    Ok(outcome.has_errors())
}

fn render_modules(outcome: &CheckOutcome, config: &Config) -> Vec<String> {
    group_by_module(&outcome.program.points, &outcome.results)
        .iter()
        .map(|(module, points)| render_module(&outcome.program.env, module, points, &config.emit))
        .collect()
}

fn print_text(outcome: &CheckOutcome, filename: &str, source: &str, config: &Config, emit: bool, color: bool) {
    let renderer = Renderer::new(filename, source)
        .with_source_map(&outcome.program.source_map)
        .with_color(color);
    for diagnostic in &outcome.diagnostics {
        eprint!("{}", renderer.diagnostic(diagnostic));
    }

    let env = &outcome.program.env;
    for resolved in outcome.resolved() {
        for entry in &resolved.entries {
            println!("{}: {}", resolved.name, entry.tree.display(env));
        }
    }

    if emit {
        for module in render_modules(outcome, config) {
            println!();
            print!("{}", module);
        }
    }
}

fn print_json(outcome: &CheckOutcome, config: &Config, emit: bool) -> Result<()> {
    let env = &outcome.program.env;
    let points: Vec<_> = outcome
        .program
        .points
        .iter()
        .zip(&outcome.results)
        .map(|(point, result)| match result {
            Ok(resolved) => json!({
                "name": point.name,
                "module": point.module,
                "entries": resolved
                    .entries
                    .iter()
                    .map(|entry| json!({
                        "entry": entry.entry.def_id,
                        "tree": entry.tree.to_json(env),
                    }))
                    .collect::<Vec<_>>(),
            }),
            Err(err) => json!({
                "name": point.name,
                "module": point.module,
                "error": err.to_string(),
            }),
        })
        .collect();

    let mut report = json!({
        "points": points,
        "diagnostics": outcome.diagnostics,
    });
    if emit {
        report["source"] = json!(render_modules(outcome, config));
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
