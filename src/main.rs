use std::{fs, path::Path, path::PathBuf, process::ExitCode, time::Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use hilo::{parse_module, render_diagnostic, serializer::json::to_json, ParseOutcome};

#[derive(Parser)]
#[command(name = "hilo")]
#[command(about = "HILO front-end: parse modules into canonical JSON ASTs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one module and write its canonical JSON AST
    Parse {
        /// Path to the HILO source file
        input: PathBuf,

        /// Path the canonical JSON AST is written to
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Parse { input, output } => run_parse(&input, &output),
    }
}

/// Exit codes per the front-end contract: 0 with zero errors (warnings
/// permitted on stderr), 1 when any error diagnostic was produced, 2 on
/// the unrecoverable abort conditions (unreadable input, resource limit).
fn run_parse(input: &Path, output: &Path) -> ExitCode {
    let bytes = match fs::read(input) {
        Ok(bytes) => bytes,
        Err(error) => {
            eprintln!("error: failed to read {}: {}", input.display(), error);
            return ExitCode::from(2);
        }
    };

    let source = match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: {} is not valid UTF-8: {}", input.display(), error);
            return ExitCode::from(2);
        }
    };

    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    let start = Instant::now();
    let outcome = parse_module(&source, &file_name);
    debug!(
        elapsed = ?start.elapsed(),
        decls = outcome.module.decls.len(),
        diagnostics = outcome.diagnostics.len(),
        "parse finished"
    );

    for diagnostic in &outcome.diagnostics {
        eprintln!("{}\n", render_diagnostic(&source, &outcome.file, diagnostic));
    }

    if outcome.was_aborted() {
        return ExitCode::from(2);
    }
    if outcome.has_errors() {
        return ExitCode::from(1);
    }

    match write_ast(output, &outcome) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::from(2)
        }
    }
}

fn write_ast(output: &Path, outcome: &ParseOutcome) -> anyhow::Result<()> {
    let json = to_json(&outcome.module);
    let rendered = serde_json::to_string_pretty(&json).context("failed to render AST as JSON")?;
    fs::write(output, format!("{}\n", rendered))
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}
