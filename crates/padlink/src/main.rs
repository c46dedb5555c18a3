use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use padlink_config::AdapterConfig;
use padlink_core::{Adapter, AdapterEvent, RangeEdit, RopeEditor};

mod notation;

/// Translate editor edits into OT operations and replay operations into text.
#[derive(Parser, Debug)]
#[command(name = "padlink", version, about)]
struct Cli {
    /// Adapter config file. Defaults to the user config file if it exists.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply edits to a file's text as one batch and print the operation.
    Translate {
        file: PathBuf,

        /// An edit as `L:C-L:C=TEXT` or `L:C=TEXT`. Repeat for a multi-edit batch.
        #[arg(long = "edit", required = true, value_parser = notation::parse_edit)]
        edits: Vec<RangeEdit>,
    },
    /// Replay an operation such as `r5,i"HI",d3` into a file's text.
    Apply {
        file: PathBuf,

        #[arg(long = "op")]
        op: String,
    },
}

/// What a command produced.
#[derive(Debug, PartialEq)]
struct Report {
    operation: String,
    inverse: String,
    text: String,
}

impl Report {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "operation": self.operation,
            "inverse": self.inverse,
            "text": self.text,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref());
    let report = match cli.command {
        Command::Translate { file, edits } => translate(&read(&file)?, edits, &config)?,
        Command::Apply { file, op } => apply(&read(&file)?, &op, &config)?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        println!("operation: {}", report.operation);
        println!("inverse:   {}", report.inverse);
        println!("{}", report.text);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> AdapterConfig {
    match path {
        Some(path) => AdapterConfig::load_or_create(path),
        None => {
            let path = AdapterConfig::config_path();
            if path.exists() {
                AdapterConfig::load_or_create(&path)
            } else {
                AdapterConfig::default()
            }
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Applies `edits` as one native batch and reports the captured change.
fn translate(text: &str, edits: Vec<RangeEdit>, config: &AdapterConfig) -> Result<Report> {
    let mut adapter = Adapter::attach_with_config(RopeEditor::from(text), config);
    adapter
        .editor_mut()
        .edit(edits)
        .context("editor rejected the edits")?;
    let events = adapter.drain_events();
    adapter.flush().context("failed to translate the edit batch")?;

    let (operation, inverse) = events
        .into_iter()
        .find_map(|event| match event {
            AdapterEvent::Change { operation, inverse } => Some((operation, inverse)),
            _ => None,
        })
        .context("edit batch produced no change")?;
    tracing::info!(
        base_len = operation.base_len(),
        target_len = operation.target_len(),
        "translated batch"
    );

    Ok(Report {
        operation: notation::format_operation(&operation),
        inverse: notation::format_operation(&inverse),
        text: adapter.get_value(),
    })
}

/// Replays the operation written as `op` and reports its inverse.
fn apply(text: &str, op: &str, config: &AdapterConfig) -> Result<Report> {
    let operation = notation::parse_operation(op).context("invalid operation")?;
    let mut adapter = Adapter::attach_with_config(RopeEditor::from(text), config);
    let inverse = adapter.invert_operation(&operation)?;
    adapter
        .apply_operation(&operation)
        .context("failed to apply operation")?;
    tracing::info!(echoes = adapter.suppressed_echoes(), "applied operation");

    Ok(Report {
        operation: notation::format_operation(&operation),
        inverse: notation::format_operation(&inverse),
        text: adapter.get_value(),
    })
}
