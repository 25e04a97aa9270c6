use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use nodeflow::document::{DocumentError, DocumentSummary, WorkflowDocument};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid workflow document {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

#[derive(Parser, Debug)]
#[command(name = "nodeflow", about = "Inspect and validate nodeflow workflow documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a workflow document and report whether it is valid.
    Validate { file: PathBuf },
    /// Print node counts per kind, connection count and world bounds.
    Summary {
        file: PathBuf,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Validate { file } => run_validate(&file),
        Command::Summary { file, json } => run_summary(&file, json),
    }
}

fn load(path: &Path) -> Result<WorkflowDocument, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_owned(), source })?;
    WorkflowDocument::parse(&text).map_err(|source| CliError::Document { path: path.to_owned(), source })
}

fn run_validate(path: &Path) -> Result<(), CliError> {
    let doc = load(path)?;
    println!("ok: {} nodes, {} connections", doc.nodes.len(), doc.connections.len());
    Ok(())
}

fn run_summary(path: &Path, json: bool) -> Result<(), CliError> {
    let doc = load(path)?;
    let summary = doc.summary();
    if json {
        println!("{}", summary_json(&summary));
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &DocumentSummary) {
    for (kind, count) in &summary.kinds {
        println!("{kind:?}: {count}");
    }
    println!("connections: {}", summary.connections);
    match summary.bounds {
        Some(b) => println!("bounds: x={} y={} width={} height={}", b.x, b.y, b.width, b.height),
        None => println!("bounds: empty"),
    }
}

fn summary_json(summary: &DocumentSummary) -> serde_json::Value {
    let kinds: serde_json::Map<String, serde_json::Value> =
        summary.kinds.iter().map(|(kind, count)| (format!("{kind:?}"), (*count).into())).collect();
    let bounds = summary.bounds.map_or(serde_json::Value::Null, |b| {
        serde_json::json!({ "x": b.x, "y": b.y, "width": b.width, "height": b.height })
    });
    serde_json::json!({
        "kinds": kinds,
        "connections": summary.connections,
        "bounds": bounds,
    })
}
