//! # fieldmap-cli
//!
//! Command-line interface for mapping records with a fieldmap declaration.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use fieldmap_mapping::{
    MappingDeclaration, MappingDsl, MappingEngine, Record, Side, TransformRegistry,
};
use serde_json::Value;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fieldmap")]
#[command(about = "Map records between the two sides of a field mapping declaration")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map one JSON record from one side to the other
    Map {
        /// Input JSON file, or - for stdin
        input: String,

        /// Mapping declaration file path
        #[arg(short, long)]
        mapping: PathBuf,

        /// Side the input record is expressed in (a or b)
        #[arg(long, value_parser = parse_side)]
        from: Side,

        /// Side to map to (a or b); the other side when omitted
        #[arg(long, value_parser = parse_side)]
        to: Option<Side>,

        /// Output file path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the identifier key for a side
    IdKey {
        /// Mapping declaration file path
        #[arg(short, long)]
        mapping: PathBuf,

        /// Side to look up (a or b)
        #[arg(short, long, value_parser = parse_side)]
        side: Side,
    },

    /// Check a mapping declaration against the built-in transforms
    Check {
        /// Mapping declaration file path
        #[arg(short, long)]
        mapping: PathBuf,
    },
}

fn parse_side(label: &str) -> Result<Side, String> {
    label.parse::<Side>().map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Map {
            input,
            mapping,
            from,
            to,
            output,
            pretty,
        } => {
            let to = to.unwrap_or_else(|| from.other());
            tracing::info!("Mapping {} from side {} to side {}", input, from, to);
            let registry = TransformRegistry::with_builtins();
            let declaration = load_declaration(&mapping)?;
            declaration
                .validate(&registry)
                .with_context(|| format!("Invalid mapping declaration {}", mapping.display()))?;

            let record = read_record(&input)?;
            let engine = MappingEngine::with_transforms(declaration, registry);
            let mapped = engine
                .map_to(&record, from, to)
                .with_context(|| format!("Failed to map {input}"))?;

            write_record(&mapped, output.as_deref(), pretty)?;
        }
        Commands::IdKey { mapping, side } => {
            let engine = MappingEngine::new(load_declaration(&mapping)?);
            match engine.id_key_for(side) {
                Some(key) => println!("{key}"),
                None => bail!("No identifier field configured in {}", mapping.display()),
            }
        }
        Commands::Check { mapping } => {
            let declaration = load_declaration(&mapping)?;
            declaration
                .validate(&TransformRegistry::with_builtins())
                .with_context(|| format!("Invalid mapping declaration {}", mapping.display()))?;
            println!("{}", summary(&declaration));
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    // -v raises the global level; target directives from RUST_LOG still apply
    let raised = match verbose {
        0 => None,
        1 => Some(LevelFilter::INFO),
        2 => Some(LevelFilter::DEBUG),
        _ => Some(LevelFilter::TRACE),
    };
    if let Some(level) = raised {
        filter = filter.add_directive(level.into());
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_declaration(path: &Path) -> anyhow::Result<MappingDeclaration> {
    tracing::debug!("Loading mapping declaration {}", path.display());
    MappingDsl::parse_file(path)
        .with_context(|| format!("Failed to load mapping declaration {}", path.display()))
}

fn read_record(input: &str) -> anyhow::Result<Record> {
    let content = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read record from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))?
    };

    let value: Value =
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {input}"))?;
    match value {
        Value::Object(record) => Ok(record),
        other => bail!("Expected a JSON object in {input}, found {}", json_kind(&other)),
    }
}

fn write_record(record: &Record, output: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
    let mut rendered = if pretty {
        serde_json::to_string_pretty(record)?
    } else {
        serde_json::to_string(record)?
    };
    rendered.push('\n');

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => std::io::stdout()
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?,
    }

    Ok(())
}

fn summary(declaration: &MappingDeclaration) -> String {
    let identifier = declaration
        .identifier_field()
        .map_or_else(
            || "none".to_string(),
            |field| format!("{} <-> {}", field.a.name, field.b.name),
        );
    format!(
        "{}: {} fields, identifier {}",
        declaration.name,
        declaration.fields.len(),
        identifier
    )
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
