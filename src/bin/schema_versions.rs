//! Schema Versions CLI
//!
//! Exports wire schemas, validates records and inspects field access for a
//! schema declaration file (JSON or TOML).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_versions::{
    EngineConfig, FieldValidator, Record, SchemaDeclaration, SchemaModel, SchemaSerializer,
    VersionDiff, VersionedRecord,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-versions")]
#[command(about = "Export, validate and inspect versioned field schemas")]
struct Cli {
    /// Configuration file (defaults to schema-versions.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the wire schema for a version
    Export {
        /// Schema declaration file
        #[arg(short, long)]
        schema: PathBuf,
        /// Version to export (defaults to the current version)
        #[arg(short = 'V', long)]
        version: Option<u32>,
        /// Compact output
        #[arg(long)]
        compact: bool,
        /// Compile the result as JSON Schema and print its fingerprint
        #[arg(long)]
        check: bool,
    },

    /// Validate a record file against its stored version
    Validate {
        #[arg(short, long)]
        schema: PathBuf,
        /// Record file (a record mapping, or a row holding one)
        #[arg(short, long)]
        record: PathBuf,
        /// Report the first problem of every field instead of stopping early
        #[arg(long)]
        all: bool,
    },

    /// Read one field from a stored record through the version gate
    Read {
        #[arg(short, long)]
        schema: PathBuf,
        #[arg(short, long)]
        record: PathBuf,
        #[arg(short, long)]
        field: String,
    },

    /// Show fields added and removed between two versions
    Diff {
        #[arg(short, long)]
        schema: PathBuf,
        #[arg(long)]
        from: u32,
        #[arg(long)]
        to: u32,
        /// Print the diff as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to this file
        #[arg(long)]
        init: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref().map(path_str).transpose()?;
    let config = EngineConfig::load_from(config_path).context("loading configuration")?;

    match cli.command {
        Commands::Export { schema, version, compact, check } => {
            let model = load_schema(&schema)?;
            let serializer = SchemaSerializer::new(config);
            let wire = match version {
                Some(v) => serializer.serialize_version(&model, v),
                None => serializer.serialize(&model),
            };

            let value = wire.to_value();
            let output = if compact {
                serde_json::to_string(&value)?
            } else {
                serde_json::to_string_pretty(&value)?
            };
            println!("{}", output);

            if check {
                wire.check_well_formed()?;
                eprintln!("✅ well-formed, fingerprint {}", wire.fingerprint().short());
            }
            Ok(())
        }

        Commands::Validate { schema, record, all } => {
            let model = load_schema(&schema)?;
            let record = load_record(&record, &config)?;
            let validator = FieldValidator::new(&model, &config);

            let errors = if all {
                validator.collect(&record)
            } else {
                validator.validate(&record).err().into_iter().collect()
            };

            if errors.is_empty() {
                println!("✅ record is valid for version {}", record.version());
                return Ok(());
            }
            for error in &errors {
                println!("❌ {}", error);
            }
            bail!("{} validation error(s)", errors.len())
        }

        Commands::Read { schema, record, field } => {
            let model = Arc::new(load_schema(&schema)?);
            let record = load_record(&record, &config)?;
            let record = VersionedRecord::load(model, config, record);

            match record.get(&field)? {
                Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
                None => println!("null"),
            }
            Ok(())
        }

        Commands::Diff { schema, from, to, json } => {
            let model = load_schema(&schema)?;
            let diff = VersionDiff::between(&model, from, to);

            if json {
                println!("{}", serde_json::to_string_pretty(&diff)?);
                return Ok(());
            }
            println!("🔍 {}", diff.summary());
            for change in &diff.changes {
                let marker = if change.is_breaking { "❌" } else { "✅" };
                println!("  {} {}", marker, change.description);
            }
            Ok(())
        }

        Commands::Config { init } => {
            match init {
                Some(path) => {
                    config.save(path_str(&path)?)?;
                    println!("✅ wrote {}", path.display());
                }
                None => print!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(())
        }
    }
}

fn path_str(path: &Path) -> anyhow::Result<&str> {
    path.to_str()
        .with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}

fn load_schema(path: &Path) -> anyhow::Result<SchemaModel> {
    let declaration = SchemaDeclaration::load(path)
        .with_context(|| format!("reading schema declaration {}", path.display()))?;
    Ok(declaration.build()?)
}

fn load_record(path: &Path, config: &EngineConfig) -> anyhow::Result<Record> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading record {}", path.display()))?;
    let row: serde_json::Value = serde_json::from_str(&content)?;
    Record::from_row(&row, config)
        .with_context(|| format!("{} does not hold a record object", path.display()))
}
