//! Command-line interface for syncmap
//!
//! # Usage Examples
//!
//! ```bash
//! # Build a typed tree from plain JSON
//! syncmap sync --schema person.yaml --input person.json --output person.typed.json
//!
//! # Refine an existing typed tree, only deleting DPM keys the source names
//! syncmap sync --schema person.yaml --input removals.json \
//!   --existing person.typed.json --delete-matching
//!
//! # Project a typed tree back to plain JSON
//! syncmap project --schema person.yaml --input person.typed.json
//!
//! # Show the named types and DPM groups of a schema
//! syncmap inspect --schema person.yaml
//! ```
//!
//! Set `RUST_LOG=debug` for traversal logging.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use syncmap::{describe_schema, emit_outcome, run_project, run_sync, ReconcileOpts, SyncmapConfig};

#[derive(Parser)]
#[command(name = "syncmap")]
#[command(about = "Schema-driven synchronization between plain JSON and typed object trees")]
#[command(long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "SYNCMAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or refine a typed tree from plain data
    Sync {
        /// Schema file (YAML, or JSON by extension)
        #[arg(long)]
        schema: PathBuf,

        /// Plain data file (JSON, or YAML by extension)
        #[arg(long)]
        input: PathBuf,

        /// Typed snapshot to refine in place
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Write the typed snapshot here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Reconciliation overrides
        #[command(flatten)]
        reconcile: ReconcileOpts,

        /// Exit with an error when any field was skipped
        #[arg(long)]
        fail_on_mismatch: bool,
    },

    /// Project a typed snapshot back to plain JSON
    Project {
        /// Schema file (YAML, or JSON by extension)
        #[arg(long)]
        schema: PathBuf,

        /// Typed snapshot written by `sync`
        #[arg(long)]
        input: PathBuf,

        /// Write the plain JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit with an error when any field was skipped
        #[arg(long)]
        fail_on_mismatch: bool,
    },

    /// List the named types and DPM groups of a schema
    Inspect {
        /// Schema file (YAML, or JSON by extension)
        #[arg(long)]
        schema: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SyncmapConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync {
            schema,
            input,
            existing,
            output,
            reconcile,
            fail_on_mismatch,
        } => {
            let policy = reconcile.apply(config.reconcile);
            let outcome = run_sync(&schema, &input, existing.as_deref(), policy)?;
            emit_outcome(
                &outcome,
                output.as_deref(),
                config.output.pretty,
                fail_on_mismatch,
            )?;
        }
        Commands::Project {
            schema,
            input,
            output,
            fail_on_mismatch,
        } => {
            let outcome = run_project(&schema, &input)?;
            emit_outcome(
                &outcome,
                output.as_deref(),
                config.output.pretty,
                fail_on_mismatch,
            )?;
        }
        Commands::Inspect { schema } => {
            let summary = describe_schema(&schema)?;
            println!("Schema version: {}", summary.version);
            println!("Named types:");
            for name in &summary.named_types {
                let declared = if summary.declared_types.contains(name) {
                    " (declared defaults)"
                } else {
                    ""
                };
                println!("  {name}{declared}");
            }
            println!("DPM groups:");
            for (path, pattern) in &summary.dpm_groups {
                println!("  {path}: /{pattern}/");
            }
        }
    }

    Ok(())
}
