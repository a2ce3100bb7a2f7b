// ABOUTME: CLI entry point for pg-dump-splitter
// ABOUTME: Parses commands, merges config file and flags, and routes to handlers

use clap::{Args, Parser, Subcommand};
use pg_dump_splitter::commands;
use pg_dump_splitter::config::SplitConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pg-dump-splitter")]
#[command(about = "Split a plain-text pg_dump into ordered up/down migrations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct ConfigArgs {
    /// Path to a TOML file with split settings
    #[arg(long = "config")]
    config_path: Option<PathBuf>,
    /// Schema that owns the dumped tables (default: public)
    #[arg(long)]
    schema: Option<String>,
    /// Maximum rows per generated INSERT statement (default: 1000)
    #[arg(long)]
    batch_size: Option<usize>,
    /// Digits in the zero-padded migration sequence prefix (default: 6)
    #[arg(long)]
    sequence_width: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a dump into numbered .up.sql/.down.sql migration files
    Split {
        /// Plain-text dump produced by pg_dump
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Directory to write migrations into (created if missing)
        #[arg(long, short = 'o', default_value = "migrations")]
        output: PathBuf,
        /// Overwrite existing migration files without asking
        #[arg(short = 'y', long)]
        yes: bool,
        /// Write manifest.json with SHA-256 checksums of every file
        #[arg(long)]
        manifest: bool,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Show how a dump would be split without writing anything
    Inspect {
        /// Plain-text dump produced by pg_dump
        #[arg(long, short = 'i')]
        input: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            input,
            output,
            yes,
            manifest,
            config,
        } => {
            let options = commands::SplitOptions {
                input,
                output,
                config: build_config(&config)?,
                skip_confirmation: yes,
                write_manifest: manifest,
            };
            commands::split(&options).map(|_| ())
        }
        Commands::Inspect { input, config } => {
            commands::inspect(&input, &build_config(&config)?).map(|_| ())
        }
    }
}

/// Load the config file (if any) and apply command-line overrides on top
fn build_config(args: &ConfigArgs) -> anyhow::Result<SplitConfig> {
    let mut config = match &args.config_path {
        Some(path) => SplitConfig::load(path)?,
        None => SplitConfig::default(),
    };

    if let Some(schema) = &args.schema {
        config.schema = schema.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(width) = args.sequence_width {
        config.sequence_width = width;
    }

    config.validate()?;
    Ok(config)
}
