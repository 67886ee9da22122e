use clap::{Parser, Subcommand};
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dagkey::cli::{
    decode_keys, encode_key, render, resolve_key, unresolve_key, KeyReport, OutputFormat,
};

#[derive(Parser)]
#[command(name = "dagkey")]
#[command(about = "Encode and decode execution plan step keys", long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one or more stored step keys
    Decode {
        /// Step keys (e.g. "etl.load", "etl.load[?]", "etl.load[file_7]")
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Build the step key for a node path
    Encode {
        /// Dotted node path (e.g. "etl.load")
        path: String,

        /// Mapping key of a resolved dynamic step
        #[arg(short, long, conflicts_with = "unresolved")]
        mapping_key: Option<String>,

        /// Encode the unresolved placeholder instead
        #[arg(short, long)]
        unresolved: bool,
    },

    /// Resolve an unresolved step key against mapping keys
    Resolve {
        /// Unresolved step key (e.g. "etl.load[?]")
        key: String,

        /// Mapping keys emitted by the upstream dynamic output
        #[arg(required = true)]
        mapping_keys: Vec<String>,
    },

    /// Print the unresolved key of a dynamic step key
    Unresolve {
        /// Dynamic step key (e.g. "etl.load[file_7]")
        key: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "dagkey=info".into())
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("Output format: {}", cli.format.as_str());

    let reports: Vec<KeyReport> = match cli.command {
        Commands::Decode { keys } => decode_keys(&keys)?,
        Commands::Encode { path, mapping_key, unresolved } => {
            vec![encode_key(&path, mapping_key.as_deref(), unresolved)?]
        }
        Commands::Resolve { key, mapping_keys } => resolve_key(&key, &mapping_keys)?,
        Commands::Unresolve { key } => vec![unresolve_key(&key)?],
    };

    println!("{}", render(&reports, cli.format)?);
    Ok(())
}
