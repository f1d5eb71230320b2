//! Command line tool for filebind.
//!
//! Usage:
//!   filebind [--config FILE] check                 - Validate backends, mappings and adapter wiring
//!   filebind [--config FILE] url <backend> <path>  - Print the public URL of a stored file
//!
//! Without `--config`, configuration comes from `config/default`,
//! `config/{RUN_MODE}` and `FILEBIND__*` environment variables.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filebind_core::{FileReference, FileSystem, WebFile};
use filebind_shared::FilesConfig;

#[derive(Debug, Parser)]
#[command(name = "filebind")]
#[command(about = "Check file attachment configuration and resolve file URLs")]
struct Cli {
    /// Configuration file replacing the layered defaults
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Validate backends, mappings and adapter wiring
    Check,
    /// Print the public URL of a stored file
    Url {
        /// Backend name
        backend: String,
        /// Path inside the backend
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filebind=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FilesConfig::from_file(path),
        None => FilesConfig::load(),
    }
    .context("Failed to load configuration")?;

    let files = FileSystem::from_config(&config).context("Invalid file configuration")?;

    match cli.command {
        Command::Check => {
            info!("Configuration is valid");
            println!(
                "ok: {} backend(s), {} mapped entity type(s), {} URL adapter(s)",
                files.backends().names().count(),
                files.mapping().entity_types().count(),
                files.resolver().len()
            );
        }
        Command::Url { backend, path } => {
            let file = WebFile::from(FileReference::new(backend, path));
            let url = files.resolver().resolve(&file).await?;
            println!("{url}");
        }
    }

    Ok(())
}
