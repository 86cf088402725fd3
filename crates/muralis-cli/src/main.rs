//! Muralis CLI: validate and ingest wallpaper uploads from the command line.
//!
//! Storage and pipeline settings come from the environment (or `.env`); see
//! `muralis_core::Config`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use muralis_cli::{check_config, init_tracing, parse_terminal, print_json};
use muralis_core::models::{TerminalRange, UploadFile, UploadRequest};
use muralis_core::Config;
use muralis_processing::{AssetPipeline, BatchOutcome, IngestOutcome, Validator};
use muralis_storage::create_storage;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "muralis", about = "Wallpaper ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a single upload without storing anything
    Validate {
        /// Path to the image
        file: PathBuf,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        author: String,
        /// Compatible terminal sizes as minW,maxW,minH,maxH
        #[arg(long, value_parser = parse_terminal)]
        terminal: Option<TerminalRange>,
    },
    /// Validate and ingest a single wallpaper
    Ingest {
        /// Path to the image
        file: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        author: String,
        /// Category code (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Compatible terminal sizes as minW,maxW,minH,maxH
        #[arg(long, value_parser = parse_terminal)]
        terminal: Option<TerminalRange>,
        /// Target launcher package (repeatable); defaults to TARGET_PACKAGES
        #[arg(long = "package")]
        packages: Vec<String>,
    },
    /// Ingest every image of a zip archive with the default name and author
    IngestBatch {
        /// Path to the zip archive
        archive: PathBuf,
        /// Category code (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
    },
}

fn build_request(
    file: PathBuf,
    name: String,
    author: String,
    categories: Vec<String>,
    terminal: Option<TerminalRange>,
) -> UploadRequest {
    UploadRequest {
        file: Some(UploadFile::from_path(file)),
        name,
        author,
        categories: categories.into_iter().collect(),
        terminal,
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    check_config(&config, !matches!(cli.command, Commands::Validate { .. }))?;

    match cli.command {
        Commands::Validate {
            file,
            name,
            author,
            terminal,
        } => {
            let request = build_request(file, name, author, Vec::new(), terminal);
            let result = Validator::from_config(&config.pipeline)
                .validate_single(&request)
                .context("Failed to read upload")?;
            print_json(&json!({ "valid": result.is_empty(), "errors": result }))?;
        }
        Commands::Ingest {
            file,
            name,
            author,
            categories,
            terminal,
            packages,
        } => {
            let mut request = build_request(file, name, author, categories, terminal);
            request.target_packages = packages.into_iter().collect();

            let store = create_storage(&config.storage)
                .await
                .context("Failed to initialize storage")?;
            let pipeline = AssetPipeline::new(store, config.pipeline);

            match pipeline.ingest(&request).await? {
                IngestOutcome::Completed(descriptor) => print_json(&descriptor)?,
                IngestOutcome::Rejected(result) => {
                    print_json(&json!({ "valid": false, "errors": result }))?;
                    anyhow::bail!("Upload rejected");
                }
            }
        }
        Commands::IngestBatch {
            archive,
            categories,
        } => {
            let store = create_storage(&config.storage)
                .await
                .context("Failed to initialize storage")?;
            let pipeline = AssetPipeline::new(store, config.pipeline);
            let categories: BTreeSet<String> = categories.into_iter().collect();

            match pipeline
                .ingest_batch(Some(&UploadFile::from_path(archive)), categories)
                .await?
            {
                BatchOutcome::Completed(descriptors) => print_json(&descriptors)?,
                BatchOutcome::Rejected(result) => {
                    print_json(&json!({ "valid": false, "errors": result }))?;
                    anyhow::bail!("Batch upload rejected");
                }
            }
        }
    }

    Ok(())
}
