//! Upload command implementation
//!
//! Ships a CSV knowledge-base file to the backend for ingestion. Only the
//! file extension is checked locally; parsing and chunking happen server
//! side.

use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::{gateway, require_session};
use crate::core::BackendGateway;

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// CSV file to ingest into the knowledge base
    pub file: PathBuf,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Extract the file name, rejecting anything that is not a `.csv`. Runs
/// before any file read or network call.
fn csv_file_name(path: &Path) -> anyhow::Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file path: {}", path.display()))?;
    if !name.to_lowercase().ends_with(".csv") {
        anyhow::bail!("Only .csv files can be uploaded, got '{}'", name);
    }
    Ok(name.to_string())
}

/// Run the upload command
pub async fn run(args: UploadArgs) -> anyhow::Result<()> {
    let file_name = csv_file_name(&args.file)?;
    let contents = std::fs::read(&args.file)
        .map_err(|e| anyhow::anyhow!("Could not read {}: {}", args.file.display(), e))?;

    let session = require_session()?;
    let receipt = gateway()?
        .upload_knowledge_base(&session, &file_name, contents)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        println!("Upload accepted: {}", receipt.message);
        println!("  File: {}", file_name);
    }

    Ok(())
}
