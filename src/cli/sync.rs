//! Sync command implementation
//!
//! Drives the workflow end to end: submit the connection string, list the
//! catalog, toggle the requested collections, confirm. Without
//! `--collections` it stops after listing so the caller can pick.

use clap::Args;

use crate::cli::{gateway, require_session};
use crate::core::{QuotaMonitor, SyncWorkflow, WorkflowPhase};

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Connection string of the source document store
    #[arg(short, long)]
    pub connection: String,

    /// Comma-separated collection names to sync; omit to just list them
    #[arg(short = 'C', long)]
    pub collections: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Split a `--collections` value into trimmed, non-empty names.
fn parse_collection_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run the sync command
pub async fn run(args: SyncArgs) -> anyhow::Result<()> {
    let session = require_session()?;
    let gateway = gateway()?;

    let mut workflow = SyncWorkflow::new(gateway.clone(), session.clone());
    workflow.set_connection_string(&args.connection);
    workflow.submit_connection().await?;
    debug_assert_eq!(workflow.phase(), WorkflowPhase::Selecting);

    let Some(requested) = args.collections.as_deref() else {
        // Discovery only: show the catalog and stop.
        if args.json {
            println!("{}", serde_json::to_string_pretty(workflow.catalog())?);
        } else {
            println!("Collections found:");
            for name in workflow.catalog() {
                println!("  {}", name);
            }
            println!();
            println!("Re-run with --collections <name,name,...> to sync.");
        }
        return Ok(());
    };

    let names = parse_collection_list(requested);
    if names.is_empty() {
        anyhow::bail!("--collections was given but contained no names");
    }
    for name in &names {
        workflow.toggle_collection(name)?;
    }

    let report = workflow.confirm_sync().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Sync completed: {}", report.message);
        println!("  Chunks processed: {}", report.chunks);
    }

    // Post-action quota refresh; a failure here must not fail the sync.
    let mut monitor = QuotaMonitor::new(gateway);
    match monitor.refresh(&session).await {
        Ok(quota) => {
            if !args.json {
                println!(
                    "  Tokens remaining: {} / {}",
                    quota.available, quota.max
                );
            }
            if monitor.needs_upsell() {
                println!();
                println!("Your assistant is paused. Upgrade to reactivate:");
                crate::cli::plans::print_catalog();
            }
        }
        Err(e) => tracing::warn!(error = %e, "Quota refresh after sync failed"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_list() {
        assert_eq!(
            parse_collection_list("users, logs ,orders"),
            ["users", "logs", "orders"]
        );
        assert_eq!(parse_collection_list("users"), ["users"]);
        assert!(parse_collection_list(" , ,").is_empty());
        assert!(parse_collection_list("").is_empty());
    }
}
