//! Status command implementation
//!
//! One quota fetch per invocation, rendered as a status line or JSON. The
//! ACTIVE/PAUSED gate comes from the server flag alone; the token balance is
//! informational.

use clap::Args;
use serde::Serialize;

use crate::cli::{gateway, require_session};
use crate::core::{QuotaMonitor, TokenQuota};

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output payload
#[derive(Debug, Serialize)]
struct StatusPayload<'a> {
    subject_id: &'a str,
    #[serde(flatten)]
    quota: &'a TokenQuota,
    used: u64,
    usage_ratio: f64,
}

/// Run the status command
pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let session = require_session()?;
    let mut monitor = QuotaMonitor::new(gateway()?);

    let quota = monitor.refresh(&session).await?;

    if args.json {
        let payload = StatusPayload {
            subject_id: &session.subject_id,
            quota: &quota,
            used: quota.used(),
            usage_ratio: quota.usage_ratio(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let state = if quota.active { "ACTIVE" } else { "PAUSED" };
    println!("Assistant: {}", state);
    if let Some(plan) = quota.plan.as_deref() {
        println!("  Plan: {}", plan);
    }
    println!("  Tokens remaining: {} / {}", quota.available, quota.max);
    println!(
        "  Used: {} ({:.0}%)",
        quota.used(),
        quota.usage_ratio() * 100.0
    );

    if monitor.needs_upsell() {
        println!();
        println!("Your assistant is paused. Upgrade to reactivate:");
        crate::cli::plans::print_catalog();
    }

    Ok(())
}
