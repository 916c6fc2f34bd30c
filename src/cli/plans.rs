//! Plans command implementation
//!
//! Lists the subscription catalog and records a chosen plan as a pending
//! payment intent. Settlement is a manual bank transfer confirmed by the
//! support team; the assistant reactivates once the backend flips the quota
//! flag, visible through `kbsync status`.

use clap::Args;

use crate::cli::{gateway, require_session};
use crate::core::{choose_plan, find_plan, plan_catalog, BackendGateway};

/// Support channel for settlement confirmation
const SUPPORT_CONTACT: &str = "billing@kbsync.app";

/// Arguments for the plans command
#[derive(Args, Debug, Default)]
pub struct PlansArgs {
    /// Choose a plan by id (starter, professional, enterprise)
    #[arg(long)]
    pub choose: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Print the catalog in fixed order.
pub fn print_catalog() {
    for plan in plan_catalog() {
        let marker = if plan.is_recommended { "  (recommended)" } else { "" };
        println!("  {:<14} ${}/mo{}", plan.name, plan.price_usd, marker);
        for feature in plan.features {
            println!("      - {}", feature);
        }
    }
}

/// Run the plans command
pub async fn run(args: PlansArgs) -> anyhow::Result<()> {
    let Some(plan_id) = args.choose.as_deref() else {
        if args.json {
            println!("{}", serde_json::to_string_pretty(plan_catalog())?);
        } else {
            println!("Available plans:");
            print_catalog();
            println!();
            println!("Choose one with `kbsync plans --choose <id>`.");
        }
        return Ok(());
    };

    let plan = find_plan(plan_id)
        .ok_or_else(|| anyhow::anyhow!("Unknown plan '{}'. See `kbsync plans`.", plan_id))?;
    let intent = choose_plan(plan);

    // Best-effort record; settlement stays manual either way.
    let session = require_session()?;
    if let Err(e) = gateway()?.submit_plan_selection(&session, &intent).await {
        tracing::warn!(error = %e, "Could not record plan selection with the backend");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&intent)?);
        return Ok(());
    }

    println!("Plan selected: {} (${}/mo)", plan.name, plan.price_usd);
    println!();
    println!("To activate, transfer ${} and confirm with our team:", intent.amount_due);
    println!("  Reference: {}-{}", intent.plan_id, session.subject_id);
    println!("  Contact:   {}", SUPPORT_CONTACT);
    println!();
    println!("Activation is applied after manual confirmation; check progress");
    println!("with `kbsync status`.");

    Ok(())
}
