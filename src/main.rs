//! kbsync - sync document-store collections into an AI assistant knowledge base
//!
//! Workflow: connect a database by connection string, pick collections from
//! the discovered catalog, run a one-shot sync. Separately, the token quota
//! gates whether the assistant is active and drives the subscription upsell.

mod backend;
mod cli;
mod core;
mod logging;
mod session_store;

use clap::Parser;
use cli::{exit_codes, Cli, Commands};

use crate::backend::auth::AuthError;
use crate::core::{GatewayError, WorkflowError};

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    // Initialize logging
    if let Err(e) = logging::init(cli.verbose, cli.json_output) {
        eprintln!("Failed to initialize logging: {}", e);
        return exit_codes::UNEXPECTED_FAILURE;
    }

    // Create tokio runtime for async commands
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {}", e);
            return exit_codes::UNEXPECTED_FAILURE;
        }
    };

    let result = match cli.command {
        Some(Commands::Sync(args)) => rt.block_on(cli::sync::run(args)),
        Some(Commands::Upload(args)) => rt.block_on(cli::upload::run(args)),
        Some(Commands::Plans(args)) => rt.block_on(cli::plans::run(args)),
        Some(Commands::Login(args)) => rt.block_on(cli::auth::login(args)),
        Some(Commands::Signup(args)) => rt.block_on(cli::auth::signup(args)),
        Some(Commands::Verify(args)) => rt.block_on(cli::auth::verify(args)),
        Some(Commands::Logout) => cli::auth::logout(),
        Some(Commands::Status(args)) => rt.block_on(cli::status::run(args)),
        // Default: status
        None => rt.block_on(cli::status::run(cli::status::StatusArgs::default())),
    };

    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            categorize_error(&e)
        }
    }
}

/// Categorize an error into the appropriate exit code
fn categorize_error(e: &anyhow::Error) -> i32 {
    if let Some(we) = e.downcast_ref::<WorkflowError>() {
        return match we {
            WorkflowError::Gateway(ge) => categorize_gateway(ge),
            WorkflowError::Busy => exit_codes::UNEXPECTED_FAILURE,
            _ => exit_codes::VALIDATION_ERROR,
        };
    }
    if let Some(ge) = e.downcast_ref::<GatewayError>() {
        return categorize_gateway(ge);
    }
    if let Some(ae) = e.downcast_ref::<AuthError>() {
        return match ae {
            AuthError::MalformedCode => exit_codes::VALIDATION_ERROR,
            AuthError::Rejected(_) => exit_codes::AUTH_REQUIRED,
            AuthError::Gateway(ge) => categorize_gateway(ge),
        };
    }

    let msg = e.to_string();
    if msg.contains("Not logged in") {
        exit_codes::AUTH_REQUIRED
    } else if msg.contains("Unknown plan")
        || msg.contains("no names")
        || msg.contains("Only .csv")
        || msg.contains("Invalid file path")
    {
        exit_codes::VALIDATION_ERROR
    } else {
        exit_codes::UNEXPECTED_FAILURE
    }
}

fn categorize_gateway(e: &GatewayError) -> i32 {
    match e {
        GatewayError::AuthRequired => exit_codes::AUTH_REQUIRED,
        _ => exit_codes::BACKEND_ERROR,
    }
}
