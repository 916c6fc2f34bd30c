//! CLI module - command-line interface
//!
//! - `kbsync` - defaults to the status command
//! - `kbsync sync` - connect a database, pick collections, run a sync
//! - `kbsync status` - token quota and assistant activation state
//! - `kbsync plans` - subscription catalog and plan selection
//! - `kbsync login|signup|verify|logout` - account/session management

pub mod auth;
pub mod plans;
pub mod status;
pub mod sync;
pub mod upload;

use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::backend::HttpGateway;
use crate::core::Session;
use crate::session_store::{FileSessionStore, SessionStore};

/// Exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const UNEXPECTED_FAILURE: i32 = 1;
    pub const AUTH_REQUIRED: i32 = 2;
    pub const VALIDATION_ERROR: i32 = 3;
    pub const BACKEND_ERROR: i32 = 4;
}

/// Version with build metadata, shown by `kbsync --version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

/// kbsync - sync document-store collections into your AI assistant
///
/// Connect a database, choose which collections to sync, and keep an eye on
/// the token quota that gates the assistant.
#[derive(Parser, Debug)]
#[command(name = "kbsync")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit machine-readable logs (JSON) to stderr
    #[arg(long = "json-output", global = true)]
    pub json_output: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect a database and sync selected collections into the knowledge base
    Sync(sync::SyncArgs),

    /// Upload a CSV knowledge-base file to train the assistant
    Upload(upload::UploadArgs),

    /// Show token quota and whether the assistant is active (default command)
    Status(status::StatusArgs),

    /// List subscription plans or choose one for manual settlement
    Plans(plans::PlansArgs),

    /// Log in with email and password
    Login(auth::LoginArgs),

    /// Create a new account (a verification code is emailed to you)
    Signup(auth::SignupArgs),

    /// Verify the emailed one-time code and start a session
    Verify(auth::VerifyArgs),

    /// Forget the stored session
    Logout,
}

/// Open the default session store.
pub fn session_store() -> anyhow::Result<FileSessionStore> {
    FileSessionStore::default_location()
}

/// Load the stored session or fail with a re-authentication hint.
pub fn require_session() -> anyhow::Result<Session> {
    session_store()?
        .get()
        .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `kbsync login` first."))
}

/// Build the backend gateway from the environment.
pub fn gateway() -> anyhow::Result<Arc<HttpGateway>> {
    Ok(Arc::new(HttpGateway::from_env()?))
}
