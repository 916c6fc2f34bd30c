//! Account commands: login, signup, verify, logout
//!
//! These only talk to the opaque auth service and the session store; the
//! sync/status/plans commands read the stored session and never touch auth.

use clap::Args;

use crate::cli::{gateway, session_store};
use crate::session_store::SessionStore;

/// Arguments for the login command
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    pub email: String,

    /// Account password
    #[arg(short, long, env = "KBSYNC_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the signup command
#[derive(Args, Debug)]
pub struct SignupArgs {
    /// Company or display name
    #[arg(short, long)]
    pub name: String,

    /// Account email
    #[arg(short, long)]
    pub email: String,

    /// Account password
    #[arg(short, long, env = "KBSYNC_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Account email
    #[arg(short, long)]
    pub email: String,

    /// 6-digit code from the verification email
    #[arg(short, long)]
    pub code: String,
}

pub async fn login(args: LoginArgs) -> anyhow::Result<()> {
    let session = gateway()?.login(&args.email, &args.password).await?;
    session_store()?.set(&session)?;
    println!("Logged in as {} <{}>", session.display_name, session.email);
    Ok(())
}

pub async fn signup(args: SignupArgs) -> anyhow::Result<()> {
    gateway()?
        .signup(&args.name, &args.email, &args.password)
        .await?;
    println!("Account created. Check {} for a verification code,", args.email);
    println!("then run `kbsync verify --email {} --code <code>`.", args.email);
    Ok(())
}

pub async fn verify(args: VerifyArgs) -> anyhow::Result<()> {
    let session = gateway()?.verify(&args.email, &args.code).await?;
    session_store()?.set(&session)?;
    println!("Verified. Logged in as {} <{}>", session.display_name, session.email);
    Ok(())
}

pub fn logout() -> anyhow::Result<()> {
    session_store()?.clear()?;
    println!("Logged out.");
    Ok(())
}
