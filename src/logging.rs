//! Logging setup
//!
//! Tracing to stderr; `--verbose` bumps the default level, `--json-output`
//! switches to machine-readable lines. `RUST_LOG` wins when set.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool, json_output: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kbsync={}", default_level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json_output {
        builder.json().try_init().map_err(|e| anyhow::anyhow!(e))?;
    } else {
        builder.try_init().map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
}
