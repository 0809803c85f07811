//! Structured logging setup

use tracing_subscriber::EnvFilter;

/// Initialize logging at the configured level
///
/// `RUST_LOG` overrides the config when set. Re-initialization (as in
/// test harnesses) is reported as an error by the subscriber; callers
/// treat that as fatal only at process start.
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    Ok(())
}
