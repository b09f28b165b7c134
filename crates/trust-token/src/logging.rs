//! Tracing subscriber setup for binaries and tests embedding trust tokens

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a global subscriber printing compact logs to stdout.
///
/// The level comes from `RUST_LOG`, defaulting to `info`. Load decisions are
/// logged at `debug` with a `path` field, so `RUST_LOG=trust_token=debug`
/// shows why each file was loaded, skipped or retracted.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected_not_fatal() {
        // Another test may have installed a subscriber first
        let _ = init();
        assert!(init().is_err());

        tracing::debug!(path = "/etc/trust", "logging initialized");
    }
}
