use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber. Logs go to stderr so stdout stays reserved
/// for diffs, questions and command output.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or everything
/// down to `debug` with `verbose`.
pub fn init(verbose: bool) -> Result<()> {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|error| anyhow!("invalid log filter: {error}"))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|error| anyhow!("failed to initialise logging: {error}"))
}
