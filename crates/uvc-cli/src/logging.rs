use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, Result};

const QUIET_DEPENDENCIES: &str = "reqwest=warn,hyper=warn,hyper_util=warn";

/// Logs go to stderr; stdout is reserved for command output such as snapshots.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new(format!("debug,{QUIET_DEPENDENCIES}"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("warn,{QUIET_DEPENDENCIES}")))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()
        .map_err(|e| Error::Logging(format!("Failed to install subscriber: {e}")))
}
