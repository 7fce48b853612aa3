//! Tracing setup for embedding applications.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install a stderr tracing subscriber filtered by `HABITLINE_LOG`
/// (falling back to `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("HABITLINE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
