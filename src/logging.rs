//! Tracing setup for the listkeeper binary.

use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;

use tracing_subscriber::{EnvFilter, fmt};

/// Install the fmt subscriber and the panic hook. `RUST_LOG` overrides the
/// level configured in `AppConfig` when both are set.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt().with_env_filter(filter).with_target(false).init();
    std::panic::set_hook(Box::new(log_panic));
}

/// Panics bypass the error responses, so route them into the same stream
/// the request traces go to.
fn log_panic(info: &PanicHookInfo<'_>) {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    let backtrace = Backtrace::capture();

    match info.location() {
        Some(location) => tracing::error!(%message, %location, %backtrace, "panic"),
        None => tracing::error!(%message, %backtrace, "panic"),
    }
}
