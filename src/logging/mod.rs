//! Structured logging bootstrap.
//!
//! mom logs through `tracing`; this module just wires a `tracing-subscriber`
//! `fmt` layer driven by `RUST_LOG`/`--verbose`, the way most CLI crates in
//! this codebase's family do it rather than rolling a bespoke log pipeline.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `verbose` bumps the default filter from `info` to `debug` for this
/// crate's own target, leaving `RUST_LOG` free to override either.
pub fn init(verbose: bool) {
    let default_directive = if verbose { "mom=debug,info" } else { "mom=info,warn" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}
