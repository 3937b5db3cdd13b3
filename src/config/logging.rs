use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

/// Initializes the application's logging and tracing infrastructure.
///
/// Verbosity is controlled through `RUST_LOG` (e.g. `RUST_LOG=debug`, or
/// per-crate: `RUST_LOG=venturelink=debug,diesel=warn`). When the variable
/// is unset the subscriber falls back to `info` for application code and
/// `warn` for diesel to keep SQL noise out of the logs.
///
/// Call exactly once at startup; the subscriber is global and immutable
/// for the lifetime of the process.
pub fn init_logging() {
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "info,diesel=warn".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
