use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` for
/// the crate's own targets when `debug` is on.
pub fn init(debug: bool) {
    let default = if debug {
        "info,trainz_dl=debug,trainz_store=debug,trainz_inspect=debug,trainz_config=debug,tower_http=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug);

    tracing_subscriber::registry().with(filter).with(stderr_layer).init();
}
