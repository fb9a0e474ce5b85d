use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise `info` for everything and `debug` for the
/// engine when `verbose` is set. Logs go to stderr so stdout stays clean
/// for JSON output.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "info,xg_edge=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
