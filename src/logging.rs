use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber; `HOUSE_BUYING_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("HOUSE_BUYING_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
