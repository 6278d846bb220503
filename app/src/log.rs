use env_logger::Env;

/// Initialise the `log` backend.
///
/// Log level is Debug in development builds and Info in production builds.
/// `RUST_LOG` overrides both.
pub fn init() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    // Tests and embedders may have installed a logger already
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}
