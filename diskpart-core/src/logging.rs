use log::LevelFilter;

/// Log to stderr at `default_level`; `RUST_LOG` overrides it when set.
pub fn init(default_level: LevelFilter) {
    // Repeated calls (tests, embedding) keep the first logger.
    let _ = env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}
