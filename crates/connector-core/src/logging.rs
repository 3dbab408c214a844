/// Initialize the global logger. `RUST_LOG` wins over the default level;
/// `verbose` raises the default from `info` to `debug`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    // A second init (tests, embedding) keeps the first logger.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
