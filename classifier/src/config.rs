use crate::cli::Args;
use analyzer::Config;
use std::time::Duration;

/// §6 "NODE_ENV" and "DEBUG" wiring: picks the concurrency profile and,
/// in debug mode, collapses the tick interval to zero (scan every block).
pub fn analyzer_config(args: &Args) -> Config {
    let mut config = if args.node_env == "production" { Config::default() } else { Config::development() };
    if args.debug {
        config.tick_interval = Duration::ZERO;
    }
    config
}
