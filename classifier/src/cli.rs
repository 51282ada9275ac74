use eth::types::Address;

/// §6 "CLI / environment". Every flag doubles as an env var, matching
/// `event-handler/src/cli.rs`.
#[derive(Debug, clap::Parser)]
pub struct Args {
    /// The node RPC API endpoint, used for all on-demand chain reads
    /// (ownerOf, totalSupply, tokenURI, allowance, ...).
    #[clap(long, env)]
    pub node_url: String,

    /// Path to the SQLite store file. Purged and re-migrated on startup.
    #[clap(long, env, default_value = "classifier.sqlite")]
    pub store_path: String,

    /// Directory containing the read-only JSON side-inputs: leaders.json,
    /// honeypots.json, tokens.json.
    #[clap(long, env, default_value = "./data")]
    pub data_dir: String,

    /// The log filter.
    #[clap(long, env, default_value = "info")]
    pub log: String,

    /// Enables verbose tracing, disables the tick interval (scan every
    /// block instead), and enables debug-target filtering.
    #[clap(long, env)]
    pub debug: bool,

    /// When `debug` is set, only this token is watched/analyzed.
    #[clap(long, env)]
    pub target_token: Option<Address>,

    /// Chooses the concurrency profile (`production` widens nothing;
    /// anything else widens the provider/fetch pools for local iteration).
    #[clap(long, env, default_value = "production")]
    pub node_env: String,
}
