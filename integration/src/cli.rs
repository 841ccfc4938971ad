//! Definition of the CLI arguments for integration tests

use std::path::PathBuf;

use clap::Parser;

use crate::constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_DEVNET_HOSTPORT};

/// CLI tool for running integration tests against a running Anvil node.
///
/// Every test deploys its own contracts, and the node is reverted to a
/// snapshot after each test.
#[derive(Debug, Clone, Parser)]
pub(crate) struct Cli {
    /// Test to run, runs every test if omitted
    #[arg(short, long)]
    pub(crate) test: Option<String>,

    /// Directory containing the compiled contract artifacts
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub(crate) artifacts_dir: PathBuf,

    /// Devnet private key, defaults to the first Anvil development account
    #[arg(short, long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub(crate) priv_key: Option<String>,

    /// Devnet RPC URL
    #[arg(short, long, default_value = DEFAULT_DEVNET_HOSTPORT)]
    pub(crate) rpc_url: String,

    /// Print the pipelines' logs while the tests run
    #[arg(short, long)]
    pub(crate) verbose: bool,
}
