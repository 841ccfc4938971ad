//! Constants used in the integration tests

/// The default RPC URL of the Anvil node the tests run against
pub(crate) const DEFAULT_DEVNET_HOSTPORT: &str = "http://127.0.0.1:8545";

/// The default directory holding the compiled contract artifacts
pub(crate) const DEFAULT_ARTIFACTS_DIR: &str = "../artifacts";
