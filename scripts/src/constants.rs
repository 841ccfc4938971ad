//! Constants used in the deploy & upgrade scripts

/// The storage slot containing the implementation address in an ERC-1967 proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const PROXY_IMPLEMENTATION_STORAGE_SLOT: &str =
    "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";

/// The number of confirmations to wait for each deployment or upgrade transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

// ------------------------
// | Deployment Parameters |
// ------------------------

/// The initial supply minted by the MetaNode token constructor
pub const DEFAULT_INITIAL_SUPPLY: u64 = 1_000_000;

/// The block at which staking rewards start accruing
pub const DEFAULT_START_BLOCK: u64 = 8_917_592;

/// The block at which staking rewards stop accruing
pub const DEFAULT_END_BLOCK: u64 = 8_924_792;

/// The amount of MetaNode rewarded per block
pub const DEFAULT_METANODE_PER_BLOCK: u64 = 100;

// ------------
// | Networks |
// ------------

/// The chain ID of the Sepolia testnet
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// The fixed gas price used on Sepolia, 30 gwei
pub const SEPOLIA_GAS_PRICE: u128 = 30_000_000_000;

/// The chain ID used by local Anvil & Hardhat nodes
pub const LOCALHOST_CHAIN_ID: u64 = 31_337;

/// The RPC URL of a local development node
pub const LOCALHOST_RPC_URL: &str = "http://127.0.0.1:8545";

/// The mnemonic local development nodes seed their accounts from
pub const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// The environment variable holding the Sepolia RPC URL
pub const SEPOLIA_RPC_URL_ENV_VAR: &str = "SEPOLIA_RPC_URL";

/// The environment variable overriding the RPC URL of any network
pub const RPC_URL_ENV_VAR: &str = "RPC_URL";

/// The environment variable holding the deployer's private key
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

// ---------
// | Paths |
// ---------

/// The default directory holding compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The directory holding one subdirectory of deployment state per network
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The name of the per-network directory holding the cache artifacts
pub const CACHE_DIR_NAME: &str = "cache";

/// The file name of the per-network named deployment registry
pub const DEPLOYMENTS_FILE_NAME: &str = "deployments.json";

/// The extension appended to a cache artifact's path to form its lock file
pub const LOCK_FILE_EXTENSION: &str = "lock";

/// The extension appended to a cache artifact's path while it is being written
pub const TMP_FILE_EXTENSION: &str = "tmp";
