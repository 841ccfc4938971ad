//! Definitions of CLI arguments and commands for the deploy & upgrade scripts

use std::path::{Path, PathBuf};

use alloy_primitives::U256;
use clap::{Args, Parser, Subcommand};

use crate::{
    artifacts::ArtifactStore,
    cache::CacheStore,
    chain::{RpcChain, StakeChain},
    commands::{deploy_stake, show_deployment, upgrade_stake, DeployContext},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_END_BLOCK, DEFAULT_INITIAL_SUPPLY, DEFAULT_METANODE_PER_BLOCK, DEFAULT_START_BLOCK,
        PRIVATE_KEY_ENV_VAR, RPC_URL_ENV_VAR,
    },
    errors::ScriptError,
    network::{Network, NetworkConfig},
    registry::DeploymentRegistry,
    types::{StakeDeployParams, VersionTag},
};

/// Deploy and upgrade the MetaNode staking contracts
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The network to deploy to
    #[arg(short, long, value_enum, default_value_t = Network::Localhost)]
    pub network: Network,

    /// Network RPC URL, defaults to the local node for `localhost` and to
    /// `$SEPOLIA_RPC_URL` for `sepolia`
    #[arg(short, long, env = RPC_URL_ENV_VAR)]
    pub rpc_url: Option<String>,

    /// Private key of the deployer, defaults to a development account for `localhost`
    #[arg(short, long, env = PRIVATE_KEY_ENV_VAR, hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Index of the development account to deploy from when no key is given
    #[arg(long, default_value_t = 0)]
    pub account_index: u32,

    /// Directory containing the compiled contract artifacts, laid out as
    /// Hardhat's `artifacts/`.
    ///
    /// Hardhat only emits `ERC1967Proxy` when a project source imports
    /// `@openzeppelin/contracts/proxy/ERC1967/ERC1967Proxy.sol`, so the project
    /// must import it for `deploy` to find the proxy artifact.
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Directory the per-version cache artifacts are written to, defaults to
    /// `deployments/<network>/cache`
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Path of the named deployment registry, defaults to
    /// `deployments/<network>/deployments.json`
    #[arg(short, long)]
    pub deployments_path: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Resolve the network configuration from the CLI arguments
    pub fn network_config(&self) -> Result<NetworkConfig, ScriptError> {
        NetworkConfig::resolve(
            self.network,
            self.rpc_url.clone(),
            self.priv_key.as_deref(),
            self.account_index,
        )
    }

    /// Open the local state the commands operate on, scoped to the selected
    /// network unless the paths are given explicitly
    pub fn deploy_context(&self) -> Result<DeployContext, ScriptError> {
        let cache_dir = self.cache_dir.clone().unwrap_or_else(|| self.network.cache_dir());
        let deployments_path = self
            .deployments_path
            .clone()
            .unwrap_or_else(|| self.network.deployments_path());

        Ok(DeployContext {
            artifacts: ArtifactStore::new(&self.artifacts_dir),
            cache: CacheStore::new(cache_dir),
            registry: DeploymentRegistry::open(deployments_path)?,
        })
    }

    /// Run the selected command, connecting to the network only if it needs a node
    pub async fn run(self) -> Result<(), ScriptError> {
        let mut ctx = self.deploy_context()?;
        if let Command::Show(args) = &self.command {
            return show_deployment(args.tag, &ctx).map(|_| ());
        }

        let chain = RpcChain::connect(&self.network_config()?).await?;
        self.command.run(&chain, &mut ctx).await
    }
}

/// Load environment variables from `path`, or from the nearest `.env` file if
/// none is given.
///
/// A missing file is not an error, the variables may come from the environment.
/// A malformed one is. Returns the path that was loaded, if any.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ScriptError> {
    let res = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match res {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ScriptError::EnvFile(e.to_string())),
    }
}

/// The available commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the MetaNode token and the V1 staking contract behind a proxy
    Deploy(DeployArgs),
    /// Upgrade the V1 staking proxy to the V2 implementation
    Upgrade,
    /// Print a cached deployment record
    Show(ShowArgs),
}

impl Command {
    /// Run the command against `chain`
    pub async fn run(
        self,
        chain: &impl StakeChain,
        ctx: &mut DeployContext,
    ) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy_stake(args.into(), chain, ctx).await.map(|_| ()),
            Command::Upgrade => upgrade_stake(chain, ctx).await.map(|_| ()),
            Command::Show(args) => show_deployment(args.tag, ctx).map(|_| ()),
        }
    }
}

/// Deploy the MetaNode token and the V1 staking contract.
///
/// The staking contract is deployed behind an ERC-1967 proxy and initialized
/// in the proxy's constructor.
#[derive(Args)]
pub struct DeployArgs {
    /// The supply minted by the MetaNode token constructor
    #[arg(long, default_value_t = DEFAULT_INITIAL_SUPPLY)]
    pub initial_supply: u64,

    /// The block at which staking rewards start accruing
    #[arg(long, default_value_t = DEFAULT_START_BLOCK)]
    pub start_block: u64,

    /// The block at which staking rewards stop accruing
    #[arg(long, default_value_t = DEFAULT_END_BLOCK)]
    pub end_block: u64,

    /// The amount of MetaNode rewarded per block
    #[arg(long, default_value_t = DEFAULT_METANODE_PER_BLOCK)]
    pub metanode_per_block: u64,
}

impl From<DeployArgs> for StakeDeployParams {
    fn from(args: DeployArgs) -> Self {
        Self {
            initial_supply: U256::from(args.initial_supply),
            start_block: U256::from(args.start_block),
            end_block: U256::from(args.end_block),
            metanode_per_block: U256::from(args.metanode_per_block),
        }
    }
}

/// Print a cached deployment record
#[derive(Args)]
pub struct ShowArgs {
    /// The version to show
    #[arg(short, long, value_enum, default_value_t = VersionTag::V1)]
    pub tag: VersionTag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_defaults() {
        let cli = Cli::try_parse_from(["stake-scripts", "deploy"]).unwrap();
        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy command");
        };

        let params = StakeDeployParams::from(args);
        assert_eq!(params.initial_supply, U256::from(1_000_000u64));
        assert_eq!(params.start_block, U256::from(8_917_592u64));
        assert_eq!(params.end_block, U256::from(8_924_792u64));
        assert_eq!(params.metanode_per_block, U256::from(100u64));
    }

    #[test]
    fn test_state_paths_follow_network() {
        let cli = Cli::try_parse_from(["stake-scripts", "--network", "sepolia", "upgrade"]).unwrap();
        assert_eq!(cli.cache_dir, None);

        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let deployments_path = dir.path().join("deployments.json");
        let cli = Cli::try_parse_from([
            "stake-scripts",
            "--cache-dir",
            cache_dir.to_str().unwrap(),
            "-d",
            deployments_path.to_str().unwrap(),
            "upgrade",
        ])
        .unwrap();

        let ctx = cli.deploy_context().unwrap();
        assert_eq!(ctx.cache.path_of(VersionTag::V1), cache_dir.join("metaNodeStakeV1.json"));
        assert_eq!(ctx.registry.path(), Some(deployments_path.as_path()));
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_env_file(Some(&dir.path().join(".env"))).unwrap(), None);
    }

    #[test]
    fn test_malformed_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "STAKE_SCRIPTS_TEST_KEY=\"unterminated\n").unwrap();

        assert!(matches!(load_env_file(Some(&path)), Err(ScriptError::EnvFile(_))));
    }

    #[test]
    fn test_show_parses_tag() {
        let cli = Cli::try_parse_from(["stake-scripts", "--network", "sepolia", "show", "-t", "V2"])
            .unwrap();
        assert_eq!(cli.network, Network::Sepolia);
        assert!(matches!(
            cli.command,
            Command::Show(ShowArgs {
                tag: VersionTag::V2
            })
        ));
    }
}
