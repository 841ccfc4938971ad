//! Shared fixtures for the pipeline tests: an in-memory chain that emulates
//! ERC-1967 proxies, and a scratch directory of fake contract artifacts
#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::{SolCall, SolValue},
};
use stake_scripts::{
    artifacts::{ArtifactStore, ContractArtifact},
    cache::CacheStore,
    chain::StakeChain,
    commands::DeployContext,
    errors::ScriptError,
    registry::DeploymentRegistry,
    types::{PoolConfig, PoolState, StakeContract, StakeDeployParams, StakeState},
};
use tempfile::TempDir;

sol! {
    function initialize(
        address _MetaNode,
        uint256 _startBlock,
        uint256 _endBlock,
        uint256 _MetaNodePerBlock
    ) external;
}

/// The deployer account of the mock chain
pub const DEPLOYER: Address = Address::repeat_byte(0xde);

/// The ABI fragment written into every fake artifact
const ABI: &str = r#"[{"type":"function","name":"startBlock","inputs":[],"outputs":[{"name":"","type":"uint256","internalType":"uint256"}],"stateMutability":"view"}]"#;

// ------------
// | Fixtures |
// ------------

/// A scratch directory holding artifacts, cache and registry for one test
pub struct Fixture {
    /// Keeps the scratch directory alive for the duration of the test
    pub dir: TempDir,
    /// The deploy context rooted in `dir`
    pub ctx: DeployContext,
}

impl Fixture {
    /// Create a fixture with artifacts for every contract
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let artifacts_dir = dir.path().join("artifacts");
        for (i, contract) in ALL_CONTRACTS.iter().enumerate() {
            write_artifact(&artifacts_dir, *contract, &format!("0x60{:02x}", i));
        }

        let ctx = DeployContext {
            artifacts: ArtifactStore::new(&artifacts_dir),
            cache: CacheStore::new(dir.path().join("cache")),
            registry: DeploymentRegistry::open(dir.path().join("deployments.json")).unwrap(),
        };

        Self { dir, ctx }
    }

    /// The path of the persisted registry
    pub fn deployments_path(&self) -> PathBuf {
        self.dir.path().join("deployments.json")
    }

    /// Delete the artifact of the given contract
    pub fn remove_artifact(&self, contract: StakeContract) {
        fs::remove_file(self.ctx.artifacts.path_of(contract)).unwrap();
    }

    /// The artifact of the given contract
    pub fn artifact(&self, contract: StakeContract) -> ContractArtifact {
        self.ctx.artifacts.load(contract).unwrap()
    }
}

/// Every contract the scripts deploy
const ALL_CONTRACTS: [StakeContract; 4] = [
    StakeContract::MetaNode,
    StakeContract::MetaNodeStake,
    StakeContract::MetaNodeStakeV2,
    StakeContract::Erc1967Proxy,
];

/// Write a Hardhat-style artifact with the given bytecode
fn write_artifact(root: &Path, contract: StakeContract, bytecode: &str) {
    let path = root.join(contract.artifact_path());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body = format!(
        r#"{{"_format":"hh-sol-artifact-1","contractName":"{}","abi":{},"bytecode":"{}"}}"#,
        contract, ABI, bytecode
    );
    fs::write(path, body).unwrap();
}

/// The default deployment parameters
pub fn default_params() -> StakeDeployParams {
    StakeDeployParams::default()
}

// --------------
// | Mock Chain |
// --------------

/// A point at which the mock chain rejects a transaction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// Reject the deployment of the given contract
    Deploy(StakeContract),
    /// Reject the upgrade call
    Upgrade,
    /// Accept the upgrade call but leave the implementation untouched
    SilentUpgrade,
}

/// A contract living on the mock chain
#[derive(Clone, Debug)]
enum MockContract {
    /// The MetaNode token
    Token,
    /// A staking implementation, which holds no state of its own
    Implementation(StakeContract),
    /// An ERC-1967 proxy and the storage it owns
    Proxy {
        /// The current implementation
        implementation: Address,
        /// The staking state, living in the proxy's storage
        state: StakeState,
    },
}

/// The mutable state of the mock chain
#[derive(Default)]
struct MockState {
    /// The deployer's next nonce
    nonce: u64,
    /// Deployed contracts, by address
    contracts: HashMap<Address, MockContract>,
    /// The number of remote calls made so far
    calls: usize,
    /// The number of contracts deployed so far
    deploys: usize,
    /// An injected failure, if any
    failure: Option<Failure>,
}

/// An in-memory [`StakeChain`]
#[derive(Default)]
pub struct MockChain {
    /// The chain's state
    state: RefCell<MockState>,
}

impl MockChain {
    /// A fresh chain with no contracts
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain that rejects the given operation
    pub fn failing(failure: Failure) -> Self {
        let chain = Self::new();
        chain.state.borrow_mut().failure = Some(failure);
        chain
    }

    /// Start rejecting the given operation
    pub fn fail_with(&self, failure: Failure) {
        self.state.borrow_mut().failure = Some(failure);
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        self.state.borrow_mut().failure = None;
    }

    /// The number of remote calls made against the chain
    pub fn calls(&self) -> usize {
        self.state.borrow().calls
    }

    /// The number of contracts deployed against the chain
    pub fn deploys(&self) -> usize {
        self.state.borrow().deploys
    }

    /// Apply `f` to the staking state behind `proxy`
    fn with_stake_state<T>(
        &self,
        proxy: Address,
        f: impl FnOnce(&mut StakeState) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError> {
        let mut state = self.state.borrow_mut();
        match state.contracts.get_mut(&proxy) {
            Some(MockContract::Proxy { state, .. }) => f(state),
            _ => Err(ScriptError::ContractInteraction(format!(
                "no proxy at {proxy:#x}"
            ))),
        }
    }

    /// Record a call and return the injected failure, if any
    fn begin_call(&self) -> Option<Failure> {
        let mut state = self.state.borrow_mut();
        state.calls += 1;
        state.failure
    }
}

impl StakeChain for MockChain {
    fn deployer_address(&self) -> Address {
        DEPLOYER
    }

    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError> {
        if self.begin_call() == Some(Failure::Deploy(artifact.contract)) {
            return Err(ScriptError::ContractDeployment(format!(
                "{} deployment reverted",
                artifact.contract
            )));
        }

        let contract = match artifact.contract {
            StakeContract::MetaNode => MockContract::Token,
            StakeContract::MetaNodeStake | StakeContract::MetaNodeStakeV2 => {
                MockContract::Implementation(artifact.contract)
            }
            StakeContract::Erc1967Proxy => {
                let (implementation, data) =
                    <(Address, Bytes)>::abi_decode_params(&constructor_args)
                        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
                if !matches!(
                    self.state.borrow().contracts.get(&implementation),
                    Some(MockContract::Implementation(_))
                ) {
                    return Err(ScriptError::ContractDeployment(
                        "ERC1967InvalidImplementation".to_string(),
                    ));
                }

                let init = initializeCall::abi_decode(&data)
                    .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
                MockContract::Proxy {
                    implementation,
                    state: StakeState {
                        metanode: init._MetaNode,
                        start_block: init._startBlock,
                        end_block: init._endBlock,
                        metanode_per_block: init._MetaNodePerBlock,
                        withdraw_paused: false,
                        claim_paused: false,
                        total_pool_weight: U256::ZERO,
                        pools: vec![],
                    },
                }
            }
        };

        let mut state = self.state.borrow_mut();
        let address = DEPLOYER.create(state.nonce);
        state.nonce += 1;
        state.deploys += 1;
        state.contracts.insert(address, contract);
        Ok(address)
    }

    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError> {
        self.begin_call();
        match self.state.borrow().contracts.get(&proxy) {
            Some(MockContract::Proxy { implementation, .. }) => Ok(*implementation),
            // An unset storage slot reads as zero
            _ => Ok(Address::ZERO),
        }
    }

    async fn upgrade_to_and_call(
        &self,
        proxy: Address,
        implementation: Address,
        _data: Bytes,
    ) -> Result<(), ScriptError> {
        let failure = self.begin_call();
        if failure == Some(Failure::Upgrade) {
            return Err(ScriptError::ContractInteraction(
                "UUPSUnauthorizedCallContext".to_string(),
            ));
        }

        let mut state = self.state.borrow_mut();
        if !matches!(
            state.contracts.get(&implementation),
            Some(MockContract::Implementation(_))
        ) {
            return Err(ScriptError::ContractInteraction(
                "ERC1967InvalidImplementation".to_string(),
            ));
        }

        match state.contracts.get_mut(&proxy) {
            Some(MockContract::Proxy {
                implementation: current,
                ..
            }) => {
                if failure != Some(Failure::SilentUpgrade) {
                    *current = implementation;
                }
                Ok(())
            }
            _ => Err(ScriptError::ContractInteraction(format!(
                "no proxy at {proxy:#x}"
            ))),
        }
    }

    async fn add_pool(&self, proxy: Address, pool: &PoolConfig) -> Result<(), ScriptError> {
        self.begin_call();
        self.with_stake_state(proxy, |state| {
            // The first pool must be the native ETH pool
            if state.pools.is_empty() != pool.st_token_address.is_zero() {
                return Err(ScriptError::ContractInteraction(
                    "invalid staking token address".to_string(),
                ));
            }

            state.total_pool_weight += pool.pool_weight;
            state.pools.push(PoolState {
                st_token_address: pool.st_token_address,
                pool_weight: pool.pool_weight,
                last_reward_block: state.start_block,
                acc_metanode_per_st: U256::ZERO,
                st_token_amount: U256::ZERO,
                min_deposit_amount: pool.min_deposit_amount,
                unstake_locked_blocks: pool.unstake_locked_blocks,
            });
            Ok(())
        })
    }

    async fn deposit_eth(&self, proxy: Address, amount: U256) -> Result<(), ScriptError> {
        self.begin_call();
        self.with_stake_state(proxy, |state| match state.pools.first_mut() {
            Some(pool) if amount >= pool.min_deposit_amount => {
                pool.st_token_amount += amount;
                Ok(())
            }
            _ => Err(ScriptError::ContractInteraction(
                "deposit amount is too small".to_string(),
            )),
        })
    }

    async fn read_stake_state(&self, proxy: Address) -> Result<StakeState, ScriptError> {
        self.begin_call();
        self.with_stake_state(proxy, |state| Ok(state.clone()))
    }
}
