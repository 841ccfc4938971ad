//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy_primitives::{Address, U256};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DEFAULT_END_BLOCK, DEFAULT_INITIAL_SUPPLY, DEFAULT_METANODE_PER_BLOCK,
        DEFAULT_START_BLOCK,
    },
    errors::ScriptError,
};

/// The version of the staking deployment a cache artifact or registry entry belongs to
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VersionTag {
    /// The initial deployment
    #[value(name = "V1")]
    V1,
    /// The deployment after the first upgrade
    #[value(name = "V2")]
    V2,
}

impl VersionTag {
    /// The file name of this version's cache artifact
    pub fn cache_file_name(&self) -> &'static str {
        match self {
            VersionTag::V1 => "metaNodeStakeV1.json",
            VersionTag::V2 => "metaNodeStakeV2.json",
        }
    }

    /// The name this version is registered under in the deployment registry
    pub fn deployment_name(&self) -> &'static str {
        match self {
            VersionTag::V1 => "MetaNodeStakeV1",
            VersionTag::V2 => "MetaNodeStakeV2",
        }
    }

    /// The staking contract backing this version
    pub fn stake_contract(&self) -> StakeContract {
        match self {
            VersionTag::V1 => StakeContract::MetaNodeStake,
            VersionTag::V2 => StakeContract::MetaNodeStakeV2,
        }
    }
}

impl Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionTag::V1 => write!(f, "V1"),
            VersionTag::V2 => write!(f, "V2"),
        }
    }
}

/// The contracts the scripts know how to deploy
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StakeContract {
    /// The MetaNode ERC20 reward token
    MetaNode,
    /// The first staking implementation
    MetaNodeStake,
    /// The upgraded staking implementation
    MetaNodeStakeV2,
    /// The OpenZeppelin ERC-1967 proxy the staking contract sits behind
    Erc1967Proxy,
}

impl StakeContract {
    /// The path of this contract's compilation artifact, relative to the
    /// artifacts directory of a Hardhat project
    pub fn artifact_path(&self) -> &'static str {
        match self {
            StakeContract::MetaNode => "contracts/MetaNode.sol/MetaNode.json",
            StakeContract::MetaNodeStake => "contracts/MetaNodeStake.sol/MetaNodeStake.json",
            StakeContract::MetaNodeStakeV2 => {
                "contracts/MetaNodeStakeV2.sol/MetaNodeStakeV2.json"
            }
            StakeContract::Erc1967Proxy => {
                "@openzeppelin/contracts/proxy/ERC1967/ERC1967Proxy.sol/ERC1967Proxy.json"
            }
        }
    }
}

impl Display for StakeContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakeContract::MetaNode => write!(f, "MetaNode"),
            StakeContract::MetaNodeStake => write!(f, "MetaNodeStake"),
            StakeContract::MetaNodeStakeV2 => write!(f, "MetaNodeStakeV2"),
            StakeContract::Erc1967Proxy => write!(f, "ERC1967Proxy"),
        }
    }
}

/// The record a deploy or upgrade step leaves in the cache for the next step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// The address of the staking proxy
    #[serde(rename = "metaNodeStakeAddress")]
    pub proxy_address: Address,
    /// The address of the implementation behind the proxy
    #[serde(rename = "metaNodeStakeImplAddress")]
    pub implementation_address: Address,
    /// The JSON-encoded ABI of the implementation
    pub abi: String,
}

/// An entry in the named deployment registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedDeployment {
    /// The address callers use, i.e. the proxy
    pub address: Address,
    /// The implementation address behind `address`
    #[serde(rename = "impl")]
    pub implementation: Address,
}

impl From<&DeploymentRecord> for NamedDeployment {
    fn from(record: &DeploymentRecord) -> Self {
        Self {
            address: record.proxy_address,
            implementation: record.implementation_address,
        }
    }
}

/// The parameters passed to the staking contract's initializer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StakeInitParams {
    /// The address of the MetaNode reward token
    pub metanode: Address,
    /// The block at which rewards start accruing
    pub start_block: U256,
    /// The block at which rewards stop accruing
    pub end_block: U256,
    /// The amount of MetaNode rewarded per block
    pub metanode_per_block: U256,
}

/// The parameters of a fresh V1 deployment
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StakeDeployParams {
    /// The supply minted by the token constructor
    pub initial_supply: U256,
    /// The block at which rewards start accruing
    pub start_block: U256,
    /// The block at which rewards stop accruing
    pub end_block: U256,
    /// The amount of MetaNode rewarded per block
    pub metanode_per_block: U256,
}

impl Default for StakeDeployParams {
    fn default() -> Self {
        Self {
            initial_supply: U256::from(DEFAULT_INITIAL_SUPPLY),
            start_block: U256::from(DEFAULT_START_BLOCK),
            end_block: U256::from(DEFAULT_END_BLOCK),
            metanode_per_block: U256::from(DEFAULT_METANODE_PER_BLOCK),
        }
    }
}

impl StakeDeployParams {
    /// Reject parameters the staking initializer would revert on
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.start_block > self.end_block {
            return Err(ScriptError::CalldataConstruction(format!(
                "start block {} is after end block {}",
                self.start_block, self.end_block
            )));
        }
        if self.metanode_per_block.is_zero() {
            return Err(ScriptError::CalldataConstruction(
                "MetaNode per block must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// The initializer parameters for a staking contract rewarding in `metanode`
    pub fn init_params(&self, metanode: Address) -> StakeInitParams {
        StakeInitParams {
            metanode,
            start_block: self.start_block,
            end_block: self.end_block,
            metanode_per_block: self.metanode_per_block,
        }
    }
}

/// The parameters of a pool registered with `addPool`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// The staked token, the zero address for the native ETH pool
    pub st_token_address: Address,
    /// The pool's share of the rewards
    pub pool_weight: U256,
    /// The smallest accepted deposit
    pub min_deposit_amount: U256,
    /// The number of blocks an unstake request stays locked
    pub unstake_locked_blocks: U256,
}

/// The configuration of a single staking pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolState {
    /// The staked token, the zero address for the native ETH pool
    pub st_token_address: Address,
    /// The pool's share of the total reward weight
    pub pool_weight: U256,
    /// The last block rewards were distributed at
    pub last_reward_block: U256,
    /// Accumulated MetaNode per staked token
    pub acc_metanode_per_st: U256,
    /// The total amount staked in the pool
    pub st_token_amount: U256,
    /// The minimum deposit accepted by the pool
    pub min_deposit_amount: U256,
    /// The number of blocks an unstake request stays locked
    pub unstake_locked_blocks: U256,
}

/// The staking contract state that must survive an upgrade unchanged
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakeState {
    /// The MetaNode reward token
    pub metanode: Address,
    /// The block at which rewards start accruing
    pub start_block: U256,
    /// The block at which rewards stop accruing
    pub end_block: U256,
    /// The amount of MetaNode rewarded per block
    pub metanode_per_block: U256,
    /// Whether withdrawals are paused
    pub withdraw_paused: bool,
    /// Whether reward claims are paused
    pub claim_paused: bool,
    /// The sum of all pool weights
    pub total_pool_weight: U256,
    /// Every configured pool, by pool ID
    pub pools: Vec<PoolState>,
}
