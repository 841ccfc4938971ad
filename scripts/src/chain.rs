//! The seam between the deploy pipeline and an EVM node

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::http::reqwest::Url,
};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use crate::{
    artifacts::ContractArtifact,
    constants::NUM_DEPLOY_CONFIRMATIONS,
    errors::ScriptError,
    network::NetworkConfig,
    solidity::IMetaNodeStake::{self, addPoolCall, depositETHCall, upgradeToAndCallCall},
    types::{PoolConfig, PoolState, StakeState},
    utils::{address_from_storage_word, implementation_slot},
};

/// The remote operations the deploy & upgrade pipelines are built from.
///
/// Every method awaits confirmation of its transaction before returning, so
/// callers can chain them strictly sequentially.
#[allow(async_fn_in_trait)]
pub trait StakeChain {
    /// The account transactions are sent from
    fn deployer_address(&self) -> Address;

    /// Deploy `artifact` with the given ABI-encoded constructor arguments,
    /// returning the address of the new contract
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError>;

    /// Read the implementation address out of an ERC-1967 proxy's storage
    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError>;

    /// Point the UUPS proxy at `implementation`, calling it with `data` if non-empty
    async fn upgrade_to_and_call(
        &self,
        proxy: Address,
        implementation: Address,
        data: Bytes,
    ) -> Result<(), ScriptError>;

    /// Register a staking pool with the staking contract behind `proxy`.
    /// The sender must hold the contract's admin role.
    async fn add_pool(&self, proxy: Address, pool: &PoolConfig) -> Result<(), ScriptError>;

    /// Stake `amount` wei into the native ETH pool behind `proxy`
    async fn deposit_eth(&self, proxy: Address, amount: U256) -> Result<(), ScriptError>;

    /// Read the staking state that must survive an upgrade
    async fn read_stake_state(&self, proxy: Address) -> Result<StakeState, ScriptError>;
}

/// A [`StakeChain`] backed by a JSON-RPC node
#[derive(Clone)]
pub struct RpcChain {
    /// The signing provider
    provider: DynProvider,
    /// The address of the signer attached to `provider`
    deployer: Address,
    /// The fixed gas price to send transactions with, if any
    gas_price: Option<u128>,
}

impl RpcChain {
    /// Connect to the node described by `config`, checking that it serves the
    /// expected chain
    pub async fn connect(config: &NetworkConfig) -> Result<Self, ScriptError> {
        let url = config
            .rpc_url
            .parse::<Url>()
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        let deployer = config.signer.address();

        let provider = ProviderBuilder::new()
            .wallet(config.signer.clone())
            .connect_http(url);
        let provider = DynProvider::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        if chain_id != config.chain_id {
            return Err(ScriptError::ChainIdMismatch {
                expected: config.chain_id,
                actual: chain_id,
            });
        }

        info!("connected to {} (chain {}) as {:#x}", config.network, chain_id, deployer);

        Ok(Self {
            provider,
            deployer,
            gas_price: config.gas_price,
        })
    }

    /// The underlying provider
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Send a transaction and wait for it to be confirmed, failing if it reverts.
    ///
    /// `to_err` wraps failures in the error variant appropriate for the caller.
    async fn send_and_confirm(
        &self,
        mut tx: TransactionRequest,
        to_err: fn(String) -> ScriptError,
    ) -> Result<TransactionReceipt, ScriptError> {
        if let Some(gas_price) = self.gas_price {
            tx.set_gas_price(gas_price);
        }

        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| to_err(e.to_string()))?
            .with_required_confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .get_receipt()
            .await
            .map_err(|e| to_err(e.to_string()))?;

        if !receipt.status() {
            return Err(to_err(format!(
                "transaction {:#x} reverted",
                receipt.transaction_hash
            )));
        }

        debug!(
            "transaction {:#x} confirmed in block {:?}",
            receipt.transaction_hash, receipt.block_number
        );
        Ok(receipt)
    }
}

impl StakeChain for RpcChain {
    fn deployer_address(&self) -> Address {
        self.deployer
    }

    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_deploy_code(artifact.creation_code(&constructor_args));

        let receipt = self
            .send_and_confirm(tx, ScriptError::ContractDeployment)
            .await?;

        receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractDeployment(format!(
                "no contract address in receipt for {} deployment",
                artifact.contract
            ))
        })
    }

    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError> {
        let word = self
            .provider
            .get_storage_at(proxy, implementation_slot())
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(address_from_storage_word(word))
    }

    async fn upgrade_to_and_call(
        &self,
        proxy: Address,
        implementation: Address,
        data: Bytes,
    ) -> Result<(), ScriptError> {
        let calldata = upgradeToAndCallCall {
            newImplementation: implementation,
            data,
        }
        .abi_encode();

        let tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_to(proxy)
            .with_input(calldata);

        self.send_and_confirm(tx, ScriptError::ContractInteraction)
            .await?;
        Ok(())
    }

    async fn add_pool(&self, proxy: Address, pool: &PoolConfig) -> Result<(), ScriptError> {
        let calldata = addPoolCall {
            _stTokenAddress: pool.st_token_address,
            _poolWeight: pool.pool_weight,
            _minDepositAmount: pool.min_deposit_amount,
            _unstakeLockedBlocks: pool.unstake_locked_blocks,
            _withUpdate: false,
        }
        .abi_encode();

        let tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_to(proxy)
            .with_input(calldata);

        self.send_and_confirm(tx, ScriptError::ContractInteraction)
            .await?;
        info!("added pool for {:#x} to {:#x}", pool.st_token_address, proxy);
        Ok(())
    }

    async fn deposit_eth(&self, proxy: Address, amount: U256) -> Result<(), ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_to(proxy)
            .with_value(amount)
            .with_input(depositETHCall {}.abi_encode());

        self.send_and_confirm(tx, ScriptError::ContractInteraction)
            .await?;
        Ok(())
    }

    async fn read_stake_state(&self, proxy: Address) -> Result<StakeState, ScriptError> {
        let stake = IMetaNodeStake::new(proxy, self.provider.clone());
        let read_err = |e: alloy::contract::Error| ScriptError::ContractInteraction(e.to_string());

        let pool_length = stake.poolLength().call().await.map_err(read_err)?;
        let num_pools: u64 = pool_length
            .try_into()
            .map_err(|_| ScriptError::ContractInteraction("pool length overflows u64".into()))?;

        let mut pools = Vec::new();
        for pid in 0..num_pools {
            let pool = stake.pool(U256::from(pid)).call().await.map_err(read_err)?;
            pools.push(PoolState {
                st_token_address: pool.stTokenAddress,
                pool_weight: pool.poolWeight,
                last_reward_block: pool.lastRewardBlock,
                acc_metanode_per_st: pool.accMetaNodePerST,
                st_token_amount: pool.stTokenAmount,
                min_deposit_amount: pool.minDepositAmount,
                unstake_locked_blocks: pool.unstakeLockedBlocks,
            });
        }

        Ok(StakeState {
            metanode: stake.MetaNode().call().await.map_err(read_err)?,
            start_block: stake.startBlock().call().await.map_err(read_err)?,
            end_block: stake.endBlock().call().await.map_err(read_err)?,
            metanode_per_block: stake.MetaNodePerBlock().call().await.map_err(read_err)?,
            withdraw_paused: stake.withdrawPaused().call().await.map_err(read_err)?,
            claim_paused: stake.claimPaused().call().await.map_err(read_err)?,
            total_pool_weight: stake.totalPoolWeight().call().await.map_err(read_err)?,
            pools,
        })
    }
}
