//! Implementations of the deploy & upgrade pipelines
//!
//! Each pipeline is a strictly sequential chain of fallible steps. A failed
//! remote call short-circuits the pipeline before anything is persisted, so
//! the cache and registry only ever hold records of completed steps. Each
//! pipeline holds the lock on its cache key from before its first transaction
//! until its record is written.

use alloy_primitives::{Address, Bytes};
use tracing::{info, warn};

use crate::{
    artifacts::ArtifactStore,
    cache::{CacheLock, CacheStore},
    chain::StakeChain,
    errors::ScriptError,
    registry::DeploymentRegistry,
    types::{DeploymentRecord, NamedDeployment, StakeContract, StakeDeployParams, VersionTag},
    utils::{proxy_constructor_args, stake_initialize_calldata, token_constructor_args},
};

/// The local state the pipelines read from and write to
#[derive(Clone, Debug)]
pub struct DeployContext {
    /// The compiled contract artifacts
    pub artifacts: ArtifactStore,
    /// The per-version cache artifacts
    pub cache: CacheStore,
    /// The named deployment registry
    pub registry: DeploymentRegistry,
}

/// Deploy the MetaNode token and the V1 staking contract behind an ERC-1967
/// proxy, then record the deployment under [`VersionTag::V1`].
///
/// A previous V1 record is overwritten.
pub async fn deploy_stake(
    params: StakeDeployParams,
    chain: &impl StakeChain,
    ctx: &mut DeployContext,
) -> Result<DeploymentRecord, ScriptError> {
    let tag = VersionTag::V1;
    params.validate()?;
    let lock = ctx.cache.lock(tag)?;
    info!("deployer's account: {:#x}", chain.deployer_address());

    // Load every artifact up front so a missing one fails before any transaction
    let token_artifact = ctx.artifacts.load(StakeContract::MetaNode)?;
    let stake_artifact = ctx.artifacts.load(tag.stake_contract())?;
    let proxy_artifact = ctx.artifacts.load(StakeContract::Erc1967Proxy)?;
    let abi = stake_artifact.abi_json()?;

    let token_address = chain
        .deploy(&token_artifact, token_constructor_args(params.initial_supply))
        .await?;
    info!("MetaNode deployed to: {:#x}", token_address);

    let stake_impl_address = chain.deploy(&stake_artifact, Bytes::new()).await?;
    info!("MetaNodeStake implementation deployed to: {:#x}", stake_impl_address);

    // The proxy constructor delegates to `initialize`, so the initializer runs
    // exactly once, in the same transaction that creates the proxy
    let init_calldata = stake_initialize_calldata(&params.init_params(token_address));
    let proxy_address = chain
        .deploy(
            &proxy_artifact,
            proxy_constructor_args(stake_impl_address, init_calldata),
        )
        .await?;
    info!("MetaNodeStake proxy address: {:#x}", proxy_address);

    let implementation_address = chain.implementation_address(proxy_address).await?;
    info!("MetaNodeStake implementation address: {:#x}", implementation_address);
    check_proxy(proxy_address, implementation_address)?;
    if implementation_address != stake_impl_address {
        return Err(ScriptError::InvalidProxy(format!(
            "proxy {:#x} points at {:#x}, expected {:#x}",
            proxy_address, implementation_address, stake_impl_address
        )));
    }

    let record = DeploymentRecord {
        proxy_address,
        implementation_address,
        abi,
    };
    persist(&lock, &record, ctx)?;

    Ok(record)
}

/// Upgrade the staking proxy recorded under [`VersionTag::V1`] to the V2
/// implementation, then record the result under [`VersionTag::V2`].
///
/// Fails with [`ScriptError::MissingPrerequisite`] before touching the chain if
/// no V1 record exists, and with [`ScriptError::InvalidProxy`] before deploying
/// anything if the recorded proxy does not hold the recorded implementation on
/// this chain.
pub async fn upgrade_stake(
    chain: &impl StakeChain,
    ctx: &mut DeployContext,
) -> Result<DeploymentRecord, ScriptError> {
    let tag = VersionTag::V2;
    let previous = ctx.cache.read(VersionTag::V1)?;
    let lock = ctx.cache.lock(tag)?;
    info!("deployer's account: {:#x}", chain.deployer_address());
    info!(
        "upgrading MetaNodeStake proxy {:#x} from implementation {:#x}",
        previous.proxy_address, previous.implementation_address
    );

    let stake_artifact = ctx.artifacts.load(tag.stake_contract())?;
    let abi = stake_artifact.abi_json()?;

    let current_impl = chain.implementation_address(previous.proxy_address).await?;
    if current_impl != previous.implementation_address {
        return Err(ScriptError::InvalidProxy(format!(
            "proxy {:#x} holds implementation {:#x} but the V1 record says {:#x}, \
             was it deployed to another network?",
            previous.proxy_address, current_impl, previous.implementation_address
        )));
    }

    let new_impl_address = chain.deploy(&stake_artifact, Bytes::new()).await?;
    info!("MetaNodeStakeV2 implementation deployed to: {:#x}", new_impl_address);

    chain
        .upgrade_to_and_call(previous.proxy_address, new_impl_address, Bytes::new())
        .await?;

    // The proxy keeps its address across the upgrade; only the slot changes
    let proxy_address = previous.proxy_address;
    let implementation_address = chain.implementation_address(proxy_address).await?;
    info!("MetaNodeStake upgraded to: {:#x}", proxy_address);
    info!("MetaNodeStake implementation address: {:#x}", implementation_address);

    let record = DeploymentRecord {
        proxy_address,
        implementation_address,
        abi,
    };
    check_upgrade(&previous, &record)?;
    if implementation_address != new_impl_address {
        return Err(ScriptError::InvalidProxy(format!(
            "proxy {:#x} points at {:#x} after upgrading to {:#x}",
            proxy_address, implementation_address, new_impl_address
        )));
    }

    persist(&lock, &record, ctx)?;

    Ok(record)
}

/// Read the cached record for `tag`, cross-checking it against the registry
pub fn show_deployment(
    tag: VersionTag,
    ctx: &DeployContext,
) -> Result<DeploymentRecord, ScriptError> {
    let record = ctx.cache.read(tag)?;

    match ctx.registry.get(tag.deployment_name()) {
        Ok(entry) if *entry != NamedDeployment::from(&record) => warn!(
            "registry entry {} ({:#x}, impl {:#x}) disagrees with the cache",
            tag.deployment_name(),
            entry.address,
            entry.implementation
        ),
        Ok(_) => {}
        Err(_) => warn!("{} is cached but not registered", tag.deployment_name()),
    }

    info!("{} proxy address: {:#x}", tag, record.proxy_address);
    info!("{} implementation address: {:#x}", tag, record.implementation_address);
    Ok(record)
}

/// Check that a proxy and its implementation are distinct, non-zero addresses
pub fn check_proxy(proxy: Address, implementation: Address) -> Result<(), ScriptError> {
    if proxy.is_zero() || implementation.is_zero() {
        return Err(ScriptError::InvalidProxy(format!(
            "proxy {:#x} has implementation {:#x}",
            proxy, implementation
        )));
    }
    if proxy == implementation {
        return Err(ScriptError::InvalidProxy(format!(
            "proxy and implementation share the address {:#x}",
            proxy
        )));
    }

    Ok(())
}

/// Check that an upgrade kept the proxy's identity and swapped its implementation
pub fn check_upgrade(
    before: &DeploymentRecord,
    after: &DeploymentRecord,
) -> Result<(), ScriptError> {
    if before.proxy_address != after.proxy_address {
        return Err(ScriptError::ProxyIdentityMismatch {
            before: before.proxy_address,
            after: after.proxy_address,
        });
    }
    if before.implementation_address == after.implementation_address {
        return Err(ScriptError::UpgradeNoop(after.implementation_address));
    }

    check_proxy(after.proxy_address, after.implementation_address)
}

/// Write `record` to the cache and registry under the version `lock` guards
fn persist(
    lock: &CacheLock,
    record: &DeploymentRecord,
    ctx: &mut DeployContext,
) -> Result<(), ScriptError> {
    let tag = lock.tag();
    ctx.cache.write(lock, record)?;
    info!("saved {} cache artifact to {}", tag, ctx.cache.path_of(tag).display());

    ctx.registry
        .save(tag.deployment_name(), NamedDeployment::from(record))
}
