//! Utilities for running integration tests

use std::path::Path;

use alloy::{primitives::U256, providers::ext::AnvilApi};
use eyre::{ensure, Result};
use stake_scripts::{
    artifacts::ArtifactStore, cache::CacheStore, chain::RpcChain, commands::DeployContext,
    registry::DeploymentRegistry, types::VersionTag,
};

/// Open a deploy context whose cache & registry live under `workdir`
pub(crate) fn scratch_context(artifacts_dir: &Path, workdir: &Path) -> Result<DeployContext> {
    Ok(DeployContext {
        artifacts: ArtifactStore::new(artifacts_dir),
        cache: CacheStore::new(workdir.join("cache")),
        registry: DeploymentRegistry::open(workdir.join("deployments.json"))?,
    })
}

/// Forget every cached record and registered deployment
pub(crate) fn reset_context(ctx: &mut DeployContext) -> Result<()> {
    ctx.registry.reset()?;
    for tag in [VersionTag::V1, VersionTag::V2] {
        ctx.cache.remove(tag)?;
    }

    Ok(())
}

/// Take a snapshot of the node's state
pub(crate) async fn snapshot_node(chain: &RpcChain) -> Result<U256> {
    let id = chain.provider().anvil_snapshot().await?;
    Ok(id)
}

/// Revert the node to the given snapshot
pub(crate) async fn revert_node(chain: &RpcChain, snapshot: U256) -> Result<()> {
    let reverted = chain.provider().anvil_revert(snapshot).await?;
    ensure!(reverted, "node failed to revert to snapshot {snapshot}");
    Ok(())
}
