//! Integration tests for the MetaNode staking scripts. These assume that an
//! Anvil node is already running locally.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

mod cli;
mod constants;
mod test_inventory;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use eyre::{eyre, Result};
use stake_scripts::{
    chain::RpcChain,
    network::{Network, NetworkConfig},
};
use test_inventory::{IntegrationTest, TestArgs};
use utils::{reset_context, revert_node, scratch_context, snapshot_node};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt().pretty().init();
    }

    let config = NetworkConfig::resolve(
        Network::Localhost,
        Some(cli.rpc_url.clone()),
        cli.priv_key.as_deref(),
        0, // account_index
    )?;
    let chain = RpcChain::connect(&config).await?;

    let workdir = tempfile::tempdir()?;
    let mut args = TestArgs {
        chain,
        ctx: scratch_context(&cli.artifacts_dir, workdir.path())?,
    };

    let tests: Vec<&IntegrationTest> = inventory::iter::<IntegrationTest>
        .into_iter()
        .filter(|test| cli.test.as_deref().map_or(true, |name| name == test.name))
        .collect();
    if tests.is_empty() {
        return Err(eyre!("no test named {}", cli.test.unwrap_or_default()));
    }

    let mut failed = 0;
    for test in tests.iter() {
        reset_context(&mut args.ctx)?;
        let snapshot = snapshot_node(&args.chain).await?;
        let res = (test.test_fn)(args.clone()).await;
        revert_node(&args.chain, snapshot).await?;

        match res {
            Ok(()) => println!("{} {}", "PASS".green().bold(), test.name),
            Err(e) => {
                failed += 1;
                println!("{} {}: {:?}", "FAIL".red().bold(), test.name, e);
            }
        }
    }

    let summary = format!("{} passed, {} failed", tests.len() - failed, failed);
    if failed > 0 {
        println!("{}", summary.red());
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", summary.green());
    Ok(ExitCode::SUCCESS)
}
