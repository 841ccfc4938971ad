//! Scripts for deploying and upgrading the MetaNode staking contracts.
//!
//! The V1 deployment creates the MetaNode token and the staking contract behind
//! an ERC-1967 proxy, the V2 upgrade swaps the proxy's implementation. Each step
//! leaves a cache artifact for the next one and registers itself by name.

#![deny(missing_docs)]

pub mod artifacts;
pub mod cache;
pub mod chain;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod errors;
pub mod network;
pub mod registry;
mod solidity;
pub mod types;
pub mod utils;
