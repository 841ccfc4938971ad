//! Definitions of errors that can occur during the execution of the deploy & upgrade scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

use alloy_primitives::Address;

use crate::types::VersionTag;

/// Errors that can occur during the execution of the deploy & upgrade scripts
#[derive(Debug)]
pub enum ScriptError {
    /// A step was invoked before the cache artifact it depends on was written
    MissingPrerequisite {
        /// The version tag of the missing artifact
        tag: VersionTag,
        /// The path at which the artifact was expected
        path: PathBuf,
    },
    /// A cache artifact exists but could not be read or parsed
    CacheParse {
        /// The path of the offending artifact
        path: PathBuf,
        /// The underlying error
        reason: String,
    },
    /// Error writing a cache artifact
    CacheWrite(String),
    /// Another run holds the lock file of a cache artifact
    CacheLocked(PathBuf),
    /// Error reading the `deployments.json` file
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    WriteDeployments(String),
    /// No deployment is registered under the given name
    UnknownDeployment(String),
    /// Error parsing a Solidity compilation artifact
    ArtifactParsing(String),
    /// Error loading a `.env` file
    EnvFile(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// The node reported a different chain ID than the network is configured for
    ChainIdMismatch {
        /// The chain ID the network is configured for
        expected: u64,
        /// The chain ID reported by the node
        actual: u64,
    },
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// The proxy address changed across an upgrade
    ProxyIdentityMismatch {
        /// The proxy address before the upgrade
        before: Address,
        /// The proxy address after the upgrade
        after: Address,
    },
    /// An upgrade left the implementation address unchanged
    UpgradeNoop(Address),
    /// A proxy does not point at a distinct, non-zero implementation
    InvalidProxy(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::MissingPrerequisite { tag, path } => write!(
                f,
                "missing {} cache artifact at {}, run the {} step first",
                tag,
                path.display(),
                tag
            ),
            ScriptError::CacheParse { path, reason } => {
                write!(f, "error parsing cache artifact {}: {}", path.display(), reason)
            }
            ScriptError::CacheWrite(s) => write!(f, "error writing cache artifact: {}", s),
            ScriptError::CacheLocked(path) => write!(
                f,
                "cache lock {} is held by another run, delete it if no other run is active",
                path.display()
            ),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::UnknownDeployment(name) => {
                write!(f, "no deployment registered under `{}`", name)
            }
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::EnvFile(s) => write!(f, "error loading .env file: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ChainIdMismatch { expected, actual } => write!(
                f,
                "connected to chain {} but the network expects chain {}",
                actual, expected
            ),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::ProxyIdentityMismatch { before, after } => write!(
                f,
                "proxy address changed across upgrade: {:#x} -> {:#x}",
                before, after
            ),
            ScriptError::UpgradeNoop(implementation) => write!(
                f,
                "upgrade left the implementation unchanged at {:#x}",
                implementation
            ),
            ScriptError::InvalidProxy(s) => write!(f, "invalid proxy: {}", s),
        }
    }
}

impl Error for ScriptError {}
