//! Loading of compiled contract artifacts
//!
//! Artifacts are the JSON files emitted by Hardhat (`{ "abi": [...], "bytecode": "0x..." }`)
//! or Foundry (`{ "abi": [...], "bytecode": { "object": "0x..." } }`).

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use alloy::json_abi::JsonAbi;
use alloy_primitives::{hex, Bytes};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{errors::ScriptError, types::StakeContract};

/// The subset of a compilation artifact the scripts make use of
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    /// The contract this artifact was compiled from
    pub contract: StakeContract,
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// The ABI as a compact JSON string, the form stored in cache artifacts
    pub fn abi_json(&self) -> Result<String, ScriptError> {
        serde_json::to_string(&self.abi).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))
    }

    /// The creation code for a deployment, i.e. the bytecode followed by the
    /// ABI-encoded constructor arguments
    pub fn creation_code(&self, constructor_args: &[u8]) -> Bytes {
        [&self.bytecode[..], constructor_args].concat().into()
    }
}

/// The raw artifact layout shared by Hardhat and Foundry
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract's ABI
    abi: JsonAbi,
    /// Either a hex string or an object with an `object` hex field
    bytecode: Value,
}

/// A directory of compiled contract artifacts
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    /// The root of the artifacts directory
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at the given artifacts directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root of the artifacts directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The full path of the given contract's artifact
    pub fn path_of(&self, contract: StakeContract) -> PathBuf {
        self.root.join(contract.artifact_path())
    }

    /// Load and parse the given contract's artifact
    pub fn load(&self, contract: StakeContract) -> Result<ContractArtifact, ScriptError> {
        let path = self.path_of(contract);
        debug!("loading {} artifact from {}", contract, path.display());

        let contents = fs::read_to_string(&path).map_err(|e| {
            let hint = match (contract, e.kind()) {
                (StakeContract::Erc1967Proxy, ErrorKind::NotFound) => {
                    ", import ERC1967Proxy.sol from a contract source so Hardhat compiles it"
                }
                _ => "",
            };
            ScriptError::ArtifactParsing(format!("{}: {}{}", path.display(), e, hint))
        })?;
        let raw: RawArtifact = serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        let bytecode_hex = match &raw.bytecode {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => obj.get("object").and_then(Value::as_str).ok_or_else(|| {
                ScriptError::ArtifactParsing(format!(
                    "{}: bytecode object has no `object` field",
                    path.display()
                ))
            })?,
            _ => {
                return Err(ScriptError::ArtifactParsing(format!(
                    "{}: unexpected bytecode format",
                    path.display()
                )))
            }
        };

        let bytecode = hex::decode(bytecode_hex)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{}: {} has no creation bytecode, is it abstract?",
                path.display(),
                contract
            )));
        }

        Ok(ContractArtifact {
            contract,
            abi: raw.abi,
            bytecode: bytecode.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write an artifact with the given JSON body for `contract` under `root`
    fn write_artifact(root: &Path, contract: StakeContract, body: &str) {
        let path = root.join(contract.artifact_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_load_hardhat_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(
            dir.path(),
            StakeContract::MetaNode,
            r#"{"contractName":"MetaNode","abi":[],"bytecode":"0x6080604052"}"#,
        );

        let artifact = ArtifactStore::new(dir.path()).load(StakeContract::MetaNode).unwrap();
        assert_eq!(&artifact.bytecode[..], &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(artifact.abi_json().unwrap(), "[]");
    }

    #[test]
    fn test_load_foundry_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(
            dir.path(),
            StakeContract::Erc1967Proxy,
            r#"{"abi":[],"bytecode":{"object":"0x60ff","sourceMap":""}}"#,
        );

        let artifact = ArtifactStore::new(dir.path()).load(StakeContract::Erc1967Proxy).unwrap();
        assert_eq!(&artifact.creation_code(&[0x01])[..], &[0x60, 0xff, 0x01]);
    }

    #[test]
    fn test_missing_and_empty_artifacts_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load(StakeContract::MetaNodeStake),
            Err(ScriptError::ArtifactParsing(_))
        ));

        write_artifact(dir.path(), StakeContract::MetaNodeStake, r#"{"abi":[],"bytecode":"0x"}"#);
        assert!(matches!(
            store.load(StakeContract::MetaNodeStake),
            Err(ScriptError::ArtifactParsing(_))
        ));
    }

    #[test]
    fn test_missing_proxy_artifact_explains_import() {
        let dir = tempfile::tempdir().unwrap();

        match ArtifactStore::new(dir.path()).load(StakeContract::Erc1967Proxy) {
            Err(ScriptError::ArtifactParsing(msg)) => assert!(msg.contains("import ERC1967Proxy.sol")),
            other => panic!("expected a parsing error, got {:?}", other.map(|a| a.contract)),
        }
    }
}
