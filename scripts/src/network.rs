//! Network configuration: which node to talk to, with which key, at which gas price

use std::{
    env,
    fmt::{self, Display},
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use clap::ValueEnum;

use crate::{
    constants::{
        CACHE_DIR_NAME, DEFAULT_DEPLOYMENTS_DIR, DEPLOYMENTS_FILE_NAME, DEV_MNEMONIC,
        LOCALHOST_CHAIN_ID, LOCALHOST_RPC_URL, PRIVATE_KEY_ENV_VAR,
        SEPOLIA_CHAIN_ID, SEPOLIA_GAS_PRICE, SEPOLIA_RPC_URL_ENV_VAR,
    },
    errors::ScriptError,
};

/// The networks the scripts can deploy to
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Network {
    /// A local Anvil or Hardhat node
    #[default]
    Localhost,
    /// The Sepolia testnet
    Sepolia,
}

impl Network {
    /// The chain ID the network's node must report
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Localhost => LOCALHOST_CHAIN_ID,
            Network::Sepolia => SEPOLIA_CHAIN_ID,
        }
    }

    /// The fixed gas price to send transactions with, if the network pins one
    pub fn gas_price(&self) -> Option<u128> {
        match self {
            Network::Localhost => None,
            Network::Sepolia => Some(SEPOLIA_GAS_PRICE),
        }
    }

    /// The RPC URL used when none is given explicitly
    pub fn default_rpc_url(&self) -> Option<String> {
        match self {
            Network::Localhost => Some(LOCALHOST_RPC_URL.to_string()),
            Network::Sepolia => env::var(SEPOLIA_RPC_URL_ENV_VAR).ok(),
        }
    }

    /// The directory this network's cache artifacts and registry live in,
    /// e.g. `deployments/sepolia`
    pub fn deployments_dir(&self) -> PathBuf {
        Path::new(DEFAULT_DEPLOYMENTS_DIR).join(self.to_string())
    }

    /// The default cache directory for this network
    pub fn cache_dir(&self) -> PathBuf {
        self.deployments_dir().join(CACHE_DIR_NAME)
    }

    /// The default registry path for this network
    pub fn deployments_path(&self) -> PathBuf {
        self.deployments_dir().join(DEPLOYMENTS_FILE_NAME)
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Localhost => write!(f, "localhost"),
            Network::Sepolia => write!(f, "sepolia"),
        }
    }
}

/// A fully resolved network configuration
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// The network being targeted
    pub network: Network,
    /// The RPC URL of the network's node
    pub rpc_url: String,
    /// The key deployments are signed with
    pub signer: PrivateKeySigner,
    /// The chain ID the node must report
    pub chain_id: u64,
    /// The fixed gas price to send transactions with, if any
    pub gas_price: Option<u128>,
}

impl NetworkConfig {
    /// Resolve the configuration for `network`.
    ///
    /// An explicit private key always wins. Without one, the local network signs
    /// with account `account_index` of the development mnemonic, while remote
    /// networks refuse to guess.
    pub fn resolve(
        network: Network,
        rpc_url: Option<String>,
        priv_key: Option<&str>,
        account_index: u32,
    ) -> Result<Self, ScriptError> {
        let rpc_url = rpc_url
            .or_else(|| network.default_rpc_url())
            .ok_or_else(|| {
                ScriptError::ClientInitialization(format!(
                    "no RPC URL for {}, set {}",
                    network, SEPOLIA_RPC_URL_ENV_VAR
                ))
            })?;

        let signer = match (priv_key, network) {
            (Some(key), _) => PrivateKeySigner::from_str(key)
                .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?,
            (None, Network::Localhost) => dev_account(account_index)?,
            (None, Network::Sepolia) => {
                return Err(ScriptError::ClientInitialization(format!(
                    "no deployer key for {}, set {}",
                    network, PRIVATE_KEY_ENV_VAR
                )))
            }
        };

        Ok(Self {
            network,
            rpc_url,
            signer,
            chain_id: network.chain_id(),
            gas_price: network.gas_price(),
        })
    }
}

/// The signer for account `index` of the local development mnemonic
pub fn dev_account(index: u32) -> Result<PrivateKeySigner, ScriptError> {
    MnemonicBuilder::<English>::default()
        .phrase(DEV_MNEMONIC)
        .index(index)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?
        .build()
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    #[test]
    fn test_localhost_defaults_to_first_dev_account() {
        let config = NetworkConfig::resolve(Network::Localhost, None, None, 0).unwrap();

        assert_eq!(config.rpc_url, LOCALHOST_RPC_URL);
        assert_eq!(config.chain_id, LOCALHOST_CHAIN_ID);
        assert_eq!(config.gas_price, None);
        assert_eq!(
            config.signer.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn test_account_index_selects_dev_account() {
        let config = NetworkConfig::resolve(Network::Localhost, None, None, 1).unwrap();
        assert_eq!(
            config.signer.address(),
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn test_sepolia_requires_url_and_key() {
        assert!(matches!(
            NetworkConfig::resolve(Network::Sepolia, None, None, 0),
            Err(ScriptError::ClientInitialization(_))
        ));
        assert!(matches!(
            NetworkConfig::resolve(
                Network::Sepolia,
                Some("https://sepolia.example".to_string()),
                None,
                0
            ),
            Err(ScriptError::ClientInitialization(_))
        ));
    }

    #[test]
    fn test_state_paths_are_scoped_by_network() {
        assert_eq!(
            Network::Localhost.cache_dir(),
            Path::new("deployments/localhost/cache")
        );
        assert_eq!(
            Network::Sepolia.deployments_path(),
            Path::new("deployments/sepolia/deployments.json")
        );
        assert_ne!(Network::Localhost.cache_dir(), Network::Sepolia.cache_dir());
    }

    #[test]
    fn test_sepolia_pins_chain_and_gas_price() {
        let key = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
        let config = NetworkConfig::resolve(
            Network::Sepolia,
            Some("https://sepolia.example".to_string()),
            Some(key),
            0,
        )
        .unwrap();

        assert_eq!(config.chain_id, 11_155_111);
        assert_eq!(config.gas_price, Some(30_000_000_000));
        assert_eq!(
            config.signer.address(),
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }
}
