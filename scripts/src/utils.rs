//! Utilities for the deploy & upgrade scripts

use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};

use crate::{
    constants::PROXY_IMPLEMENTATION_STORAGE_SLOT, solidity::IMetaNodeStake::initializeCall,
    types::StakeInitParams,
};

/// The ERC-1967 implementation slot as a storage key
pub fn implementation_slot() -> U256 {
    // The slot is a compile-time constant, so it always parses
    U256::from_str(PROXY_IMPLEMENTATION_STORAGE_SLOT).unwrap()
}

/// Extract the address stored in the low 20 bytes of a storage word
pub fn address_from_storage_word(word: U256) -> Address {
    Address::from_word(B256::from(word.to_be_bytes::<32>()))
}

/// Prepare calldata for the staking contract's `initialize` method
pub fn stake_initialize_calldata(params: &StakeInitParams) -> Bytes {
    initializeCall {
        _MetaNode: params.metanode,
        _startBlock: params.start_block,
        _endBlock: params.end_block,
        _MetaNodePerBlock: params.metanode_per_block,
    }
    .abi_encode()
    .into()
}

/// ABI-encode the `MetaNode(uint256 initialSupply)` constructor arguments
pub fn token_constructor_args(initial_supply: U256) -> Bytes {
    (initial_supply,).abi_encode_params().into()
}

/// ABI-encode the `ERC1967Proxy(address implementation, bytes data)` constructor arguments
pub fn proxy_constructor_args(implementation: Address, init_calldata: Bytes) -> Bytes {
    (implementation, init_calldata).abi_encode_params().into()
}
