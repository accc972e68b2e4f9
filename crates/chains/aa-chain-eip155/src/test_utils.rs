//! Fixtures shared by the unit tests of this crate.

use aa_types::timestamp::UnixTimestamp;
use alloy_primitives::{Address, Bytes, U256, b256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolCall, SolValue, sol};

use crate::chain::{Chain, Eip155ChainReference, Storage};
use crate::contract::{Contract, ContractDescriptor, Frame};
use crate::deployment::Deployment;
use crate::error::ExecutionError;

pub const CHAIN_ID: u64 = 100009;
pub const GENESIS_TIME: u64 = 1_700_000_000;

pub const DEPLOYER: Address = Address::with_last_byte(0xde);
pub const RELAYER: Address = Address::with_last_byte(0x4e);

sol! {
    interface ICounter {
        function increment() external returns (uint256);
    }
}

pub fn chain_at(timestamp: u64) -> Chain {
    Chain::new(Eip155ChainReference::new(CHAIN_ID))
        .with_timestamp(UnixTimestamp::from_secs(timestamp))
}

/// Well-known development keys.
pub fn owner_signer() -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&b256!(
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
    ))
    .unwrap()
}

pub fn stranger_signer() -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&b256!(
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
    ))
    .unwrap()
}

pub fn recipient() -> Address {
    PrivateKeySigner::from_bytes(&b256!(
        "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a"
    ))
    .unwrap()
    .address()
}

/// A chain with a fully initialized factory.
pub fn bootstrapped() -> (Chain, Deployment) {
    let mut chain = chain_at(GENESIS_TIME);
    let deployment = Deployment::bootstrap(&mut chain, DEPLOYER).unwrap();
    (chain, deployment)
}

/// Reverts on every call, including plain value transfers.
#[derive(Debug)]
pub struct Reverter;

impl Contract for Reverter {
    fn descriptor(&self) -> ContractDescriptor {
        ContractDescriptor::new("Reverter", "1")
    }

    fn call(
        &self,
        _chain: &mut Chain,
        _frame: &Frame,
        _data: &[u8],
    ) -> Result<Bytes, ExecutionError> {
        Err(ExecutionError::Reverted("always".into()))
    }
}

/// Increments slot zero and returns the new value.
#[derive(Debug)]
pub struct Counter;

impl Counter {
    pub fn increment() -> Bytes {
        ICounter::incrementCall {}.abi_encode().into()
    }

    pub fn decode(output: &[u8]) -> u64 {
        U256::abi_decode(output).unwrap().to::<u64>()
    }

    pub fn value(chain: &Chain, address: Address) -> u64 {
        match chain.storage(address) {
            Some(Storage::Counter(value)) => value.to::<u64>(),
            _ => 0,
        }
    }
}

impl Contract for Counter {
    fn descriptor(&self) -> ContractDescriptor {
        ContractDescriptor::new("Counter", "1")
    }

    fn call(&self, chain: &mut Chain, frame: &Frame, data: &[u8]) -> Result<Bytes, ExecutionError> {
        if data.is_empty() {
            return Ok(Bytes::new());
        }
        ICounter::incrementCall::abi_decode(data)
            .map_err(|e| ExecutionError::InvalidCalldata(e.to_string()))?;
        let storage = chain.storage_mut(frame.address);
        if storage.is_empty() {
            *storage = Storage::Counter(U256::ZERO);
        }
        let Storage::Counter(value) = storage else {
            return Err(ExecutionError::StorageLayoutMismatch(frame.address));
        };
        *value += U256::from(1);
        Ok(value.abi_encode().into())
    }
}
