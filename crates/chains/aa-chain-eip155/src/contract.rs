//! Contract logic and code identity.
//!
//! Logic contracts are native Rust types implementing [`Contract`]. Calldata is
//! ABI-encoded, so contracts call each other (and themselves) exactly as they would
//! on an EVM chain. The code at an address is either such logic or an ERC-1967-style
//! proxy that forwards every call to its current implementation while keeping storage
//! at the proxy address.

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use crate::chain::Chain;
use crate::error::ExecutionError;

/// Kind reported by the proxy code itself.
pub const ACCOUNT_PROXY: &str = "ERC1967Proxy";

/// Stable identity of a piece of code: its kind and version.
///
/// The keccak256 of its JSON serialization plays the role of the code hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContractDescriptor {
    pub kind: Cow<'static, str>,
    pub version: Cow<'static, str>,
}

impl ContractDescriptor {
    pub fn new(kind: impl Into<Cow<'static, str>>, version: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: kind.into(),
            version: version.into(),
        }
    }

    pub fn proxy() -> Self {
        Self::new(ACCOUNT_PROXY, "1")
    }

    /// Canonical serialized form.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::json!({ "kind": self.kind, "version": self.version })
            .to_string()
            .into_bytes()
    }

    pub fn code_hash(&self) -> B256 {
        keccak256(self.encode())
    }
}

impl Display for ContractDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.kind, self.version)
    }
}

/// Execution context of a single call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Address whose balance and storage the code runs against.
    pub address: Address,
    /// Address the running code was loaded from. Differs from `address` behind a proxy.
    pub code_address: Address,
    pub caller: Address,
    pub value: U256,
}

impl Frame {
    pub fn is_delegated(&self) -> bool {
        self.address != self.code_address
    }
}

/// Logic deployed at an address.
pub trait Contract: Debug + Send + Sync {
    fn descriptor(&self) -> ContractDescriptor;

    /// Handles ABI-encoded `data` in the context of `frame`.
    ///
    /// Empty `data` is a plain value transfer.
    fn call(&self, chain: &mut Chain, frame: &Frame, data: &[u8]) -> Result<Bytes, ExecutionError>;
}

/// Code stored at an address.
#[derive(Debug, Clone)]
pub enum Code {
    Logic(Arc<dyn Contract>),
    Proxy { implementation: Address },
}

impl Code {
    pub fn logic<C: Contract + 'static>(contract: C) -> Self {
        Code::Logic(Arc::new(contract))
    }

    pub fn descriptor(&self) -> ContractDescriptor {
        match self {
            Code::Logic(contract) => contract.descriptor(),
            Code::Proxy { .. } => ContractDescriptor::proxy(),
        }
    }

    pub fn code_hash(&self) -> B256 {
        self.descriptor().code_hash()
    }
}

/// Decodes the 4-byte selector of `data`, if present.
pub fn selector_of(data: &[u8]) -> Result<[u8; 4], ExecutionError> {
    data.get(..4)
        .and_then(|s| <[u8; 4]>::try_from(s).ok())
        .ok_or_else(|| ExecutionError::InvalidCalldata(format!("{} bytes", data.len())))
}
