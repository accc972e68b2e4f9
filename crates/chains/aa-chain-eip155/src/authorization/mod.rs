//! Signature-authorized execution messages.
//!
//! An owner signs an [`Authorization`] (or a [`BatchAuthorization`]) off-chain; anyone
//! may then submit it to the account, which executes it if the signature recovers
//! to the owner under the account's EIP-712 domain and the block time lies within
//! `[validAfter, validBefore)`.
//!
//! The domain is `{ name: "Wallet", version: "1", chainId, verifyingContract: account }`,
//! so a signature is bound to one account on one chain. There is no nonce: the same
//! signed message executes again if resubmitted inside its window.

pub mod client;

use aa_types::timestamp::UnixTimestamp;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use tracing::instrument;

use crate::chain::Eip155ChainReference;
use crate::error::ExecutionError;

pub use client::*;

/// EIP-712 domain name of every smart account.
pub const DOMAIN_NAME: &str = "Wallet";
/// EIP-712 domain version of every smart account.
pub const DOMAIN_VERSION: &str = "1";

sol! {
    /// Typed payload of `executeWithAuthorization`.
    #[derive(Debug, PartialEq, Eq)]
    struct ExecuteWithAuthorization {
        address to;
        uint256 value;
        bytes data;
        uint256 validAfter;
        uint256 validBefore;
    }

    /// Typed payload of `executeBatchWithAuthorization`.
    #[derive(Debug, PartialEq, Eq)]
    struct ExecuteBatchWithAuthorization {
        address[] to;
        uint256[] value;
        bytes[] data;
        uint256 validAfter;
        uint256 validBefore;
    }
}

/// The EIP-712 domain of the account at `account`.
pub fn account_domain(chain: &Eip155ChainReference, account: Address) -> Eip712Domain {
    eip712_domain! {
        name: DOMAIN_NAME,
        version: DOMAIN_VERSION,
        chain_id: chain.inner(),
        verifying_contract: account,
    }
}

/// Validates that `now` lies within `[valid_after, valid_before)`.
#[instrument(skip_all, err)]
pub fn assert_time(
    now: UnixTimestamp,
    valid_after: UnixTimestamp,
    valid_before: UnixTimestamp,
) -> Result<(), ExecutionError> {
    if now < valid_after {
        return Err(ExecutionError::AuthorizationNotYetValid { valid_after, now });
    }
    if now >= valid_before {
        return Err(ExecutionError::AuthorizationExpired { valid_before, now });
    }
    Ok(())
}

/// Converts an ABI `uint256` time bound, saturating at `u64::MAX`.
pub fn timestamp_from_u256(value: U256) -> UnixTimestamp {
    UnixTimestamp::from_secs(u64::try_from(value).unwrap_or(u64::MAX))
}

/// A single call, as executed by an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Unsigned message authorizing one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
}

impl Authorization {
    pub fn payload(&self) -> ExecuteWithAuthorization {
        ExecuteWithAuthorization {
            to: self.to,
            value: self.value,
            data: self.data.clone(),
            validAfter: U256::from(self.valid_after.as_secs()),
            validBefore: U256::from(self.valid_before.as_secs()),
        }
    }

    pub fn signing_hash(&self, domain: &Eip712Domain) -> alloy_primitives::B256 {
        self.payload().eip712_signing_hash(domain)
    }
}

/// Unsigned message authorizing an ordered batch of calls under one validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAuthorization {
    pub to: Vec<Address>,
    pub value: Vec<U256>,
    pub data: Vec<Bytes>,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
}

impl BatchAuthorization {
    pub fn from_calls(
        calls: impl IntoIterator<Item = Call>,
        valid_after: UnixTimestamp,
        valid_before: UnixTimestamp,
    ) -> Self {
        let mut batch = BatchAuthorization {
            to: Vec::new(),
            value: Vec::new(),
            data: Vec::new(),
            valid_after,
            valid_before,
        };
        for call in calls {
            batch.to.push(call.to);
            batch.value.push(call.value);
            batch.data.push(call.data);
        }
        batch
    }

    pub fn payload(&self) -> ExecuteBatchWithAuthorization {
        ExecuteBatchWithAuthorization {
            to: self.to.clone(),
            value: self.value.clone(),
            data: self.data.clone(),
            validAfter: U256::from(self.valid_after.as_secs()),
            validBefore: U256::from(self.valid_before.as_secs()),
        }
    }

    pub fn signing_hash(&self, domain: &Eip712Domain) -> alloy_primitives::B256 {
        self.payload().eip712_signing_hash(domain)
    }
}

/// Zips parallel batch arrays into calls, rejecting arrays of differing lengths.
pub fn zip_calls(
    to: &[Address],
    value: &[U256],
    data: &[Bytes],
) -> Result<Vec<Call>, ExecutionError> {
    if to.len() != value.len() || to.len() != data.len() {
        return Err(ExecutionError::LengthMismatch {
            to: to.len(),
            value: value.len(),
            data: data.len(),
        });
    }
    Ok(to
        .iter()
        .zip(value)
        .zip(data)
        .map(|((to, value), data)| Call {
            to: *to,
            value: *value,
            data: data.clone(),
        })
        .collect())
}

/// An authorization together with the owner's signature over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed<A> {
    pub authorization: A,
    pub signature: Bytes,
}
