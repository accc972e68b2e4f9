//! Client-side signing of authorizations.
//!
//! # Usage
//!
//! ```ignore
//! use aa_chain_eip155::authorization::{Authorization, sign_authorization};
//! use alloy_signer_local::PrivateKeySigner;
//!
//! let owner = PrivateKeySigner::random();
//! let signed = sign_authorization(&owner, &chain, account, authorization).await?;
//! ```

use alloy_primitives::{Address, FixedBytes, Signature};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::Arc;

use crate::authorization::{Authorization, BatchAuthorization, Signed, account_domain};
use crate::chain::Eip155ChainReference;

/// A trait that abstracts signing operations, allowing both owned signers and Arc-wrapped signers.
///
/// Alloy's `Signer` trait is not implemented for `Arc<T>`, but signers are often
/// shared via `Arc` since `PrivateKeySigner` is not `Clone`-friendly across tasks.
#[async_trait]
pub trait SignerLike {
    /// Returns the address of the signer.
    fn address(&self) -> Address;

    /// Signs the given hash.
    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error>;
}

#[async_trait]
impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

#[async_trait]
impl<T: SignerLike + Send + Sync> SignerLike for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_hash(hash).await
    }
}

/// Signs `authorization` for the account at `account` on `chain`.
pub async fn sign_authorization<S: SignerLike + Sync>(
    signer: &S,
    chain: &Eip155ChainReference,
    account: Address,
    authorization: Authorization,
) -> Result<Signed<Authorization>, alloy_signer::Error> {
    let hash = authorization.signing_hash(&account_domain(chain, account));
    let signature = signer.sign_hash(&hash).await?;
    Ok(Signed {
        authorization,
        signature: signature.as_bytes().into(),
    })
}

/// Signs a batch `authorization` for the account at `account` on `chain`.
pub async fn sign_batch_authorization<S: SignerLike + Sync>(
    signer: &S,
    chain: &Eip155ChainReference,
    account: Address,
    authorization: BatchAuthorization,
) -> Result<Signed<BatchAuthorization>, alloy_signer::Error> {
    let hash = authorization.signing_hash(&account_domain(chain, account));
    let signature = signer.sign_hash(&hash).await?;
    Ok(Signed {
        authorization,
        signature: signature.as_bytes().into(),
    })
}
