//! EIP-712 signature recovery.
//!
//! Recovery is a pure function of the domain, the typed payload and the signature
//! bytes. Both 65-byte `(r, s, v)` and 64-byte ERC-2098 compact signatures are
//! accepted; `s` is normalized to the lower half of the curve order first.

use alloy_primitives::{Address, B256, Signature};
use alloy_sol_types::{Eip712Domain, SolStruct};

use crate::error::ExecutionError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Malformed signature of {0} bytes")]
    Malformed(usize),
    #[error("Signature recovery failed: {0}")]
    Recovery(String),
    #[error("Signed by {recovered}, expected {expected}")]
    SignerMismatch { expected: Address, recovered: Address },
}

impl From<SignatureError> for ExecutionError {
    fn from(value: SignatureError) -> Self {
        ExecutionError::SignatureInvalid(value.to_string())
    }
}

/// Parses raw signature bytes.
pub fn parse_signature(bytes: &[u8]) -> Result<Signature, SignatureError> {
    let signature = match bytes.len() {
        65 => Signature::from_raw(bytes).map_err(|e| SignatureError::Recovery(e.to_string()))?,
        64 => Signature::from_erc2098(bytes),
        other => return Err(SignatureError::Malformed(other)),
    };
    Ok(signature.normalized_s())
}

/// Recovers the signer of an EIP-712 prehash.
pub fn recover_prehash(prehash: &B256, signature: &[u8]) -> Result<Address, SignatureError> {
    parse_signature(signature)?
        .recover_address_from_prehash(prehash)
        .map_err(|e| SignatureError::Recovery(e.to_string()))
}

/// Recovers the address that signed `payload` under `domain`.
pub fn recover_signer<T: SolStruct>(
    domain: &Eip712Domain,
    payload: &T,
    signature: &[u8],
) -> Result<Address, SignatureError> {
    let prehash = payload.eip712_signing_hash(domain);
    recover_prehash(&prehash, signature)
}

/// Checks that `payload` was signed by `expected` under `domain`.
pub fn verify_signer<T: SolStruct>(
    expected: Address,
    domain: &Eip712Domain,
    payload: &T,
    signature: &[u8],
) -> Result<(), SignatureError> {
    let recovered = recover_signer(domain, payload, signature)?;
    if recovered != expected {
        return Err(SignatureError::SignerMismatch {
            expected,
            recovered,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{owner_signer, stranger_signer};
    use alloy_primitives::U256;
    use alloy_signer::Signer;
    use alloy_sol_types::{eip712_domain, sol};

    sol! {
        struct Mail {
            address to;
            uint256 amount;
        }
    }

    fn domain() -> Eip712Domain {
        eip712_domain! {
            name: "Wallet",
            version: "1",
            chain_id: 1,
            verifying_contract: Address::with_last_byte(9),
        }
    }

    fn mail() -> Mail {
        Mail {
            to: Address::with_last_byte(1),
            amount: U256::from(10),
        }
    }

    #[tokio::test]
    async fn test_recovers_signer() {
        let signer = owner_signer();
        let hash = mail().eip712_signing_hash(&domain());
        let signature = signer.sign_hash(&hash).await.unwrap();
        let recovered = recover_signer(&domain(), &mail(), &signature.as_bytes()).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[tokio::test]
    async fn test_accepts_compact_signature() {
        let signer = owner_signer();
        let hash = mail().eip712_signing_hash(&domain());
        let signature = signer.sign_hash(&hash).await.unwrap();
        let compact = signature.as_erc2098();
        verify_signer(signer.address(), &domain(), &mail(), &compact).unwrap();
    }

    #[tokio::test]
    async fn test_rejects_other_signer() {
        let hash = mail().eip712_signing_hash(&domain());
        let signature = stranger_signer().sign_hash(&hash).await.unwrap();
        let err = verify_signer(
            owner_signer().address(),
            &domain(),
            &mail(),
            &signature.as_bytes(),
        )
        .unwrap_err();
        assert!(matches!(err, SignatureError::SignerMismatch { .. }));
    }

    #[tokio::test]
    async fn test_altered_payload_recovers_someone_else() {
        let signer = owner_signer();
        let hash = mail().eip712_signing_hash(&domain());
        let signature = signer.sign_hash(&hash).await.unwrap();
        let altered = Mail {
            amount: U256::from(11),
            ..mail()
        };
        let result = verify_signer(signer.address(), &domain(), &altered, &signature.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_malformed_length() {
        let err = recover_signer(&domain(), &mail(), &[0u8; 12]).unwrap_err();
        assert_eq!(err, SignatureError::Malformed(12));
    }
}
