//! JSON bodies of the relayer's HTTP interface.
//!
//! Addresses are EIP-55 checksummed, amounts are decimal strings, byte strings are
//! `0x`-prefixed hex and timestamps are stringified seconds.

use aa_chain_eip155::ExecutionError;
use aa_chain_eip155::authorization::{Authorization, BatchAuthorization, Signed};
use aa_chain_eip155::chain::{ChecksummedAddress, decimal_u256, decimal_u256_seq};
use aa_chain_eip155::events::Log;
use aa_types::chain::ChainId;
use aa_types::timestamp::UnixTimestamp;
use alloy_primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};

/// A CREATE2 salt, as a decimal string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt(#[serde(with = "decimal_u256")] pub U256);

impl From<Salt> for U256 {
    fn from(value: Salt) -> Self {
        value.0
    }
}

/// `GET /factory`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryResponse {
    pub chain: ChainId,
    pub factory: ChecksummedAddress,
    pub version: String,
    pub account_implementation: ChecksummedAddress,
    pub account_implementation_version: String,
}

/// Query of `GET /accounts/{owner}/address`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountAddressQuery {
    #[serde(default, deserialize_with = "optional_salt")]
    pub salt: Option<Salt>,
}

fn optional_salt<'de, D>(deserializer: D) -> Result<Option<Salt>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(s) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    U256::from_str_radix(&s, 10)
        .map(|salt| Some(Salt(salt)))
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAddressResponse {
    pub owner: ChecksummedAddress,
    pub salt: Salt,
    pub address: ChecksummedAddress,
    pub deployed: bool,
}

/// `POST /accounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub owner: ChecksummedAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<Salt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountResponse {
    pub account: ChecksummedAddress,
    pub owner: ChecksummedAddress,
    /// `false` if the account already existed.
    pub created: bool,
}

/// `GET /account/{address}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub address: ChecksummedAddress,
    pub owner: ChecksummedAddress,
    /// Absent for V1 logic.
    pub version: Option<String>,
    #[serde(with = "decimal_u256")]
    pub balance: U256,
}

/// `POST /account/{address}/execute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub to: ChecksummedAddress,
    #[serde(with = "decimal_u256")]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
    pub signature: Bytes,
}

impl From<&ExecuteRequest> for Signed<Authorization> {
    fn from(request: &ExecuteRequest) -> Self {
        Signed {
            authorization: Authorization {
                to: request.to.into(),
                value: request.value,
                data: request.data.clone(),
                valid_after: request.valid_after,
                valid_before: request.valid_before,
            },
            signature: request.signature.clone(),
        }
    }
}

impl From<Signed<Authorization>> for ExecuteRequest {
    fn from(signed: Signed<Authorization>) -> Self {
        let authorization = signed.authorization;
        ExecuteRequest {
            to: authorization.to.into(),
            value: authorization.value,
            data: authorization.data,
            valid_after: authorization.valid_after,
            valid_before: authorization.valid_before,
            signature: signed.signature,
        }
    }
}

/// `POST /account/{address}/execute-batch`
///
/// `to`, `value` and `data` are parallel arrays; the account rejects differing lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteBatchRequest {
    pub to: Vec<ChecksummedAddress>,
    #[serde(with = "decimal_u256_seq")]
    pub value: Vec<U256>,
    pub data: Vec<Bytes>,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
    pub signature: Bytes,
}

impl From<&ExecuteBatchRequest> for Signed<BatchAuthorization> {
    fn from(request: &ExecuteBatchRequest) -> Self {
        Signed {
            authorization: BatchAuthorization {
                to: request.to.iter().map(|to| to.0).collect(),
                value: request.value.clone(),
                data: request.data.clone(),
                valid_after: request.valid_after,
                valid_before: request.valid_before,
            },
            signature: request.signature.clone(),
        }
    }
}

impl From<Signed<BatchAuthorization>> for ExecuteBatchRequest {
    fn from(signed: Signed<BatchAuthorization>) -> Self {
        let authorization = signed.authorization;
        ExecuteBatchRequest {
            to: authorization.to.into_iter().map(Into::into).collect(),
            value: authorization.value,
            data: authorization.data,
            valid_after: authorization.valid_after,
            valid_before: authorization.valid_before,
            signature: signed.signature,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub account: ChecksummedAddress,
    /// Events emitted while executing.
    pub logs: Vec<Log>,
}

/// Machine-readable cause of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    Unauthorized,
    InvalidSignature,
    AuthorizationNotYetValid,
    AuthorizationExpired,
    LengthMismatch,
    AlreadyInitialized,
    AlreadyDeployed,
    CallFailed,
    InsufficientFunds,
    InvalidImplementation,
    InvalidRequest,
    AccountNotDeployed,
}

impl From<&ExecutionError> for ErrorReason {
    fn from(error: &ExecutionError) -> Self {
        match error.root_cause() {
            ExecutionError::Unauthorized { .. } => ErrorReason::Unauthorized,
            ExecutionError::SignatureInvalid(_) => ErrorReason::InvalidSignature,
            ExecutionError::AuthorizationNotYetValid { .. } => {
                ErrorReason::AuthorizationNotYetValid
            }
            ExecutionError::AuthorizationExpired { .. } => ErrorReason::AuthorizationExpired,
            ExecutionError::LengthMismatch { .. } => ErrorReason::LengthMismatch,
            ExecutionError::AlreadyInitialized { .. }
            | ExecutionError::InitializerOutOfOrder { .. } => ErrorReason::AlreadyInitialized,
            ExecutionError::AlreadyDeployed(_) => ErrorReason::AlreadyDeployed,
            ExecutionError::SubcallFailed { .. } | ExecutionError::Reverted(_) => {
                ErrorReason::CallFailed
            }
            ExecutionError::InsufficientBalance { .. } => ErrorReason::InsufficientFunds,
            ExecutionError::InvalidImplementation(_)
            | ExecutionError::StorageLayoutMismatch(_)
            | ExecutionError::AccountImplementationUnset => ErrorReason::InvalidImplementation,
            ExecutionError::UnknownSelector(_)
            | ExecutionError::InvalidCalldata(_)
            | ExecutionError::NotDelegated => ErrorReason::InvalidRequest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub reason: ErrorReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use serde_json::json;

    #[test]
    fn test_execute_request_wire_format() {
        let body = json!({
            "to": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "value": "1000000000000000000",
            "data": "0x",
            "validAfter": "0",
            "validBefore": "1700000060",
            "signature": "0x1234"
        });
        let request: ExecuteRequest = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(request.value, U256::from(10).pow(U256::from(18)));
        assert_eq!(request.valid_before, UnixTimestamp::from_secs(1_700_000_060));
        assert_eq!(serde_json::to_value(&request).unwrap(), body);

        let signed = Signed::<Authorization>::from(&request);
        assert_eq!(signed.signature, Bytes::from_static(&[0x12, 0x34]));
        assert_eq!(ExecuteRequest::from(signed), request);
    }

    #[test]
    fn test_batch_request_keeps_mismatched_lengths() {
        let body = json!({
            "to": ["0x70997970C51812dc3A010C7d01b50e0d17dc79C8"],
            "value": ["1", "2"],
            "data": ["0x"],
            "validAfter": "0",
            "validBefore": "10",
            "signature": "0x"
        });
        let request: ExecuteBatchRequest = serde_json::from_value(body).unwrap();
        let signed = Signed::<BatchAuthorization>::from(&request);
        assert_eq!(signed.authorization.to.len(), 1);
        assert_eq!(signed.authorization.value, vec![U256::from(1), U256::from(2)]);
    }

    #[test]
    fn test_salt_is_decimal() {
        let request: CreateAccountRequest = serde_json::from_value(json!({
            "owner": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "salt": "42"
        }))
        .unwrap();
        assert_eq!(request.salt, Some(Salt(U256::from(42))));

        let request: CreateAccountRequest = serde_json::from_value(json!({
            "owner": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
        }))
        .unwrap();
        assert_eq!(request.salt, None);
    }

    #[test]
    fn test_error_reason_mapping() {
        let nested = ExecutionError::SubcallFailed {
            index: 2,
            target: Address::ZERO,
            source: Box::new(ExecutionError::Reverted("no".into())),
        };
        assert_eq!(ErrorReason::from(&nested), ErrorReason::CallFailed);
        let underfunded = ExecutionError::SubcallFailed {
            index: 1,
            target: Address::ZERO,
            source: Box::new(ExecutionError::InsufficientBalance {
                account: Address::ZERO,
                balance: U256::ZERO,
                required: U256::from(1),
            }),
        };
        assert_eq!(ErrorReason::from(&underfunded), ErrorReason::InsufficientFunds);
        assert_eq!(
            serde_json::to_value(ErrorReason::from(&ExecutionError::SignatureInvalid(
                "mismatch".into()
            )))
            .unwrap(),
            json!("invalid_signature")
        );
    }
}
