//! ABI of the smart account and the account factory.
//!
//! Every logic version decodes the same interface; functions a version does not
//! have fail with [`ExecutionError::UnknownSelector`](crate::ExecutionError::UnknownSelector).

use alloy_sol_types::{SolInterface, SolType, SolValue, sol};

use crate::contract::selector_of;
use crate::error::ExecutionError;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface ISimpleAccount {
        function initialize(address owner) external;
        function owner() external view returns (address);
        function version() external pure returns (string);
        function execute(address to, uint256 value, bytes data) external;
        function executeBatch(address[] to, uint256[] value, bytes[] data) external;
        function executeWithAuthorization(
            address to,
            uint256 value,
            bytes data,
            uint256 validAfter,
            uint256 validBefore,
            bytes signature
        ) external;
        function executeBatchWithAuthorization(
            address[] to,
            uint256[] value,
            bytes[] data,
            uint256 validAfter,
            uint256 validBefore,
            bytes signature
        ) external;
        function transferOwnership(address newOwner) external;
        function upgradeToAndCall(address newImplementation, bytes data) external payable;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface ISimpleAccountFactory {
        function initialize() external;
        function initializeV2() external;
        function initializeV3(address accountImplementation) external;
        function version() external pure returns (string);
        function accountImplementation() external view returns (address);
        function accountImplementationVersion() external view returns (string);
        function getAccountAddress(address owner) external view returns (address);
        function getAccountAddressWithSalt(address owner, uint256 salt)
            external
            view
            returns (address);
        function createAccount(address owner) external returns (address);
        function createAccountWithSalt(address owner, uint256 salt) external returns (address);
        function upgradeToAndCall(address newImplementation, bytes data) external payable;
        function DEFAULT_ADMIN_ROLE() external view returns (bytes32);
        function hasRole(bytes32 role, address account) external view returns (bool);
        function getRoleAdmin(bytes32 role) external view returns (bytes32);
        function grantRole(bytes32 role, address account) external;
        function revokeRole(bytes32 role, address account) external;
        function renounceRole(bytes32 role, address callerConfirmation) external;
    }
}

/// Decodes calldata into one of the calls of interface `I`.
pub fn decode_call<I: SolInterface>(data: &[u8]) -> Result<I, ExecutionError> {
    let selector = selector_of(data)?;
    if !I::valid_selector(selector) {
        return Err(ExecutionError::UnknownSelector(selector.into()));
    }
    I::abi_decode(data).map_err(|e| ExecutionError::InvalidCalldata(e.to_string()))
}

/// Decodes the ABI-encoded return value of a call.
pub fn decode_return<T>(output: &[u8]) -> Result<T, ExecutionError>
where
    T: SolValue + From<<T::SolType as SolType>::RustType>,
{
    T::abi_decode(output).map_err(|e| ExecutionError::InvalidCalldata(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};
    use alloy_sol_types::SolCall;

    #[test]
    fn test_decode_known_call() {
        let data = ISimpleAccount::executeCall {
            to: Address::with_last_byte(1),
            value: U256::from(3),
            data: Bytes::new(),
        }
        .abi_encode();
        let call = decode_call::<ISimpleAccount::ISimpleAccountCalls>(&data).unwrap();
        assert!(matches!(
            call,
            ISimpleAccount::ISimpleAccountCalls::execute(c) if c.value == U256::from(3)
        ));
    }

    #[test]
    fn test_decode_unknown_selector() {
        let data = ISimpleAccountFactory::initializeV2Call {}.abi_encode();
        let err = decode_call::<ISimpleAccount::ISimpleAccountCalls>(&data).unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownSelector(_)));
    }

    #[test]
    fn test_decode_truncated_arguments() {
        let mut data = ISimpleAccount::transferOwnershipCall {
            newOwner: Address::with_last_byte(7),
        }
        .abi_encode();
        data.truncate(10);
        let err = decode_call::<ISimpleAccount::ISimpleAccountCalls>(&data).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidCalldata(_)));
    }
}
