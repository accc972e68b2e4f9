//! Deterministic account addresses.
//!
//! An account lives at
//!
//! ```text
//! create2(factory, salt, keccak256(proxyCreationCode ++ abi.encode(implementation, initialize(owner))))
//! ```
//!
//! which depends only on the factory, the salt, the owner and the account
//! implementation, and never on whether anything is deployed there yet.

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::{SolCall, SolValue};

use crate::contract::ContractDescriptor;
use crate::interfaces::ISimpleAccount;

/// Salt used by `getAccountAddress` and `createAccount`.
pub const DEFAULT_SALT: U256 = U256::ZERO;

/// Hash of the proxy creation code with its constructor arguments.
pub fn account_init_code_hash(implementation: Address, owner: Address) -> B256 {
    let init_data = Bytes::from(ISimpleAccount::initializeCall { owner }.abi_encode());
    let mut init_code = ContractDescriptor::proxy().encode();
    init_code.extend_from_slice(&(implementation, init_data).abi_encode_params());
    keccak256(init_code)
}

/// Address of the account for `owner` and `salt`, deployed by `factory` with
/// proxies pointing at `implementation`.
pub fn compute_account_address(
    factory: Address,
    owner: Address,
    salt: U256,
    implementation: Address,
) -> Address {
    factory.create2(
        salt.to_be_bytes::<32>(),
        account_init_code_hash(implementation, owner),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTORY: Address = Address::with_last_byte(0xfa);
    const OWNER: Address = Address::with_last_byte(0x01);
    const IMPLEMENTATION: Address = Address::with_last_byte(0x1e);

    #[test]
    fn test_is_pure() {
        let a = compute_account_address(FACTORY, OWNER, DEFAULT_SALT, IMPLEMENTATION);
        let b = compute_account_address(FACTORY, OWNER, DEFAULT_SALT, IMPLEMENTATION);
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_input_matters() {
        let base = compute_account_address(FACTORY, OWNER, DEFAULT_SALT, IMPLEMENTATION);
        let inputs = [
            compute_account_address(
                Address::with_last_byte(0xfb),
                OWNER,
                DEFAULT_SALT,
                IMPLEMENTATION,
            ),
            compute_account_address(
                FACTORY,
                Address::with_last_byte(0x02),
                DEFAULT_SALT,
                IMPLEMENTATION,
            ),
            compute_account_address(FACTORY, OWNER, U256::from(1), IMPLEMENTATION),
            compute_account_address(FACTORY, OWNER, DEFAULT_SALT, Address::with_last_byte(0x1f)),
        ];
        for other in inputs {
            assert_ne!(base, other);
        }
    }
}
