use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;

use crate::authorization::{Authorization, BatchAuthorization, Call, Signed};
use crate::chain::Chain;
use crate::error::ExecutionError;
use crate::interfaces::{ISimpleAccount, decode_return};

/// Typed binding to the account proxy at one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleAccountInstance {
    address: Address,
}

impl SimpleAccountInstance {
    pub const fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self, chain: &Chain) -> Result<Address, ExecutionError> {
        let output = chain.static_call(
            Address::ZERO,
            self.address,
            &ISimpleAccount::ownerCall {}.abi_encode(),
        )?;
        decode_return(&output)
    }

    /// `None` for V1 logic, which has no `version()`.
    pub fn version(&self, chain: &Chain) -> Result<Option<String>, ExecutionError> {
        let result = chain.static_call(
            Address::ZERO,
            self.address,
            &ISimpleAccount::versionCall {}.abi_encode(),
        );
        match result {
            Ok(output) => decode_return(&output).map(Some),
            Err(ExecutionError::UnknownSelector(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn execute(
        &self,
        chain: &mut Chain,
        sender: Address,
        call: Call,
    ) -> Result<Bytes, ExecutionError> {
        let data = ISimpleAccount::executeCall {
            to: call.to,
            value: call.value,
            data: call.data,
        }
        .abi_encode();
        chain.transact(sender, self.address, U256::ZERO, data)
    }

    pub fn execute_batch(
        &self,
        chain: &mut Chain,
        sender: Address,
        calls: Vec<Call>,
    ) -> Result<Bytes, ExecutionError> {
        let mut call = ISimpleAccount::executeBatchCall {
            to: Vec::with_capacity(calls.len()),
            value: Vec::with_capacity(calls.len()),
            data: Vec::with_capacity(calls.len()),
        };
        for c in calls {
            call.to.push(c.to);
            call.value.push(c.value);
            call.data.push(c.data);
        }
        chain.transact(sender, self.address, U256::ZERO, call.abi_encode())
    }

    /// Submits an owner-signed authorization. `relayer` may be anyone.
    pub fn execute_with_authorization(
        &self,
        chain: &mut Chain,
        relayer: Address,
        signed: &Signed<Authorization>,
    ) -> Result<Bytes, ExecutionError> {
        let authorization = &signed.authorization;
        let data = ISimpleAccount::executeWithAuthorizationCall {
            to: authorization.to,
            value: authorization.value,
            data: authorization.data.clone(),
            validAfter: U256::from(authorization.valid_after.as_secs()),
            validBefore: U256::from(authorization.valid_before.as_secs()),
            signature: signed.signature.clone(),
        }
        .abi_encode();
        chain.transact(relayer, self.address, U256::ZERO, data)
    }

    pub fn execute_batch_with_authorization(
        &self,
        chain: &mut Chain,
        relayer: Address,
        signed: &Signed<BatchAuthorization>,
    ) -> Result<Bytes, ExecutionError> {
        let authorization = &signed.authorization;
        let data = ISimpleAccount::executeBatchWithAuthorizationCall {
            to: authorization.to.clone(),
            value: authorization.value.clone(),
            data: authorization.data.clone(),
            validAfter: U256::from(authorization.valid_after.as_secs()),
            validBefore: U256::from(authorization.valid_before.as_secs()),
            signature: signed.signature.clone(),
        }
        .abi_encode();
        chain.transact(relayer, self.address, U256::ZERO, data)
    }

    pub fn transfer_ownership(
        &self,
        chain: &mut Chain,
        sender: Address,
        new_owner: Address,
    ) -> Result<Bytes, ExecutionError> {
        let data = ISimpleAccount::transferOwnershipCall { newOwner: new_owner }.abi_encode();
        chain.transact(sender, self.address, U256::ZERO, data)
    }

    pub fn upgrade_to_and_call(
        &self,
        chain: &mut Chain,
        sender: Address,
        new_implementation: Address,
        data: Bytes,
    ) -> Result<Bytes, ExecutionError> {
        let data = ISimpleAccount::upgradeToAndCallCall {
            newImplementation: new_implementation,
            data,
        }
        .abi_encode();
        chain.transact(sender, self.address, U256::ZERO, data)
    }
}
