use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolCall;

use crate::account::SimpleAccountInstance;
use crate::chain::Chain;
use crate::error::ExecutionError;
use crate::interfaces::{ISimpleAccountFactory, decode_return};

/// Typed binding to the factory proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleAccountFactoryInstance {
    address: Address,
}

impl SimpleAccountFactoryInstance {
    pub const fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn read<C: SolCall>(&self, chain: &Chain, call: C) -> Result<Bytes, ExecutionError> {
        chain.static_call(Address::ZERO, self.address, &call.abi_encode())
    }

    fn send<C: SolCall>(
        &self,
        chain: &mut Chain,
        sender: Address,
        call: C,
    ) -> Result<Bytes, ExecutionError> {
        chain.transact(sender, self.address, U256::ZERO, call.abi_encode())
    }

    pub fn version(&self, chain: &Chain) -> Result<String, ExecutionError> {
        decode_return(&self.read(chain, ISimpleAccountFactory::versionCall {})?)
    }

    pub fn account_implementation(&self, chain: &Chain) -> Result<Address, ExecutionError> {
        decode_return(&self.read(chain, ISimpleAccountFactory::accountImplementationCall {})?)
    }

    pub fn account_implementation_version(&self, chain: &Chain) -> Result<String, ExecutionError> {
        decode_return(&self.read(
            chain,
            ISimpleAccountFactory::accountImplementationVersionCall {},
        )?)
    }

    pub fn get_account_address(
        &self,
        chain: &Chain,
        owner: Address,
    ) -> Result<Address, ExecutionError> {
        decode_return(&self.read(chain, ISimpleAccountFactory::getAccountAddressCall { owner })?)
    }

    pub fn get_account_address_with_salt(
        &self,
        chain: &Chain,
        owner: Address,
        salt: U256,
    ) -> Result<Address, ExecutionError> {
        decode_return(&self.read(
            chain,
            ISimpleAccountFactory::getAccountAddressWithSaltCall { owner, salt },
        )?)
    }

    pub fn create_account(
        &self,
        chain: &mut Chain,
        sender: Address,
        owner: Address,
    ) -> Result<SimpleAccountInstance, ExecutionError> {
        let output = self.send(chain, sender, ISimpleAccountFactory::createAccountCall { owner })?;
        decode_return(&output).map(SimpleAccountInstance::new)
    }

    pub fn create_account_with_salt(
        &self,
        chain: &mut Chain,
        sender: Address,
        owner: Address,
        salt: U256,
    ) -> Result<SimpleAccountInstance, ExecutionError> {
        let output = self.send(
            chain,
            sender,
            ISimpleAccountFactory::createAccountWithSaltCall { owner, salt },
        )?;
        decode_return(&output).map(SimpleAccountInstance::new)
    }

    pub fn initialize(&self, chain: &mut Chain, sender: Address) -> Result<(), ExecutionError> {
        self.send(chain, sender, ISimpleAccountFactory::initializeCall {})
            .map(|_| ())
    }

    pub fn initialize_v2(&self, chain: &mut Chain, sender: Address) -> Result<(), ExecutionError> {
        self.send(chain, sender, ISimpleAccountFactory::initializeV2Call {})
            .map(|_| ())
    }

    pub fn initialize_v3(
        &self,
        chain: &mut Chain,
        sender: Address,
        account_implementation: Address,
    ) -> Result<(), ExecutionError> {
        self.send(
            chain,
            sender,
            ISimpleAccountFactory::initializeV3Call {
                accountImplementation: account_implementation,
            },
        )
        .map(|_| ())
    }

    pub fn upgrade_to_and_call(
        &self,
        chain: &mut Chain,
        sender: Address,
        new_implementation: Address,
        data: Bytes,
    ) -> Result<(), ExecutionError> {
        self.send(
            chain,
            sender,
            ISimpleAccountFactory::upgradeToAndCallCall {
                newImplementation: new_implementation,
                data,
            },
        )
        .map(|_| ())
    }

    pub fn default_admin_role(&self, chain: &Chain) -> Result<B256, ExecutionError> {
        decode_return(&self.read(chain, ISimpleAccountFactory::DEFAULT_ADMIN_ROLECall {})?)
    }

    pub fn has_role(
        &self,
        chain: &Chain,
        role: B256,
        account: Address,
    ) -> Result<bool, ExecutionError> {
        decode_return(&self.read(chain, ISimpleAccountFactory::hasRoleCall { role, account })?)
    }

    pub fn get_role_admin(&self, chain: &Chain, role: B256) -> Result<B256, ExecutionError> {
        decode_return(&self.read(chain, ISimpleAccountFactory::getRoleAdminCall { role })?)
    }

    pub fn grant_role(
        &self,
        chain: &mut Chain,
        sender: Address,
        role: B256,
        account: Address,
    ) -> Result<(), ExecutionError> {
        self.send(chain, sender, ISimpleAccountFactory::grantRoleCall { role, account })
            .map(|_| ())
    }

    pub fn revoke_role(
        &self,
        chain: &mut Chain,
        sender: Address,
        role: B256,
        account: Address,
    ) -> Result<(), ExecutionError> {
        self.send(chain, sender, ISimpleAccountFactory::revokeRoleCall { role, account })
            .map(|_| ())
    }

    pub fn renounce_role(
        &self,
        chain: &mut Chain,
        sender: Address,
        role: B256,
    ) -> Result<(), ExecutionError> {
        self.send(
            chain,
            sender,
            ISimpleAccountFactory::renounceRoleCall {
                role,
                callerConfirmation: sender,
            },
        )
        .map(|_| ())
    }
}
