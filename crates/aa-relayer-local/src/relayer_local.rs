//! Local relayer over an in-process chain.
//!
//! [`RelayerLocal`] owns the [`Chain`] the factory is deployed on. Every request takes
//! the chain lock for its whole duration, so invocations never interleave.
//!
//! Before any state-changing request the chain clock is moved forward to wall-clock
//! time; it never moves backwards.
//!
//! # Example
//!
//! ```ignore
//! use aa_relayer_local::RelayerLocal;
//!
//! let relayer = RelayerLocal::new(chain, deployment.factory, relayer_address);
//! let info = relayer.factory().await?;
//! ```

use aa_chain_eip155::ExecutionError;
use aa_chain_eip155::account::SimpleAccountInstance;
use aa_chain_eip155::authorization::{Authorization, BatchAuthorization, Signed};
use aa_chain_eip155::chain::Chain;
use aa_chain_eip155::factory::SimpleAccountFactoryInstance;
use aa_types::timestamp::UnixTimestamp;
use alloy_primitives::{Address, U256};
use tokio::sync::Mutex;
use tracing::instrument;

use crate::relayer::Relayer;
use crate::types::{
    AccountAddressResponse, AccountResponse, CreateAccountRequest, CreateAccountResponse,
    ExecuteBatchRequest, ExecuteRequest, ExecuteResponse, FactoryResponse, Salt,
};

/// A [`Relayer`] that submits transactions to a local [`Chain`] from a single sender.
pub struct RelayerLocal {
    chain: Mutex<Chain>,
    factory: SimpleAccountFactoryInstance,
    address: Address,
}

impl RelayerLocal {
    /// Creates a relayer for `factory` on `chain`, sending transactions as `address`.
    pub fn new(chain: Chain, factory: SimpleAccountFactoryInstance, address: Address) -> Self {
        RelayerLocal {
            chain: Mutex::new(chain),
            factory,
            address,
        }
    }

    /// The sender of every transaction this relayer submits.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn factory_instance(&self) -> SimpleAccountFactoryInstance {
        self.factory
    }

    /// Credits `amount` to `address`. Meant for genesis allocations and tests.
    pub async fn deal(&self, address: Address, amount: U256) {
        self.chain.lock().await.deal(address, amount);
    }

    pub async fn balance(&self, address: Address) -> U256 {
        self.chain.lock().await.balance(address)
    }

    fn sync_clock(chain: &mut Chain) {
        let now = UnixTimestamp::now();
        if now > chain.timestamp() {
            chain.set_timestamp(now);
        }
    }

    fn deployed_account(
        chain: &Chain,
        account: Address,
    ) -> Result<SimpleAccountInstance, RelayerLocalError> {
        if chain.is_deployed(account) {
            Ok(SimpleAccountInstance::new(account))
        } else {
            Err(RelayerLocalError::NotDeployed(account))
        }
    }
}

impl Relayer for RelayerLocal {
    type Error = RelayerLocalError;

    async fn factory(&self) -> Result<FactoryResponse, Self::Error> {
        let chain = self.chain.lock().await;
        Ok(FactoryResponse {
            chain: chain.chain_reference().as_chain_id(),
            factory: self.factory.address().into(),
            version: self.factory.version(&chain)?,
            account_implementation: self.factory.account_implementation(&chain)?.into(),
            account_implementation_version: self.factory.account_implementation_version(&chain)?,
        })
    }

    async fn account_address(
        &self,
        owner: Address,
        salt: U256,
    ) -> Result<AccountAddressResponse, Self::Error> {
        let chain = self.chain.lock().await;
        let address = self
            .factory
            .get_account_address_with_salt(&chain, owner, salt)?;
        Ok(AccountAddressResponse {
            owner: owner.into(),
            salt: Salt(salt),
            address: address.into(),
            deployed: chain.is_deployed(address),
        })
    }

    #[instrument(skip_all, err, fields(owner = %request.owner))]
    async fn create_account(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<CreateAccountResponse, Self::Error> {
        let owner = request.owner.into();
        let salt = request.salt.map(<U256 as From<Salt>>::from).unwrap_or_default();
        let mut chain = self.chain.lock().await;
        Self::sync_clock(&mut chain);
        let predicted = self
            .factory
            .get_account_address_with_salt(&chain, owner, salt)?;
        let created = !chain.is_deployed(predicted);
        let account =
            self.factory
                .create_account_with_salt(&mut chain, self.address, owner, salt)?;
        tracing::info!(account = %account.address(), created, "account ready");
        Ok(CreateAccountResponse {
            account: account.address().into(),
            owner: request.owner,
            created,
        })
    }

    async fn account(&self, account: Address) -> Result<AccountResponse, Self::Error> {
        let chain = self.chain.lock().await;
        let instance = Self::deployed_account(&chain, account)?;
        Ok(AccountResponse {
            address: account.into(),
            owner: instance.owner(&chain)?.into(),
            version: instance.version(&chain)?,
            balance: chain.balance(account),
        })
    }

    #[instrument(skip_all, err, fields(account = %account, to = %request.to))]
    async fn execute(
        &self,
        account: Address,
        request: &ExecuteRequest,
    ) -> Result<ExecuteResponse, Self::Error> {
        let signed = Signed::<Authorization>::from(request);
        let mut chain = self.chain.lock().await;
        let instance = Self::deployed_account(&chain, account)?;
        Self::sync_clock(&mut chain);
        let first_log = chain.logs().len();
        instance.execute_with_authorization(&mut chain, self.address, &signed)?;
        Ok(ExecuteResponse {
            account: account.into(),
            logs: chain.logs()[first_log..].to_vec(),
        })
    }

    #[instrument(skip_all, err, fields(account = %account, calls = request.to.len()))]
    async fn execute_batch(
        &self,
        account: Address,
        request: &ExecuteBatchRequest,
    ) -> Result<ExecuteResponse, Self::Error> {
        let signed = Signed::<BatchAuthorization>::from(request);
        let mut chain = self.chain.lock().await;
        let instance = Self::deployed_account(&chain, account)?;
        Self::sync_clock(&mut chain);
        let first_log = chain.logs().len();
        instance.execute_batch_with_authorization(&mut chain, self.address, &signed)?;
        Ok(ExecuteResponse {
            account: account.into(),
            logs: chain.logs()[first_log..].to_vec(),
        })
    }
}

/// Errors of [`RelayerLocal`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayerLocalError {
    /// The transaction or read reverted.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// No account is deployed at the address.
    #[error("No account deployed at {0}")]
    NotDeployed(Address),
}

#[cfg(test)]
mod tests {
    use super::*;
    use aa_chain_eip155::authorization::{Call, sign_authorization, sign_batch_authorization};
    use aa_chain_eip155::chain::{ChecksummedAddress, Eip155ChainReference};
    use aa_chain_eip155::deployment::Deployment;
    use aa_chain_eip155::events::Event;
    use aa_chain_eip155::interfaces::ISimpleAccount;
    use alloy_primitives::{Bytes, b256};
    use alloy_signer_local::PrivateKeySigner;
    use alloy_sol_types::SolCall;

    const DEPLOYER: Address = Address::with_last_byte(0xde);
    const SENDER: Address = Address::with_last_byte(0x4e);
    const PAYEE: Address = Address::with_last_byte(0xbe);

    fn owner() -> PrivateKeySigner {
        PrivateKeySigner::from_bytes(&b256!(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        ))
        .unwrap()
    }

    fn relayer() -> RelayerLocal {
        let mut chain = Chain::new(Eip155ChainReference::new(100009));
        let deployment = Deployment::bootstrap(&mut chain, DEPLOYER).unwrap();
        RelayerLocal::new(chain, deployment.factory, SENDER)
    }

    #[tokio::test]
    async fn test_factory_info() {
        let relayer = relayer();
        let info = relayer.factory().await.unwrap();
        assert_eq!(info.chain.to_string(), "eip155:100009");
        assert_eq!(info.version, "3");
        assert_eq!(info.account_implementation_version, "3");
        assert_eq!(info.factory, ChecksummedAddress::from(relayer.factory_instance().address()));
    }

    #[tokio::test]
    async fn test_create_then_execute() {
        let relayer = relayer();
        let owner = owner();
        let predicted = relayer
            .account_address(owner.address(), U256::ZERO)
            .await
            .unwrap();
        assert!(!predicted.deployed);
        relayer.deal(predicted.address.into(), U256::from(500)).await;

        let request = CreateAccountRequest {
            owner: owner.address().into(),
            salt: None,
        };
        let created = relayer.create_account(&request).await.unwrap();
        assert!(created.created);
        assert_eq!(created.account, predicted.address);
        let again = relayer.create_account(&request).await.unwrap();
        assert!(!again.created);
        assert_eq!(again.account, created.account);

        let account = created.account.into();
        let now = UnixTimestamp::now();
        let signed = sign_authorization(
            &owner,
            &Eip155ChainReference::new(100009),
            account,
            Authorization {
                to: PAYEE,
                value: U256::from(200),
                data: Bytes::new(),
                valid_after: UnixTimestamp::EPOCH,
                valid_before: now + 3600,
            },
        )
        .await
        .unwrap();
        let response = relayer
            .execute(account, &ExecuteRequest::from(signed))
            .await
            .unwrap();
        assert!(response.logs.is_empty());
        assert_eq!(relayer.balance(PAYEE).await, U256::from(200));

        let info = relayer.account(account).await.unwrap();
        assert_eq!(info.owner, ChecksummedAddress::from(owner.address()));
        assert_eq!(info.version.as_deref(), Some("3"));
        assert_eq!(info.balance, U256::from(300));
    }

    #[tokio::test]
    async fn test_batch_reports_logs() {
        let relayer = relayer();
        let owner = owner();
        let next_owner = PAYEE;
        let created = relayer
            .create_account(&CreateAccountRequest {
                owner: owner.address().into(),
                salt: Some(Salt(U256::from(7))),
            })
            .await
            .unwrap();
        let account: Address = created.account.into();
        let handover = ISimpleAccount::transferOwnershipCall {
            newOwner: next_owner,
        };
        let batch = BatchAuthorization::from_calls(
            [Call {
                to: account,
                value: U256::ZERO,
                data: handover.abi_encode().into(),
            }],
            UnixTimestamp::EPOCH,
            UnixTimestamp::now() + 3600,
        );
        let signed = sign_batch_authorization(
            &owner,
            &Eip155ChainReference::new(100009),
            account,
            batch,
        )
        .await
        .unwrap();
        let response = relayer
            .execute_batch(account, &ExecuteBatchRequest::from(signed))
            .await
            .unwrap();
        assert_eq!(response.logs.len(), 1);
        assert_eq!(
            response.logs[0].event,
            Event::OwnershipTransferred {
                previous_owner: owner.address(),
                new_owner: next_owner,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let relayer = relayer();
        let err = relayer.account(PAYEE).await.unwrap_err();
        assert!(matches!(err, RelayerLocalError::NotDeployed(a) if a == PAYEE));
    }
}
