//! `SimpleAccountFactory`: derives account addresses and deploys accounts on demand.
//!
//! The factory itself is an upgradeable proxy. Its logic went through three
//! releases, each with an initializer that must run exactly once and in order:
//!
//! | Version | Initializer | Effect |
//! |---------|-------------|--------|
//! | 1 | `initialize()` | grants the caller `DEFAULT_ADMIN_ROLE` |
//! | 2 | `initializeV2()` | admin only; new accounts use the V2 account logic bundled with the factory |
//! | 3 | `initializeV3(accountImplementation)` | admin only; records the account implementation in storage |
//!
//! On a fresh proxy, `initialize()` of version N logic runs every step up to N at
//! once, taking the account implementation for step 3 from the logic's bundle.

mod instance;

pub use instance::*;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use serde::Serialize;
use tracing::instrument;

use crate::access_control::{AccessControl, DEFAULT_ADMIN_ROLE, RoleStore};
use crate::account::SIMPLE_ACCOUNT;
use crate::address::{account_init_code_hash, compute_account_address};
use crate::chain::{Chain, Storage};
use crate::contract::{Code, Contract, ContractDescriptor, Frame};
use crate::error::ExecutionError;
use crate::events::Event;
use crate::interfaces::ISimpleAccount;
use crate::interfaces::ISimpleAccountFactory::{self, ISimpleAccountFactoryCalls};
use crate::interfaces::decode_call;
use crate::migration::{Initializable, Migration, MigrationTable};
use crate::proxy;

/// Kind reported by every version of the factory logic.
pub const SIMPLE_ACCOUNT_FACTORY: &str = "SimpleAccountFactory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FactoryVersion {
    V1,
    V2,
    V3,
}

impl FactoryVersion {
    pub const LATEST: FactoryVersion = FactoryVersion::V3;

    pub fn number(&self) -> u64 {
        match self {
            FactoryVersion::V1 => 1,
            FactoryVersion::V2 => 2,
            FactoryVersion::V3 => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FactoryVersion::V1 => "1",
            FactoryVersion::V2 => "2",
            FactoryVersion::V3 => "3",
        }
    }
}

/// Persistent state of the factory proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactoryStorage {
    pub initialized: u64,
    pub roles: AccessControl,
    pub account_implementation: Option<Address>,
    pub account_implementation_version: Option<String>,
}

impl FactoryStorage {
    pub const EMPTY: FactoryStorage = FactoryStorage {
        initialized: 0,
        roles: AccessControl::new(),
        account_implementation: None,
        account_implementation_version: None,
    };

    pub fn load(chain: &Chain, address: Address) -> Result<&FactoryStorage, ExecutionError> {
        match chain.storage(address) {
            None | Some(Storage::Empty) => Ok(&EMPTY_FACTORY_STORAGE),
            Some(Storage::Factory(storage)) => Ok(storage),
            Some(_) => Err(ExecutionError::StorageLayoutMismatch(address)),
        }
    }

    pub fn load_mut(
        chain: &mut Chain,
        address: Address,
    ) -> Result<&mut FactoryStorage, ExecutionError> {
        let storage = chain.storage_mut(address);
        if storage.is_empty() {
            *storage = Storage::Factory(FactoryStorage::default());
        }
        match storage {
            Storage::Factory(storage) => Ok(storage),
            _ => Err(ExecutionError::StorageLayoutMismatch(address)),
        }
    }
}

static EMPTY_FACTORY_STORAGE: FactoryStorage = FactoryStorage::EMPTY;

impl Initializable for FactoryStorage {
    fn initialized_version(&self) -> u64 {
        self.initialized
    }

    fn set_initialized_version(&mut self, version: u64) {
        self.initialized = version;
    }
}

/// Arguments available to factory initializers.
#[derive(Debug, Clone, Copy)]
pub struct FactoryInitContext {
    pub caller: Address,
    pub account_implementation: Option<Address>,
}

fn grant_deployer_admin(
    storage: &mut FactoryStorage,
    context: &FactoryInitContext,
) -> Result<(), ExecutionError> {
    storage.roles.grant_role(DEFAULT_ADMIN_ROLE, context.caller);
    Ok(())
}

fn reinitialize_v2(_: &mut FactoryStorage, _: &FactoryInitContext) -> Result<(), ExecutionError> {
    Ok(())
}

fn record_account_implementation(
    storage: &mut FactoryStorage,
    context: &FactoryInitContext,
) -> Result<(), ExecutionError> {
    let implementation = context
        .account_implementation
        .ok_or(ExecutionError::AccountImplementationUnset)?;
    storage.account_implementation = Some(implementation);
    storage.account_implementation_version = Some(FactoryVersion::V3.as_str().to_string());
    Ok(())
}

pub const FACTORY_MIGRATIONS: MigrationTable<FactoryStorage, FactoryInitContext> =
    MigrationTable::new(&[
        Migration {
            version: 1,
            name: "initialize",
            run: grant_deployer_admin,
        },
        Migration {
            version: 2,
            name: "initializeV2",
            run: reinitialize_v2,
        },
        Migration {
            version: 3,
            name: "initializeV3",
            run: record_account_implementation,
        },
    ]);

/// Factory logic of one [`FactoryVersion`].
///
/// Like a Solidity immutable, `bundled_account_implementation` is fixed when the
/// logic is deployed. V1 and V2 serve it as the account implementation; V3 only
/// uses it to complete a fresh `initialize()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleAccountFactory {
    version: FactoryVersion,
    bundled_account_implementation: Address,
}

impl SimpleAccountFactory {
    pub const fn new(version: FactoryVersion, account_implementation: Address) -> Self {
        Self {
            version,
            bundled_account_implementation: account_implementation,
        }
    }

    pub fn version(&self) -> FactoryVersion {
        self.version
    }

    fn account_implementation(
        &self,
        chain: &Chain,
        factory: Address,
    ) -> Result<Address, ExecutionError> {
        match self.version {
            FactoryVersion::V1 | FactoryVersion::V2 => Ok(self.bundled_account_implementation),
            FactoryVersion::V3 => FactoryStorage::load(chain, factory)?
                .account_implementation
                .ok_or(ExecutionError::AccountImplementationUnset),
        }
    }

    fn account_implementation_version(
        &self,
        chain: &Chain,
        factory: Address,
    ) -> Result<String, ExecutionError> {
        match self.version {
            FactoryVersion::V1 | FactoryVersion::V2 => Ok(self.version.as_str().to_string()),
            FactoryVersion::V3 => FactoryStorage::load(chain, factory)?
                .account_implementation_version
                .clone()
                .ok_or(ExecutionError::AccountImplementationUnset),
        }
    }

    fn require_account_logic(chain: &Chain, implementation: Address) -> Result<(), ExecutionError> {
        let descriptor = chain.logic_at(implementation)?.descriptor();
        if descriptor.kind != SIMPLE_ACCOUNT {
            return Err(ExecutionError::InvalidImplementation(implementation));
        }
        Ok(())
    }

    /// `initialize()`: on a fresh proxy runs every step up to this logic's version.
    #[instrument(skip_all, err, fields(factory = %frame.address, caller = %frame.caller))]
    fn initialize(&self, chain: &mut Chain, frame: &Frame) -> Result<Bytes, ExecutionError> {
        if !frame.is_delegated() {
            return Err(ExecutionError::NotDelegated);
        }
        let context = FactoryInitContext {
            caller: frame.caller,
            account_implementation: Some(self.bundled_account_implementation),
        };
        if self.version.number() >= 3 {
            Self::require_account_logic(chain, self.bundled_account_implementation)?;
        }
        let storage = FactoryStorage::load_mut(chain, frame.address)?;
        let current = storage.initialized;
        if current > 0 {
            return Err(ExecutionError::AlreadyInitialized {
                current,
                requested: 1,
            });
        }
        let ran = FACTORY_MIGRATIONS.apply_through(storage, self.version.number(), &context)?;
        chain.emit(
            frame.address,
            Event::RoleGranted {
                role: DEFAULT_ADMIN_ROLE,
                account: frame.caller,
                sender: frame.caller,
            },
        );
        for version in ran {
            chain.emit(frame.address, Event::Initialized { version });
        }
        Ok(Bytes::new())
    }

    /// `initializeV2()` / `initializeV3(..)`: admin-only reinitializers.
    #[instrument(skip_all, err, fields(
        factory = %frame.address,
        caller = %frame.caller,
        version = version,
    ))]
    fn reinitialize(
        &self,
        chain: &mut Chain,
        frame: &Frame,
        version: u64,
        account_implementation: Option<Address>,
    ) -> Result<Bytes, ExecutionError> {
        if !frame.is_delegated() {
            return Err(ExecutionError::NotDelegated);
        }
        let storage = FactoryStorage::load(chain, frame.address)?;
        FACTORY_MIGRATIONS.check(storage.initialized, version)?;
        storage.roles.check_role(DEFAULT_ADMIN_ROLE, frame.caller)?;
        if let Some(implementation) = account_implementation {
            Self::require_account_logic(chain, implementation)?;
        }
        let context = FactoryInitContext {
            caller: frame.caller,
            account_implementation,
        };
        let storage = FactoryStorage::load_mut(chain, frame.address)?;
        FACTORY_MIGRATIONS.apply(storage, version, &context)?;
        chain.emit(frame.address, Event::Initialized { version });
        Ok(Bytes::new())
    }

    /// Deploys the account for (`owner`, `salt`) unless it already exists.
    #[instrument(skip_all, err, fields(factory = %frame.address, owner = %owner, salt = %salt))]
    fn create_account(
        &self,
        chain: &mut Chain,
        frame: &Frame,
        owner: Address,
        salt: U256,
    ) -> Result<Bytes, ExecutionError> {
        let implementation = self.account_implementation(chain, frame.address)?;
        let account = compute_account_address(frame.address, owner, salt, implementation);
        if chain.is_deployed(account) {
            tracing::debug!(%account, "account already deployed");
            return Ok(account.abi_encode().into());
        }
        let deployed = chain.create2(
            frame.address,
            B256::from(salt.to_be_bytes::<32>()),
            account_init_code_hash(implementation, owner),
            Code::Proxy { implementation },
        )?;
        chain.emit(deployed, Event::Upgraded { implementation });
        let init_data = ISimpleAccount::initializeCall { owner }.abi_encode();
        chain.call(frame.address, deployed, U256::ZERO, &init_data)?;
        chain.emit(
            frame.address,
            Event::AccountCreated {
                owner,
                account: deployed,
            },
        );
        tracing::info!(account = %deployed, "account created");
        Ok(deployed.abi_encode().into())
    }

    fn grant_role(
        chain: &mut Chain,
        frame: &Frame,
        role: B256,
        account: Address,
    ) -> Result<Bytes, ExecutionError> {
        let storage = FactoryStorage::load_mut(chain, frame.address)?;
        storage
            .roles
            .check_role(storage.roles.role_admin(role), frame.caller)?;
        if storage.roles.grant_role(role, account) {
            chain.emit(
                frame.address,
                Event::RoleGranted {
                    role,
                    account,
                    sender: frame.caller,
                },
            );
        }
        Ok(Bytes::new())
    }

    fn revoke_role(
        chain: &mut Chain,
        frame: &Frame,
        role: B256,
        account: Address,
    ) -> Result<Bytes, ExecutionError> {
        let storage = FactoryStorage::load_mut(chain, frame.address)?;
        storage
            .roles
            .check_role(storage.roles.role_admin(role), frame.caller)?;
        if storage.roles.revoke_role(role, account) {
            chain.emit(
                frame.address,
                Event::RoleRevoked {
                    role,
                    account,
                    sender: frame.caller,
                },
            );
        }
        Ok(Bytes::new())
    }

    fn renounce_role(
        chain: &mut Chain,
        frame: &Frame,
        role: B256,
        caller_confirmation: Address,
    ) -> Result<Bytes, ExecutionError> {
        if caller_confirmation != frame.caller {
            return Err(ExecutionError::Unauthorized {
                caller: frame.caller,
            });
        }
        let storage = FactoryStorage::load_mut(chain, frame.address)?;
        if storage.roles.revoke_role(role, frame.caller) {
            chain.emit(
                frame.address,
                Event::RoleRevoked {
                    role,
                    account: frame.caller,
                    sender: frame.caller,
                },
            );
        }
        Ok(Bytes::new())
    }
}

/// Gate of the factory's own upgrade.
pub fn authorize_upgrade(roles: &impl RoleStore, caller: Address) -> Result<(), ExecutionError> {
    roles.check_role(DEFAULT_ADMIN_ROLE, caller)
}

impl Contract for SimpleAccountFactory {
    fn descriptor(&self) -> ContractDescriptor {
        ContractDescriptor::new(SIMPLE_ACCOUNT_FACTORY, self.version.as_str())
    }

    fn call(&self, chain: &mut Chain, frame: &Frame, data: &[u8]) -> Result<Bytes, ExecutionError> {
        if data.is_empty() {
            return Ok(Bytes::new());
        }
        let call = decode_call::<ISimpleAccountFactoryCalls>(data)?;
        let factory = frame.address;
        match call {
            ISimpleAccountFactoryCalls::initialize(_) => self.initialize(chain, frame),
            ISimpleAccountFactoryCalls::initializeV2(_) if self.version >= FactoryVersion::V2 => {
                self.reinitialize(chain, frame, 2, None)
            }
            ISimpleAccountFactoryCalls::initializeV3(call)
                if self.version >= FactoryVersion::V3 =>
            {
                self.reinitialize(chain, frame, 3, Some(call.accountImplementation))
            }
            ISimpleAccountFactoryCalls::initializeV2(_) => Err(ExecutionError::UnknownSelector(
                ISimpleAccountFactory::initializeV2Call::SELECTOR.into(),
            )),
            ISimpleAccountFactoryCalls::initializeV3(_) => Err(ExecutionError::UnknownSelector(
                ISimpleAccountFactory::initializeV3Call::SELECTOR.into(),
            )),
            ISimpleAccountFactoryCalls::version(_) => {
                Ok(self.version.as_str().to_string().abi_encode().into())
            }
            ISimpleAccountFactoryCalls::accountImplementation(_) => {
                Ok(self.account_implementation(chain, factory)?.abi_encode().into())
            }
            ISimpleAccountFactoryCalls::accountImplementationVersion(_) => Ok(self
                .account_implementation_version(chain, factory)?
                .abi_encode()
                .into()),
            ISimpleAccountFactoryCalls::getAccountAddress(call) => {
                let implementation = self.account_implementation(chain, factory)?;
                let account = compute_account_address(
                    factory,
                    call.owner,
                    crate::address::DEFAULT_SALT,
                    implementation,
                );
                Ok(account.abi_encode().into())
            }
            ISimpleAccountFactoryCalls::getAccountAddressWithSalt(call) => {
                let implementation = self.account_implementation(chain, factory)?;
                let account =
                    compute_account_address(factory, call.owner, call.salt, implementation);
                Ok(account.abi_encode().into())
            }
            ISimpleAccountFactoryCalls::createAccount(call) => {
                self.create_account(chain, frame, call.owner, crate::address::DEFAULT_SALT)
            }
            ISimpleAccountFactoryCalls::createAccountWithSalt(call) => {
                self.create_account(chain, frame, call.owner, call.salt)
            }
            ISimpleAccountFactoryCalls::upgradeToAndCall(call) => {
                authorize_upgrade(&FactoryStorage::load(chain, factory)?.roles, frame.caller)?;
                proxy::upgrade_to_and_call(
                    chain,
                    frame,
                    call.newImplementation,
                    SIMPLE_ACCOUNT_FACTORY,
                    &call.data,
                )
            }
            ISimpleAccountFactoryCalls::DEFAULT_ADMIN_ROLE(_) => {
                Ok(DEFAULT_ADMIN_ROLE.abi_encode().into())
            }
            ISimpleAccountFactoryCalls::hasRole(call) => {
                let roles = &FactoryStorage::load(chain, factory)?.roles;
                Ok(roles.has_role(call.role, call.account).abi_encode().into())
            }
            ISimpleAccountFactoryCalls::getRoleAdmin(call) => {
                let roles = &FactoryStorage::load(chain, factory)?.roles;
                Ok(roles.role_admin(call.role).abi_encode().into())
            }
            ISimpleAccountFactoryCalls::grantRole(call) => {
                Self::grant_role(chain, frame, call.role, call.account)
            }
            ISimpleAccountFactoryCalls::revokeRole(call) => {
                Self::revoke_role(chain, frame, call.role, call.account)
            }
            ISimpleAccountFactoryCalls::renounceRole(call) => {
                Self::renounce_role(chain, frame, call.role, call.callerConfirmation)
            }
        }
    }
}
