//! `SimpleAccount`: a smart account controlled by a single owner.
//!
//! The owner (or the account itself, when reached through one of its own
//! `execute*` calls) may execute calls, transfer ownership and upgrade the logic.
//! Anyone may submit an execution the owner signed as an EIP-712
//! [`Authorization`](crate::authorization::Authorization).
//!
//! Accounts are deployed as proxies; the logic here always runs against the
//! proxy's [`AccountStorage`].

mod instance;

pub use instance::*;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolStruct, SolValue};
use serde::Serialize;
use tracing::instrument;

use crate::authorization::{
    Call, ExecuteBatchWithAuthorization, ExecuteWithAuthorization, account_domain, assert_time,
    timestamp_from_u256, zip_calls,
};
use crate::chain::{Chain, Storage};
use crate::contract::{Contract, ContractDescriptor, Frame};
use crate::error::ExecutionError;
use crate::events::Event;
use crate::interfaces::ISimpleAccount::{self, ISimpleAccountCalls};
use crate::interfaces::decode_call;
use crate::migration::{Initializable, Migration, MigrationTable};
use crate::proxy;
use crate::signature::verify_signer;

/// Kind reported by every version of the account logic.
pub const SIMPLE_ACCOUNT: &str = "SimpleAccount";

/// Released versions of the account logic.
///
/// V2 added `version()`. V3 behaves exactly like V2 and differs only in its
/// version label: it is the release a V3 factory rolls out through
/// `initializeV3`, which records it as the account implementation for new
/// accounts. Existing accounts reach it only through their own `upgradeToAndCall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AccountVersion {
    V1,
    V2,
    V3,
}

impl AccountVersion {
    pub const LATEST: AccountVersion = AccountVersion::V3;

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountVersion::V1 => "1",
            AccountVersion::V2 => "2",
            AccountVersion::V3 => "3",
        }
    }

    /// Value returned by `version()`. V1 predates that function.
    pub fn reported(&self) -> Option<&'static str> {
        match self {
            AccountVersion::V1 => None,
            other => Some(other.as_str()),
        }
    }
}

/// Persistent state of an account proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountStorage {
    pub owner: Address,
    pub initialized: u64,
}

impl AccountStorage {
    pub const EMPTY: AccountStorage = AccountStorage {
        owner: Address::ZERO,
        initialized: 0,
    };

    /// Storage at `address`, or [`AccountStorage::EMPTY`] if nothing was written yet.
    pub fn load(chain: &Chain, address: Address) -> Result<&AccountStorage, ExecutionError> {
        match chain.storage(address) {
            None | Some(Storage::Empty) => Ok(&AccountStorage::EMPTY),
            Some(Storage::Account(storage)) => Ok(storage),
            Some(_) => Err(ExecutionError::StorageLayoutMismatch(address)),
        }
    }

    pub fn load_mut(
        chain: &mut Chain,
        address: Address,
    ) -> Result<&mut AccountStorage, ExecutionError> {
        let storage = chain.storage_mut(address);
        if storage.is_empty() {
            *storage = Storage::Account(AccountStorage::default());
        }
        match storage {
            Storage::Account(storage) => Ok(storage),
            _ => Err(ExecutionError::StorageLayoutMismatch(address)),
        }
    }
}

impl Initializable for AccountStorage {
    fn initialized_version(&self) -> u64 {
        self.initialized
    }

    fn set_initialized_version(&mut self, version: u64) {
        self.initialized = version;
    }
}

fn set_owner(storage: &mut AccountStorage, owner: &Address) -> Result<(), ExecutionError> {
    storage.owner = *owner;
    Ok(())
}

/// Account initializers. Upgrades between account versions do not add steps.
pub const ACCOUNT_MIGRATIONS: MigrationTable<AccountStorage, Address> =
    MigrationTable::new(&[Migration {
        version: 1,
        name: "initialize",
        run: set_owner,
    }]);

/// Account logic of one [`AccountVersion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleAccount {
    version: AccountVersion,
}

impl SimpleAccount {
    pub const fn new(version: AccountVersion) -> Self {
        Self { version }
    }

    pub const fn latest() -> Self {
        Self::new(AccountVersion::LATEST)
    }

    pub fn version(&self) -> AccountVersion {
        self.version
    }

    #[instrument(skip_all, err, fields(account = %frame.address, owner = %owner))]
    fn initialize(
        &self,
        chain: &mut Chain,
        frame: &Frame,
        owner: Address,
    ) -> Result<Bytes, ExecutionError> {
        if !frame.is_delegated() {
            return Err(ExecutionError::NotDelegated);
        }
        let storage = AccountStorage::load_mut(chain, frame.address)?;
        ACCOUNT_MIGRATIONS.apply(storage, 1, &owner)?;
        chain.emit(frame.address, Event::Initialized { version: 1 });
        chain.emit(
            frame.address,
            Event::OwnershipTransferred {
                previous_owner: Address::ZERO,
                new_owner: owner,
            },
        );
        Ok(Bytes::new())
    }

    fn require_owner_or_self(chain: &Chain, frame: &Frame) -> Result<(), ExecutionError> {
        let owner = AccountStorage::load(chain, frame.address)?.owner;
        if frame.caller == owner || frame.caller == frame.address {
            Ok(())
        } else {
            Err(ExecutionError::Unauthorized {
                caller: frame.caller,
            })
        }
    }

    /// Verifies the owner's signature over `payload` and the validity window.
    #[instrument(skip_all, err, fields(account = %frame.address, relayer = %frame.caller))]
    fn authorize<T: SolStruct>(
        chain: &Chain,
        frame: &Frame,
        payload: &T,
        valid_after: U256,
        valid_before: U256,
        signature: &[u8],
    ) -> Result<(), ExecutionError> {
        assert_time(
            chain.timestamp(),
            timestamp_from_u256(valid_after),
            timestamp_from_u256(valid_before),
        )?;
        let owner = AccountStorage::load(chain, frame.address)?.owner;
        let domain = account_domain(&chain.chain_reference(), frame.address);
        verify_signer(owner, &domain, payload, signature)?;
        Ok(())
    }

    /// Performs `calls` in order from `account`. Any failure undoes all of them.
    fn execute_calls(
        chain: &mut Chain,
        account: Address,
        calls: &[Call],
    ) -> Result<Bytes, ExecutionError> {
        chain.atomic(|chain| {
            for (index, call) in calls.iter().enumerate() {
                chain
                    .call(account, call.to, call.value, &call.data)
                    .map_err(|source| ExecutionError::SubcallFailed {
                        index,
                        target: call.to,
                        source: Box::new(source),
                    })?;
            }
            Ok(Bytes::new())
        })
    }

    fn transfer_ownership(
        chain: &mut Chain,
        frame: &Frame,
        new_owner: Address,
    ) -> Result<Bytes, ExecutionError> {
        Self::require_owner_or_self(chain, frame)?;
        let storage = AccountStorage::load_mut(chain, frame.address)?;
        let previous_owner = std::mem::replace(&mut storage.owner, new_owner);
        chain.emit(
            frame.address,
            Event::OwnershipTransferred {
                previous_owner,
                new_owner,
            },
        );
        Ok(Bytes::new())
    }
}

impl Contract for SimpleAccount {
    fn descriptor(&self) -> ContractDescriptor {
        ContractDescriptor::new(SIMPLE_ACCOUNT, self.version.as_str())
    }

    fn call(&self, chain: &mut Chain, frame: &Frame, data: &[u8]) -> Result<Bytes, ExecutionError> {
        if data.is_empty() {
            return Ok(Bytes::new());
        }
        match decode_call::<ISimpleAccountCalls>(data)? {
            ISimpleAccountCalls::initialize(call) => self.initialize(chain, frame, call.owner),
            ISimpleAccountCalls::owner(_) => {
                let owner = AccountStorage::load(chain, frame.address)?.owner;
                Ok(owner.abi_encode().into())
            }
            ISimpleAccountCalls::version(_) => match self.version.reported() {
                Some(version) => Ok(version.to_string().abi_encode().into()),
                None => Err(ExecutionError::UnknownSelector(
                    ISimpleAccount::versionCall::SELECTOR.into(),
                )),
            },
            ISimpleAccountCalls::execute(call) => {
                Self::require_owner_or_self(chain, frame)?;
                let calls = [Call {
                    to: call.to,
                    value: call.value,
                    data: call.data,
                }];
                Self::execute_calls(chain, frame.address, &calls)
            }
            ISimpleAccountCalls::executeBatch(call) => {
                Self::require_owner_or_self(chain, frame)?;
                let calls = zip_calls(&call.to, &call.value, &call.data)?;
                Self::execute_calls(chain, frame.address, &calls)
            }
            ISimpleAccountCalls::executeWithAuthorization(call) => {
                let payload = ExecuteWithAuthorization {
                    to: call.to,
                    value: call.value,
                    data: call.data,
                    validAfter: call.validAfter,
                    validBefore: call.validBefore,
                };
                Self::authorize(
                    chain,
                    frame,
                    &payload,
                    call.validAfter,
                    call.validBefore,
                    &call.signature,
                )?;
                let calls = [Call {
                    to: payload.to,
                    value: payload.value,
                    data: payload.data,
                }];
                Self::execute_calls(chain, frame.address, &calls)
            }
            ISimpleAccountCalls::executeBatchWithAuthorization(call) => {
                let calls = zip_calls(&call.to, &call.value, &call.data)?;
                let payload = ExecuteBatchWithAuthorization {
                    to: call.to,
                    value: call.value,
                    data: call.data,
                    validAfter: call.validAfter,
                    validBefore: call.validBefore,
                };
                Self::authorize(
                    chain,
                    frame,
                    &payload,
                    call.validAfter,
                    call.validBefore,
                    &call.signature,
                )?;
                Self::execute_calls(chain, frame.address, &calls)
            }
            ISimpleAccountCalls::transferOwnership(call) => {
                Self::transfer_ownership(chain, frame, call.newOwner)
            }
            ISimpleAccountCalls::upgradeToAndCall(call) => {
                Self::require_owner_or_self(chain, frame)?;
                proxy::upgrade_to_and_call(
                    chain,
                    frame,
                    call.newImplementation,
                    SIMPLE_ACCOUNT,
                    &call.data,
                )
            }
        }
    }
}
