use aa_types::timestamp::UnixTimestamp;
use alloy_primitives::{Address, B256, Bytes, U256};
use std::sync::Arc;
use tracing::instrument;

use crate::chain::Eip155ChainReference;
use crate::chain::state::{AccountState, Storage, WorldState};
use crate::contract::{Code, Contract, Frame};
use crate::error::ExecutionError;
use crate::events::{Event, Log};

/// A deterministic, in-memory execution environment.
///
/// Every [`Chain::transact`] runs to completion as one atomic unit: if it fails,
/// balances, nonces, code, storage and logs are restored to what they were before.
/// Nested [`Chain::call`]s are atomic in the same way, so a reverted sub-call never
/// leaves partial effects behind.
#[derive(Debug, Clone)]
pub struct Chain {
    chain: Eip155ChainReference,
    timestamp: UnixTimestamp,
    state: WorldState,
}

impl Chain {
    /// A fresh chain whose block time is the current wall-clock time.
    pub fn new(chain: Eip155ChainReference) -> Self {
        Self {
            chain,
            timestamp: UnixTimestamp::now(),
            state: WorldState::default(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: UnixTimestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn chain_reference(&self) -> Eip155ChainReference {
        self.chain
    }

    pub fn timestamp(&self) -> UnixTimestamp {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: UnixTimestamp) {
        self.timestamp = timestamp;
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.timestamp = self.timestamp + seconds;
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.state
            .get(&address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.state.get(&address).map(|a| a.nonce).unwrap_or_default()
    }

    /// Sets the balance of `address`, out of thin air.
    pub fn deal(&mut self, address: Address, amount: U256) {
        self.state.get_mut(address).balance = amount;
    }

    pub fn code(&self, address: Address) -> Option<&Code> {
        self.state.get(&address).and_then(|a| a.code.as_ref())
    }

    pub fn code_hash(&self, address: Address) -> Option<B256> {
        self.code(address).map(Code::code_hash)
    }

    pub fn is_deployed(&self, address: Address) -> bool {
        self.code(address).is_some()
    }

    /// Current implementation behind a proxy.
    pub fn implementation(&self, proxy: Address) -> Option<Address> {
        match self.code(proxy) {
            Some(Code::Proxy { implementation }) => Some(*implementation),
            _ => None,
        }
    }

    pub fn storage(&self, address: Address) -> Option<&Storage> {
        self.state.get(&address).map(|a| &a.storage)
    }

    pub fn storage_mut(&mut self, address: Address) -> &mut Storage {
        &mut self.state.get_mut(address).storage
    }

    pub fn logs(&self) -> &[Log] {
        self.state.logs()
    }

    pub fn emit(&mut self, address: Address, event: Event) {
        tracing::debug!(%address, ?event, "event");
        self.state.push_log(Log { address, event });
    }

    /// Logic deployed directly at `address`. Proxies and empty addresses are rejected.
    pub fn logic_at(&self, address: Address) -> Result<Arc<dyn Contract>, ExecutionError> {
        match self.code(address) {
            Some(Code::Logic(contract)) => Ok(contract.clone()),
            _ => Err(ExecutionError::InvalidImplementation(address)),
        }
    }

    /// Runs `f`, restoring every account and log it wrote if it fails.
    pub fn atomic<T>(
        &mut self,
        f: impl FnOnce(&mut Chain) -> Result<T, ExecutionError>,
    ) -> Result<T, ExecutionError> {
        self.state.checkpoint();
        let result = f(self);
        match result {
            Ok(_) => self.state.commit(),
            Err(_) => self.state.revert(),
        }
        result
    }

    /// Top-level transaction from an externally owned `sender`.
    ///
    /// The sender's nonce advances even if the transaction reverts.
    #[instrument(skip_all, err, fields(
        chain = %self.chain,
        sender = %sender,
        to = %to,
        value = %value,
    ))]
    pub fn transact(
        &mut self,
        sender: Address,
        to: Address,
        value: U256,
        data: impl Into<Bytes>,
    ) -> Result<Bytes, ExecutionError> {
        let data = data.into();
        self.state.get_mut(sender).nonce += 1;
        let result = self.call(sender, to, value, &data);
        match &result {
            Ok(_) => tracing::debug!("transaction succeeded"),
            Err(error) => tracing::info!(%error, "transaction reverted"),
        }
        result
    }

    /// Read-only call. Any state it writes is discarded.
    pub fn static_call(
        &self,
        caller: Address,
        to: Address,
        data: &[u8],
    ) -> Result<Bytes, ExecutionError> {
        let mut scratch = self.clone();
        scratch.call(caller, to, U256::ZERO, data)
    }

    /// Message call from `caller` to `to`, moving `value` along.
    pub fn call(
        &mut self,
        caller: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, ExecutionError> {
        self.atomic(|chain| {
            chain.transfer(caller, to, value)?;
            let frame = Frame {
                address: to,
                code_address: to,
                caller,
                value,
            };
            chain.dispatch(frame, data)
        })
    }

    /// Re-enters the code at `frame.address` with the same caller, as a proxy does
    /// when it runs initialization data against a freshly set implementation.
    pub fn delegate(&mut self, frame: &Frame, data: &[u8]) -> Result<Bytes, ExecutionError> {
        let frame = Frame {
            value: U256::ZERO,
            ..*frame
        };
        self.atomic(|chain| chain.dispatch(frame, data))
    }

    fn dispatch(&mut self, frame: Frame, data: &[u8]) -> Result<Bytes, ExecutionError> {
        let Some(code) = self.code(frame.address).cloned() else {
            return Ok(Bytes::new());
        };
        match code {
            Code::Logic(contract) => contract.call(self, &frame, data),
            Code::Proxy { implementation } => {
                let contract = self.logic_at(implementation)?;
                let frame = Frame {
                    code_address: implementation,
                    ..frame
                };
                contract.call(self, &frame, data)
            }
        }
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), ExecutionError> {
        if value.is_zero() {
            return Ok(());
        }
        let balance = self.balance(from);
        if balance < value {
            return Err(ExecutionError::InsufficientBalance {
                account: from,
                balance,
                required: value,
            });
        }
        self.state.get_mut(from).balance = balance - value;
        let recipient = self.state.get_mut(to);
        recipient.balance = recipient.balance.saturating_add(value);
        Ok(())
    }

    /// CREATE: deploys `code` at `sender.create(nonce)` and advances the sender's nonce.
    #[instrument(skip_all, err, fields(sender = %sender, code = %code.descriptor()))]
    pub fn deploy(&mut self, sender: Address, code: Code) -> Result<Address, ExecutionError> {
        let account = self.state.get_mut(sender);
        let address = sender.create(account.nonce);
        account.nonce += 1;
        self.install(address, code)?;
        tracing::info!(%address, "contract deployed");
        Ok(address)
    }

    /// Deploys a proxy pointing at `implementation` and runs `init_data` through it,
    /// with `sender` as the caller, in one atomic step.
    #[instrument(skip_all, err, fields(sender = %sender, implementation = %implementation))]
    pub fn deploy_proxy(
        &mut self,
        sender: Address,
        implementation: Address,
        init_data: &[u8],
    ) -> Result<Address, ExecutionError> {
        self.atomic(|chain| {
            chain.logic_at(implementation)?;
            let address = chain.deploy(sender, Code::Proxy { implementation })?;
            chain.emit(address, Event::Upgraded { implementation });
            if !init_data.is_empty() {
                let frame = Frame {
                    address,
                    code_address: address,
                    caller: sender,
                    value: U256::ZERO,
                };
                chain.dispatch(frame, init_data)?;
            }
            Ok(address)
        })
    }

    /// CREATE2: deploys `code` at `deployer.create2(salt, init_code_hash)`.
    ///
    /// Fails with [`ExecutionError::AlreadyDeployed`] if code is already there.
    /// Any balance already held by the address is kept.
    pub fn create2(
        &mut self,
        deployer: Address,
        salt: B256,
        init_code_hash: B256,
        code: Code,
    ) -> Result<Address, ExecutionError> {
        let address = deployer.create2(salt, init_code_hash);
        self.install(address, code)?;
        tracing::info!(%deployer, %address, "contract deployed with create2");
        Ok(address)
    }

    /// Points the proxy at `proxy` to a new implementation.
    pub fn set_implementation(
        &mut self,
        proxy: Address,
        implementation: Address,
    ) -> Result<(), ExecutionError> {
        match self.state.get_mut(proxy).code.as_mut() {
            Some(Code::Proxy { implementation: current }) => {
                *current = implementation;
                Ok(())
            }
            _ => Err(ExecutionError::NotDelegated),
        }
    }

    fn install(&mut self, address: Address, code: Code) -> Result<(), ExecutionError> {
        let account: &mut AccountState = self.state.get_mut(address);
        if account.code.is_some() {
            return Err(ExecutionError::AlreadyDeployed(address));
        }
        account.code = Some(code);
        account.nonce = account.nonce.max(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Counter, Reverter, chain_at};
    use alloy_primitives::b256;

    const ALICE: Address = Address::with_last_byte(0xa1);
    const BOB: Address = Address::with_last_byte(0xb0);

    #[test]
    fn test_transfer_moves_value() {
        let mut chain = chain_at(1_000);
        chain.deal(ALICE, U256::from(100));
        chain.transact(ALICE, BOB, U256::from(40), Bytes::new()).unwrap();
        assert_eq!(chain.balance(ALICE), U256::from(60));
        assert_eq!(chain.balance(BOB), U256::from(40));
        assert_eq!(chain.nonce(ALICE), 1);
    }

    #[test]
    fn test_insufficient_balance_reverts() {
        let mut chain = chain_at(1_000);
        chain.deal(ALICE, U256::from(10));
        let err = chain
            .transact(ALICE, BOB, U256::from(11), Bytes::new())
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InsufficientBalance { .. }));
        assert_eq!(chain.balance(ALICE), U256::from(10));
        assert_eq!(chain.nonce(ALICE), 1);
    }

    #[test]
    fn test_reverted_transaction_restores_value_and_logs() {
        let mut chain = chain_at(1_000);
        let reverter = chain.deploy(ALICE, Code::logic(Reverter)).unwrap();
        chain.deal(ALICE, U256::from(5));
        let logs_before = chain.logs().len();
        let err = chain
            .transact(ALICE, reverter, U256::from(5), Bytes::from_static(b"\x01"))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Reverted(_)));
        assert_eq!(chain.balance(ALICE), U256::from(5));
        assert_eq!(chain.balance(reverter), U256::ZERO);
        assert_eq!(chain.logs().len(), logs_before);
    }

    #[test]
    fn test_revert_after_long_history_only_undoes_its_frame() {
        let mut chain = chain_at(1_000);
        let counter = chain.deploy(ALICE, Code::logic(Counter)).unwrap();
        let reverter = chain.deploy(ALICE, Code::logic(Reverter)).unwrap();
        let proxies: Vec<Address> = (0..64)
            .map(|_| chain.deploy_proxy(ALICE, counter, &Counter::increment()).unwrap())
            .collect();
        let logs = chain.logs().to_vec();
        let nonce = chain.nonce(ALICE);

        let err = chain
            .deploy_proxy(ALICE, reverter, &[0x01])
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Reverted(_)));
        assert_eq!(chain.logs(), logs.as_slice());
        assert_eq!(chain.nonce(ALICE), nonce);
        assert!(!chain.is_deployed(ALICE.create(nonce)));
        assert!(proxies.iter().all(|proxy| Counter::value(&chain, *proxy) == 1));
    }

    #[test]
    fn test_static_call_discards_writes() {
        let mut chain = chain_at(1_000);
        let counter = chain.deploy(ALICE, Code::logic(Counter)).unwrap();
        chain.transact(ALICE, counter, U256::ZERO, Counter::increment()).unwrap();
        let out = chain.static_call(ALICE, counter, &Counter::increment()).unwrap();
        assert_eq!(Counter::decode(&out), 2);
        assert_eq!(Counter::value(&chain, counter), 1);
    }

    #[test]
    fn test_deploy_uses_create_addresses() {
        let mut chain = chain_at(1_000);
        let first = chain.deploy(ALICE, Code::logic(Counter)).unwrap();
        let second = chain.deploy(ALICE, Code::logic(Counter)).unwrap();
        assert_eq!(first, ALICE.create(0));
        assert_eq!(second, ALICE.create(1));
        assert!(chain.is_deployed(first));
        assert_eq!(
            chain.code_hash(first),
            Some(Code::logic(Counter).code_hash())
        );
    }

    #[test]
    fn test_create2_rejects_occupied_address_and_keeps_balance() {
        let mut chain = chain_at(1_000);
        let salt = B256::ZERO;
        let hash = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");
        let predicted = ALICE.create2(salt, hash);
        chain.deal(predicted, U256::from(7));

        let deployed = chain
            .create2(ALICE, salt, hash, Code::logic(Counter))
            .unwrap();
        assert_eq!(deployed, predicted);
        assert_eq!(chain.balance(deployed), U256::from(7));

        let err = chain
            .create2(ALICE, salt, hash, Code::logic(Counter))
            .unwrap_err();
        assert_eq!(err, ExecutionError::AlreadyDeployed(predicted));
    }

    #[test]
    fn test_proxy_keeps_storage_across_implementations() {
        let mut chain = chain_at(1_000);
        let logic = chain.deploy(ALICE, Code::logic(Counter)).unwrap();
        let proxy = chain.deploy_proxy(ALICE, logic, &Counter::increment()).unwrap();
        assert_eq!(chain.implementation(proxy), Some(logic));
        assert_eq!(Counter::value(&chain, proxy), 1);
        assert_eq!(Counter::value(&chain, logic), 0);

        let other = chain.deploy(ALICE, Code::logic(Counter)).unwrap();
        chain.set_implementation(proxy, other).unwrap();
        chain.transact(ALICE, proxy, U256::ZERO, Counter::increment()).unwrap();
        assert_eq!(Counter::value(&chain, proxy), 2);
        assert!(chain.logs().contains(&Log {
            address: proxy,
            event: Event::Upgraded {
                implementation: logic
            }
        }));
    }

    #[test]
    fn test_proxy_to_missing_logic_is_rejected() {
        let mut chain = chain_at(1_000);
        let err = chain.deploy_proxy(ALICE, BOB, &[]).unwrap_err();
        assert_eq!(err, ExecutionError::InvalidImplementation(BOB));
        assert_eq!(chain.nonce(ALICE), 0);
    }

    #[test]
    fn test_time_controls() {
        let mut chain = chain_at(1_000);
        chain.advance_time(60);
        assert_eq!(chain.timestamp(), UnixTimestamp::from_secs(1_060));
        chain.set_timestamp(UnixTimestamp::from_secs(5));
        assert_eq!(chain.timestamp().as_secs(), 5);
    }
}
