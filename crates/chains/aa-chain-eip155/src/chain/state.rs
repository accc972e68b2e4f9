use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use std::sync::Arc;

use crate::account::AccountStorage;
use crate::contract::Code;
use crate::events::Log;
use crate::factory::FactoryStorage;

/// Per-address state.
///
/// Balance is independent of code, so funds sent to an address before anything
/// is deployed there survive the deployment.
#[derive(Debug, Clone, Default)]
pub struct AccountState {
    pub balance: U256,
    pub nonce: u64,
    pub code: Option<Code>,
    pub storage: Storage,
}

/// Typed storage layouts.
///
/// Storage belongs to the address, not to the code: swapping a proxy's
/// implementation leaves it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Storage {
    #[default]
    Empty,
    Account(AccountStorage),
    Factory(FactoryStorage),
    #[cfg(test)]
    Counter(U256),
}

impl Storage {
    pub fn is_empty(&self) -> bool {
        matches!(self, Storage::Empty)
    }
}

/// Accounts as they were before the open frame first touched them.
#[derive(Debug, Clone, Default)]
struct Checkpoint {
    logs: usize,
    touched: HashMap<Address, Option<AccountState>>,
}

/// Everything a transaction can change.
///
/// Rollback is journaled: each open checkpoint keeps the prior value of the
/// accounts written since it was taken and the log length at that point. The
/// account map and the logs sit behind an [`Arc`], so a clone for a read-only
/// call shares them until it writes.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    accounts: Arc<HashMap<Address, AccountState>>,
    logs: Arc<Vec<Log>>,
    journal: Vec<Checkpoint>,
}

impl WorldState {
    pub fn get(&self, address: &Address) -> Option<&AccountState> {
        self.accounts.get(address)
    }

    pub fn get_mut(&mut self, address: Address) -> &mut AccountState {
        if let Some(checkpoint) = self.journal.last_mut() {
            checkpoint
                .touched
                .entry(address)
                .or_insert_with(|| self.accounts.get(&address).cloned());
        }
        Arc::make_mut(&mut self.accounts).entry(address).or_default()
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub fn push_log(&mut self, log: Log) {
        Arc::make_mut(&mut self.logs).push(log);
    }

    pub(crate) fn checkpoint(&mut self) {
        self.journal.push(Checkpoint {
            logs: self.logs.len(),
            touched: HashMap::new(),
        });
    }

    /// Folds the innermost checkpoint into its parent.
    pub(crate) fn commit(&mut self) {
        let Some(done) = self.journal.pop() else {
            return;
        };
        if let Some(parent) = self.journal.last_mut() {
            for (address, previous) in done.touched {
                parent.touched.entry(address).or_insert(previous);
            }
        }
    }

    /// Restores every account and log written since the innermost checkpoint.
    pub(crate) fn revert(&mut self) {
        let Some(done) = self.journal.pop() else {
            return;
        };
        if self.logs.len() > done.logs {
            Arc::make_mut(&mut self.logs).truncate(done.logs);
        }
        if done.touched.is_empty() {
            return;
        }
        let accounts = Arc::make_mut(&mut self.accounts);
        for (address, previous) in done.touched {
            match previous {
                Some(account) => {
                    accounts.insert(address, account);
                }
                None => {
                    accounts.remove(&address);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;

    const ALICE: Address = Address::with_last_byte(0xa1);
    const BOB: Address = Address::with_last_byte(0xb0);

    fn upgraded(address: Address) -> Log {
        Log {
            address,
            event: Event::Upgraded {
                implementation: address,
            },
        }
    }

    #[test]
    fn test_revert_restores_touched_accounts_and_logs() {
        let mut state = WorldState::default();
        state.get_mut(ALICE).balance = U256::from(10);
        state.push_log(upgraded(ALICE));

        state.checkpoint();
        state.get_mut(ALICE).balance = U256::from(3);
        state.get_mut(BOB).nonce = 7;
        state.push_log(upgraded(BOB));
        state.revert();

        assert_eq!(state.get(&ALICE).map(|a| a.balance), Some(U256::from(10)));
        assert!(state.get(&BOB).is_none());
        assert_eq!(state.logs(), &[upgraded(ALICE)]);
    }

    #[test]
    fn test_committed_frame_is_undone_by_outer_revert() {
        let mut state = WorldState::default();
        state.checkpoint();
        state.get_mut(ALICE).nonce = 1;
        state.checkpoint();
        state.get_mut(ALICE).nonce = 2;
        state.get_mut(BOB).nonce = 1;
        state.commit();
        assert_eq!(state.get(&BOB).map(|a| a.nonce), Some(1));
        state.revert();
        assert!(state.get(&ALICE).is_none());
        assert!(state.get(&BOB).is_none());
    }

    #[test]
    fn test_inner_revert_keeps_outer_writes() {
        let mut state = WorldState::default();
        state.checkpoint();
        state.get_mut(ALICE).nonce = 1;
        state.push_log(upgraded(ALICE));
        state.checkpoint();
        state.get_mut(ALICE).nonce = 2;
        state.push_log(upgraded(BOB));
        state.revert();
        state.commit();
        assert_eq!(state.get(&ALICE).map(|a| a.nonce), Some(1));
        assert_eq!(state.logs(), &[upgraded(ALICE)]);
    }

    #[test]
    fn test_clone_shares_until_written() {
        let mut state = WorldState::default();
        state.get_mut(ALICE).nonce = 1;
        let mut scratch = state.clone();
        scratch.get_mut(ALICE).nonce = 5;
        assert_eq!(state.get(&ALICE).map(|a| a.nonce), Some(1));
        assert_eq!(scratch.get(&ALICE).map(|a| a.nonce), Some(5));
    }
}
