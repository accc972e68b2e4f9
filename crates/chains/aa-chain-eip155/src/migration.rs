//! Versioned initializers.
//!
//! Upgradeable logic keeps an "initialized version" counter in storage. A
//! [`MigrationTable`] lists the initializer of every version; the coordinator runs
//! a step only if it directly follows the current version, then bumps the counter.

use crate::error::ExecutionError;

/// Storage that records which initializers have run.
pub trait Initializable {
    fn initialized_version(&self) -> u64;

    fn set_initialized_version(&mut self, version: u64);
}

pub type Initializer<S, C> = fn(&mut S, &C) -> Result<(), ExecutionError>;

/// The setup step of one version.
pub struct Migration<S: 'static, C: 'static> {
    pub version: u64,
    pub name: &'static str,
    pub run: Initializer<S, C>,
}

/// Ordered initializers, starting at version 1.
pub struct MigrationTable<S: 'static, C: 'static> {
    migrations: &'static [Migration<S, C>],
}

impl<S: Initializable, C> MigrationTable<S, C> {
    pub const fn new(migrations: &'static [Migration<S, C>]) -> Self {
        Self { migrations }
    }

    /// The migration for `requested`, if it may run when storage is at `current`.
    pub fn check(&self, current: u64, requested: u64) -> Result<&Migration<S, C>, ExecutionError> {
        if requested <= current {
            return Err(ExecutionError::AlreadyInitialized { current, requested });
        }
        if requested != current + 1 {
            return Err(ExecutionError::InitializerOutOfOrder { current, requested });
        }
        self.migrations
            .iter()
            .find(|m| m.version == requested)
            .ok_or(ExecutionError::InitializerOutOfOrder { current, requested })
    }

    /// Runs the initializer of `requested`. On failure `state` may be partially written;
    /// callers rely on the surrounding transaction to roll it back.
    pub fn apply(&self, state: &mut S, requested: u64, context: &C) -> Result<(), ExecutionError> {
        let current = state.initialized_version();
        let migration = self.check(current, requested)?;
        (migration.run)(state, context)?;
        state.set_initialized_version(requested);
        tracing::debug!(version = requested, name = migration.name, "initializer ran");
        Ok(())
    }

    /// Runs every initializer from the current version up to `target`, in order.
    /// Returns the versions that ran.
    pub fn apply_through(
        &self,
        state: &mut S,
        target: u64,
        context: &C,
    ) -> Result<Vec<u64>, ExecutionError> {
        let current = state.initialized_version();
        if target <= current {
            return Err(ExecutionError::AlreadyInitialized {
                current,
                requested: target,
            });
        }
        (current + 1..=target)
            .map(|version| self.apply(state, version, context).map(|_| version))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ledger {
        version: u64,
        steps: Vec<&'static str>,
    }

    impl Initializable for Ledger {
        fn initialized_version(&self) -> u64 {
            self.version
        }

        fn set_initialized_version(&mut self, version: u64) {
            self.version = version;
        }
    }

    fn first(ledger: &mut Ledger, _: &()) -> Result<(), ExecutionError> {
        ledger.steps.push("first");
        Ok(())
    }

    fn second(ledger: &mut Ledger, _: &()) -> Result<(), ExecutionError> {
        ledger.steps.push("second");
        Ok(())
    }

    fn third(_: &mut Ledger, _: &()) -> Result<(), ExecutionError> {
        Err(ExecutionError::Reverted("third".into()))
    }

    const TABLE: MigrationTable<Ledger, ()> = MigrationTable::new(&[
        Migration {
            version: 1,
            name: "first",
            run: first,
        },
        Migration {
            version: 2,
            name: "second",
            run: second,
        },
        Migration {
            version: 3,
            name: "third",
            run: third,
        },
    ]);

    #[test]
    fn test_runs_in_order_exactly_once() {
        let mut ledger = Ledger::default();
        TABLE.apply(&mut ledger, 1, &()).unwrap();
        TABLE.apply(&mut ledger, 2, &()).unwrap();
        assert_eq!(ledger.steps, vec!["first", "second"]);
        assert_eq!(
            TABLE.apply(&mut ledger, 2, &()),
            Err(ExecutionError::AlreadyInitialized {
                current: 2,
                requested: 2
            })
        );
        assert_eq!(
            TABLE.apply(&mut ledger, 1, &()),
            Err(ExecutionError::AlreadyInitialized {
                current: 2,
                requested: 1
            })
        );
    }

    #[test]
    fn test_rejects_skipping_a_version() {
        let mut ledger = Ledger::default();
        TABLE.apply(&mut ledger, 1, &()).unwrap();
        assert_eq!(
            TABLE.apply(&mut ledger, 3, &()),
            Err(ExecutionError::InitializerOutOfOrder {
                current: 1,
                requested: 3
            })
        );
        assert_eq!(ledger.version, 1);
    }

    #[test]
    fn test_failed_step_keeps_version() {
        let mut ledger = Ledger::default();
        let err = TABLE.apply_through(&mut ledger, 3, &()).unwrap_err();
        assert!(matches!(err, ExecutionError::Reverted(_)));
        assert_eq!(ledger.version, 2);
    }

    #[test]
    fn test_apply_through() {
        let mut ledger = Ledger::default();
        let ran = TABLE.apply_through(&mut ledger, 2, &()).unwrap();
        assert_eq!(ran, vec![1, 2]);
        assert!(TABLE.apply_through(&mut ledger, 2, &()).is_err());
    }
}
