use aa_types::timestamp::UnixTimestamp;
use alloy_primitives::{Address, Selector, U256};

/// Reasons an invocation against the [`Chain`](crate::chain::Chain) reverts.
///
/// Any error returned from a transaction discards every state change it made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The caller is not the account owner, not the account itself, and lacks the required role.
    #[error("Caller {caller} is not authorized")]
    Unauthorized { caller: Address },
    /// Recovered signer differs from the owner, or the signature bytes are malformed.
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),
    #[error("Authorization is not valid before {valid_after} (now {now})")]
    AuthorizationNotYetValid {
        valid_after: UnixTimestamp,
        now: UnixTimestamp,
    },
    #[error("Authorization expired at {valid_before} (now {now})")]
    AuthorizationExpired {
        valid_before: UnixTimestamp,
        now: UnixTimestamp,
    },
    #[error("Batch lengths differ: {to} targets, {value} values, {data} payloads")]
    LengthMismatch { to: usize, value: usize, data: usize },
    #[error("Already initialized at version {current}, cannot run initializer {requested}")]
    AlreadyInitialized { current: u64, requested: u64 },
    #[error("Initializer {requested} cannot run at version {current}")]
    InitializerOutOfOrder { current: u64, requested: u64 },
    #[error("Code already deployed at {0}")]
    AlreadyDeployed(Address),
    #[error("Call #{index} to {target} failed: {source}")]
    SubcallFailed {
        index: usize,
        target: Address,
        #[source]
        source: Box<ExecutionError>,
    },
    #[error("Insufficient balance at {account}: has {balance}, needs {required}")]
    InsufficientBalance {
        account: Address,
        balance: U256,
        required: U256,
    },
    #[error("Unknown function selector {0}")]
    UnknownSelector(Selector),
    #[error("Invalid calldata: {0}")]
    InvalidCalldata(String),
    /// The address does not hold logic of the expected kind.
    #[error("Invalid implementation {0}")]
    InvalidImplementation(Address),
    #[error("Storage at {0} does not match the expected layout")]
    StorageLayoutMismatch(Address),
    /// Proxy-only entry point invoked on the logic contract itself.
    #[error("Function must be called through a proxy")]
    NotDelegated,
    #[error("Account implementation is not set")]
    AccountImplementationUnset,
    #[error("Reverted: {0}")]
    Reverted(String),
}

impl ExecutionError {
    /// Unwraps nested [`ExecutionError::SubcallFailed`] layers down to the originating revert.
    pub fn root_cause(&self) -> &ExecutionError {
        match self {
            ExecutionError::SubcallFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_nested_subcalls() {
        let inner = ExecutionError::Reverted("nope".into());
        let err = ExecutionError::SubcallFailed {
            index: 2,
            target: Address::ZERO,
            source: Box::new(ExecutionError::SubcallFailed {
                index: 0,
                target: Address::ZERO,
                source: Box::new(inner.clone()),
            }),
        };
        assert_eq!(err.root_cause(), &inner);
        assert!(err.to_string().starts_with("Call #2"));
    }
}
