//! Events emitted by accounts, the factory and proxies.

use alloy_primitives::{Address, B256};
use serde::Serialize;

/// A single event, tagged with its Solidity event name when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all_fields = "camelCase")]
pub enum Event {
    AccountCreated {
        owner: Address,
        account: Address,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    Upgraded {
        implementation: Address,
    },
    Initialized {
        version: u64,
    },
    RoleGranted {
        role: B256,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: B256,
        account: Address,
        sender: Address,
    },
}

/// An [`Event`] together with the address that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Log {
    pub address: Address,
    #[serde(flatten)]
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_log_serialization() {
        let log = Log {
            address: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            event: Event::Initialized { version: 3 },
        };
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["event"], "Initialized");
        assert_eq!(json["version"], 3);
    }

    #[test]
    fn test_event_fields_are_camel_case() {
        let event = Event::OwnershipTransferred {
            previous_owner: Address::ZERO,
            new_owner: Address::ZERO,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("previousOwner").is_some());
        assert!(json.get("newOwner").is_some());
    }
}
