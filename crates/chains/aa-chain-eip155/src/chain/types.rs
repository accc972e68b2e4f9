//! Wire format types for EVM chain interactions.
//!
//! These types handle serialization of EVM-specific values as they cross the
//! relayer's JSON boundary: checksummed addresses, decimal `U256` amounts and
//! numeric chain references.

use aa_types::chain::ChainId;
use alloy_primitives::{Address, U256, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// An Ethereum address that serializes with EIP-55 checksum encoding.
///
/// # Example
///
/// ```
/// use aa_chain_eip155::chain::ChecksummedAddress;
///
/// let addr: ChecksummedAddress = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap();
/// assert_eq!(addr.to_string(), "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ChecksummedAddress(pub Address);

impl FromStr for ChecksummedAddress {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Address::from_str(s)?;
        Ok(Self(address))
    }
}

impl Display for ChecksummedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_checksum(None))
    }
}

impl Serialize for ChecksummedAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_checksum(None))
    }
}

impl<'de> Deserialize<'de> for ChecksummedAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<ChecksummedAddress> for Address {
    fn from(value: ChecksummedAddress) -> Self {
        value.0
    }
}

impl From<Address> for ChecksummedAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl PartialEq<ChecksummedAddress> for Address {
    fn eq(&self, other: &ChecksummedAddress) -> bool {
        self.eq(&other.0)
    }
}

pub mod decimal_u256 {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a U256 as a decimal string.
    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize a decimal string into a U256.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
    }
}

/// Same as [`decimal_u256`], for the parallel `value[]` sequence of a batch.
pub mod decimal_u256_seq {
    use alloy_primitives::U256;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &[U256], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| U256::from_str_radix(s, 10).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// The CAIP-2 namespace for EVM-compatible chains.
pub const EIP155_NAMESPACE: &str = "eip155";

/// A numeric chain ID for EVM-compatible networks.
///
/// Every account's EIP-712 domain commits to this value, so an authorization
/// signed for one chain never verifies on another.
///
/// # Example
///
/// ```
/// use aa_chain_eip155::chain::Eip155ChainReference;
/// use aa_types::chain::ChainId;
///
/// let vechain = Eip155ChainReference::new(100009);
/// let chain_id: ChainId = vechain.into();
/// assert_eq!(chain_id.to_string(), "eip155:100009");
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Eip155ChainReference(u64);

impl Eip155ChainReference {
    /// Creates a new chain reference from a numeric chain ID.
    pub fn new(chain_id: u64) -> Self {
        Self(chain_id)
    }

    /// Returns the numeric chain ID.
    pub fn inner(&self) -> u64 {
        self.0
    }

    /// Converts this chain reference to a CAIP-2 [`ChainId`].
    pub fn as_chain_id(&self) -> ChainId {
        ChainId::new(EIP155_NAMESPACE, self.0.to_string())
    }
}

impl From<Eip155ChainReference> for ChainId {
    fn from(value: Eip155ChainReference) -> Self {
        value.as_chain_id()
    }
}

impl TryFrom<&ChainId> for Eip155ChainReference {
    type Error = Eip155ChainReferenceFormatError;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace != EIP155_NAMESPACE {
            return Err(Eip155ChainReferenceFormatError::InvalidNamespace(
                value.namespace.clone(),
            ));
        }
        let chain_id: u64 = value.reference.parse().map_err(|_| {
            Eip155ChainReferenceFormatError::InvalidReference(value.reference.clone())
        })?;
        Ok(Eip155ChainReference(chain_id))
    }
}

impl TryFrom<ChainId> for Eip155ChainReference {
    type Error = Eip155ChainReferenceFormatError;

    fn try_from(value: ChainId) -> Result<Self, Self::Error> {
        Eip155ChainReference::try_from(&value)
    }
}

/// Error returned when converting a [`ChainId`] to an [`Eip155ChainReference`].
#[derive(Debug, thiserror::Error)]
pub enum Eip155ChainReferenceFormatError {
    /// The chain ID namespace is not `eip155`.
    #[error("Invalid namespace {0}, expected eip155")]
    InvalidNamespace(String),
    /// The chain reference is not a valid numeric value.
    #[error("Invalid eip155 chain reference {0}")]
    InvalidReference(String),
}

impl Display for Eip155ChainReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Amounts {
        #[serde(with = "decimal_u256")]
        single: U256,
        #[serde(with = "decimal_u256_seq")]
        many: Vec<U256>,
    }

    #[test]
    fn test_checksummed_address_serializes_with_checksum() {
        let address: ChecksummedAddress = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045"
            .parse()
            .unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045\"");
    }

    #[test]
    fn test_decimal_amounts() {
        let json = r#"{"single":"1000000000000000000","many":["1","0","42"]}"#;
        let amounts: Amounts = serde_json::from_str(json).unwrap();
        assert_eq!(amounts.single, U256::from(10).pow(U256::from(18)));
        assert_eq!(amounts.many, vec![U256::from(1), U256::ZERO, U256::from(42)]);
        assert_eq!(serde_json::to_string(&amounts).unwrap(), json);
    }

    #[test]
    fn test_decimal_rejects_hex() {
        let json = r#"{"single":"0x10","many":[]}"#;
        assert!(serde_json::from_str::<Amounts>(json).is_err());
    }

    #[test]
    fn test_chain_reference_from_chain_id() {
        let chain_id: ChainId = "eip155:100009".parse().unwrap();
        let reference = Eip155ChainReference::try_from(&chain_id).unwrap();
        assert_eq!(reference.inner(), 100009);
        assert_eq!(reference.as_chain_id(), chain_id);
    }

    #[test]
    fn test_chain_reference_rejects_other_namespace() {
        let chain_id = ChainId::new("solana", "mainnet");
        let err = Eip155ChainReference::try_from(chain_id).unwrap_err();
        assert!(matches!(
            err,
            Eip155ChainReferenceFormatError::InvalidNamespace(_)
        ));
    }

    #[test]
    fn test_chain_reference_rejects_non_numeric() {
        let chain_id = ChainId::new("eip155", "base");
        let err = Eip155ChainReference::try_from(chain_id).unwrap_err();
        assert!(matches!(
            err,
            Eip155ChainReferenceFormatError::InvalidReference(_)
        ));
    }
}
