//! Configuration value helpers.
//!
//! # Environment Variable Resolution
//!
//! The [`LiteralOrEnv`] wrapper type allows configuration values to be specified
//! either as literal values or as references to environment variables:
//!
//! ```json
//! {
//!   "chain": "eip155:100009",                    // Literal value
//!   "deployer": "$DEPLOYER_ADDRESS",             // Simple env var
//!   "admin": "${FACTORY_ADMIN}"                  // Braced env var
//! }
//! ```
//!
//! This keeps deployment-specific identities out of configuration files while
//! still allowing them to be loaded at runtime.

use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"0x5FbDB2315678afecb367f032d93F642f64180aa3"`
/// - Simple env var: `"$DEPLOYER_ADDRESS"`
/// - Braced env var: `"${DEPLOYER_ADDRESS}"`
///
/// The wrapper implements `Deref` to provide transparent access to the inner type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    /// Get a reference to the inner value
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the variable name if the string matches `$VAR` or `${VAR}` syntax.
    fn parse_env_var_syntax(s: &str) -> Option<String> {
        if s.starts_with("${") && s.ends_with('}') {
            Some(s[2..s.len() - 1].to_string())
        } else if s.starts_with('$') && s.len() > 1 {
            let var_name = &s[1..];
            if var_name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                Some(var_name.to_string())
            } else {
                None
            }
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for LiteralOrEnv<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = if let Some(var_name) = Self::parse_env_var_syntax(&s) {
            std::env::var(&var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{}' not found (referenced as '{}')",
                    var_name, s
                ))
            })?
        } else {
            s
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {}", e)))?;

        Ok(LiteralOrEnv(parsed))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value() {
        let value: LiteralOrEnv<u64> = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(*value, 42);
    }

    #[test]
    fn test_braced_env_var() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("AA_TYPES_TEST_BRACED", "7") };
        let value: LiteralOrEnv<u64> =
            serde_json::from_str("\"${AA_TYPES_TEST_BRACED}\"").unwrap();
        assert_eq!(value.into_inner(), 7);
    }

    #[test]
    fn test_simple_env_var() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("AA_TYPES_TEST_SIMPLE", "hello") };
        let value: LiteralOrEnv<String> =
            serde_json::from_str("\"$AA_TYPES_TEST_SIMPLE\"").unwrap();
        assert_eq!(value.inner(), "hello");
    }

    #[test]
    fn test_missing_env_var() {
        let result: Result<LiteralOrEnv<String>, _> =
            serde_json::from_str("\"$AA_TYPES_TEST_DEFINITELY_UNSET\"");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("AA_TYPES_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_unparseable_value() {
        let result: Result<LiteralOrEnv<u64>, _> = serde_json::from_str("\"not-a-number\"");
        assert!(result.is_err());
    }
}
