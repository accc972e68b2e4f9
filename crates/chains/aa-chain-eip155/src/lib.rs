//! Deterministic smart accounts for EIP-155 (EVM) chains.
//!
//! This crate implements account abstraction: a factory that derives per-owner
//! account addresses with CREATE2 and deploys them lazily, and a smart account that
//! lets its owner act directly or authorize a relayer to execute pre-signed
//! EIP-712 messages on its behalf.
//!
//! # Architecture
//!
//! - [`chain`] - The in-memory execution environment ([`chain::Chain`]) and EVM wire types
//! - [`contract`] - The [`contract::Contract`] trait implemented by all logic contracts
//! - [`account`] - `SimpleAccount` logic (V1, V2, V3) and its typed binding
//! - [`factory`] - `SimpleAccountFactory` logic (V1, V2, V3) and its typed binding
//! - [`authorization`] - EIP-712 authorization messages, validity windows and client signing
//! - [`access_control`] - Role membership consulted by the factory upgrade path
//! - [`migration`] - Versioned initializer tables
//! - [`address`] - Pure deterministic account address derivation
//! - [`deployment`] - Bootstrapping a factory on a fresh chain
//!
//! # Example
//!
//! ```ignore
//! use aa_chain_eip155::chain::{Chain, Eip155ChainReference};
//! use aa_chain_eip155::deployment::Deployment;
//!
//! let mut chain = Chain::new(Eip155ChainReference::new(100009));
//! let deployment = Deployment::bootstrap(&mut chain, deployer)?;
//! let account = deployment.factory.create_account(&mut chain, relayer, owner)?;
//! ```

pub mod access_control;
pub mod account;
pub mod address;
pub mod authorization;
pub mod chain;
pub mod contract;
pub mod deployment;
pub mod error;
pub mod events;
pub mod factory;
pub mod interfaces;
pub mod migration;
pub mod proxy;
pub mod signature;

#[cfg(test)]
mod test_utils;

pub use error::ExecutionError;
