#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types shared by the smart account crates.
//!
//! This crate holds the pieces that do not depend on a particular chain family:
//!
//! - [`chain`] - CAIP-2 chain identifiers (e.g. `eip155:100009`)
//! - [`config`] - Configuration values that may be resolved from environment variables
//! - [`timestamp`] - Unix timestamps bounding authorization validity windows
//!
//! Chain-specific behavior (EIP-712 signatures, deterministic account addresses,
//! account and factory logic) lives in `aa-chain-eip155`.

pub mod chain;
pub mod config;
pub mod timestamp;
