//! Chain identification.
//!
//! - [`ChainId`] - A CAIP-2 compliant chain identifier (e.g., `eip155:100009`)

mod chain_id;

pub use chain_id::*;
