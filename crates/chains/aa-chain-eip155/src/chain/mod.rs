//! The execution environment and EVM wire types.
//!
//! - [`Chain`] - atomic, serialized invocation of contract logic over a [`WorldState`]
//! - [`ChecksummedAddress`], [`decimal_u256`], [`Eip155ChainReference`] - JSON wire types

mod environment;
mod state;
mod types;

pub use environment::*;
pub use state::*;
pub use types::*;
