//! UUPS upgrades: logic behind a proxy replaces itself.

use alloy_primitives::{Address, Bytes};
use tracing::instrument;

use crate::chain::Chain;
use crate::contract::Frame;
use crate::error::ExecutionError;
use crate::events::Event;

/// Points the proxy running `frame` at `new_implementation`, then runs `data`
/// (if any) against the new logic with the same caller.
///
/// The new implementation must be logic of `expected_kind`. Authorization is the
/// caller's business and must be checked before this is invoked.
#[instrument(skip_all, err, fields(
    proxy = %frame.address,
    new_implementation = %new_implementation,
))]
pub fn upgrade_to_and_call(
    chain: &mut Chain,
    frame: &Frame,
    new_implementation: Address,
    expected_kind: &str,
    data: &[u8],
) -> Result<Bytes, ExecutionError> {
    if !frame.is_delegated() {
        return Err(ExecutionError::NotDelegated);
    }
    let descriptor = chain.logic_at(new_implementation)?.descriptor();
    if descriptor.kind != expected_kind {
        return Err(ExecutionError::InvalidImplementation(new_implementation));
    }
    chain.set_implementation(frame.address, new_implementation)?;
    chain.emit(
        frame.address,
        Event::Upgraded {
            implementation: new_implementation,
        },
    );
    tracing::info!(implementation = %descriptor, "proxy upgraded");
    if data.is_empty() {
        return Ok(Bytes::new());
    }
    chain.delegate(frame, data)
}
