//! # Gamepad Registry
//!
//! One-shot enumeration: every slot is queried once and a session is started
//! for each slot that answered. Empty slots are not rescanned later.

use std::sync::Arc;

use tracing::{debug, info};

use super::session::{GamepadSession, SessionOptions};
use crate::error::Result;
use crate::source::{StateSource, MAX_SLOTS};

/// Slots among `slots` whose state query currently succeeds, in order.
///
/// Each slot is queried exactly once.
pub fn probe_slots<I>(source: &dyn StateSource, slots: I) -> Vec<u8>
where
    I: IntoIterator<Item = u8>,
{
    slots
        .into_iter()
        .filter(|&slot| match source.query_state(slot) {
            Ok(_) => true,
            Err(e) => {
                debug!(slot, "Skipping slot: {}", e);
                false
            }
        })
        .collect()
}

/// Starts a session for every responsive slot in `0..MAX_SLOTS`.
///
/// # Errors
///
/// Returns [`crate::error::PadwatchError::NoRuntime`] if a session has to be
/// started outside a tokio runtime.
pub fn enumerate(source: Arc<dyn StateSource>, options: &SessionOptions) -> Result<Vec<GamepadSession>> {
    enumerate_slots(source, options, 0..MAX_SLOTS)
}

/// Like [`enumerate`], over an explicit set of slots.
///
/// # Errors
///
/// Same as [`enumerate`]. Sessions started before the failure are stopped.
pub fn enumerate_slots<I>(
    source: Arc<dyn StateSource>,
    options: &SessionOptions,
    slots: I,
) -> Result<Vec<GamepadSession>>
where
    I: IntoIterator<Item = u8>,
{
    let responsive = probe_slots(source.as_ref(), slots);

    let sessions = responsive
        .into_iter()
        .map(|slot| GamepadSession::start(slot, Arc::clone(&source), *options))
        .collect::<Result<Vec<_>>>()?;

    info!("Found {} gamepad(s)", sessions.len());
    Ok(sessions)
}
