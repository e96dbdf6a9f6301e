//! Deterministic scripted source.
//!
//! Replays a queue of results per slot. Once a slot's queue runs dry the last
//! result keeps being returned, so a finished script looks like a device that
//! stopped changing. Slots without a script report [`SourceError::NotConnected`].

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{
    RawBatteryInfo, RawCapabilities, RawGamepad, RawKeystroke, RawState, RawVibration,
    SourceError, StateSource,
};

#[derive(Default)]
struct SlotScript {
    states: VecDeque<Result<RawState, SourceError>>,
    last: Option<Result<RawState, SourceError>>,
    keystrokes: VecDeque<Result<RawKeystroke, SourceError>>,
    battery: Option<Result<RawBatteryInfo, SourceError>>,
    capabilities: Option<Result<RawCapabilities, SourceError>>,
    vibrations: Vec<RawVibration>,
}

/// Source that returns pre-recorded results.
#[derive(Default)]
pub struct ScriptedSource {
    slots: Mutex<HashMap<u8, SlotScript>>,
    state_queries: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<u8, SlotScript>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a state query result for `slot`.
    pub fn push_state(&self, slot: u8, result: Result<RawState, SourceError>) {
        self.slots().entry(slot).or_default().states.push_back(result);
    }

    /// Queue a successful snapshot for `slot`.
    pub fn push_snapshot(&self, slot: u8, packet: u32, gamepad: RawGamepad) {
        self.push_state(slot, Ok(RawState { packet, gamepad }));
    }

    /// Queue a keystroke for `slot`.
    pub fn push_keystroke(&self, slot: u8, virtual_key: u16, flags: u16) {
        self.slots()
            .entry(slot)
            .or_default()
            .keystrokes
            .push_back(Ok(RawKeystroke { virtual_key, flags }));
    }

    /// Queue a keystroke query failure for `slot`.
    pub fn push_keystroke_error(&self, slot: u8, error: SourceError) {
        self.slots()
            .entry(slot)
            .or_default()
            .keystrokes
            .push_back(Err(error));
    }

    pub fn set_battery(&self, slot: u8, result: Result<RawBatteryInfo, SourceError>) {
        self.slots().entry(slot).or_default().battery = Some(result);
    }

    pub fn set_capabilities(&self, slot: u8, result: Result<RawCapabilities, SourceError>) {
        self.slots().entry(slot).or_default().capabilities = Some(result);
    }

    /// Vibration requests received for `slot`, oldest first.
    pub fn vibrations(&self, slot: u8) -> Vec<RawVibration> {
        self.slots()
            .get(&slot)
            .map(|script| script.vibrations.clone())
            .unwrap_or_default()
    }

    /// Number of state queries answered so far, across all slots.
    pub fn state_queries(&self) -> usize {
        self.state_queries.load(Ordering::SeqCst)
    }

    /// Number of state results still queued for `slot`.
    pub fn pending_states(&self, slot: u8) -> usize {
        self.slots()
            .get(&slot)
            .map_or(0, |script| script.states.len())
    }
}

impl StateSource for ScriptedSource {
    fn query_state(&self, slot: u8) -> Result<RawState, SourceError> {
        self.state_queries.fetch_add(1, Ordering::SeqCst);
        let mut slots = self.slots();
        let Some(script) = slots.get_mut(&slot) else {
            return Err(SourceError::NotConnected);
        };
        match script.states.pop_front() {
            Some(result) => {
                script.last = Some(result.clone());
                result
            }
            None => script.last.clone().unwrap_or(Err(SourceError::NotConnected)),
        }
    }

    fn query_keystroke(&self, slot: u8) -> Result<Option<RawKeystroke>, SourceError> {
        let mut slots = self.slots();
        match slots.get_mut(&slot).and_then(|s| s.keystrokes.pop_front()) {
            Some(Ok(keystroke)) => Ok(Some(keystroke)),
            Some(Err(error)) => Err(error),
            None => Ok(None),
        }
    }

    fn query_battery(&self, slot: u8) -> Result<RawBatteryInfo, SourceError> {
        self.slots()
            .get(&slot)
            .and_then(|s| s.battery.clone())
            .unwrap_or(Err(SourceError::NotConnected))
    }

    fn query_capabilities(&self, slot: u8) -> Result<RawCapabilities, SourceError> {
        self.slots()
            .get(&slot)
            .and_then(|s| s.capabilities.clone())
            .unwrap_or(Err(SourceError::NotConnected))
    }

    fn set_vibration(&self, slot: u8, vibration: RawVibration) -> Result<(), SourceError> {
        let mut slots = self.slots();
        let script = slots.get_mut(&slot).ok_or(SourceError::NotConnected)?;
        script.vibrations.push(vibration);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscripted_slot_is_not_connected() {
        let source = ScriptedSource::new();
        assert_eq!(source.query_state(2), Err(SourceError::NotConnected));
        assert_eq!(source.state_queries(), 1);
    }

    #[test]
    fn test_replays_in_order_then_repeats_last() {
        let source = ScriptedSource::new();
        source.push_state(0, Err(SourceError::NotConnected));
        source.push_snapshot(0, 7, RawGamepad::default());

        assert_eq!(source.query_state(0), Err(SourceError::NotConnected));
        assert_eq!(source.query_state(0).map(|s| s.packet), Ok(7));
        assert_eq!(source.query_state(0).map(|s| s.packet), Ok(7));
        assert_eq!(source.pending_states(0), 0);
    }

    #[test]
    fn test_keystroke_queue_drains() {
        let source = ScriptedSource::new();
        source.push_keystroke(1, 0x5800, 0x0001);

        assert_eq!(
            source.query_keystroke(1),
            Ok(Some(RawKeystroke {
                virtual_key: 0x5800,
                flags: 0x0001,
            }))
        );
        assert_eq!(source.query_keystroke(1), Ok(None));
    }

    #[test]
    fn test_records_vibration() {
        let source = ScriptedSource::new();
        source.push_snapshot(0, 1, RawGamepad::default());
        let request = RawVibration {
            left_motor_speed: 10,
            right_motor_speed: 20,
        };

        assert!(source.set_vibration(0, request).is_ok());
        assert_eq!(source.vibrations(0), vec![request]);
        assert_eq!(source.set_vibration(3, request), Err(SourceError::NotConnected));
    }
}
