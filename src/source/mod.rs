//! # Raw State Source
//!
//! The hardware query contract consumed by the observation loop.
//!
//! A source answers synchronous, per-slot queries:
//! - `query_state`: a snapshot with a packet (sequence) number, or "not connected"
//! - `query_keystroke`: the next discrete button transition, if any
//! - `query_battery` / `query_capabilities`: device metadata
//! - `set_vibration`: fire-and-forget motor speeds
//!
//! Everything in this module is raw protocol data: bitmasks and integers in
//! device ranges. Normalization lives in [`crate::controller::normalizer`].

pub mod evdev;
#[cfg(test)]
pub mod scripted;

use bitflags::bitflags;
use thiserror::Error;

/// Number of controller slots a source exposes.
pub const MAX_SLOTS: u8 = 4;

/// Largest raw thumbstick magnitude.
pub const THUMB_MAX: i32 = i16::MAX as i32;

/// Largest raw trigger value.
pub const TRIGGER_MAX: i32 = u8::MAX as i32;

/// Recommended left thumbstick deadzone in raw units.
pub const LEFT_THUMB_DEADZONE: i16 = 7849;

/// Recommended right thumbstick deadzone in raw units.
pub const RIGHT_THUMB_DEADZONE: i16 = 8689;

/// Recommended trigger threshold in raw units.
pub const TRIGGER_THRESHOLD: u8 = 30;

bitflags! {
    /// Button bits of [`RawGamepad::buttons`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonMask: u16 {
        const DPAD_UP = 0x0001;
        const DPAD_DOWN = 0x0002;
        const DPAD_LEFT = 0x0004;
        const DPAD_RIGHT = 0x0008;
        const START = 0x0010;
        const BACK = 0x0020;
        const LEFT_THUMB = 0x0040;
        const RIGHT_THUMB = 0x0080;
        const LEFT_SHOULDER = 0x0100;
        const RIGHT_SHOULDER = 0x0200;
        const GUIDE = 0x0400;
        const A = 0x1000;
        const B = 0x2000;
        const X = 0x4000;
        const Y = 0x8000;
    }
}

bitflags! {
    /// Feature flags reported in [`RawCapabilities::flags`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CapabilityFlags: u16 {
        const FORCE_FEEDBACK = 0x0001;
        const WIRELESS = 0x0002;
        const VOICE = 0x0004;
        const PLUGIN_MODULES = 0x0008;
        const NO_NAVIGATION = 0x0010;
    }
}

/// Keystroke flag: the key went down.
pub const KEYSTROKE_KEYDOWN: u16 = 0x0001;
/// Keystroke flag: the key went up.
pub const KEYSTROKE_KEYUP: u16 = 0x0002;
/// Keystroke flag: auto-repeat of a held key.
pub const KEYSTROKE_REPEAT: u16 = 0x0004;

/// Raw gamepad values as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawGamepad {
    /// Bitmask of pressed buttons, see [`ButtonMask`].
    pub buttons: u16,
    /// Left trigger (0-255).
    pub left_trigger: u8,
    /// Right trigger (0-255).
    pub right_trigger: u8,
    /// Left stick X (-32768..32767), positive is right.
    pub left_thumb_x: i16,
    /// Left stick Y (-32768..32767), positive is up.
    pub left_thumb_y: i16,
    /// Right stick X (-32768..32767), positive is right.
    pub right_thumb_x: i16,
    /// Right stick Y (-32768..32767), positive is up.
    pub right_thumb_y: i16,
}

impl RawGamepad {
    /// Pressed buttons as a typed mask. Unknown bits are kept.
    #[must_use]
    pub fn button_mask(&self) -> ButtonMask {
        ButtonMask::from_bits_retain(self.buttons)
    }
}

/// One state snapshot.
///
/// `packet` increases whenever the device state changed since the last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawState {
    pub packet: u32,
    pub gamepad: RawGamepad,
}

/// One discrete input event from the keystroke queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeystroke {
    pub virtual_key: u16,
    pub flags: u16,
}

/// Battery type and level codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBatteryInfo {
    pub battery_type: u8,
    pub battery_level: u8,
}

/// Device subtype code and feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCapabilities {
    pub sub_type: u8,
    pub flags: u16,
}

/// Motor speeds in device units (0-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawVibration {
    pub left_motor_speed: u16,
    pub right_motor_speed: u16,
}

/// Query failures. All of them are transient from the observation loop's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Nothing occupies the slot right now
    #[error("Device not connected")]
    NotConnected,

    /// The query itself failed
    #[error("Device error: {0}")]
    Device(String),

    /// The backend has no such query
    #[error("Not supported by this backend: {0}")]
    Unsupported(&'static str),
}

/// Synchronous, per-slot hardware query interface.
///
/// Calls are expected to be fast and non-blocking; the observation loop calls
/// [`StateSource::query_state`] once per tick from its own task.
pub trait StateSource: Send + Sync + 'static {
    /// Read the current state of `slot`.
    fn query_state(&self, slot: u8) -> Result<RawState, SourceError>;

    /// Pop the next keystroke for `slot`. `Ok(None)` means the queue is empty.
    fn query_keystroke(&self, _slot: u8) -> Result<Option<RawKeystroke>, SourceError> {
        Ok(None)
    }

    /// Read battery information for `slot`.
    fn query_battery(&self, _slot: u8) -> Result<RawBatteryInfo, SourceError> {
        Err(SourceError::Unsupported("battery information"))
    }

    /// Read capabilities for `slot`.
    fn query_capabilities(&self, _slot: u8) -> Result<RawCapabilities, SourceError> {
        Err(SourceError::Unsupported("capabilities"))
    }

    /// Set motor speeds for `slot`.
    fn set_vibration(&self, _slot: u8, _vibration: RawVibration) -> Result<(), SourceError> {
        Err(SourceError::Unsupported("vibration"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StateOnly;

    impl StateSource for StateOnly {
        fn query_state(&self, _slot: u8) -> Result<RawState, SourceError> {
            Ok(RawState::default())
        }
    }

    #[test]
    fn test_button_bits_are_distinct() {
        let all = ButtonMask::all();
        assert_eq!(all.iter().count(), 15, "Should define 15 buttons");
        assert_eq!(all.bits(), 0xF7FF);
    }

    #[test]
    fn test_button_mask_keeps_unknown_bits() {
        let raw = RawGamepad {
            buttons: 0x1000 | 0x0800,
            ..RawGamepad::default()
        };
        let mask = raw.button_mask();
        assert!(mask.contains(ButtonMask::A));
        assert_eq!(mask.bits(), 0x1800);
    }

    #[test]
    fn test_default_trait_methods() {
        let source = StateOnly;
        assert_eq!(source.query_keystroke(0), Ok(None));
        assert!(matches!(source.query_battery(0), Err(SourceError::Unsupported(_))));
        assert!(matches!(source.query_capabilities(0), Err(SourceError::Unsupported(_))));
        assert!(matches!(
            source.set_vibration(0, RawVibration::default()),
            Err(SourceError::Unsupported(_))
        ));
    }

    #[test]
    fn test_protocol_constants() {
        assert_eq!(MAX_SLOTS, 4);
        assert_eq!(THUMB_MAX, 32767);
        assert_eq!(TRIGGER_MAX, 255);
        assert_eq!(LEFT_THUMB_DEADZONE, 7849);
        assert_eq!(RIGHT_THUMB_DEADZONE, 8689);
        assert_eq!(TRIGGER_THRESHOLD, 30);
    }
}
