//! # Controller State Module
//!
//! Application-facing view of a controller: logical buttons, normalized
//! sticks and triggers, key transitions and device metadata.
//!
//! ## Logical Buttons
//!
//! | Button | Raw Bit |
//! |--------|---------|
//! | A / B / X / Y | 0x1000 / 0x2000 / 0x4000 / 0x8000 |
//! | Left / Right Shoulder | 0x0100 / 0x0200 |
//! | Start / Back / Guide | 0x0010 / 0x0020 / 0x0400 |
//! | Left / Right Thumb press | 0x0040 / 0x0080 |
//! | D-Pad Up / Down / Left / Right | 0x0001 / 0x0002 / 0x0004 / 0x0008 |

use serde::Serialize;
use std::fmt;

use super::normalizer::{normalize_analog, FilterConfig};
use crate::error::PadwatchError;
use crate::source::{
    ButtonMask, CapabilityFlags, RawBatteryInfo, RawCapabilities, RawGamepad, RawKeystroke,
    RawVibration, KEYSTROKE_KEYDOWN, KEYSTROKE_KEYUP, KEYSTROKE_REPEAT,
};

/// One of the 15 digital buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Button {
    A,
    B,
    X,
    Y,
    LeftShoulder,
    RightShoulder,
    Start,
    Back,
    Guide,
    LeftThumb,
    RightThumb,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

impl Button {
    /// Every logical button, in table order.
    pub const ALL: [Button; 15] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::Start,
        Button::Back,
        Button::Guide,
        Button::LeftThumb,
        Button::RightThumb,
        Button::DPadUp,
        Button::DPadDown,
        Button::DPadLeft,
        Button::DPadRight,
    ];

    /// The raw bit this button is bound to.
    #[must_use]
    pub fn mask(self) -> ButtonMask {
        match self {
            Button::A => ButtonMask::A,
            Button::B => ButtonMask::B,
            Button::X => ButtonMask::X,
            Button::Y => ButtonMask::Y,
            Button::LeftShoulder => ButtonMask::LEFT_SHOULDER,
            Button::RightShoulder => ButtonMask::RIGHT_SHOULDER,
            Button::Start => ButtonMask::START,
            Button::Back => ButtonMask::BACK,
            Button::Guide => ButtonMask::GUIDE,
            Button::LeftThumb => ButtonMask::LEFT_THUMB,
            Button::RightThumb => ButtonMask::RIGHT_THUMB,
            Button::DPadUp => ButtonMask::DPAD_UP,
            Button::DPadDown => ButtonMask::DPAD_DOWN,
            Button::DPadLeft => ButtonMask::DPAD_LEFT,
            Button::DPadRight => ButtonMask::DPAD_RIGHT,
        }
    }
}

/// Normalized stick position, each axis in -1.0 to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Thumbstick {
    pub x: f32,
    pub y: f32,
}

/// Normalized state of one controller.
///
/// # Examples
///
/// ```
/// use padwatch::controller::state::{Button, GamepadState};
///
/// let state = GamepadState::default();
/// assert!(!state.is_pressed(Button::A));
/// assert_eq!(state.left_thumb.x, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GamepadState {
    // Face buttons
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,

    // Shoulders
    pub left_shoulder: bool,
    pub right_shoulder: bool,

    // System buttons
    pub start: bool,
    pub back: bool,
    pub guide: bool,

    // Stick clicks
    pub left_thumb_press: bool,
    pub right_thumb_press: bool,

    // D-Pad
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,

    // Analog
    pub left_thumb: Thumbstick,
    pub right_thumb: Thumbstick,
    /// Left trigger, 0.0 to 1.0.
    pub left_trigger: f32,
    /// Right trigger, 0.0 to 1.0.
    pub right_trigger: f32,
}

impl GamepadState {
    /// Builds the normalized state of a raw snapshot.
    ///
    /// Buttons test their bit against the raw mask; sticks and triggers go
    /// through [`normalize_analog`] with `filter`.
    #[must_use]
    pub fn from_raw(raw: &RawGamepad, filter: &FilterConfig) -> Self {
        let mask = raw.button_mask();
        let pressed = |button: Button| mask.contains(button.mask());
        let analog = normalize_analog(raw, filter);

        Self {
            a: pressed(Button::A),
            b: pressed(Button::B),
            x: pressed(Button::X),
            y: pressed(Button::Y),
            left_shoulder: pressed(Button::LeftShoulder),
            right_shoulder: pressed(Button::RightShoulder),
            start: pressed(Button::Start),
            back: pressed(Button::Back),
            guide: pressed(Button::Guide),
            left_thumb_press: pressed(Button::LeftThumb),
            right_thumb_press: pressed(Button::RightThumb),
            dpad_up: pressed(Button::DPadUp),
            dpad_down: pressed(Button::DPadDown),
            dpad_left: pressed(Button::DPadLeft),
            dpad_right: pressed(Button::DPadRight),
            left_thumb: Thumbstick {
                x: analog.left_thumb_x,
                y: analog.left_thumb_y,
            },
            right_thumb: Thumbstick {
                x: analog.right_thumb_x,
                y: analog.right_thumb_y,
            },
            left_trigger: analog.left_trigger,
            right_trigger: analog.right_trigger,
        }
    }

    /// Whether `button` is currently held.
    #[must_use]
    pub fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::X => self.x,
            Button::Y => self.y,
            Button::LeftShoulder => self.left_shoulder,
            Button::RightShoulder => self.right_shoulder,
            Button::Start => self.start,
            Button::Back => self.back,
            Button::Guide => self.guide,
            Button::LeftThumb => self.left_thumb_press,
            Button::RightThumb => self.right_thumb_press,
            Button::DPadUp => self.dpad_up,
            Button::DPadDown => self.dpad_down,
            Button::DPadLeft => self.dpad_left,
            Button::DPadRight => self.dpad_right,
        }
    }

    /// Held buttons, in [`Button::ALL`] order.
    #[must_use]
    pub fn pressed_buttons(&self) -> Vec<Button> {
        Button::ALL
            .into_iter()
            .filter(|button| self.is_pressed(*button))
            .collect()
    }

    /// Checks if any button is currently pressed.
    #[must_use]
    pub fn any_button_pressed(&self) -> bool {
        Button::ALL.into_iter().any(|button| self.is_pressed(button))
    }
}

/// Consistent copy of a session's state, taken in one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GamepadSnapshot {
    pub slot: u8,
    pub sequence: u32,
    pub connected: bool,
    pub state: GamepadState,
}

/// Logical inputs reported by the keystroke feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeyCode {
    A,
    B,
    X,
    Y,
    RightShoulder,
    LeftShoulder,
    LeftTrigger,
    RightTrigger,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Start,
    Back,
    LeftThumbPress,
    RightThumbPress,
    LeftThumbUp,
    LeftThumbDown,
    LeftThumbRight,
    LeftThumbLeft,
    LeftThumbUpLeft,
    LeftThumbUpRight,
    LeftThumbDownRight,
    LeftThumbDownLeft,
    RightThumbUp,
    RightThumbDown,
    RightThumbRight,
    RightThumbLeft,
    RightThumbUpLeft,
    RightThumbUpRight,
    RightThumbDownRight,
    RightThumbDownLeft,
}

impl KeyCode {
    /// Decodes a virtual key code (0x5800..=0x5837). Unknown codes give `None`.
    #[must_use]
    pub fn from_virtual_key(code: u16) -> Option<Self> {
        let key = match code {
            0x5800 => KeyCode::A,
            0x5801 => KeyCode::B,
            0x5802 => KeyCode::X,
            0x5803 => KeyCode::Y,
            0x5804 => KeyCode::RightShoulder,
            0x5805 => KeyCode::LeftShoulder,
            0x5806 => KeyCode::LeftTrigger,
            0x5807 => KeyCode::RightTrigger,

            0x5810 => KeyCode::DPadUp,
            0x5811 => KeyCode::DPadDown,
            0x5812 => KeyCode::DPadLeft,
            0x5813 => KeyCode::DPadRight,
            0x5814 => KeyCode::Start,
            0x5815 => KeyCode::Back,
            0x5816 => KeyCode::LeftThumbPress,
            0x5817 => KeyCode::RightThumbPress,

            0x5820 => KeyCode::LeftThumbUp,
            0x5821 => KeyCode::LeftThumbDown,
            0x5822 => KeyCode::LeftThumbRight,
            0x5823 => KeyCode::LeftThumbLeft,
            0x5824 => KeyCode::LeftThumbUpLeft,
            0x5825 => KeyCode::LeftThumbUpRight,
            0x5826 => KeyCode::LeftThumbDownRight,
            0x5827 => KeyCode::LeftThumbDownLeft,

            0x5830 => KeyCode::RightThumbUp,
            0x5831 => KeyCode::RightThumbDown,
            0x5832 => KeyCode::RightThumbRight,
            0x5833 => KeyCode::RightThumbLeft,
            0x5834 => KeyCode::RightThumbUpLeft,
            0x5835 => KeyCode::RightThumbUpRight,
            0x5836 => KeyCode::RightThumbDownRight,
            0x5837 => KeyCode::RightThumbDownLeft,

            _ => return None,
        };
        Some(key)
    }
}

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeyTransition {
    Pressed,
    Released,
}

/// One button or stick-direction transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub transition: KeyTransition,
}

impl KeyEvent {
    /// Decodes a raw keystroke.
    ///
    /// `None` for unknown keys, records with neither the down nor the up flag,
    /// and auto-repeats of a held key (those are not transitions).
    #[must_use]
    pub fn from_raw(raw: &RawKeystroke) -> Option<Self> {
        if raw.flags & KEYSTROKE_REPEAT != 0 {
            return None;
        }
        let key = KeyCode::from_virtual_key(raw.virtual_key)?;
        let transition = if raw.flags & KEYSTROKE_KEYDOWN != 0 {
            KeyTransition::Pressed
        } else if raw.flags & KEYSTROKE_KEYUP != 0 {
            KeyTransition::Released
        } else {
            return None;
        };

        Some(Self { key, transition })
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.transition {
            KeyTransition::Pressed => "down",
            KeyTransition::Released => "up",
        };
        write!(f, "{:?} {}", self.key, direction)
    }
}

/// Battery charge level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatteryLevel {
    Empty,
    Low,
    Medium,
    Full,
}

impl BatteryLevel {
    /// Approximate charge as a fraction of full.
    #[must_use]
    pub fn charge(self) -> f32 {
        match self {
            BatteryLevel::Empty => 0.0,
            BatteryLevel::Low => 0.33,
            BatteryLevel::Medium => 0.66,
            BatteryLevel::Full => 1.0,
        }
    }
}

impl TryFrom<u8> for BatteryLevel {
    type Error = PadwatchError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(BatteryLevel::Empty),
            0x01 => Ok(BatteryLevel::Low),
            0x02 => Ok(BatteryLevel::Medium),
            0x03 => Ok(BatteryLevel::Full),
            other => Err(PadwatchError::UnknownBatteryLevel(other)),
        }
    }
}

/// Power source of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatteryType {
    Disconnected,
    Wired,
    Alkaline,
    NiMh,
    Unknown,
}

impl TryFrom<u8> for BatteryType {
    type Error = PadwatchError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(BatteryType::Disconnected),
            0x01 => Ok(BatteryType::Wired),
            0x02 => Ok(BatteryType::Alkaline),
            0x03 => Ok(BatteryType::NiMh),
            0xFF => Ok(BatteryType::Unknown),
            other => Err(PadwatchError::UnknownBatteryType(other)),
        }
    }
}

/// Decoded battery information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryInfo {
    pub battery_type: BatteryType,
    pub level: BatteryLevel,
}

impl TryFrom<RawBatteryInfo> for BatteryInfo {
    type Error = PadwatchError;

    fn try_from(raw: RawBatteryInfo) -> Result<Self, Self::Error> {
        Ok(Self {
            battery_type: BatteryType::try_from(raw.battery_type)?,
            level: BatteryLevel::try_from(raw.battery_level)?,
        })
    }
}

/// Kind of controller in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceSubtype {
    Unknown,
    Gamepad,
    Wheel,
    ArcadeStick,
    FlightStick,
    DancePad,
    Guitar,
    GuitarAlternate,
    DrumKit,
    GuitarBass,
    ArcadePad,
}

impl TryFrom<u8> for DeviceSubtype {
    type Error = PadwatchError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(DeviceSubtype::Unknown),
            0x01 => Ok(DeviceSubtype::Gamepad),
            0x02 => Ok(DeviceSubtype::Wheel),
            0x03 => Ok(DeviceSubtype::ArcadeStick),
            0x04 => Ok(DeviceSubtype::FlightStick),
            0x05 => Ok(DeviceSubtype::DancePad),
            0x06 => Ok(DeviceSubtype::Guitar),
            0x07 => Ok(DeviceSubtype::GuitarAlternate),
            0x08 => Ok(DeviceSubtype::DrumKit),
            0x0B => Ok(DeviceSubtype::GuitarBass),
            0x13 => Ok(DeviceSubtype::ArcadePad),
            other => Err(PadwatchError::UnknownDeviceSubtype(other)),
        }
    }
}

/// Decoded capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub subtype: DeviceSubtype,
    pub flags: CapabilityFlags,
}

impl DeviceCapabilities {
    #[must_use]
    pub fn supports_force_feedback(&self) -> bool {
        self.flags.contains(CapabilityFlags::FORCE_FEEDBACK)
    }

    #[must_use]
    pub fn is_wireless(&self) -> bool {
        self.flags.contains(CapabilityFlags::WIRELESS)
    }
}

impl TryFrom<RawCapabilities> for DeviceCapabilities {
    type Error = PadwatchError;

    fn try_from(raw: RawCapabilities) -> Result<Self, Self::Error> {
        Ok(Self {
            subtype: DeviceSubtype::try_from(raw.sub_type)?,
            flags: CapabilityFlags::from_bits_truncate(raw.flags),
        })
    }
}

/// Motor speeds for both vibration motors, each 0.0 to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VibrationMotorSpeed {
    left: f32,
    right: f32,
}

impl VibrationMotorSpeed {
    /// Creates a motor speed pair. Out-of-range values are clamped, NaN is 0.0.
    ///
    /// # Examples
    ///
    /// ```
    /// use padwatch::controller::state::VibrationMotorSpeed;
    ///
    /// let speed = VibrationMotorSpeed::new(1.5, -0.2);
    /// assert_eq!(speed.left(), 1.0);
    /// assert_eq!(speed.right(), 0.0);
    /// ```
    #[must_use]
    pub fn new(left: f32, right: f32) -> Self {
        let clamp = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            left: clamp(left),
            right: clamp(right),
        }
    }

    /// Both motors off.
    #[must_use]
    pub fn off() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn left(&self) -> f32 {
        self.left
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.right
    }

    /// Scales to device units (0-65535).
    #[must_use]
    pub fn to_raw(self) -> RawVibration {
        let scale = |v: f32| (v * f32::from(u16::MAX)).round() as u16;
        RawVibration {
            left_motor_speed: scale(self.left),
            right_motor_speed: scale(self.right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_buttons(buttons: u16) -> RawGamepad {
        RawGamepad {
            buttons,
            ..RawGamepad::default()
        }
    }

    // ==================== Button Mapping Tests ====================

    #[test]
    fn test_only_a_pressed() {
        let state = GamepadState::from_raw(&raw_with_buttons(0x1000), &FilterConfig::default());

        assert!(state.a, "A should be pressed");
        for button in Button::ALL.into_iter().filter(|b| *b != Button::A) {
            assert!(!state.is_pressed(button), "{:?} should be released", button);
        }
        assert_eq!(state.pressed_buttons(), vec![Button::A]);
    }

    #[test]
    fn test_each_button_maps_to_its_own_bit() {
        for button in Button::ALL {
            let raw = raw_with_buttons(button.mask().bits());
            let state = GamepadState::from_raw(&raw, &FilterConfig::default());
            assert_eq!(state.pressed_buttons(), vec![button]);
        }
    }

    #[test]
    fn test_all_buttons_pressed() {
        let state = GamepadState::from_raw(&raw_with_buttons(0xFFFF), &FilterConfig::default());
        assert_eq!(state.pressed_buttons().len(), 15);
        assert!(state.any_button_pressed());
    }

    #[test]
    fn test_no_buttons_pressed() {
        let state = GamepadState::from_raw(&raw_with_buttons(0), &FilterConfig::default());
        assert!(!state.any_button_pressed());
        assert!(state.pressed_buttons().is_empty());
    }

    #[test]
    fn test_button_masks_are_unique() {
        let mut seen = ButtonMask::empty();
        for button in Button::ALL {
            assert!(!seen.intersects(button.mask()), "{:?} shares a bit", button);
            seen |= button.mask();
        }
        assert_eq!(seen, ButtonMask::all());
    }

    // ==================== Analog Tests ====================

    #[test]
    fn test_from_raw_analog_values() {
        let raw = RawGamepad {
            left_thumb_x: 16000,
            right_thumb_y: -32768,
            left_trigger: 0,
            right_trigger: 255,
            ..RawGamepad::default()
        };
        let state = GamepadState::from_raw(&raw, &FilterConfig::default());

        assert!((state.left_thumb.x - 0.327).abs() < 0.001);
        assert_eq!(state.left_thumb.y, 0.0);
        assert!((state.right_thumb.y + 1.0).abs() < 0.0001);
        assert_eq!(state.left_trigger, 0.0);
        assert!((state.right_trigger - 1.0).abs() < 0.0001);
    }

    // ==================== KeyEvent Tests ====================

    #[test]
    fn test_key_code_table() {
        assert_eq!(KeyCode::from_virtual_key(0x5800), Some(KeyCode::A));
        assert_eq!(KeyCode::from_virtual_key(0x5804), Some(KeyCode::RightShoulder));
        assert_eq!(KeyCode::from_virtual_key(0x5817), Some(KeyCode::RightThumbPress));
        assert_eq!(KeyCode::from_virtual_key(0x5827), Some(KeyCode::LeftThumbDownLeft));
        assert_eq!(KeyCode::from_virtual_key(0x5837), Some(KeyCode::RightThumbDownLeft));
    }

    #[test]
    fn test_key_code_gaps_are_unknown() {
        assert_eq!(KeyCode::from_virtual_key(0x5808), None);
        assert_eq!(KeyCode::from_virtual_key(0x5818), None);
        assert_eq!(KeyCode::from_virtual_key(0x5838), None);
        assert_eq!(KeyCode::from_virtual_key(0x0041), None);
    }

    fn keystroke(virtual_key: u16, flags: u16) -> RawKeystroke {
        RawKeystroke { virtual_key, flags }
    }

    #[test]
    fn test_key_event_down_and_up() {
        let down = KeyEvent::from_raw(&keystroke(0x5800, KEYSTROKE_KEYDOWN));
        assert_eq!(
            down,
            Some(KeyEvent {
                key: KeyCode::A,
                transition: KeyTransition::Pressed,
            })
        );

        let up = KeyEvent::from_raw(&keystroke(0x5801, KEYSTROKE_KEYUP));
        assert_eq!(
            up,
            Some(KeyEvent {
                key: KeyCode::B,
                transition: KeyTransition::Released,
            })
        );
        assert_eq!(up.unwrap().to_string(), "B up");
    }

    #[test]
    fn test_key_event_repeat_is_not_a_transition() {
        let repeat = keystroke(0x5810, KEYSTROKE_KEYDOWN | KEYSTROKE_REPEAT);
        assert_eq!(KeyEvent::from_raw(&repeat), None);
    }

    #[test]
    fn test_key_event_rejects_bad_records() {
        assert_eq!(KeyEvent::from_raw(&keystroke(0x5800, 0)), None);
        assert_eq!(KeyEvent::from_raw(&keystroke(0x1234, KEYSTROKE_KEYDOWN)), None);
    }

    // ==================== Battery Tests ====================

    #[test]
    fn test_battery_level_charge() {
        assert_eq!(BatteryLevel::try_from(0).unwrap().charge(), 0.0);
        assert_eq!(BatteryLevel::try_from(1).unwrap().charge(), 0.33);
        assert_eq!(BatteryLevel::try_from(2).unwrap().charge(), 0.66);
        assert_eq!(BatteryLevel::try_from(3).unwrap().charge(), 1.0);
    }

    #[test]
    fn test_unknown_battery_level_is_error() {
        let result = BatteryLevel::try_from(7);
        assert!(matches!(result, Err(PadwatchError::UnknownBatteryLevel(7))));
    }

    #[test]
    fn test_battery_type_codes() {
        assert_eq!(BatteryType::try_from(0x01).unwrap(), BatteryType::Wired);
        assert_eq!(BatteryType::try_from(0x03).unwrap(), BatteryType::NiMh);
        assert_eq!(BatteryType::try_from(0xFF).unwrap(), BatteryType::Unknown);
        assert!(matches!(
            BatteryType::try_from(0x10),
            Err(PadwatchError::UnknownBatteryType(0x10))
        ));
    }

    #[test]
    fn test_battery_info_from_raw() {
        let info = BatteryInfo::try_from(RawBatteryInfo {
            battery_type: 2,
            battery_level: 1,
        })
        .unwrap();
        assert_eq!(info.battery_type, BatteryType::Alkaline);
        assert_eq!(info.level, BatteryLevel::Low);
    }

    // ==================== Capabilities Tests ====================

    #[test]
    fn test_capabilities_from_raw() {
        let caps = DeviceCapabilities::try_from(RawCapabilities {
            sub_type: 0x13,
            flags: 0x0003,
        })
        .unwrap();
        assert_eq!(caps.subtype, DeviceSubtype::ArcadePad);
        assert!(caps.supports_force_feedback());
        assert!(caps.is_wireless());
    }

    #[test]
    fn test_unknown_subtype_is_error() {
        let result = DeviceCapabilities::try_from(RawCapabilities {
            sub_type: 0x09,
            flags: 0,
        });
        assert!(matches!(result, Err(PadwatchError::UnknownDeviceSubtype(0x09))));
    }

    // ==================== Vibration Tests ====================

    #[test]
    fn test_vibration_clamps() {
        let speed = VibrationMotorSpeed::new(2.0, f32::NAN);
        assert_eq!(speed.left(), 1.0);
        assert_eq!(speed.right(), 0.0);
    }

    #[test]
    fn test_vibration_to_raw() {
        let raw = VibrationMotorSpeed::new(1.0, 0.5).to_raw();
        assert_eq!(raw.left_motor_speed, 65535);
        assert_eq!(raw.right_motor_speed, 32768);
        assert_eq!(VibrationMotorSpeed::off().to_raw(), RawVibration::default());
    }
}
