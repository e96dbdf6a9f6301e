//! # evdev Backend
//!
//! Exposes gamepads found under `/dev/input` through the [`StateSource`] contract
//! using the Linux evdev interface.
//!
//! ## Device Detection
//!
//! An event device counts as a gamepad when it reports `BTN_SOUTH` and `ABS_X`.
//! Devices are sorted by path and assigned to slots `0..MAX_SLOTS` once, at open.
//!
//! ## State Reads
//!
//! Each query reads the full key and axis state with the `EVIOCGKEY` / `EVIOCGABS`
//! ioctls. evdev has no packet counter, so one is kept per slot and bumped
//! whenever the decoded snapshot differs from the previous read.
//!
//! ## Axis Mapping
//!
//! | Input | evdev Code | Scaled To |
//! |-------|------------|-----------|
//! | Left stick | ABS_X, ABS_Y | -32768..32767, Y up positive |
//! | Right stick | ABS_RX, ABS_RY | -32768..32767, Y up positive |
//! | Triggers | ABS_Z, ABS_RZ | 0..255 |
//! | D-Pad | ABS_HAT0X/Y or BTN_DPAD_* | button bits |
//!
//! ## Vibration
//!
//! Devices advertising `FF_RUMBLE` get one rumble effect, uploaded on first use
//! and updated in place afterwards. Left motor is the strong one.

use evdev::{
    AbsoluteAxisType, Device, FFEffect, FFEffectData, FFEffectKind, FFEffectType, FFReplay,
    FFTrigger, Key,
};
use std::io;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use super::{
    ButtonMask, RawGamepad, RawState, RawVibration, SourceError, StateSource, MAX_SLOTS,
};
use crate::error::{PadwatchError, Result};

/// Key to button bit table.
const KEY_MAP: &[(Key, ButtonMask)] = &[
    (Key::BTN_SOUTH, ButtonMask::A),
    (Key::BTN_EAST, ButtonMask::B),
    (Key::BTN_WEST, ButtonMask::X),
    (Key::BTN_NORTH, ButtonMask::Y),
    (Key::BTN_TL, ButtonMask::LEFT_SHOULDER),
    (Key::BTN_TR, ButtonMask::RIGHT_SHOULDER),
    (Key::BTN_START, ButtonMask::START),
    (Key::BTN_SELECT, ButtonMask::BACK),
    (Key::BTN_MODE, ButtonMask::GUIDE),
    (Key::BTN_THUMBL, ButtonMask::LEFT_THUMB),
    (Key::BTN_THUMBR, ButtonMask::RIGHT_THUMB),
    (Key::BTN_DPAD_UP, ButtonMask::DPAD_UP),
    (Key::BTN_DPAD_DOWN, ButtonMask::DPAD_DOWN),
    (Key::BTN_DPAD_LEFT, ButtonMask::DPAD_LEFT),
    (Key::BTN_DPAD_RIGHT, ButtonMask::DPAD_RIGHT),
];

/// Axis limits copied from the kernel's `input_absinfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisInfo {
    value: i32,
    minimum: i32,
    maximum: i32,
}

struct EvdevSlot {
    device: Device,
    path: String,
    last: Option<RawGamepad>,
    packet: u32,
    rumble: Option<FFEffect>,
}

/// Gamepads reachable through evdev, one per slot.
pub struct EvdevSource {
    slots: Vec<Mutex<EvdevSlot>>,
}

impl std::fmt::Debug for EvdevSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevSource")
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl EvdevSource {
    /// Detect and open up to [`MAX_SLOTS`] gamepads.
    ///
    /// # Errors
    ///
    /// - `Io`: `/dev/input` cannot be listed
    /// - `ControllerNotFound`: no device looks like a gamepad
    pub fn open() -> Result<Self> {
        Self::open_dir(Path::new("/dev/input"))
    }

    /// Detect gamepads under a custom input directory.
    pub fn open_dir(input_dir: &Path) -> Result<Self> {
        let mut entries: Vec<_> = std::fs::read_dir(input_dir)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Deterministic slot assignment
        entries.sort_by_key(|entry| entry.path());

        let mut slots = Vec::new();
        for entry in entries {
            if slots.len() >= MAX_SLOTS as usize {
                break;
            }

            let path = entry.path();
            let is_event_node = path
                .file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) if looks_like_gamepad(&device) => {
                    info!(
                        "Slot {}: {} at {}",
                        slots.len(),
                        device.name().unwrap_or("unnamed gamepad"),
                        path.display()
                    );
                    slots.push(Mutex::new(EvdevSlot {
                        device,
                        path: path.to_string_lossy().to_string(),
                        last: None,
                        packet: 0,
                        rumble: None,
                    }));
                }
                Ok(_) => debug!("Skipping non-gamepad device {}", path.display()),
                // Permission denied or other errors - skip device
                Err(e) => debug!("Could not open {}: {}", path.display(), e),
            }
        }

        if slots.is_empty() {
            return Err(PadwatchError::ControllerNotFound);
        }

        Ok(Self { slots })
    }

    /// Number of slots backed by a device.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Device path behind `slot`, if any.
    pub fn device_path(&self, slot: u8) -> Option<String> {
        self.slots.get(slot as usize).map(|s| {
            s.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .path
                .clone()
        })
    }
}

impl StateSource for EvdevSource {
    fn query_state(&self, slot: u8) -> std::result::Result<RawState, SourceError> {
        let cell = self
            .slots
            .get(slot as usize)
            .ok_or(SourceError::NotConnected)?;
        let mut entry = cell.lock().unwrap_or_else(PoisonError::into_inner);

        let keys = entry.device.get_key_state().map_err(map_io_error)?;
        let abs = entry.device.get_abs_state().map_err(map_io_error)?;
        let axis = |axis: AbsoluteAxisType| {
            let info = &abs[axis.0 as usize];
            AxisInfo {
                value: info.value,
                minimum: info.minimum,
                maximum: info.maximum,
            }
        };

        let mut buttons = ButtonMask::empty();
        for (key, bit) in KEY_MAP {
            if keys.contains(*key) {
                buttons |= *bit;
            }
        }
        buttons |= hat_buttons(
            axis(AbsoluteAxisType::ABS_HAT0X).value,
            axis(AbsoluteAxisType::ABS_HAT0Y).value,
        );

        let gamepad = RawGamepad {
            buttons: buttons.bits(),
            left_trigger: scale_trigger(axis(AbsoluteAxisType::ABS_Z)),
            right_trigger: scale_trigger(axis(AbsoluteAxisType::ABS_RZ)),
            left_thumb_x: scale_thumb(axis(AbsoluteAxisType::ABS_X)),
            left_thumb_y: invert(scale_thumb(axis(AbsoluteAxisType::ABS_Y))),
            right_thumb_x: scale_thumb(axis(AbsoluteAxisType::ABS_RX)),
            right_thumb_y: invert(scale_thumb(axis(AbsoluteAxisType::ABS_RY))),
        };

        if entry.last != Some(gamepad) {
            entry.packet = entry.packet.wrapping_add(1);
            entry.last = Some(gamepad);
        }

        Ok(RawState {
            packet: entry.packet,
            gamepad,
        })
    }

    fn set_vibration(
        &self,
        slot: u8,
        vibration: RawVibration,
    ) -> std::result::Result<(), SourceError> {
        let cell = self
            .slots
            .get(slot as usize)
            .ok_or(SourceError::NotConnected)?;
        let mut guard = cell.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = &mut *guard;

        let supports_rumble = entry
            .device
            .supported_ff()
            .map_or(false, |ff| ff.contains(FFEffectType::FF_RUMBLE));
        if !supports_rumble {
            return Err(SourceError::Unsupported("rumble"));
        }

        let data = rumble_effect(vibration);
        let stopped = vibration == RawVibration::default();

        match entry.rumble.as_mut() {
            Some(effect) => {
                effect.update(data).map_err(map_io_error)?;
                if stopped {
                    effect.stop().map_err(map_io_error)?;
                } else {
                    effect.play(1).map_err(map_io_error)?;
                }
            }
            None if stopped => {}
            None => {
                let mut effect = entry.device.upload_ff_effect(data).map_err(map_io_error)?;
                effect.play(1).map_err(map_io_error)?;
                entry.rumble = Some(effect);
            }
        }

        Ok(())
    }
}

/// A zero-length replay keeps the effect running until it is updated or stopped.
fn rumble_effect(vibration: RawVibration) -> FFEffectData {
    FFEffectData {
        direction: 0,
        trigger: FFTrigger::default(),
        replay: FFReplay::default(),
        kind: FFEffectKind::Rumble {
            strong_magnitude: vibration.left_motor_speed,
            weak_magnitude: vibration.right_motor_speed,
        },
    }
}

fn looks_like_gamepad(device: &Device) -> bool {
    let has_south = device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
    let has_stick = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));
    has_south && has_stick
}

/// A vanished device node reads as "not connected"; anything else is a device error.
fn map_io_error(e: io::Error) -> SourceError {
    match e.raw_os_error() {
        Some(code) if code == 19 => SourceError::NotConnected, // ENODEV
        _ => SourceError::Device(e.to_string()),
    }
}

/// Maps an axis from its reported range onto -32768..32767.
fn scale_thumb(info: AxisInfo) -> i16 {
    if info.maximum <= info.minimum {
        return 0;
    }
    let span = (info.maximum - info.minimum) as f32;
    let t = ((info.value - info.minimum) as f32 / span).clamp(0.0, 1.0);
    (t * 65535.0 - 32768.0).round() as i16
}

/// Maps an axis from its reported range onto 0..255.
fn scale_trigger(info: AxisInfo) -> u8 {
    if info.maximum <= info.minimum {
        return 0;
    }
    let span = (info.maximum - info.minimum) as f32;
    let t = ((info.value - info.minimum) as f32 / span).clamp(0.0, 1.0);
    (t * 255.0).round() as u8
}

/// evdev Y grows downward; the raw protocol has up positive.
fn invert(value: i16) -> i16 {
    // -(-32768) does not fit, saturate instead
    value.saturating_neg()
}

fn hat_buttons(hat_x: i32, hat_y: i32) -> ButtonMask {
    let mut mask = ButtonMask::empty();
    if hat_x < 0 {
        mask |= ButtonMask::DPAD_LEFT;
    } else if hat_x > 0 {
        mask |= ButtonMask::DPAD_RIGHT;
    }
    if hat_y < 0 {
        mask |= ButtonMask::DPAD_UP;
    } else if hat_y > 0 {
        mask |= ButtonMask::DPAD_DOWN;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(value: i32, minimum: i32, maximum: i32) -> AxisInfo {
        AxisInfo {
            value,
            minimum,
            maximum,
        }
    }

    #[test]
    fn test_scale_thumb_endpoints() {
        assert_eq!(scale_thumb(info(-32768, -32768, 32767)), -32768);
        assert_eq!(scale_thumb(info(32767, -32768, 32767)), 32767);
        assert_eq!(scale_thumb(info(0, 0, 255)), -32768);
        assert_eq!(scale_thumb(info(255, 0, 255)), 32767);
    }

    #[test]
    fn test_scale_thumb_center() {
        // 128 of 0..255 sits just above the middle
        let centered = scale_thumb(info(128, 0, 255));
        assert!(centered.abs() < 200, "Center should map near 0, got {}", centered);
    }

    #[test]
    fn test_scale_degenerate_range() {
        assert_eq!(scale_thumb(info(5, 10, 10)), 0);
        assert_eq!(scale_trigger(info(5, 10, 0)), 0);
    }

    #[test]
    fn test_scale_trigger() {
        assert_eq!(scale_trigger(info(0, 0, 1023)), 0);
        assert_eq!(scale_trigger(info(1023, 0, 1023)), 255);
        assert_eq!(scale_trigger(info(2000, 0, 1023)), 255, "Out-of-range values clamp");
    }

    #[test]
    fn test_invert_saturates() {
        assert_eq!(invert(-32768), 32767);
        assert_eq!(invert(100), -100);
    }

    #[test]
    fn test_hat_buttons() {
        assert_eq!(hat_buttons(0, 0), ButtonMask::empty());
        assert_eq!(hat_buttons(-1, -1), ButtonMask::DPAD_LEFT | ButtonMask::DPAD_UP);
        assert_eq!(hat_buttons(1, 1), ButtonMask::DPAD_RIGHT | ButtonMask::DPAD_DOWN);
    }

    #[test]
    fn test_key_map_covers_every_button() {
        let mut covered = ButtonMask::empty();
        for (_, bit) in KEY_MAP {
            covered |= *bit;
        }
        assert_eq!(covered, ButtonMask::all());
    }

    #[test]
    fn test_rumble_effect_motor_order() {
        let data = rumble_effect(RawVibration {
            left_motor_speed: 60000,
            right_motor_speed: 1000,
        });
        assert_eq!(data.replay, FFReplay::default());
        assert_eq!(
            data.kind,
            FFEffectKind::Rumble {
                strong_magnitude: 60000,
                weak_magnitude: 1000,
            }
        );
    }

    #[test]
    fn test_map_io_error() {
        assert_eq!(
            map_io_error(io::Error::from_raw_os_error(19)),
            SourceError::NotConnected
        );
        assert!(matches!(
            map_io_error(io::Error::new(io::ErrorKind::Other, "boom")),
            SourceError::Device(_)
        ));
    }

    #[test]
    fn test_open_dir_missing_directory() {
        let result = EvdevSource::open_dir(Path::new("/nonexistent/input/dir"));
        assert!(matches!(result, Err(PadwatchError::Io(_))));
    }

    #[test]
    fn test_open_dir_without_gamepads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("event0"), b"not a device").unwrap();

        let result = EvdevSource::open_dir(dir.path());
        assert!(matches!(result, Err(PadwatchError::ControllerNotFound)));
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_query_with_real_hardware() {
        let source = EvdevSource::open().expect("No gamepad found");
        let state = source.query_state(0).expect("Query failed");
        assert!(state.packet >= 1, "First read should bump the packet counter");
        assert!(source.device_path(0).unwrap().starts_with("/dev/input/event"));
    }
}
