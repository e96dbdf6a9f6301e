//! # Normalizer Module
//!
//! Converts raw controller integers to normalized values and applies
//! deadzones and trigger thresholds.
//!
//! ## Deadzone
//!
//! A deadzone eliminates small stick movements near center to prevent drift.
//! Values within the deadzone are mapped to center (0.0), while values outside
//! are rescaled so the output still spans the full range:
//!
//! - `value > 0`: `max((value - deadzone) / (1 - deadzone), 0)`
//! - otherwise: `min((value + deadzone) / (1 - deadzone), 0)`
//!
//! ## Threshold
//!
//! Triggers use the same formula with a zero floor, since they never go negative.
//!
//! ## Usage
//!
//! ```
//! use padwatch::controller::normalizer::{apply_deadzone, normalize_axis};
//!
//! let value = normalize_axis(16000, 32767);
//! assert!((apply_deadzone(value, 0.2395) - 0.327).abs() < 0.001);
//!
//! // Input near center (within deadzone)
//! assert_eq!(apply_deadzone(0.1, 0.2395), 0.0);
//! ```

use crate::source::{
    RawGamepad, LEFT_THUMB_DEADZONE, RIGHT_THUMB_DEADZONE, THUMB_MAX, TRIGGER_MAX,
    TRIGGER_THRESHOLD,
};

/// Largest accepted deadzone or threshold. 1.0 would divide by zero.
pub const MAX_FILTER: f32 = 0.99;

/// Converts a raw axis value to the range -1.0 to 1.0.
///
/// `raw / raw_max`, clamped. The most negative raw value of a two's complement
/// range is one step past `-raw_max` and clamps to -1.0.
///
/// # Examples
///
/// ```
/// use padwatch::controller::normalizer::normalize_axis;
///
/// assert_eq!(normalize_axis(32767, 32767), 1.0);
/// assert_eq!(normalize_axis(-32768, 32767), -1.0);
/// assert_eq!(normalize_axis(0, 32767), 0.0);
/// ```
#[must_use]
pub fn normalize_axis(raw: i32, raw_max: i32) -> f32 {
    if raw_max <= 0 {
        return 0.0;
    }
    (raw as f32 / raw_max as f32).clamp(-1.0, 1.0)
}

/// Converts a raw trigger value to the range 0.0 to 1.0.
///
/// # Examples
///
/// ```
/// use padwatch::controller::normalizer::normalize_trigger;
///
/// assert_eq!(normalize_trigger(0, 255), 0.0);
/// assert_eq!(normalize_trigger(255, 255), 1.0);
/// ```
#[must_use]
pub fn normalize_trigger(raw: i32, raw_max: i32) -> f32 {
    if raw_max <= 0 {
        return 0.0;
    }
    (raw as f32 / raw_max as f32).clamp(0.0, 1.0)
}

/// Applies a symmetric deadzone and rescales the remainder to the full range.
///
/// `deadzone` must already be in [0.0, 1.0); see [`clamp_filter`].
#[must_use]
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value > 0.0 {
        ((value - deadzone) / (1.0 - deadzone)).max(0.0)
    } else {
        ((value + deadzone) / (1.0 - deadzone)).min(0.0)
    }
}

/// Applies a trigger threshold. Same as [`apply_deadzone`] with a zero floor.
#[must_use]
pub fn apply_threshold(value: f32, threshold: f32) -> f32 {
    apply_deadzone(value, threshold).max(0.0)
}

/// Clamps a deadzone or threshold into [0.0, [`MAX_FILTER`]]. NaN becomes 0.0.
#[must_use]
pub fn clamp_filter(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_FILTER)
    }
}

/// Deadzone and threshold settings for one controller.
///
/// Values are fractions of full scale. Defaults are the recommended
/// 7849/32767, 8689/32767 and 30/255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    left_thumb_deadzone: f32,
    right_thumb_deadzone: f32,
    left_trigger_threshold: f32,
    right_trigger_threshold: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            left_thumb_deadzone: f32::from(LEFT_THUMB_DEADZONE) / THUMB_MAX as f32,
            right_thumb_deadzone: f32::from(RIGHT_THUMB_DEADZONE) / THUMB_MAX as f32,
            left_trigger_threshold: f32::from(TRIGGER_THRESHOLD) / TRIGGER_MAX as f32,
            right_trigger_threshold: f32::from(TRIGGER_THRESHOLD) / TRIGGER_MAX as f32,
        }
    }
}

impl FilterConfig {
    /// Creates a filter configuration. Values outside [0.0, 0.99] are clamped.
    ///
    /// # Examples
    ///
    /// ```
    /// use padwatch::controller::normalizer::FilterConfig;
    ///
    /// let filter = FilterConfig::new(0.1, 0.1, 1.5, 0.0);
    /// assert_eq!(filter.left_trigger_threshold(), 0.99);
    /// ```
    #[must_use]
    pub fn new(
        left_thumb_deadzone: f32,
        right_thumb_deadzone: f32,
        left_trigger_threshold: f32,
        right_trigger_threshold: f32,
    ) -> Self {
        Self {
            left_thumb_deadzone: clamp_filter(left_thumb_deadzone),
            right_thumb_deadzone: clamp_filter(right_thumb_deadzone),
            left_trigger_threshold: clamp_filter(left_trigger_threshold),
            right_trigger_threshold: clamp_filter(right_trigger_threshold),
        }
    }

    /// No filtering at all.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[must_use]
    pub fn left_thumb_deadzone(&self) -> f32 {
        self.left_thumb_deadzone
    }

    #[must_use]
    pub fn right_thumb_deadzone(&self) -> f32 {
        self.right_thumb_deadzone
    }

    #[must_use]
    pub fn left_trigger_threshold(&self) -> f32 {
        self.left_trigger_threshold
    }

    #[must_use]
    pub fn right_trigger_threshold(&self) -> f32 {
        self.right_trigger_threshold
    }

    pub fn set_left_thumb_deadzone(&mut self, value: f32) {
        self.left_thumb_deadzone = clamp_filter(value);
    }

    pub fn set_right_thumb_deadzone(&mut self, value: f32) {
        self.right_thumb_deadzone = clamp_filter(value);
    }

    pub fn set_left_trigger_threshold(&mut self, value: f32) {
        self.left_trigger_threshold = clamp_filter(value);
    }

    pub fn set_right_trigger_threshold(&mut self, value: f32) {
        self.right_trigger_threshold = clamp_filter(value);
    }
}

/// Normalized and filtered analog values of one raw snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalogValues {
    pub left_thumb_x: f32,
    pub left_thumb_y: f32,
    pub right_thumb_x: f32,
    pub right_thumb_y: f32,
    pub left_trigger: f32,
    pub right_trigger: f32,
}

/// Runs every axis and trigger of `raw` through normalization and `filter`.
///
/// Each stick axis is filtered on its own with its stick's deadzone.
#[must_use]
pub fn normalize_analog(raw: &RawGamepad, filter: &FilterConfig) -> AnalogValues {
    let thumb = |value: i16, deadzone: f32| {
        apply_deadzone(normalize_axis(i32::from(value), THUMB_MAX), deadzone)
    };
    let trigger = |value: u8, threshold: f32| {
        apply_threshold(normalize_trigger(i32::from(value), TRIGGER_MAX), threshold)
    };

    AnalogValues {
        left_thumb_x: thumb(raw.left_thumb_x, filter.left_thumb_deadzone),
        left_thumb_y: thumb(raw.left_thumb_y, filter.left_thumb_deadzone),
        right_thumb_x: thumb(raw.right_thumb_x, filter.right_thumb_deadzone),
        right_thumb_y: thumb(raw.right_thumb_y, filter.right_thumb_deadzone),
        left_trigger: trigger(raw.left_trigger, filter.left_trigger_threshold),
        right_trigger: trigger(raw.right_trigger, filter.right_trigger_threshold),
    }
}
