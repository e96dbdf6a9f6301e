//! # Controller Module
//!
//! Gamepad observation on top of a [`crate::source::StateSource`].
//!
//! This module handles:
//! - Normalizing sticks and triggers with deadzones and thresholds
//! - Polling each slot in its own task and detecting changes by packet number
//! - Dispatching state-changed and key transition notifications
//! - One-shot enumeration of connected controllers

pub mod normalizer;
pub mod registry;
pub mod session;
pub mod state;
pub mod subscription;

pub use normalizer::FilterConfig;
pub use registry::{enumerate, enumerate_slots};
pub use session::{Gamepad, GamepadSession, SessionOptions, SessionState};
pub use state::{Button, GamepadSnapshot, GamepadState, KeyEvent, VibrationMotorSpeed};
pub use subscription::SubscriptionId;
