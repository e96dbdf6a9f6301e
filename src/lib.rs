//! # Padwatch Library
//!
//! Observe game controllers as normalized, event-driven state.
//!
//! This library polls a raw controller source per slot, turns bitmasks and raw
//! integers into booleans and filtered floats, and notifies subscribers when
//! something changed.

pub mod config;
pub mod controller;
pub mod error;
pub mod source;
