//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and event reading via evdev
//! - Per-brand layouts mapping raw indices to control names
//! - Deadzone filtering and scaling into drone velocities
//! - Dispatching takeoff, land and flip on button presses

pub mod events;
pub mod gamepad;
pub mod layout;
pub mod translator;
