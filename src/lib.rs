//! # Tello Pad Library
//!
//! Fly a Tello drone with a gamepad.
//!
//! This library provides the core functionality for turning gamepad input
//! into Tello SDK commands: controller layouts, the control translator,
//! the UDP drone link and state telemetry logging.

pub mod config;
pub mod error;
pub mod controller;
pub mod drone;
pub mod pilot;
pub mod telemetry;
