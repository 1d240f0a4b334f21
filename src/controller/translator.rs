//! # Control Translator
//!
//! Turns gamepad events into drone velocity state and discrete actions.
//!
//! ## Stick Assignments
//!
//! | Control | Channel | Multiplier | Inverted |
//! |---------|---------|------------|----------|
//! | LX | Yaw | 30 | no |
//! | LY | Vertical | 10 | yes |
//! | RX | Lateral | 60 | no |
//! | RY | Longitudinal | 60 | yes |
//!
//! Y axes are inverted because pushing a stick up reports a negative value,
//! while up should mean climb / move forward.
//!
//! ## Axis Pipeline
//!
//! 1. Clamp the raw value to `-1.0..=1.0`
//! 2. Values with magnitude below [`DEADZONE`] collapse to zero
//! 3. Scale to integer percent: `round(value * 100)`
//! 4. Multiply (and invert) into the matching channel
//!
//! Channels are not clamped here. The transport clamps to the range the
//! drone accepts when a command leaves the process.
//!
//! ## Buttons
//!
//! | Control | Action |
//! |---------|--------|
//! | START | Arm + takeoff |
//! | SELECT | Disarm + land |
//! | UP / DOWN / LEFT / RIGHT | Flip in that direction |
//!
//! ## Usage
//!
//! ```
//! use tello_pad::controller::layout::LayoutRegistry;
//! use tello_pad::controller::translator::{ControlSession, DroneAction};
//!
//! let registry = LayoutRegistry::builtin();
//! let mut session = ControlSession::new(registry.get("default")?.clone());
//!
//! assert!(session.tick().is_none()); // Disarmed
//!
//! assert_eq!(session.on_button_down(7), Some(DroneAction::Takeoff));
//! session.on_axis_motion(2, 1.0);
//!
//! let command = session.tick().expect("armed");
//! assert_eq!(command.lateral, 6000);
//! # Ok::<(), tello_pad::error::TelloPadError>(())
//! ```

use std::fmt;

use serde::Serialize;

use super::events::PadEvent;
use super::layout::{axes, buttons, Layout};

/// Axis magnitude below which input is treated as centered.
pub const DEADZONE: f32 = 0.5;

/// Multiplier for the yaw channel (LX).
pub const YAW_MULT: i32 = 30;

/// Multiplier for the vertical channel (LY).
pub const VERTICAL_MULT: i32 = 10;

/// Multiplier for the lateral and longitudinal channels (RX, RY).
pub const HORIZONTAL_MULT: i32 = 60;

/// Direction of a flip maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipDirection {
    Forward,
    Backward,
    Left,
    Right,
}

impl fmt::Display for FlipDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlipDirection::Forward => "forward",
            FlipDirection::Backward => "backward",
            FlipDirection::Left => "left",
            FlipDirection::Right => "right",
        };
        f.write_str(name)
    }
}

/// Discrete action requested by a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroneAction {
    Takeoff,
    Land,
    Flip(FlipDirection),
}

/// Whether velocity commands are being transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArmState {
    /// Initial state; ticks produce nothing.
    #[default]
    Disarmed,
    /// Entered on takeoff; ticks produce velocity commands.
    Armed,
}

/// Current stick-derived velocities.
///
/// Values are the raw product of the scaling pipeline and may exceed the
/// range the drone accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VelocityState {
    /// Left/right (RX).
    pub lateral: i32,
    /// Forward/backward (RY).
    pub longitudinal: i32,
    /// Up/down (LY).
    pub vertical: i32,
    /// Rotation (LX).
    pub yaw: i32,
}

/// Immutable snapshot of [`VelocityState`] handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VelocityCommand {
    pub lateral: i32,
    pub longitudinal: i32,
    pub vertical: i32,
    pub yaw: i32,
}

impl VelocityCommand {
    /// Returns a copy with every channel clamped to `-limit..=limit`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_pad::controller::translator::VelocityCommand;
    ///
    /// let cmd = VelocityCommand { lateral: 4800, longitudinal: -30, vertical: -800, yaw: 0 };
    /// let clamped = cmd.clamped(100);
    /// assert_eq!(clamped.lateral, 100);
    /// assert_eq!(clamped.longitudinal, -30);
    /// assert_eq!(clamped.vertical, -100);
    /// ```
    #[must_use]
    pub fn clamped(&self, limit: i32) -> Self {
        let limit = limit.abs();
        Self {
            lateral: self.lateral.clamp(-limit, limit),
            longitudinal: self.longitudinal.clamp(-limit, limit),
            vertical: self.vertical.clamp(-limit, limit),
            yaw: self.yaw.clamp(-limit, limit),
        }
    }
}

impl From<VelocityState> for VelocityCommand {
    fn from(state: VelocityState) -> Self {
        Self {
            lateral: state.lateral,
            longitudinal: state.longitudinal,
            vertical: state.vertical,
            yaw: state.yaw,
        }
    }
}

/// Normalizes a raw axis reading to integer percent.
///
/// Out-of-range input is clamped, NaN reads as centered, and anything inside
/// the deadzone is zero.
#[inline]
#[must_use]
pub fn axis_percent(raw_value: f32) -> i32 {
    let value = if raw_value.is_nan() {
        0.0
    } else {
        raw_value.clamp(-1.0, 1.0)
    };

    if value.abs() < DEADZONE {
        return 0;
    }

    (value * 100.0).round() as i32
}

/// Per-session control state: active layout, velocities and arm flag.
///
/// Owned by the control loop. Event handlers only mutate state; velocities
/// reach the drone exclusively through [`ControlSession::tick`].
#[derive(Debug, Clone)]
pub struct ControlSession {
    layout: Layout,
    velocity: VelocityState,
    arm_state: ArmState,
}

impl ControlSession {
    /// Creates a disarmed session with zero velocities.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            velocity: VelocityState::default(),
            arm_state: ArmState::Disarmed,
        }
    }

    /// Active layout.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Current velocity state.
    #[must_use]
    pub fn velocity(&self) -> &VelocityState {
        &self.velocity
    }

    /// Current arm state.
    #[must_use]
    pub fn arm_state(&self) -> ArmState {
        self.arm_state
    }

    /// Returns `true` while velocity commands are being emitted.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.arm_state == ArmState::Armed
    }

    /// Folds an axis movement into the velocity state.
    ///
    /// Axes without a velocity assignment (triggers, unmapped indices) are
    /// ignored.
    pub fn on_axis_motion(&mut self, raw_axis_index: u16, raw_value: f32) {
        let name = self.layout.axis_name(raw_axis_index);
        let scaled = axis_percent(raw_value);

        match name.as_ref() {
            axes::LX => self.velocity.yaw = scaled * YAW_MULT,
            axes::LY => self.velocity.vertical = -scaled * VERTICAL_MULT,
            axes::RX => self.velocity.lateral = scaled * HORIZONTAL_MULT,
            axes::RY => self.velocity.longitudinal = -scaled * HORIZONTAL_MULT,
            _ => {}
        }
    }

    /// Handles a button press, returning the action it requests.
    ///
    /// START arms and SELECT disarms before their action is returned. The
    /// caller forwards the action to the drone without waiting on it.
    pub fn on_button_down(&mut self, raw_button_index: u16) -> Option<DroneAction> {
        let name = self.layout.button_name(raw_button_index);

        match name.as_ref() {
            buttons::START => {
                self.arm_state = ArmState::Armed;
                Some(DroneAction::Takeoff)
            }
            buttons::SELECT => {
                self.arm_state = ArmState::Disarmed;
                Some(DroneAction::Land)
            }
            buttons::UP => Some(DroneAction::Flip(FlipDirection::Forward)),
            buttons::DOWN => Some(DroneAction::Flip(FlipDirection::Backward)),
            buttons::LEFT => Some(DroneAction::Flip(FlipDirection::Left)),
            buttons::RIGHT => Some(DroneAction::Flip(FlipDirection::Right)),
            _ => None,
        }
    }

    /// Handles a button release. Actions are edge-triggered on press, so
    /// releases have no effect.
    pub fn on_button_up(&mut self, _raw_button_index: u16) {}

    /// Routes any input event to its handler.
    ///
    /// Returns the action requested by a button press, if any. `Quit` is
    /// ignored here; the control loop handles it.
    pub fn handle_event(&mut self, event: &PadEvent) -> Option<DroneAction> {
        match *event {
            PadEvent::AxisMotion { index, value } => {
                self.on_axis_motion(index, value);
                None
            }
            PadEvent::ButtonDown { index } => self.on_button_down(index),
            PadEvent::ButtonUp { index } => {
                self.on_button_up(index);
                None
            }
            PadEvent::Quit => None,
        }
    }

    /// Ends the session. If still armed, disarms and returns a land request.
    pub fn release(&mut self) -> Option<DroneAction> {
        match self.arm_state {
            ArmState::Armed => {
                self.arm_state = ArmState::Disarmed;
                Some(DroneAction::Land)
            }
            ArmState::Disarmed => None,
        }
    }

    /// Snapshot of the velocity state to transmit this period.
    ///
    /// Returns `None` while disarmed.
    #[must_use]
    pub fn tick(&self) -> Option<VelocityCommand> {
        match self.arm_state {
            ArmState::Armed => Some(self.velocity.into()),
            ArmState::Disarmed => None,
        }
    }
}
