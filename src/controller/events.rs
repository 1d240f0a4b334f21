//! # Gamepad Events
//!
//! Device-independent input events consumed by the control loop.
//!
//! Axis and button numbers are raw indices as reported by the input source.
//! They only gain meaning once resolved through a
//! [`Layout`](super::layout::Layout).

use std::fmt;

use super::layout::Layout;

/// One discrete input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadEvent {
    /// An analog axis moved. `value` is nominally in `-1.0..=1.0`.
    AxisMotion { index: u16, value: f32 },
    /// A button was pressed.
    ButtonDown { index: u16 },
    /// A button was released.
    ButtonUp { index: u16 },
    /// The operator asked to quit, or the input device went away.
    Quit,
}

impl fmt::Display for PadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadEvent::AxisMotion { index, value } => write!(f, "Axis {} moved to {:.2}", index, value),
            PadEvent::ButtonDown { index } => write!(f, "Button {} pressed", index),
            PadEvent::ButtonUp { index } => write!(f, "Button {} released", index),
            PadEvent::Quit => write!(f, "Quit requested"),
        }
    }
}

/// Renders an event with its semantic name under `layout`.
///
/// Used by the probe mode to help users find out how their pad is numbered.
///
/// # Examples
///
/// ```
/// use tello_pad::controller::events::{describe_event, PadEvent};
/// use tello_pad::controller::layout::LayoutRegistry;
///
/// let registry = LayoutRegistry::builtin();
/// let layout = registry.get("default")?;
///
/// let text = describe_event(layout, &PadEvent::ButtonDown { index: 7 });
/// assert_eq!(text, "Button START (7) pressed");
/// # Ok::<(), tello_pad::error::TelloPadError>(())
/// ```
#[must_use]
pub fn describe_event(layout: &Layout, event: &PadEvent) -> String {
    match event {
        PadEvent::AxisMotion { index, value } => {
            format!("Axis {} ({}) moved to {:.2}", layout.axis_name(*index), index, value)
        }
        PadEvent::ButtonDown { index } => {
            format!("Button {} ({}) pressed", layout.button_name(*index), index)
        }
        PadEvent::ButtonUp { index } => {
            format!("Button {} ({}) released", layout.button_name(*index), index)
        }
        PadEvent::Quit => event.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::layout::LayoutRegistry;

    #[test]
    fn test_display_raw() {
        let event = PadEvent::AxisMotion { index: 2, value: -0.5 };
        assert_eq!(event.to_string(), "Axis 2 moved to -0.50");
        assert_eq!(PadEvent::ButtonUp { index: 3 }.to_string(), "Button 3 released");
    }

    #[test]
    fn test_describe_axis() {
        let registry = LayoutRegistry::builtin();
        let layout = registry.get("8bitdo").unwrap();
        let text = describe_event(layout, &PadEvent::AxisMotion { index: 1, value: 0.25 });
        assert_eq!(text, "Axis LY (1) moved to 0.25");
    }

    #[test]
    fn test_describe_unmapped_button() {
        let registry = LayoutRegistry::builtin();
        let layout = registry.get("default").unwrap();
        let text = describe_event(layout, &PadEvent::ButtonUp { index: 20 });
        assert_eq!(text, "Button 20 (20) released");
    }

    #[test]
    fn test_describe_quit() {
        let registry = LayoutRegistry::builtin();
        let layout = registry.get("default").unwrap();
        assert_eq!(describe_event(layout, &PadEvent::Quit), "Quit requested");
    }
}
