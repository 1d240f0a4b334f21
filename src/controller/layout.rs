//! # Controller Layout Registry
//!
//! Maps raw axis and button indices reported by a gamepad to semantic
//! control names such as `"LX"` or `"START"`.
//!
//! Different controller brands number their buttons differently, so each
//! supported controller gets its own [`Layout`]. Layouts are looked up by
//! identifier in a [`LayoutRegistry`] built once at startup.
//!
//! ## Built-in Layouts
//!
//! | Identifier | Controller |
//! |------------|------------|
//! | `default` | Generic XInput-style pad |
//! | `8bitdo` | 8BitDo pads (D-Pad reported as buttons) |
//!
//! ## Fallback
//!
//! An index without a mapping resolves to its decimal string (`12` → `"12"`).
//! Such names never match a control, so the event is ignored instead of
//! failing.
//!
//! ## Usage
//!
//! ```
//! use tello_pad::controller::layout::LayoutRegistry;
//!
//! let registry = LayoutRegistry::builtin();
//! assert_eq!(registry.resolve_button("default", 7)?, "START");
//! assert_eq!(registry.resolve_axis("8bitdo", 42)?, "42");
//! # Ok::<(), tello_pad::error::TelloPadError>(())
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{Result, TelloPadError};

/// Layout used when neither the config file nor the command line picks one.
pub const DEFAULT_LAYOUT: &str = "default";

/// Identifier of the 8BitDo layout.
pub const LAYOUT_8BITDO: &str = "8bitdo";

/// Semantic axis names understood by the control translator.
pub mod axes {
    /// Left stick horizontal.
    pub const LX: &str = "LX";
    /// Left stick vertical.
    pub const LY: &str = "LY";
    /// Right stick horizontal.
    pub const RX: &str = "RX";
    /// Right stick vertical.
    pub const RY: &str = "RY";
    /// Left trigger.
    pub const L2: &str = "L2";
    /// Right trigger.
    pub const R2: &str = "R2";
}

/// Semantic button names that trigger drone actions.
pub mod buttons {
    /// Arm and take off.
    pub const START: &str = "START";
    /// Disarm and land.
    pub const SELECT: &str = "SELECT";
    /// D-pad up, flip forward.
    pub const UP: &str = "UP";
    /// D-pad down, flip backward.
    pub const DOWN: &str = "DOWN";
    /// D-pad left, flip left.
    pub const LEFT: &str = "LEFT";
    /// D-pad right, flip right.
    pub const RIGHT: &str = "RIGHT";
}

const STICK_AXES: &[(u16, &str)] = &[
    (0, axes::LX),
    (1, axes::LY),
    (2, axes::RX),
    (3, axes::RY),
    (4, axes::L2),
    (5, axes::R2),
];

const DEFAULT_BUTTONS: &[(u16, &str)] = &[
    (0, "A"),
    (1, "B"),
    (2, "X"),
    (3, "Y"),
    (4, "L1"),
    (5, "R1"),
    (6, buttons::SELECT),
    (7, buttons::START),
    (9, "Left Stick Click"),
    (10, "Right Stick Click"),
];

const BITDO_BUTTONS: &[(u16, &str)] = &[
    (0, "B"),
    (1, "A"),
    (2, "Y"),
    (3, "X"),
    (4, buttons::SELECT),
    (6, buttons::START),
    (7, "L3"),
    (8, "R3"),
    (9, "L1"),
    (10, "R1"),
    (11, buttons::UP),
    (12, buttons::DOWN),
    (13, buttons::LEFT),
    (14, buttons::RIGHT),
    (15, "SHARE"),
];

/// Index-to-name mapping for one controller type.
///
/// Immutable once built. Indices are unique within each mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    id: &'static str,
    axes: HashMap<u16, &'static str>,
    buttons: HashMap<u16, &'static str>,
}

impl Layout {
    fn from_tables(
        id: &'static str,
        axes: &[(u16, &'static str)],
        buttons: &[(u16, &'static str)],
    ) -> Self {
        Self {
            id,
            axes: axes.iter().copied().collect(),
            buttons: buttons.iter().copied().collect(),
        }
    }

    /// Layout identifier, e.g. `"8bitdo"`.
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Resolves a raw axis index to its semantic name.
    ///
    /// Unmapped indices resolve to their decimal string.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_pad::controller::layout::LayoutRegistry;
    ///
    /// let registry = LayoutRegistry::builtin();
    /// let layout = registry.get("default")?;
    /// assert_eq!(layout.axis_name(1), "LY");
    /// assert_eq!(layout.axis_name(9), "9");
    /// # Ok::<(), tello_pad::error::TelloPadError>(())
    /// ```
    #[must_use]
    pub fn axis_name(&self, raw_index: u16) -> Cow<'static, str> {
        Self::lookup(&self.axes, raw_index)
    }

    /// Resolves a raw button index to its semantic name.
    ///
    /// Unmapped indices resolve to their decimal string.
    #[must_use]
    pub fn button_name(&self, raw_index: u16) -> Cow<'static, str> {
        Self::lookup(&self.buttons, raw_index)
    }

    /// Number of mapped axes.
    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Number of mapped buttons.
    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    #[inline]
    fn lookup(map: &HashMap<u16, &'static str>, raw_index: u16) -> Cow<'static, str> {
        match map.get(&raw_index) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(raw_index.to_string()),
        }
    }
}

/// Registry of all known controller layouts, keyed by identifier.
///
/// Built once at startup and passed by reference; there is no runtime
/// mutation.
#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    layouts: HashMap<&'static str, Layout>,
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LayoutRegistry {
    /// Creates the registry with every built-in layout.
    #[must_use]
    pub fn builtin() -> Self {
        let layouts = [
            Layout::from_tables(DEFAULT_LAYOUT, STICK_AXES, DEFAULT_BUTTONS),
            Layout::from_tables(LAYOUT_8BITDO, STICK_AXES, BITDO_BUTTONS),
        ];

        Self {
            layouts: layouts.into_iter().map(|l| (l.id, l)).collect(),
        }
    }

    /// Looks up a layout by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TelloPadError::Configuration`] if `layout_id` is not registered.
    pub fn get(&self, layout_id: &str) -> Result<&Layout> {
        self.layouts.get(layout_id).ok_or_else(|| {
            TelloPadError::config(format!(
                "unknown controller layout '{}' (available: {})",
                layout_id,
                self.ids().join(", ")
            ))
        })
    }

    /// Returns `true` if `layout_id` is registered.
    #[must_use]
    pub fn contains(&self, layout_id: &str) -> bool {
        self.layouts.contains_key(layout_id)
    }

    /// Sorted identifiers of all registered layouts.
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.layouts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Resolves an axis index within the named layout.
    ///
    /// # Errors
    ///
    /// Returns [`TelloPadError::Configuration`] for an unknown layout.
    pub fn resolve_axis(&self, layout_id: &str, raw_index: u16) -> Result<Cow<'static, str>> {
        Ok(self.get(layout_id)?.axis_name(raw_index))
    }

    /// Resolves a button index within the named layout.
    ///
    /// # Errors
    ///
    /// Returns [`TelloPadError::Configuration`] for an unknown layout.
    pub fn resolve_button(&self, layout_id: &str, raw_index: u16) -> Result<Cow<'static, str>> {
        Ok(self.get(layout_id)?.button_name(raw_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Registry Tests ====================

    #[test]
    fn test_builtin_ids() {
        let registry = LayoutRegistry::builtin();
        assert_eq!(registry.ids(), vec!["8bitdo", "default"]);
        assert!(registry.contains(DEFAULT_LAYOUT));
        assert!(registry.contains(LAYOUT_8BITDO));
    }

    #[test]
    fn test_unknown_layout_is_configuration_error() {
        let registry = LayoutRegistry::builtin();
        match registry.get("ps5") {
            Err(TelloPadError::Configuration(msg)) => {
                assert!(msg.contains("ps5"));
                assert!(msg.contains("8bitdo"));
                assert!(msg.contains("default"));
            }
            other => panic!("Expected Configuration error, got: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_with_unknown_layout_fails() {
        let registry = LayoutRegistry::builtin();
        assert!(registry.resolve_axis("ps5", 0).is_err());
        assert!(registry.resolve_button("ps5", 0).is_err());
    }

    #[test]
    fn test_layout_ids_match_keys() {
        let registry = LayoutRegistry::builtin();
        for id in registry.ids() {
            assert_eq!(registry.get(id).unwrap().id(), id);
        }
    }

    // ==================== Default Layout ====================

    #[test]
    fn test_default_axes() {
        let registry = LayoutRegistry::builtin();
        assert_eq!(registry.resolve_axis("default", 0).unwrap(), "LX");
        assert_eq!(registry.resolve_axis("default", 1).unwrap(), "LY");
        assert_eq!(registry.resolve_axis("default", 2).unwrap(), "RX");
        assert_eq!(registry.resolve_axis("default", 3).unwrap(), "RY");
        assert_eq!(registry.resolve_axis("default", 6).unwrap(), "6");
    }

    #[test]
    fn test_default_buttons() {
        let registry = LayoutRegistry::builtin();
        assert_eq!(registry.resolve_button("default", 6).unwrap(), "SELECT");
        assert_eq!(registry.resolve_button("default", 7).unwrap(), "START");
        assert_eq!(registry.resolve_button("default", 9).unwrap(), "Left Stick Click");
        // 8 is a gap in the table
        assert_eq!(registry.resolve_button("default", 8).unwrap(), "8");
        assert_eq!(registry.resolve_button("default", 11).unwrap(), "11");
    }

    // ==================== 8BitDo Layout ====================

    #[test]
    fn test_8bitdo_axes() {
        let registry = LayoutRegistry::builtin();
        assert_eq!(registry.resolve_axis("8bitdo", 1).unwrap(), "LY");
        assert_eq!(registry.resolve_axis("8bitdo", 5).unwrap(), "R2");
        assert_eq!(registry.resolve_axis("8bitdo", 7).unwrap(), "7");
    }

    #[test]
    fn test_8bitdo_buttons() {
        let registry = LayoutRegistry::builtin();
        assert_eq!(registry.resolve_button("8bitdo", 6).unwrap(), "START");
        assert_eq!(registry.resolve_button("8bitdo", 4).unwrap(), "SELECT");
        assert_eq!(registry.resolve_button("8bitdo", 11).unwrap(), "UP");
        assert_eq!(registry.resolve_button("8bitdo", 12).unwrap(), "DOWN");
        assert_eq!(registry.resolve_button("8bitdo", 13).unwrap(), "LEFT");
        assert_eq!(registry.resolve_button("8bitdo", 14).unwrap(), "RIGHT");
        assert_eq!(registry.resolve_button("8bitdo", 5).unwrap(), "5");
        assert_eq!(registry.resolve_button("8bitdo", 16).unwrap(), "16");
    }

    #[test]
    fn test_layouts_differ_on_start() {
        let registry = LayoutRegistry::builtin();
        // Same raw index, different meaning per brand
        assert_eq!(registry.resolve_button("default", 7).unwrap(), "START");
        assert_eq!(registry.resolve_button("8bitdo", 7).unwrap(), "L3");
    }

    #[test]
    fn test_fallback_is_borrowed_only_when_mapped() {
        let registry = LayoutRegistry::builtin();
        let layout = registry.get("default").unwrap();
        assert!(matches!(layout.axis_name(0), Cow::Borrowed(_)));
        assert!(matches!(layout.axis_name(60), Cow::Owned(_)));
    }

    #[test]
    fn test_counts() {
        let registry = LayoutRegistry::builtin();
        let default = registry.get("default").unwrap();
        assert_eq!(default.axis_count(), 6);
        assert_eq!(default.button_count(), 10);

        let bitdo = registry.get("8bitdo").unwrap();
        assert_eq!(bitdo.axis_count(), 6);
        assert_eq!(bitdo.button_count(), 15);
    }
}
