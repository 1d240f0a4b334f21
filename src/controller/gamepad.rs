//! # Gamepad Input Module
//!
//! Detects a gamepad through the Linux evdev interface and converts its
//! events into raw-index [`PadEvent`]s.
//!
//! ## Index Assignment
//!
//! evdev reports axes and buttons by kernel code (`ABS_RX`, `BTN_SOUTH`, ...).
//! Layouts work with small dense indices instead, assigned per device:
//!
//! - Axes: ascending `ABS_*` code order, hat axes excluded
//! - Buttons: ascending key code order, starting at `BTN_MISC`
//!
//! Absolute values are normalized to `-1.0..=1.0` from the min/max the device
//! reports for each axis.

use std::collections::HashMap;
use std::path::Path;

use evdev::{AbsoluteAxisType, Device, EventStream, InputEvent, InputEventKind, Key};
use tracing::{debug, info};

use super::events::PadEvent;
use crate::error::{Result, TelloPadError};

/// First hat axis code (`ABS_HAT0X`).
const ABS_HAT_FIRST: u16 = 0x10;

/// Last hat axis code (`ABS_HAT3Y`).
const ABS_HAT_LAST: u16 = 0x17;

/// Lowest key code treated as a gamepad button (`BTN_MISC`).
const BTN_FIRST: u16 = 0x100;

/// evdev key value for autorepeat events.
const KEY_REPEAT: i32 = 2;

/// Reported value range of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    /// Maps `value` from `min..=max` onto `-1.0..=1.0`.
    ///
    /// A degenerate range (max <= min) always reads as centered.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_pad::controller::gamepad::AxisRange;
    ///
    /// let range = AxisRange { min: 0, max: 255 };
    /// assert_eq!(range.normalize(0), -1.0);
    /// assert_eq!(range.normalize(255), 1.0);
    /// ```
    #[must_use]
    pub fn normalize(&self, value: i32) -> f32 {
        if self.max <= self.min {
            return 0.0;
        }
        let min = f64::from(self.min);
        let span = f64::from(self.max) - min;
        let normalized = 2.0 * (f64::from(value) - min) / span - 1.0;
        normalized.clamp(-1.0, 1.0) as f32
    }
}

/// Per-device translation from evdev codes to raw layout indices.
#[derive(Debug, Clone, Default)]
pub struct IndexMap {
    /// ABS code -> (raw index, range)
    axes: HashMap<u16, (u16, AxisRange)>,
    /// Key code -> raw index
    buttons: HashMap<u16, u16>,
}

impl IndexMap {
    /// Builds an index map from the axes and keys a device supports.
    ///
    /// Input order does not matter; indices are assigned by ascending code.
    #[must_use]
    pub fn new<A, K>(axes: A, keys: K) -> Self
    where
        A: IntoIterator<Item = (AbsoluteAxisType, AxisRange)>,
        K: IntoIterator<Item = Key>,
    {
        let mut axes: Vec<_> = axes
            .into_iter()
            .filter(|(axis, _)| !(ABS_HAT_FIRST..=ABS_HAT_LAST).contains(&axis.0))
            .collect();
        axes.sort_by_key(|(axis, _)| axis.0);
        axes.dedup_by_key(|(axis, _)| axis.0);

        let mut keys: Vec<u16> = keys
            .into_iter()
            .map(|key| key.code())
            .filter(|&code| code >= BTN_FIRST)
            .collect();
        keys.sort_unstable();
        keys.dedup();

        Self {
            axes: axes
                .into_iter()
                .enumerate()
                .map(|(i, (axis, range))| (axis.0, (i as u16, range)))
                .collect(),
            buttons: keys
                .into_iter()
                .enumerate()
                .map(|(i, code)| (code, i as u16))
                .collect(),
        }
    }

    /// Reads supported axes, their ranges and buttons from an open device.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the device's axis info cannot be queried.
    pub fn from_device(device: &Device) -> Result<Self> {
        let abs_state = device
            .get_abs_state()
            .map_err(|e| TelloPadError::Controller(format!("Failed to read axis info: {}", e)))?;

        let axes: Vec<(AbsoluteAxisType, AxisRange)> = device
            .supported_absolute_axes()
            .map(|set| {
                set.iter()
                    .filter_map(|axis| {
                        abs_state.get(axis.0 as usize).map(|info| {
                            (axis, AxisRange { min: info.minimum, max: info.maximum })
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let keys: Vec<Key> = device
            .supported_keys()
            .map(|set| set.iter().collect())
            .unwrap_or_default();

        Ok(Self::new(axes, keys))
    }

    /// Number of indexed axes.
    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Number of indexed buttons.
    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// Converts an evdev event into a [`PadEvent`].
    ///
    /// Returns `None` for sync events, hats, autorepeat and codes the device
    /// did not advertise.
    #[must_use]
    pub fn translate(&self, event: &InputEvent) -> Option<PadEvent> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                let (index, range) = self.axes.get(&axis.0)?;
                Some(PadEvent::AxisMotion {
                    index: *index,
                    value: range.normalize(event.value()),
                })
            }
            InputEventKind::Key(key) => {
                let index = *self.buttons.get(&key.code())?;
                match event.value() {
                    0 => Some(PadEvent::ButtonUp { index }),
                    KEY_REPEAT => None,
                    _ => Some(PadEvent::ButtonDown { index }),
                }
            }
            _ => None,
        }
    }
}

/// An opened gamepad, ready to be turned into an event stream.
pub struct Gamepad {
    device: Device,
    device_path: String,
    index: IndexMap,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Detect and open the first gamepad under `/dev/input`.
    ///
    /// A device counts as a gamepad if it has an `ABS_X` axis and either a
    /// `BTN_SOUTH` or `BTN_TRIGGER` button.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: no gamepad present
    /// - `Controller`: `/dev/input` missing or unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tello_pad::controller::gamepad::Gamepad;
    ///
    /// let pad = Gamepad::open()?;
    /// println!("Using gamepad at: {}", pad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(TelloPadError::Controller(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| TelloPadError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TelloPadError::Controller(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic choice when several pads are plugged in
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if Self::looks_like_gamepad(&device) {
                        return Self::from_device(device, path.to_string_lossy().to_string());
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TelloPadError::ControllerNotFound)
    }

    /// Open a specific event device.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the device cannot be opened or queried.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::open(path).map_err(|e| {
            TelloPadError::Controller(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_device(device, path.to_string_lossy().to_string())
    }

    fn from_device(device: Device, device_path: String) -> Result<Self> {
        let index = IndexMap::from_device(&device)?;
        info!(
            "Using gamepad '{}' at {} ({} axes, {} buttons)",
            device.name().unwrap_or("unnamed"),
            device_path,
            index.axis_count(),
            index.button_count()
        );
        Ok(Self { device, device_path, index })
    }

    fn looks_like_gamepad(device: &Device) -> bool {
        let has_stick = device
            .supported_absolute_axes()
            .map(|axes| axes.contains(AbsoluteAxisType::ABS_X))
            .unwrap_or(false);
        let has_buttons = device
            .supported_keys()
            .map(|keys| keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER))
            .unwrap_or(false);
        has_stick && has_buttons
    }

    /// Device path this gamepad was opened from.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name, if the driver provides one.
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Index assignment for this device.
    pub fn index_map(&self) -> &IndexMap {
        &self.index
    }

    /// Converts the gamepad into an async event stream.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the device cannot be switched to non-blocking mode.
    pub fn into_stream(self) -> Result<PadStream> {
        let stream = self
            .device
            .into_event_stream()
            .map_err(|e| TelloPadError::Controller(format!("Failed to start event stream: {}", e)))?;
        Ok(PadStream { stream, index: self.index })
    }
}

/// Async source of [`PadEvent`]s from one gamepad.
pub struct PadStream {
    stream: EventStream,
    index: IndexMap,
}

impl PadStream {
    /// Waits for the next event that maps to a [`PadEvent`].
    ///
    /// # Errors
    ///
    /// Returns `Controller` when the device fails, typically because it was
    /// unplugged.
    pub async fn next_event(&mut self) -> Result<PadEvent> {
        loop {
            let event = self
                .stream
                .next_event()
                .await
                .map_err(|e| TelloPadError::Controller(format!("Failed to fetch events: {}", e)))?;

            if let Some(pad_event) = self.index.translate(&event) {
                return Ok(pad_event);
            }
        }
    }
}
