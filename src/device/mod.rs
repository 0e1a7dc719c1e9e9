//! # Device Module
//!
//! Game controller input, from the platform device list to the values the
//! frame loop consumes.
//!
//! This module handles:
//! - The [`DeviceSnapshot`] produced by every poll
//! - The [`DeviceSource`] capability over the platform's device slots
//! - Translating evdev state into the standard gamepad layout ([`layout`])
//! - Detecting and reading gamepads through evdev ([`evdev_source`])
//! - The shared [`poller::InputPoller`] and its connection notifications

pub mod evdev_source;
pub mod layout;
pub mod poller;

/// Id shown for a controller that reports no usable name.
pub const UNKNOWN_DEVICE_ID: &str = "Unknown Controller";

/// One poll's worth of a controller's state.
///
/// Snapshots are never mutated; every poll produces a new one.
///
/// # Examples
///
/// ```
/// use padscope::device::DeviceSnapshot;
///
/// let snapshot = DeviceSnapshot::new("Wireless Controller", vec![0.0, 1.0], vec![0.5]);
/// assert_eq!(snapshot.button(1), 1.0);
/// assert_eq!(snapshot.button(7), 0.0);  // Out of range reads as released
/// assert_eq!(snapshot.axis(0), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    /// Human-readable controller name reported by the platform.
    pub id: String,
    pub connected: bool,
    /// Button values in standard layout order, each in 0.0..=1.0.
    pub buttons: Vec<f32>,
    /// Axis values in standard layout order, each in -1.0..=1.0.
    pub axes: Vec<f32>,
}

impl DeviceSnapshot {
    /// Creates a connected snapshot.
    #[must_use]
    pub fn new(id: impl Into<String>, buttons: Vec<f32>, axes: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            connected: true,
            buttons,
            axes,
        }
    }

    /// Button value, 0.0 when the index is out of range.
    #[must_use]
    pub fn button(&self, index: usize) -> f32 {
        self.buttons.get(index).copied().unwrap_or(0.0)
    }

    /// Axis value, 0.0 when the index is out of range.
    #[must_use]
    pub fn axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }
}

/// Platform capability listing connected input devices.
///
/// The list is slot-indexed: any slot may be empty, including slot 0 while a
/// later slot is populated.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceSource: Send + Sync {
    /// Current device slots. Must not block.
    fn connected_devices(&self) -> Vec<Option<DeviceSnapshot>>;
}
