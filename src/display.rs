//! # 2D Display Surfaces
//!
//! Pure mappings from controller values to what the 2D indicators show:
//!
//! - [`StickSurface`]: stick dots offset by `axis * scale`
//! - [`TriggerSurface`]: trigger bars filled to the trigger value
//! - [`StatusSurface`]: exactly one of "connected (id)" or "connect a controller"
//!
//! None of these depend on the 3D model, so they keep working while the asset
//! is loading or after it failed to load.

use tracing::debug;

use crate::device::poller::{ConnectionEvent, InputPoller};
use crate::device::{DeviceSource, UNKNOWN_DEVICE_ID};

/// Default dot offset at full stick deflection.
pub const DEFAULT_STICK_SCALE: f32 = 25.0;

/// Screen offset of one stick dot. Positive `y` points down, as the axes do.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickOffset {
    pub x: f32,
    pub y: f32,
}

/// Offsets of both stick dots.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickOffsets {
    pub left: StickOffset,
    pub right: StickOffset,
}

/// Maps the four stick axes to dot offsets.
///
/// # Examples
///
/// ```
/// use padscope::display::StickSurface;
///
/// let surface = StickSurface::new(25.0);
/// let offsets = surface.offsets(&[0.5, -0.5, 0.0, 0.0]);
/// assert_eq!((offsets.left.x, offsets.left.y), (12.5, -12.5));
/// assert_eq!((offsets.right.x, offsets.right.y), (0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickSurface {
    scale: f32,
}

impl Default for StickSurface {
    fn default() -> Self {
        Self::new(DEFAULT_STICK_SCALE)
    }
}

impl StickSurface {
    #[must_use]
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    /// Offset at full deflection.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Left stick from axes 0/1, right stick from axes 2/3.
    ///
    /// Missing axes read as centred; values outside -1..=1 are clamped.
    #[must_use]
    pub fn offsets(&self, axes: &[f32]) -> StickOffsets {
        let offset = |x: usize, y: usize| StickOffset {
            x: self.offset(axes.get(x).copied().unwrap_or(0.0)),
            y: self.offset(axes.get(y).copied().unwrap_or(0.0)),
        };
        StickOffsets {
            left: offset(0, 1),
            right: offset(2, 3),
        }
    }

    /// Offset for a single axis value.
    #[must_use]
    pub fn offset(&self, axis: f32) -> f32 {
        if axis.is_nan() {
            return 0.0;
        }
        axis.clamp(-1.0, 1.0) * self.scale
    }
}

/// Fill levels of both trigger bars, each in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerFills {
    pub left: f32,
    pub right: f32,
}

/// Maps trigger button values to bar fills.
///
/// # Examples
///
/// ```
/// use padscope::display::TriggerSurface;
///
/// let surface = TriggerSurface::new([6, 7]);
/// let fills = surface.fills(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.25, 1.7]);
/// assert_eq!(fills.left, 0.25);
/// assert_eq!(fills.right, 1.0); // Clamped
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerSurface {
    indices: [usize; 2],
}

impl TriggerSurface {
    /// `indices` are the (left, right) trigger button slots.
    #[must_use]
    pub fn new(indices: [usize; 2]) -> Self {
        Self { indices }
    }

    /// Reads both trigger slots out of a full button array.
    #[must_use]
    pub fn fills(&self, buttons: &[f32]) -> TriggerFills {
        let value = |index: usize| Self::fill(buttons.get(index).copied().unwrap_or(0.0));
        TriggerFills {
            left: value(self.indices[0]),
            right: value(self.indices[1]),
        }
    }

    /// Clamps a trigger value to a fill fraction. NaN reads as empty.
    #[must_use]
    pub fn fill(value: f32) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, 1.0)
    }
}

/// What the status indicator shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusPresentation {
    Connected { id: String },
    #[default]
    Disconnected,
}

impl StatusPresentation {
    /// Builds the presentation from a connection flag and a device id.
    #[must_use]
    pub fn from_device(connected: bool, id: &str) -> Self {
        if !connected {
            return Self::Disconnected;
        }
        let id = if id.trim().is_empty() { UNKNOWN_DEVICE_ID } else { id };
        Self::Connected { id: id.to_string() }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Text line for the indicator.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Connected { id } => format!("✅ {} connected", id),
            Self::Disconnected => "❌ Connect your controller (USB or Bluetooth)".to_string(),
        }
    }

    /// Style class for the indicator.
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "status connected",
            Self::Disconnected => "status disconnected",
        }
    }
}

/// Connection status indicator.
///
/// Starts out disconnected and only changes when told about a connection
/// change, so it is cheap to keep on screen every frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSurface {
    presentation: StatusPresentation,
}

impl StatusSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presentation(&self) -> &StatusPresentation {
        &self.presentation
    }

    /// Sets the presentation from a connection flag and a device id.
    pub fn update(&mut self, connected: bool, id: &str) {
        let next = StatusPresentation::from_device(connected, id);
        if next != self.presentation {
            debug!("Status: {}", next.text());
            self.presentation = next;
        }
    }

    /// Applies one connection notification.
    pub fn apply(&mut self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Connected { id } => self.update(true, id),
            ConnectionEvent::Disconnected => self.update(false, ""),
        }
    }

    /// Re-reads the current device from the poller.
    pub fn refresh<S: DeviceSource>(&mut self, poller: &InputPoller<S>) {
        match poller.device() {
            Some(device) => self.update(device.connected, &device.id),
            None => self.update(false, ""),
        }
    }
}
