//! # Standard Layout Module
//!
//! This module translates raw evdev key and absolute-axis state into the
//! standard gamepad ordering used everywhere else in the crate.
//!
//! ## Button Indices
//!
//! | Index | Source | PlayStation name |
//! |-------|--------|------------------|
//! | 0 | BTN_SOUTH | Cross (×) |
//! | 1 | BTN_EAST | Circle (○) |
//! | 2 | BTN_WEST | Square (□) |
//! | 3 | BTN_NORTH | Triangle (△) |
//! | 4 | BTN_TL | L1 |
//! | 5 | BTN_TR | R1 |
//! | 6 | ABS_Z, else BTN_TL2 | L2 (analog) |
//! | 7 | ABS_RZ, else BTN_TR2 | R2 (analog) |
//! | 8 | BTN_SELECT | Share / Create |
//! | 9 | BTN_START | Options |
//! | 10 | BTN_THUMBL | L3 |
//! | 11 | BTN_THUMBR | R3 |
//! | 12 | ABS_HAT0Y < 0 or BTN_DPAD_UP | D-Pad up |
//! | 13 | ABS_HAT0Y > 0 or BTN_DPAD_DOWN | D-Pad down |
//! | 14 | ABS_HAT0X < 0 or BTN_DPAD_LEFT | D-Pad left |
//! | 15 | ABS_HAT0X > 0 or BTN_DPAD_RIGHT | D-Pad right |
//! | 16 | BTN_MODE | PS |
//!
//! ## Axis Indices
//!
//! | Index | Source | Meaning |
//! |-------|--------|---------|
//! | 0 | ABS_X | Left stick X (-1 = left) |
//! | 1 | ABS_Y | Left stick Y (-1 = up) |
//! | 2 | ABS_RX | Right stick X |
//! | 3 | ABS_RY | Right stick Y |
//!
//! Axis ranges come from each axis' absinfo, so 8-bit DualSense sticks and
//! 16-bit Xbox sticks normalise the same way.

use evdev::{AbsoluteAxisType, Key};

use super::DeviceSnapshot;

/// Number of buttons in the standard layout.
pub const BUTTON_COUNT: usize = 17;

/// Number of axes in the standard layout.
pub const AXIS_COUNT: usize = 4;

/// Index of the left analog trigger.
pub const LEFT_TRIGGER: usize = 6;

/// Index of the right analog trigger.
pub const RIGHT_TRIGGER: usize = 7;

/// Digital buttons read straight from the key state.
const DIGITAL_BUTTONS: [(usize, Key); 11] = [
    (0, Key::BTN_SOUTH),
    (1, Key::BTN_EAST),
    (2, Key::BTN_WEST),
    (3, Key::BTN_NORTH),
    (4, Key::BTN_TL),
    (5, Key::BTN_TR),
    (8, Key::BTN_SELECT),
    (9, Key::BTN_START),
    (10, Key::BTN_THUMBL),
    (11, Key::BTN_THUMBR),
    (16, Key::BTN_MODE),
];

/// Analog triggers with their digital fallback.
const TRIGGERS: [(usize, AbsoluteAxisType, Key); 2] = [
    (LEFT_TRIGGER, AbsoluteAxisType::ABS_Z, Key::BTN_TL2),
    (RIGHT_TRIGGER, AbsoluteAxisType::ABS_RZ, Key::BTN_TR2),
];

/// D-Pad slots: (index, hat axis, hat direction, key fallback).
const DPAD: [(usize, AbsoluteAxisType, i32, Key); 4] = [
    (12, AbsoluteAxisType::ABS_HAT0Y, -1, Key::BTN_DPAD_UP),
    (13, AbsoluteAxisType::ABS_HAT0Y, 1, Key::BTN_DPAD_DOWN),
    (14, AbsoluteAxisType::ABS_HAT0X, -1, Key::BTN_DPAD_LEFT),
    (15, AbsoluteAxisType::ABS_HAT0X, 1, Key::BTN_DPAD_RIGHT),
];

/// Stick axes in standard order.
const STICK_AXES: [AbsoluteAxisType; AXIS_COUNT] = [
    AbsoluteAxisType::ABS_X,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_RX,
    AbsoluteAxisType::ABS_RY,
];

/// Raw reading of one absolute axis together with its declared range.
///
/// # Examples
///
/// ```
/// use padscope::device::layout::AxisReading;
///
/// let stick = AxisReading::new(255, 0, 255);
/// assert_eq!(stick.bipolar(), 1.0);
///
/// let trigger = AxisReading::new(0, 0, 255);
/// assert_eq!(trigger.unipolar(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisReading {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
}

impl AxisReading {
    #[must_use]
    pub fn new(value: i32, minimum: i32, maximum: i32) -> Self {
        Self {
            value,
            minimum,
            maximum,
        }
    }

    /// Position within the range as 0.0..=1.0. Degenerate ranges read as 0.0.
    #[must_use]
    pub fn unipolar(&self) -> f32 {
        if self.maximum <= self.minimum {
            return 0.0;
        }
        let span = (self.maximum as f64) - (self.minimum as f64);
        let offset = (self.value as f64) - (self.minimum as f64);
        (offset / span).clamp(0.0, 1.0) as f32
    }

    /// Position within the range as -1.0..=1.0. Degenerate ranges read as 0.0.
    #[must_use]
    pub fn bipolar(&self) -> f32 {
        if self.maximum <= self.minimum {
            return 0.0;
        }
        (self.unipolar() * 2.0 - 1.0).clamp(-1.0, 1.0)
    }
}

/// Builds a standard-layout [`DeviceSnapshot`] from raw key and axis state.
///
/// `pressed` reports whether a key is currently down. `axis` returns the
/// reading of an absolute axis, or `None` if the device lacks that axis.
///
/// # Examples
///
/// ```
/// use evdev::{AbsoluteAxisType, Key};
/// use padscope::device::layout::{snapshot, AxisReading};
///
/// let state = snapshot(
///     "Wireless Controller",
///     |key| key == Key::BTN_SOUTH,
///     |axis| (axis == AbsoluteAxisType::ABS_X).then(|| AxisReading::new(255, 0, 255)),
/// );
/// assert_eq!(state.buttons[0], 1.0);
/// assert_eq!(state.axes[0], 1.0);
/// assert_eq!(state.axes[1], 0.0);
/// ```
pub fn snapshot<P, A>(id: &str, pressed: P, axis: A) -> DeviceSnapshot
where
    P: Fn(Key) -> bool,
    A: Fn(AbsoluteAxisType) -> Option<AxisReading>,
{
    let mut buttons = vec![0.0_f32; BUTTON_COUNT];

    for (index, key) in DIGITAL_BUTTONS {
        buttons[index] = digital(pressed(key));
    }

    for (index, abs, key) in TRIGGERS {
        buttons[index] = match axis(abs) {
            Some(reading) => reading.unipolar(),
            None => digital(pressed(key)),
        };
    }

    for (index, hat, direction, key) in DPAD {
        let from_hat = axis(hat).is_some_and(|reading| reading.value.signum() == direction);
        buttons[index] = digital(from_hat || pressed(key));
    }

    let axes = STICK_AXES
        .iter()
        .map(|&abs| axis(abs).map_or(0.0, |reading| reading.bipolar()))
        .collect();

    DeviceSnapshot::new(id, buttons, axes)
}

fn digital(pressed: bool) -> f32 {
    if pressed {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_keys(_: Key) -> bool {
        false
    }

    fn no_axes(_: AbsoluteAxisType) -> Option<AxisReading> {
        None
    }

    // ==================== AxisReading Tests ====================

    #[test]
    fn test_unipolar_endpoints() {
        assert_eq!(AxisReading::new(0, 0, 255).unipolar(), 0.0);
        assert_eq!(AxisReading::new(255, 0, 255).unipolar(), 1.0);
    }

    #[test]
    fn test_bipolar_endpoints_and_center() {
        assert_eq!(AxisReading::new(-32768, -32768, 32767).bipolar(), -1.0);
        assert_eq!(AxisReading::new(32767, -32768, 32767).bipolar(), 1.0);
        assert!(AxisReading::new(128, 0, 255).bipolar().abs() < 0.01);
    }

    #[test]
    fn test_out_of_range_readings_clamp() {
        assert_eq!(AxisReading::new(300, 0, 255).unipolar(), 1.0);
        assert_eq!(AxisReading::new(-5, 0, 255).bipolar(), -1.0);
    }

    #[test]
    fn test_degenerate_range_reads_zero() {
        assert_eq!(AxisReading::new(10, 5, 5).unipolar(), 0.0);
        assert_eq!(AxisReading::new(10, 7, 3).bipolar(), 0.0);
    }

    // ==================== Snapshot Tests ====================

    #[test]
    fn test_idle_snapshot_shape() {
        let state = snapshot("pad", no_keys, no_axes);
        assert_eq!(state.buttons.len(), BUTTON_COUNT);
        assert_eq!(state.axes.len(), AXIS_COUNT);
        assert!(state.buttons.iter().all(|&v| v == 0.0));
        assert!(state.axes.iter().all(|&v| v == 0.0));
        assert!(state.connected);
        assert_eq!(state.id, "pad");
    }

    #[test]
    fn test_face_buttons_order() {
        let state = snapshot("pad", |k| k == Key::BTN_WEST, no_axes);
        assert_eq!(state.buttons[2], 1.0, "BTN_WEST is square at index 2");
        assert_eq!(state.buttons.iter().filter(|&&v| v > 0.0).count(), 1);

        let state = snapshot("pad", |k| k == Key::BTN_NORTH, no_axes);
        assert_eq!(state.buttons[3], 1.0, "BTN_NORTH is triangle at index 3");
    }

    #[test]
    fn test_system_buttons() {
        let state = snapshot(
            "pad",
            |k| matches!(k, Key::BTN_SELECT | Key::BTN_START | Key::BTN_MODE),
            no_axes,
        );
        assert_eq!(state.buttons[8], 1.0);
        assert_eq!(state.buttons[9], 1.0);
        assert_eq!(state.buttons[16], 1.0);
    }

    #[test]
    fn test_analog_trigger_preferred_over_digital() {
        let state = snapshot(
            "pad",
            |k| k == Key::BTN_TL2,
            |a| (a == AbsoluteAxisType::ABS_Z).then(|| AxisReading::new(51, 0, 255)),
        );
        assert!((state.buttons[LEFT_TRIGGER] - 0.2).abs() < 0.001);
    }

    #[test]
    fn test_digital_trigger_fallback() {
        let state = snapshot("pad", |k| k == Key::BTN_TR2, no_axes);
        assert_eq!(state.buttons[RIGHT_TRIGGER], 1.0);
        assert_eq!(state.buttons[LEFT_TRIGGER], 0.0);
    }

    #[test]
    fn test_dpad_from_hat() {
        let state = snapshot("pad", no_keys, |a| match a {
            AbsoluteAxisType::ABS_HAT0X => Some(AxisReading::new(1, -1, 1)),
            AbsoluteAxisType::ABS_HAT0Y => Some(AxisReading::new(-1, -1, 1)),
            _ => None,
        });
        assert_eq!(state.buttons[12], 1.0, "up");
        assert_eq!(state.buttons[13], 0.0, "down");
        assert_eq!(state.buttons[14], 0.0, "left");
        assert_eq!(state.buttons[15], 1.0, "right");
    }

    #[test]
    fn test_dpad_from_keys() {
        let state = snapshot(
            "pad",
            |k| matches!(k, Key::BTN_DPAD_DOWN | Key::BTN_DPAD_LEFT),
            no_axes,
        );
        assert_eq!(state.buttons[13], 1.0);
        assert_eq!(state.buttons[14], 1.0);
        assert_eq!(state.buttons[12], 0.0);
    }

    #[test]
    fn test_stick_axes_order() {
        let state = snapshot("pad", no_keys, |a| match a {
            AbsoluteAxisType::ABS_X => Some(AxisReading::new(0, 0, 255)),
            AbsoluteAxisType::ABS_RY => Some(AxisReading::new(255, 0, 255)),
            _ => None,
        });
        assert_eq!(state.axes, vec![-1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_trigger_axes_do_not_leak_into_sticks() {
        let state = snapshot("pad", no_keys, |a| {
            (a == AbsoluteAxisType::ABS_RZ).then(|| AxisReading::new(255, 0, 255))
        });
        assert_eq!(state.axes, vec![0.0; AXIS_COUNT]);
        assert_eq!(state.buttons[RIGHT_TRIGGER], 1.0);
    }

    #[test]
    fn test_constants() {
        assert_eq!(BUTTON_COUNT, 17);
        assert_eq!(AXIS_COUNT, 4);
        assert_eq!(LEFT_TRIGGER, 6);
        assert_eq!(RIGHT_TRIGGER, 7);
    }
}
