//! # evdev Device Source
//!
//! Finds gamepads among the Linux `/dev/input/event*` nodes and reads their
//! state for the [`InputPoller`](super::poller::InputPoller).
//!
//! ## Controller Detection
//!
//! Any event device that advertises `BTN_SOUTH` is treated as a gamepad. This
//! covers DualShock 4, DualSense, Xbox and most generic pads. The device list is
//! rescanned at most once per `rescan_interval_ms` so newly plugged pads show up
//! without reopening every node on every frame.
//!
//! ## Reading State
//!
//! State is read with the `EVIOCGKEY` / `EVIOCGABS` ioctls rather than by
//! draining the event queue, so a read never blocks and always reflects the
//! current physical state. A failed read means the device is gone; its slot is
//! emptied and stays empty until a rescan reuses it.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::layout::{self, AxisReading};
use super::{DeviceSnapshot, DeviceSource, UNKNOWN_DEVICE_ID};
use crate::config::DeviceConfig;
use crate::error::{PadscopeError, Result};

/// An opened gamepad occupying a slot.
struct OpenPad {
    path: PathBuf,
    name: String,
    device: Device,
    axes: Vec<AbsoluteAxisType>,
}

#[derive(Default)]
struct SlotTable {
    slots: Vec<Option<OpenPad>>,
    last_scan: Option<Instant>,
}

impl SlotTable {
    fn holds(&self, path: &Path) -> bool {
        self.slots.iter().flatten().any(|pad| pad.path == path)
    }

    fn insert(&mut self, pad: OpenPad) -> usize {
        match self.slots.iter().position(Option::is_none) {
            Some(free) => {
                self.slots[free] = Some(pad);
                free
            }
            None => {
                self.slots.push(Some(pad));
                self.slots.len() - 1
            }
        }
    }
}

/// Gamepad source backed by Linux evdev.
pub struct EvdevSource {
    pinned_path: Option<PathBuf>,
    rescan_interval: Duration,
    table: Mutex<SlotTable>,
}

impl std::fmt::Debug for EvdevSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevSource")
            .field("pinned_path", &self.pinned_path)
            .field("rescan_interval", &self.rescan_interval)
            .finish_non_exhaustive()
    }
}

impl EvdevSource {
    /// Creates a source from the `[device]` configuration.
    ///
    /// No device is opened until the first poll.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padscope::config::DeviceConfig;
    /// use padscope::device::DeviceSource;
    /// use padscope::device::evdev_source::EvdevSource;
    ///
    /// let source = EvdevSource::new(&DeviceConfig::default());
    /// for (slot, device) in source.connected_devices().iter().enumerate() {
    ///     println!("slot {}: {:?}", slot, device.as_ref().map(|d| &d.id));
    /// }
    /// ```
    #[must_use]
    pub fn new(config: &DeviceConfig) -> Self {
        let pinned_path = (!config.device_path.is_empty()).then(|| PathBuf::from(&config.device_path));
        Self {
            pinned_path,
            rescan_interval: Duration::from_millis(config.rescan_interval_ms),
            table: Mutex::new(SlotTable::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotTable> {
        // A panic mid-poll leaves the table structurally valid.
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn rescan_due(&self, table: &SlotTable) -> bool {
        table
            .last_scan
            .map_or(true, |at| at.elapsed() >= self.rescan_interval)
    }

    /// Opens gamepads not yet held by any slot.
    fn rescan(&self, table: &mut SlotTable) {
        table.last_scan = Some(Instant::now());

        let mut candidates: Vec<(PathBuf, Device)> = match &self.pinned_path {
            Some(path) if table.holds(path) => Vec::new(),
            Some(path) => match Device::open(path) {
                Ok(device) => vec![(path.clone(), device)],
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            None => evdev::enumerate()
                .filter(|(path, _)| !table.holds(path))
                .collect(),
        };

        // Sort for deterministic slot assignment when several pads are present
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        for (path, device) in candidates {
            let id = device.input_id();
            debug!(
                "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                path.display(),
                id.vendor(),
                id.product()
            );

            if !is_gamepad(&device) {
                continue;
            }

            let name = device
                .name()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(UNKNOWN_DEVICE_ID)
                .to_string();
            let axes = device
                .supported_absolute_axes()
                .map(|set| set.iter().collect())
                .unwrap_or_default();

            let slot = table.insert(OpenPad {
                path: path.clone(),
                name: name.clone(),
                device,
                axes,
            });
            info!("Controller '{}' connected at {} (slot {})", name, path.display(), slot);
        }
    }
}

impl DeviceSource for EvdevSource {
    fn connected_devices(&self) -> Vec<Option<DeviceSnapshot>> {
        let mut table = self.lock();

        if self.rescan_due(&table) {
            self.rescan(&mut table);
        }

        table
            .slots
            .iter_mut()
            .map(|slot| {
                let pad = slot.as_ref()?;
                match read_pad(pad) {
                    Ok(snapshot) => Some(snapshot),
                    Err(e) => {
                        info!(
                            "Controller '{}' at {} disconnected ({})",
                            pad.name,
                            pad.path.display(),
                            e
                        );
                        *slot = None;
                        None
                    }
                }
            })
            .collect()
    }
}

fn is_gamepad(device: &Device) -> bool {
    device
        .supported_keys()
        .is_some_and(|keys| keys.contains(Key::BTN_SOUTH))
}

fn read_pad(pad: &OpenPad) -> Result<DeviceSnapshot> {
    let read_error = |e: std::io::Error| PadscopeError::Device(format!("read failed: {}", e));
    let keys = pad.device.get_key_state().map_err(read_error)?;
    let abs = pad.device.get_abs_state().map_err(read_error)?;

    Ok(layout::snapshot(
        &pad.name,
        |key| keys.contains(key),
        |axis| {
            if !pad.axes.contains(&axis) {
                return None;
            }
            abs.get(axis.0 as usize)
                .map(|info| AxisReading::new(info.value, info.minimum, info.maximum))
        },
    ))
}
