//! # Input Poller
//!
//! The single logical access point to the controller. `main` builds exactly one
//! [`InputPoller`] and hands out `Arc` clones; every holder sees the same
//! instance and the same connection history.
//!
//! Reads never fail. With no device connected every value is `0.0` and
//! [`InputPoller::device`] is `None`.

use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::{DeviceSnapshot, DeviceSource};

/// Capacity of the connection notification channel.
const CONNECTION_EVENT_CAPACITY: usize = 16;

/// A change in which controller (if any) occupies the first device slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A controller appeared, or a different one replaced the previous one.
    Connected { id: String },
    /// The last controller went away.
    Disconnected,
}

/// Polls a [`DeviceSource`] and tracks the first connected controller.
pub struct InputPoller<S> {
    source: S,
    last_known: Mutex<Option<DeviceSnapshot>>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl<S> std::fmt::Debug for InputPoller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputPoller")
            .field("observers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl<S: DeviceSource> InputPoller<S> {
    /// Wraps a device source. No device is queried until the first read.
    pub fn new(source: S) -> Self {
        let (events, _) = broadcast::channel(CONNECTION_EVENT_CAPACITY);
        Self {
            source,
            last_known: Mutex::new(None),
            events,
        }
    }

    fn last_known(&self) -> MutexGuard<'_, Option<DeviceSnapshot>> {
        self.last_known
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Re-queries the source and returns the first connected controller.
    ///
    /// Empty slots are skipped, so a controller in slot 1 is found even when
    /// slot 0 is empty. Broadcasts a [`ConnectionEvent`] if the result differs
    /// from the previous poll.
    pub fn device(&self) -> Option<DeviceSnapshot> {
        let current = self
            .source
            .connected_devices()
            .into_iter()
            .flatten()
            .find(|device| device.connected);

        let mut last = self.last_known();
        if let Some(event) = transition(last.as_ref(), current.as_ref()) {
            match &event {
                ConnectionEvent::Connected { id } => info!("Controller connected: {}", id),
                ConnectionEvent::Disconnected => info!("Controller disconnected"),
            }
            // No observers is fine; the event is simply dropped.
            let _ = self.events.send(event);
        }
        *last = current.clone();

        current
    }

    /// Value of button `index`, or `0.0` without a device or out of range.
    pub fn button_value(&self, index: usize) -> f32 {
        self.device().map_or(0.0, |device| device.button(index))
    }

    /// Value of axis `index`, or `0.0` without a device or out of range.
    pub fn axis_value(&self, index: usize) -> f32 {
        self.device().map_or(0.0, |device| device.axis(index))
    }

    /// The controller seen by the most recent poll, without polling again.
    pub fn last_device(&self) -> Option<DeviceSnapshot> {
        self.last_known().clone()
    }

    /// Starts observing connection transitions from now on.
    pub fn subscribe(&self) -> ConnectionObserver {
        ConnectionObserver {
            rx: Some(self.events.subscribe()),
        }
    }
}

fn transition(
    previous: Option<&DeviceSnapshot>,
    current: Option<&DeviceSnapshot>,
) -> Option<ConnectionEvent> {
    match (previous, current) {
        (None, Some(now)) => Some(ConnectionEvent::Connected { id: now.id.clone() }),
        (Some(before), Some(now)) if before.id != now.id => {
            Some(ConnectionEvent::Connected { id: now.id.clone() })
        }
        (Some(_), None) => Some(ConnectionEvent::Disconnected),
        _ => None,
    }
}

/// Receiving end of the poller's connection notifications.
///
/// Detaching is idempotent, and a default observer starts out detached.
#[derive(Debug, Default)]
pub struct ConnectionObserver {
    rx: Option<broadcast::Receiver<ConnectionEvent>>,
}

impl ConnectionObserver {
    /// Whether this observer still receives events.
    pub fn is_attached(&self) -> bool {
        self.rx.is_some()
    }

    /// Takes every event delivered since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<ConnectionEvent> {
        let mut drained = Vec::new();
        let Some(rx) = self.rx.as_mut() else {
            return drained;
        };

        loop {
            match rx.try_recv() {
                Ok(event) => drained.push(event),
                Err(broadcast::error::TryRecvError::Empty) => break,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Missed {} connection events", skipped);
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    self.rx = None;
                    break;
                }
            }
        }
        drained
    }

    /// Stops observing. Safe to call any number of times.
    pub fn detach(&mut self) {
        self.rx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockDeviceSource;
    use std::sync::Arc;

    fn pad(id: &str) -> DeviceSnapshot {
        DeviceSnapshot::new(id, vec![0.0, 0.75, 0.0], vec![0.25, -0.5])
    }

    fn source_returning(slots: Vec<Option<DeviceSnapshot>>) -> MockDeviceSource {
        let mut mock = MockDeviceSource::new();
        mock.expect_connected_devices()
            .returning(move || slots.clone());
        mock
    }

    /// Source that replays `script` one poll at a time, repeating the last entry.
    fn scripted(script: Vec<Vec<Option<DeviceSnapshot>>>) -> MockDeviceSource {
        let mut mock = MockDeviceSource::new();
        let mut step = 0;
        mock.expect_connected_devices().returning(move || {
            let slots = script[step.min(script.len() - 1)].clone();
            step += 1;
            slots
        });
        mock
    }

    #[test]
    fn test_no_device() {
        let poller = InputPoller::new(source_returning(vec![]));
        assert!(poller.device().is_none());
        assert!(poller.last_device().is_none());
    }

    #[test]
    fn test_absent_device_reads_zero() {
        let poller = InputPoller::new(source_returning(vec![None, None]));
        for index in [0, 1, 6, 7, 100, usize::MAX] {
            assert_eq!(poller.button_value(index), 0.0);
            assert_eq!(poller.axis_value(index), 0.0);
        }
    }

    #[test]
    fn test_skips_empty_first_slot() {
        let poller = InputPoller::new(source_returning(vec![None, Some(pad("second"))]));
        assert_eq!(poller.device().unwrap().id, "second");
    }

    #[test]
    fn test_skips_disconnected_snapshot() {
        let mut stale = pad("stale");
        stale.connected = false;
        let poller = InputPoller::new(source_returning(vec![Some(stale), Some(pad("live"))]));
        assert_eq!(poller.device().unwrap().id, "live");
    }

    #[test]
    fn test_button_and_axis_values() {
        let poller = InputPoller::new(source_returning(vec![Some(pad("pad"))]));
        assert_eq!(poller.button_value(1), 0.75);
        assert_eq!(poller.button_value(3), 0.0, "out of range button");
        assert_eq!(poller.axis_value(1), -0.5);
        assert_eq!(poller.axis_value(9), 0.0, "out of range axis");
    }

    #[test]
    fn test_requeries_every_call() {
        let mut mock = MockDeviceSource::new();
        mock.expect_connected_devices()
            .times(3)
            .returning(|| vec![Some(pad("pad"))]);
        let poller = InputPoller::new(mock);

        poller.device();
        poller.button_value(0);
        poller.axis_value(0);
    }

    #[test]
    fn test_last_device_tracks_latest_poll() {
        let poller = InputPoller::new(scripted(vec![vec![Some(pad("a"))], vec![]]));
        poller.device();
        assert_eq!(poller.last_device().unwrap().id, "a");
        poller.device();
        assert!(poller.last_device().is_none());
    }

    #[test]
    fn test_connection_events_fire_once_per_transition() {
        let poller = InputPoller::new(scripted(vec![
            vec![],
            vec![Some(pad("Wireless Controller"))],
            vec![Some(pad("Wireless Controller"))],
            vec![None],
            vec![None],
        ]));
        let mut observer = poller.subscribe();

        for _ in 0..5 {
            poller.device();
        }

        assert_eq!(
            observer.drain(),
            vec![
                ConnectionEvent::Connected { id: "Wireless Controller".to_string() },
                ConnectionEvent::Disconnected,
            ]
        );
        assert!(observer.drain().is_empty());
    }

    #[test]
    fn test_controller_swap_reports_new_id() {
        let poller = InputPoller::new(scripted(vec![
            vec![Some(pad("first"))],
            vec![Some(pad("second"))],
        ]));
        let mut observer = poller.subscribe();
        poller.device();
        poller.device();

        assert_eq!(
            observer.drain(),
            vec![
                ConnectionEvent::Connected { id: "first".to_string() },
                ConnectionEvent::Connected { id: "second".to_string() },
            ]
        );
    }

    #[test]
    fn test_observer_detach_is_idempotent() {
        let poller = InputPoller::new(source_returning(vec![Some(pad("pad"))]));
        let mut observer = poller.subscribe();
        assert!(observer.is_attached());

        observer.detach();
        observer.detach();
        assert!(!observer.is_attached());

        poller.device();
        assert!(observer.drain().is_empty());
    }

    #[test]
    fn test_default_observer_is_detached() {
        let mut observer = ConnectionObserver::default();
        assert!(!observer.is_attached());
        assert!(observer.drain().is_empty());
        observer.detach();
    }

    #[test]
    fn test_observer_closes_when_poller_dropped() {
        let poller = InputPoller::new(source_returning(vec![]));
        let mut observer = poller.subscribe();
        drop(poller);

        assert!(observer.drain().is_empty());
        assert!(!observer.is_attached());
    }

    #[test]
    fn test_shared_handles_see_same_instance() {
        let poller = Arc::new(InputPoller::new(scripted(vec![
            vec![Some(pad("pad"))],
            vec![],
        ])));
        let other = Arc::clone(&poller);
        let mut observer = other.subscribe();

        poller.device();
        assert_eq!(other.last_device().unwrap().id, "pad");

        other.device();
        assert!(poller.last_device().is_none());
        assert_eq!(observer.drain().len(), 2);
        assert!(Arc::ptr_eq(&poller, &other));
    }
}
