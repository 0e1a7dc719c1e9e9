//! # Frame Sync Loop
//!
//! Drives one frame at a time: pick up the model once it has loaded, poll the
//! controller, paint the bound nodes, update the 2D surfaces and redraw.
//!
//! ## Frame Order
//!
//! 1. Install the model and capture bindings once the asset load completes
//! 2. Apply pending connection notifications to the status surface
//! 3. Poll the controller; highlight pressed buttons and move the sticks and
//!    triggers, or release everything when no controller is present
//! 4. Redraw
//!
//! [`FrameLoop::start`] runs [`FrameSync::tick`] on a tokio interval at the
//! configured refresh rate. The returned [`FrameLoopHandle`] is the only way to
//! cancel it.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::binder::ButtonBinder;
use crate::config::Config;
use crate::device::poller::{ConnectionObserver, InputPoller};
use crate::device::DeviceSource;
use crate::display::{
    StatusPresentation, StatusSurface, StickOffsets, StickSurface, TriggerFills, TriggerSurface,
};
use crate::scene::asset::{AssetLoad, AssetStatus};
use crate::scene::Renderer;

/// Progress of the model asset as seen by the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetState {
    #[default]
    Loading,
    Ready,
    /// Load failed; the loop keeps running without highlighting.
    Failed,
}

/// Everything a renderer needs to draw one frame besides the scene itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameView {
    pub status: StatusPresentation,
    pub sticks: StickOffsets,
    pub triggers: TriggerFills,
    /// Stick offset at full deflection.
    pub stick_scale: f32,
    pub buttons: Vec<f32>,
    pub axes: Vec<f32>,
    pub asset: AssetState,
    pub device_id: Option<String>,
}

/// Whether highlighting is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Model not installed yet, or the loop was never started.
    Idle,
    Running,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The renderer asked to close.
    Exit,
}

/// Per-frame driver tying the poller, binder, surfaces and renderer together.
pub struct FrameSync<S, R> {
    poller: Arc<InputPoller<S>>,
    binder: ButtonBinder,
    renderer: R,
    sticks: StickSurface,
    triggers: TriggerSurface,
    status: StatusSurface,
    asset: AssetLoad,
    observer: ConnectionObserver,
    started: bool,
    view: FrameView,
}

impl<S, R> std::fmt::Debug for FrameSync<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSync")
            .field("asset", &self.view.asset)
            .field("status", self.status.presentation())
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl<S: DeviceSource, R: Renderer> FrameSync<S, R> {
    /// Creates a driver. Trigger bars follow the binder's trigger slots.
    pub fn new(
        poller: Arc<InputPoller<S>>,
        binder: ButtonBinder,
        renderer: R,
        sticks: StickSurface,
        asset: AssetLoad,
    ) -> Self {
        let observer = poller.subscribe();
        let triggers = TriggerSurface::new(binder.policy().trigger_indices());
        Self {
            poller,
            binder,
            renderer,
            sticks,
            triggers,
            status: StatusSurface::new(),
            asset,
            observer,
            started: false,
            view: FrameView {
                stick_scale: sticks.scale(),
                ..FrameView::default()
            },
        }
    }

    /// Creates a driver from the `[binding]`, `[thresholds]` and `[display]`
    /// sections.
    pub fn from_config(
        config: &Config,
        poller: Arc<InputPoller<S>>,
        renderer: R,
        asset: AssetLoad,
    ) -> Self {
        Self::new(
            poller,
            ButtonBinder::from_config(config),
            renderer,
            StickSurface::new(config.display.stick_scale),
            asset,
        )
    }

    /// Runs one frame.
    pub fn tick(&mut self) -> TickOutcome {
        self.poll_asset();
        self.sync_status();

        match self.poller.device() {
            Some(device) => {
                self.binder.update(&device.buttons, &mut self.renderer);
                self.view.sticks = self.sticks.offsets(&device.axes);
                self.view.triggers = self.triggers.fills(&device.buttons);
                self.view.buttons = device.buttons;
                self.view.axes = device.axes;
                self.view.device_id = Some(device.id);
            }
            None => {
                self.binder.release_all(&mut self.renderer);
                self.view.sticks = StickOffsets::default();
                self.view.triggers = TriggerFills::default();
                self.view.buttons.clear();
                self.view.axes.clear();
                self.view.device_id = None;
            }
        }

        // Transitions raised by this poll land in the same frame
        self.sync_status();

        if let Err(e) = self.renderer.redraw(&self.view) {
            warn!("Redraw failed: {}", e);
        }

        if self.renderer.close_requested() {
            TickOutcome::Exit
        } else {
            TickOutcome::Continue
        }
    }

    fn poll_asset(&mut self) {
        match self.asset.poll() {
            AssetStatus::Pending | AssetStatus::Consumed => {}
            AssetStatus::Complete(Ok(scene)) => {
                self.renderer.install_scene(scene);
                let bound = self.binder.capture(&self.renderer);
                debug!("Model ready with {} bound targets", bound);
                self.view.asset = AssetState::Ready;
            }
            AssetStatus::Complete(Err(e)) => {
                error!(
                    "Failed to load model from {}: {} (continuing without highlighting)",
                    self.asset.path().display(),
                    e
                );
                self.view.asset = AssetState::Failed;
            }
        }
    }

    fn sync_status(&mut self) {
        for event in self.observer.drain() {
            self.status.apply(&event);
        }
        self.view.status = self.status.presentation().clone();
    }

    /// Releases every highlight and stops observing connection changes.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.binder.release_all(&mut self.renderer);
        self.observer.detach();
    }

    fn mark_started(&mut self) {
        self.started = true;
    }

    pub fn state(&self) -> FrameState {
        if self.started && self.view.asset == AssetState::Ready {
            FrameState::Running
        } else {
            FrameState::Idle
        }
    }

    pub fn asset_state(&self) -> AssetState {
        self.view.asset
    }

    /// The view handed to the last redraw.
    pub fn view(&self) -> &FrameView {
        &self.view
    }

    pub fn status(&self) -> &StatusSurface {
        &self.status
    }

    pub fn binder(&self) -> &ButtonBinder {
        &self.binder
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

/// Schedules [`FrameSync::tick`] on a tokio interval.
#[derive(Debug)]
pub struct FrameLoop;

impl FrameLoop {
    /// Spawns the loop on the current tokio runtime.
    ///
    /// Missed ticks are skipped rather than bursted. The loop ends when the
    /// handle is stopped or dropped, or when the renderer asks to close.
    pub fn start<S, R>(mut sync: FrameSync<S, R>, refresh_hz: u32) -> FrameLoopHandle
    where
        S: DeviceSource + 'static,
        R: Renderer + Send + 'static,
    {
        let period = Duration::from_secs_f64(1.0 / f64::from(refresh_hz.max(1)));
        let (cancel, mut cancelled) = watch::channel(false);

        info!("Starting frame loop at {}Hz", refresh_hz);

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            sync.mark_started();

            let mut frames: u64 = 0;
            loop {
                tokio::select! {
                    // Err means the handle is gone
                    _ = cancelled.changed() => break,

                    _ = ticker.tick() => {
                        frames += 1;
                        if sync.tick() == TickOutcome::Exit {
                            info!("Renderer requested close");
                            break;
                        }
                    }
                }
            }

            sync.shutdown();
            debug!("Frame loop ended after {} frames", frames);
            frames
        });

        FrameLoopHandle {
            cancel: Some(cancel),
            task: Some(task),
        }
    }
}

/// Cancellation handle for a running [`FrameLoop`].
///
/// # Examples
///
/// ```
/// use padscope::frame::FrameLoopHandle;
///
/// let mut handle = FrameLoopHandle::idle();
/// handle.stop();
/// handle.stop(); // No effect
/// assert!(!handle.is_running());
/// ```
#[derive(Debug, Default)]
pub struct FrameLoopHandle {
    cancel: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<u64>>,
}

impl FrameLoopHandle {
    /// A handle for a loop that never started.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Asks the loop to stop after its current frame.
    ///
    /// Stopping an idle, stopped or finished loop does nothing.
    pub fn stop(&self) {
        let Some(cancel) = &self.cancel else {
            return;
        };
        if !*cancel.borrow() {
            info!("Stopping frame loop");
        }
        cancel.send_replace(true);
    }

    /// Waits for the loop to end and returns how many frames it ran.
    ///
    /// Returns `None` for an idle handle, after a previous successful join, or
    /// if the loop task panicked. Dropping the returned future before it
    /// completes leaves the handle joinable.
    pub async fn join(&mut self) -> Option<u64> {
        let task = self.task.as_mut()?;
        let outcome = task.await;
        self.task = None;

        match outcome {
            Ok(frames) => Some(frames),
            Err(e) => {
                error!("Frame loop task failed: {}", e);
                None
            }
        }
    }
}
