//! # Button-to-Target Binder
//!
//! Connects button indices to named nodes of the controller model and paints
//! those nodes while their buttons are held.
//!
//! ## Pressed State
//!
//! A button is pressed when its value is strictly above its threshold:
//!
//! | Slot | Default threshold |
//! |------|-------------------|
//! | Analog triggers (6, 7) | 0.1 |
//! | Everything else | 0.01 |
//!
//! ## Binding Lifecycle
//!
//! 1. The index-to-node table comes from configuration.
//! 2. Once the model is installed, [`ButtonBinder::capture`] resolves each node
//!    and remembers its original paint. Entries whose node is missing or has
//!    nothing paintable are dropped.
//! 3. Every frame, [`ButtonBinder::update`] paints bound nodes green or restores
//!    their original paint.
//!
//! ## Usage
//!
//! ```
//! use padscope::binder::{ButtonBinder, ThresholdPolicy};
//! use padscope::config::ButtonMapping;
//! use padscope::scene::headless::HeadlessRenderer;
//! use padscope::scene::{Renderer, SceneGraph, PRESSED_PAINT};
//!
//! let mut renderer = HeadlessRenderer::new();
//! renderer.install_scene(SceneGraph::from_json(r##"{
//!     "name": "pad",
//!     "nodes": [{ "name": "X", "materials": [{ "emissive": "#000000" }] }]
//! }"##).unwrap());
//!
//! let mut binder = ButtonBinder::new(
//!     vec![ButtonMapping { index: 0, node: "X".to_string() }],
//!     ThresholdPolicy::default(),
//!     PRESSED_PAINT,
//! );
//! binder.capture(&renderer);
//! binder.update(&[0.5], &mut renderer);
//!
//! let x = renderer.node("X").unwrap();
//! assert_eq!(renderer.paint(x), Some(PRESSED_PAINT));
//! ```

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::{ButtonMapping, Config, ThresholdConfig};
use crate::scene::{NodeId, Paint, Renderer};

/// Default threshold for digital buttons.
pub const DIGITAL_THRESHOLD: f32 = 0.01;

/// Default threshold for analog triggers.
pub const ANALOG_TRIGGER_THRESHOLD: f32 = 0.1;

/// Default analog trigger slots (left, right).
pub const TRIGGER_INDICES: [usize; 2] = [6, 7];

/// Decides whether a button value counts as pressed.
///
/// # Examples
///
/// ```
/// use padscope::binder::ThresholdPolicy;
///
/// let policy = ThresholdPolicy::default();
/// assert!(policy.is_pressed(0, 0.02));
/// assert!(!policy.is_pressed(6, 0.05)); // Trigger slots need more travel
/// assert!(policy.is_pressed(6, 0.2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    digital: f32,
    analog_trigger: f32,
    trigger_indices: [usize; 2],
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            digital: DIGITAL_THRESHOLD,
            analog_trigger: ANALOG_TRIGGER_THRESHOLD,
            trigger_indices: TRIGGER_INDICES,
        }
    }
}

impl ThresholdPolicy {
    #[must_use]
    pub fn new(digital: f32, analog_trigger: f32, trigger_indices: [usize; 2]) -> Self {
        Self {
            digital,
            analog_trigger,
            trigger_indices,
        }
    }

    /// Builds the policy from the `[thresholds]` section.
    ///
    /// A trigger list that is not exactly two entries long falls back to the
    /// default slots; [`Config::validate`] rejects such files anyway.
    #[must_use]
    pub fn from_config(config: &ThresholdConfig) -> Self {
        let trigger_indices = match config.trigger_indices.as_slice() {
            &[left, right] => [left, right],
            _ => TRIGGER_INDICES,
        };
        Self::new(config.digital, config.analog_trigger, trigger_indices)
    }

    /// Analog trigger slots (left, right).
    #[must_use]
    pub fn trigger_indices(&self) -> [usize; 2] {
        self.trigger_indices
    }

    /// Whether `index` is an analog trigger slot.
    #[must_use]
    pub fn is_trigger(&self, index: usize) -> bool {
        self.trigger_indices.contains(&index)
    }

    /// Threshold that applies to `index`.
    #[must_use]
    pub fn threshold(&self, index: usize) -> f32 {
        if self.is_trigger(index) {
            self.analog_trigger
        } else {
            self.digital
        }
    }

    /// `value > threshold(index)`. NaN is never pressed.
    #[must_use]
    pub fn is_pressed(&self, index: usize, value: f32) -> bool {
        value > self.threshold(index)
    }
}

/// A resolved button-to-node binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetBinding {
    pub button_index: usize,
    /// Node name as configured.
    pub target: String,
    pub node: NodeId,
    /// Paint the node had when it was captured.
    pub original_paint: Paint,
}

/// Binder table plus the policy used to drive it.
#[derive(Debug, Clone)]
pub struct ButtonBinder {
    mappings: Vec<ButtonMapping>,
    policy: ThresholdPolicy,
    pressed_paint: Paint,
    table: BTreeMap<usize, Vec<TargetBinding>>,
    captured: bool,
}

impl ButtonBinder {
    /// Creates an empty binder. Nothing is bound until [`ButtonBinder::capture`].
    #[must_use]
    pub fn new(mappings: Vec<ButtonMapping>, policy: ThresholdPolicy, pressed_paint: Paint) -> Self {
        Self {
            mappings,
            policy,
            pressed_paint,
            table: BTreeMap::new(),
            captured: false,
        }
    }

    /// Creates a binder from the `[binding]` and `[thresholds]` sections.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.binding.buttons.clone(),
            ThresholdPolicy::from_config(&config.thresholds),
            config.binding.pressed_color,
        )
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Whether a capture has run since construction.
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Resolves every configured node against the renderer's scene.
    ///
    /// Entries whose node is missing, or has no paint, are dropped silently.
    /// Running capture again against the same scene yields the same table; a
    /// node already bound keeps the original paint captured the first time,
    /// even if it is currently highlighted.
    ///
    /// Returns the number of bindings in the table.
    pub fn capture<R: Renderer + ?Sized>(&mut self, renderer: &R) -> usize {
        let previous = std::mem::take(&mut self.table);
        let remembered = |name: &str, node: NodeId| {
            previous
                .values()
                .flatten()
                .find(|b| b.node == node && b.target == name)
                .map(|b| b.original_paint)
        };

        for mapping in &self.mappings {
            let Some(node) = renderer.node(&mapping.node) else {
                debug!("Button {}: node '{}' not in model, skipping", mapping.index, mapping.node);
                continue;
            };

            let Some(current) = renderer.paint(node) else {
                debug!("Button {}: node '{}' has nothing paintable, skipping", mapping.index, mapping.node);
                continue;
            };

            let bindings = self.table.entry(mapping.index).or_default();
            if bindings.iter().any(|b| b.node == node) {
                continue;
            }

            bindings.push(TargetBinding {
                button_index: mapping.index,
                target: mapping.node.clone(),
                node,
                original_paint: remembered(&mapping.node, node).unwrap_or(current),
            });
        }

        self.captured = true;
        let bound = self.bindings().count();
        info!(
            "Bound {} of {} configured button targets",
            bound,
            self.mappings.len()
        );
        bound
    }

    /// Paints bound nodes according to `buttons`.
    ///
    /// Indices without a binding, and bindings whose index lies past the end of
    /// `buttons`, are left untouched. A node bound to several indices is
    /// highlighted while any of them is pressed.
    pub fn update<R: Renderer + ?Sized>(&self, buttons: &[f32], renderer: &mut R) {
        let mut nodes: BTreeMap<NodeId, (Paint, bool)> = BTreeMap::new();

        for (index, &value) in buttons.iter().enumerate() {
            let Some(bindings) = self.table.get(&index) else {
                continue;
            };
            let pressed = self.policy.is_pressed(index, value);
            for binding in bindings {
                let entry = nodes
                    .entry(binding.node)
                    .or_insert((binding.original_paint, false));
                entry.1 |= pressed;
            }
        }

        for (node, (original, pressed)) in nodes {
            renderer.set_paint(node, if pressed { self.pressed_paint } else { original });
        }
    }

    /// Restores every bound node to its original paint.
    pub fn release_all<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        for binding in self.bindings() {
            renderer.set_paint(binding.node, binding.original_paint);
        }
    }

    /// Whether button `index` has at least one bound node.
    #[must_use]
    pub fn is_bound(&self, index: usize) -> bool {
        self.table.get(&index).is_some_and(|b| !b.is_empty())
    }

    /// Bindings for one button index.
    pub fn bindings_for(&self, index: usize) -> &[TargetBinding] {
        self.table.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every binding, ordered by button index.
    pub fn bindings(&self) -> impl Iterator<Item = &TargetBinding> {
        self.table.values().flatten()
    }
}
