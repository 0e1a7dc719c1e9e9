//! # Headless Renderer
//!
//! Keeps the scene graph in memory and draws nothing. Used when stdout is not a
//! terminal (`[render] mode = "headless"`) and as the renderer in tests.

use tracing::{debug, info};

use super::{NodeId, Paint, Renderer, SceneGraph};
use crate::display::StatusPresentation;
use crate::error::Result;
use crate::frame::FrameView;

/// A [`Renderer`] that only logs.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    scene: Option<SceneGraph>,
    last_view: Option<FrameView>,
    last_status: Option<StatusPresentation>,
    frames: u64,
}

impl HeadlessRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The installed scene, if any.
    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    /// The view passed to the most recent redraw.
    pub fn last_view(&self) -> Option<&FrameView> {
        self.last_view.as_ref()
    }

    /// Number of redraws so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Names of nodes currently painted `paint`, in depth-first order.
    pub fn nodes_painted(&self, paint: Paint) -> Vec<&str> {
        let Some(scene) = &self.scene else {
            return Vec::new();
        };
        scene
            .nodes()
            .iter()
            .enumerate()
            .filter(|(index, _)| scene.paint(NodeId(*index)) == Some(paint))
            .map(|(_, node)| node.name.as_str())
            .collect()
    }
}

impl Renderer for HeadlessRenderer {
    fn install_scene(&mut self, scene: SceneGraph) {
        info!("Installed model '{}' ({} nodes)", scene.name(), scene.nodes().len());
        self.scene = Some(scene);
    }

    fn node(&self, name: &str) -> Option<NodeId> {
        self.scene.as_ref()?.find(name)
    }

    fn paint(&self, node: NodeId) -> Option<Paint> {
        self.scene.as_ref()?.paint(node)
    }

    fn set_paint(&mut self, node: NodeId, paint: Paint) {
        if let Some(scene) = self.scene.as_mut() {
            scene.set_paint(node, paint);
        }
    }

    fn redraw(&mut self, view: &FrameView) -> Result<()> {
        if self.last_status.as_ref() != Some(&view.status) {
            info!("{}", view.status.text());
            self.last_status = Some(view.status.clone());
        }

        self.frames += 1;
        if self.frames % 600 == 0 {
            debug!(
                "Frame {}: sticks {:?}, triggers {:?}",
                self.frames, view.sticks, view.triggers
            );
        }

        self.last_view = Some(view.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PRESSED_PAINT;

    fn scene() -> SceneGraph {
        SceneGraph::from_json(
            r##"{
            "name": "pad",
            "nodes": [
                { "name": "X", "materials": [{ "emissive": "#000000" }] },
                { "name": "Logo" }
            ]
        }"##,
        )
        .unwrap()
    }

    #[test]
    fn test_lookups_before_install() {
        let mut renderer = HeadlessRenderer::new();
        assert!(renderer.scene().is_none());
        assert!(renderer.node("X").is_none());
        assert!(renderer.paint(NodeId(0)).is_none());
        // Painting without a scene is a no-op
        renderer.set_paint(NodeId(0), PRESSED_PAINT);
        assert!(renderer.nodes_painted(PRESSED_PAINT).is_empty());
    }

    #[test]
    fn test_paint_after_install() {
        let mut renderer = HeadlessRenderer::new();
        renderer.install_scene(scene());

        let x = renderer.node("X").unwrap();
        assert_eq!(renderer.paint(x), Some(Paint::rgb(0, 0, 0)));
        assert!(renderer.paint(renderer.node("Logo").unwrap()).is_none());

        renderer.set_paint(x, PRESSED_PAINT);
        assert_eq!(renderer.nodes_painted(PRESSED_PAINT), ["X"]);
    }

    #[test]
    fn test_redraw_keeps_last_view() {
        let mut renderer = HeadlessRenderer::new();
        assert_eq!(renderer.frames(), 0);

        let view = FrameView::default();
        renderer.redraw(&view).unwrap();
        renderer.redraw(&view).unwrap();

        assert_eq!(renderer.frames(), 2);
        assert_eq!(renderer.last_view(), Some(&view));
        assert!(!renderer.close_requested());
    }
}
