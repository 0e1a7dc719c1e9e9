//! # Scene Module
//!
//! The controller model as the rest of the crate sees it: a graph of named
//! nodes whose materials carry an emissive [`Paint`], plus the [`Renderer`]
//! capability that owns that graph and draws each frame.
//!
//! This module handles:
//! - Parsing and formatting `#rrggbb` paint values
//! - Flattening a JSON model asset into a name-addressable [`SceneGraph`]
//! - Reading and writing node paint uniformly across single and
//!   multi-material nodes
//! - Loading the asset asynchronously ([`asset`])
//! - Terminal and headless renderers ([`terminal`], [`headless`])

pub mod asset;
pub mod headless;
pub mod terminal;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PadscopeError, Result};
use crate::frame::FrameView;

/// Paint applied to a target while its button is pressed (saturated green).
pub const PRESSED_PAINT: Paint = Paint::rgb(0x00, 0xff, 0x00);

/// An RGB emissive colour.
///
/// Serialised as a `"#rrggbb"` string in both the config file and model assets.
///
/// # Examples
///
/// ```
/// use padscope::scene::Paint;
///
/// let paint: Paint = "#00ff00".parse().unwrap();
/// assert_eq!(paint, Paint::rgb(0, 255, 0));
/// assert_eq!(paint.to_string(), "#00ff00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Paint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Paint {
    /// Creates a paint from its red, green and blue components.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Paint {
    type Err = PadscopeError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| PadscopeError::InvalidPaint(format!("'{}' must start with '#'", s)))?;

        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PadscopeError::InvalidPaint(format!(
                "'{}' must be exactly six hex digits after '#'",
                s
            )));
        }

        let component = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| PadscopeError::InvalidPaint(format!("'{}': {}", s, e)))
        };

        Ok(Self {
            r: component(0..2)?,
            g: component(2..4)?,
            b: component(4..6)?,
        })
    }
}

impl TryFrom<String> for Paint {
    type Error = PadscopeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Paint> for String {
    fn from(paint: Paint) -> Self {
        paint.to_string()
    }
}

impl fmt::Display for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Handle to a node inside a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A surface of a node. Only materials with an emissive channel are paintable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub emissive: Option<Paint>,
}

/// A named node of the flattened model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneNode {
    pub name: String,
    /// Nesting depth in the asset tree (root nodes are 0).
    pub depth: usize,
    pub materials: Vec<Material>,
}

/// Node as written in the model asset, before flattening.
#[derive(Debug, Deserialize)]
struct AssetNode {
    name: String,
    #[serde(default)]
    materials: Vec<Material>,
    #[serde(default)]
    children: Vec<AssetNode>,
}

#[derive(Debug, Deserialize)]
struct AssetFile {
    name: String,
    #[serde(default)]
    nodes: Vec<AssetNode>,
}

/// A loaded controller model: every node of the asset in depth-first order.
///
/// Names are not required to be unique; lookups return the first match in
/// depth-first order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneGraph {
    name: String,
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Parses a JSON model asset.
    ///
    /// # Errors
    ///
    /// Returns `Asset` if the document is not a valid model asset (including
    /// malformed paint strings).
    ///
    /// # Examples
    ///
    /// ```
    /// use padscope::scene::SceneGraph;
    ///
    /// let graph = SceneGraph::from_json(r##"{
    ///     "name": "pad",
    ///     "nodes": [{ "name": "button_cross", "materials": [{ "emissive": "#000000" }] }]
    /// }"##).unwrap();
    /// assert!(graph.find("button_cross").is_some());
    /// assert!(graph.find("button_missing").is_none());
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let file: AssetFile = serde_json::from_str(json)?;
        let mut nodes = Vec::new();
        for root in file.nodes {
            flatten(root, 0, &mut nodes);
        }
        Ok(Self {
            name: file.name,
            nodes,
        })
    }

    /// Builds a graph directly from already-flattened nodes.
    #[must_use]
    pub fn from_nodes(name: impl Into<String>, nodes: Vec<SceneNode>) -> Self {
        Self {
            name: name.into(),
            nodes,
        }
    }

    /// Model name declared by the asset.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All nodes in depth-first order.
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Returns the node with this id, if any.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// Finds the first node with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Current paint of a node: the emissive of its first paintable material.
    ///
    /// Returns `None` for unknown nodes and for nodes without any emissive
    /// material.
    #[must_use]
    pub fn paint(&self, id: NodeId) -> Option<Paint> {
        self.node(id)?.materials.iter().find_map(|m| m.emissive)
    }

    /// Sets the emissive of every paintable material of a node.
    ///
    /// Materials without an emissive channel, and unknown nodes, are left alone.
    pub fn set_paint(&mut self, id: NodeId, paint: Paint) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            for emissive in node.materials.iter_mut().filter_map(|m| m.emissive.as_mut()) {
                *emissive = paint;
            }
        }
    }
}

fn flatten(node: AssetNode, depth: usize, out: &mut Vec<SceneNode>) {
    out.push(SceneNode {
        name: node.name,
        depth,
        materials: node.materials,
    });
    for child in node.children {
        flatten(child, depth + 1, out);
    }
}

/// Rendering capability consumed by the frame loop.
///
/// A renderer owns the scene graph once it is installed. Paint access is
/// uniform: implementations decide how a paint maps onto one or many surfaces.
/// Before [`Renderer::install_scene`] every node lookup returns `None`.
pub trait Renderer {
    /// Takes ownership of a freshly loaded model.
    fn install_scene(&mut self, scene: SceneGraph);

    /// Resolves a node by name.
    fn node(&self, name: &str) -> Option<NodeId>;

    /// Current paint of a node, `None` if it has nothing paintable.
    fn paint(&self, node: NodeId) -> Option<Paint>;

    /// Paints every paintable surface of a node.
    fn set_paint(&mut self, node: NodeId, paint: Paint);

    /// Draws one frame.
    fn redraw(&mut self, view: &FrameView) -> Result<()>;

    /// Whether the user asked to close the view.
    fn close_requested(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "name": "sample",
        "nodes": [
            {
                "name": "body",
                "materials": [{ "name": "shell", "emissive": "#101010" }],
                "children": [
                    { "name": "button_cross", "materials": [{ "emissive": "#000000" }] },
                    {
                        "name": "button_l2",
                        "materials": [
                            { "name": "plastic" },
                            { "name": "cap", "emissive": "#202020" },
                            { "name": "rim", "emissive": "#303030" }
                        ]
                    },
                    { "name": "logo" }
                ]
            },
            { "name": "button_cross", "materials": [{ "emissive": "#ffffff" }] }
        ]
    }"##;

    #[test]
    fn test_paint_parse_and_display() {
        let paint: Paint = "#1a2B3c".parse().unwrap();
        assert_eq!(paint, Paint::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(paint.to_string(), "#1a2b3c");
    }

    #[test]
    fn test_paint_rejects_malformed() {
        for bad in ["00ff00", "#00ff0", "#00ff000", "#gg0000", "", "#"] {
            assert!(bad.parse::<Paint>().is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_pressed_paint_is_green() {
        assert_eq!(PRESSED_PAINT.to_string(), "#00ff00");
    }

    #[test]
    fn test_flatten_depth_first() {
        let graph = SceneGraph::from_json(SAMPLE).unwrap();
        let names: Vec<_> = graph.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["body", "button_cross", "button_l2", "logo", "button_cross"]);
        assert_eq!(graph.nodes()[0].depth, 0);
        assert_eq!(graph.nodes()[1].depth, 1);
        assert_eq!(graph.name(), "sample");
    }

    #[test]
    fn test_find_returns_first_match() {
        let graph = SceneGraph::from_json(SAMPLE).unwrap();
        assert_eq!(graph.find("button_cross"), Some(NodeId(1)));
        assert_eq!(graph.find("nope"), None);
    }

    #[test]
    fn test_paint_uses_first_emissive_material() {
        let graph = SceneGraph::from_json(SAMPLE).unwrap();
        let l2 = graph.find("button_l2").unwrap();
        assert_eq!(graph.paint(l2), Some(Paint::rgb(0x20, 0x20, 0x20)));
    }

    #[test]
    fn test_paint_absent_without_emissive() {
        let graph = SceneGraph::from_json(SAMPLE).unwrap();
        let logo = graph.find("logo").unwrap();
        assert_eq!(graph.paint(logo), None);
        assert_eq!(graph.paint(NodeId(99)), None);
    }

    #[test]
    fn test_set_paint_applies_to_all_emissive_materials() {
        let mut graph = SceneGraph::from_json(SAMPLE).unwrap();
        let l2 = graph.find("button_l2").unwrap();
        graph.set_paint(l2, PRESSED_PAINT);

        let materials = &graph.node(l2).unwrap().materials;
        assert_eq!(materials[0].emissive, None, "non-emissive material stays untouched");
        assert_eq!(materials[1].emissive, Some(PRESSED_PAINT));
        assert_eq!(materials[2].emissive, Some(PRESSED_PAINT));
    }

    #[test]
    fn test_set_paint_unknown_node_is_noop() {
        let mut graph = SceneGraph::from_json(SAMPLE).unwrap();
        let before = graph.clone();
        graph.set_paint(NodeId(42), PRESSED_PAINT);
        assert_eq!(graph, before);
    }

    #[test]
    fn test_invalid_asset_paint_is_rejected() {
        let json = r#"{ "name": "x", "nodes": [{ "name": "a", "materials": [{ "emissive": "green" }] }] }"#;
        assert!(matches!(
            SceneGraph::from_json(json),
            Err(PadscopeError::Asset(_))
        ));
    }
}
