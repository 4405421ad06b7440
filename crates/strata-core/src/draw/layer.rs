//! Layer-based z-ordering for SVG output.
//!
//! Drawables push their SVG nodes into a [`LayeredOutput`] tagged with a
//! [`RenderLayer`]; rendering emits one `<g>` per non-empty layer, bottom to
//! top, so relation lines always sit above bars and labels above both.
//!
//! ```
//! # use strata_core::draw::{RenderLayer, LayeredOutput};
//! # use svg::node::element::{Rectangle, Text};
//! let mut output = LayeredOutput::new();
//! output.add_to_layer(RenderLayer::Text, Box::new(Text::new("Latin")));
//! output.add_to_layer(RenderLayer::Bar, Box::new(Rectangle::new()));
//!
//! // Bar group first, then Text
//! assert_eq!(output.render().len(), 2);
//! ```

use svg::node::element as svg_element;

/// Type alias for boxed SVG nodes.
pub type SvgNode = Box<dyn svg::Node>;

/// Rendering layers of a timeline, bottom to top in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Background fill
    Background,
    /// Year axis ticks and labels
    Axis,
    /// Entry bars
    Bar,
    /// Relation lines (continuation, merge, split, fork, link)
    Relation,
    /// Entry labels
    Text,
}

impl RenderLayer {
    /// Returns a human-readable name for this layer.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Axis => "axis",
            Self::Bar => "bar",
            Self::Relation => "relation",
            Self::Text => "text",
        }
    }
}

/// SVG nodes grouped by rendering layer.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    items: Vec<(RenderLayer, SvgNode)>,
}

impl LayeredOutput {
    /// Creates a new empty `LayeredOutput`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single node to the specified layer, after any nodes already there.
    pub fn add_to_layer(&mut self, layer: RenderLayer, node: SvgNode) {
        self.items.push((layer, node));
    }

    /// Appends every node of `other`.
    pub fn merge(&mut self, other: LayeredOutput) {
        self.items.extend(other.items);
    }

    /// Returns `true` if there are no nodes in any layer.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Renders all layers to SVG groups, consuming the output.
    ///
    /// Each non-empty layer becomes a `<g data-layer="...">` element. Nodes keep
    /// their insertion order within a layer.
    pub fn render(mut self) -> Vec<SvgNode> {
        if self.is_empty() {
            return Vec::new();
        }

        // Stable sort keeps insertion order inside each layer
        self.items.sort_by_key(|(layer, _)| *layer);

        let mut result = Vec::new();
        let mut current_layer = self.items[0].0;
        let mut current_group = svg_element::Group::new().set("data-layer", current_layer.name());

        for (layer, node) in self.items {
            if layer != current_layer {
                result.push(Box::new(current_group) as SvgNode);

                current_layer = layer;
                current_group = svg_element::Group::new().set("data-layer", layer.name());
            }

            current_group = current_group.add(node);
        }

        result.push(Box::new(current_group) as SvgNode);

        result
    }
}
