//! SVG implementation of the line-drawing interface.

use indexmap::IndexMap;
use svg::node::element as svg_element;

use strata_core::{
    color::Color,
    draw::{Line, LineDrawer, MarkerKind, SvgNode},
};

/// Draws [`Line`]s as SVG paths and collects the marker definitions they
/// reference, one per marker kind and color.
#[derive(Debug, Default)]
pub struct SvgLineDrawer {
    markers: IndexMap<String, (MarkerKind, Color)>,
}

impl SvgLineDrawer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct marker definitions referenced so far.
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// A `<defs>` element with every marker referenced so far.
    pub fn draw_marker_definitions(&self) -> SvgNode {
        let mut defs = svg_element::Definitions::new();
        for (id, &(kind, color)) in &self.markers {
            defs = defs.add(Self::create_marker(id, kind, color));
        }
        defs.into()
    }

    fn marker_id(kind: MarkerKind, color: Color) -> String {
        format!("{}-{}", kind.name(), color.to_id_safe_string())
    }

    /// Registers a marker and returns the `url(#...)` reference to it.
    fn register_marker(&mut self, kind: MarkerKind, color: Color) -> String {
        let id = Self::marker_id(kind, color);
        let reference = format!("url(#{id})");
        self.markers.entry(id).or_insert((kind, color));
        reference
    }

    fn create_marker(id: &str, kind: MarkerKind, color: Color) -> svg_element::Marker {
        let marker = svg_element::Marker::new()
            .set("id", id)
            .set("viewBox", "0 0 10 10")
            .set("refY", 5);

        match kind {
            MarkerKind::Arrow => marker
                .set("refX", 9)
                .set("markerWidth", 6)
                .set("markerHeight", 6)
                .set("orient", "auto-start-reverse")
                .add(
                    svg_element::Path::new()
                        .set("d", "M 0 0 L 10 5 L 0 10 z")
                        .set("fill", color.to_string())
                        .set("fill-opacity", color.alpha()),
                ),
            MarkerKind::Dot => marker
                .set("refX", 5)
                .set("markerWidth", 4)
                .set("markerHeight", 4)
                .add(
                    svg_element::Circle::new()
                        .set("cx", 5)
                        .set("cy", 5)
                        .set("r", 5)
                        .set("fill", color.to_string())
                        .set("fill-opacity", color.alpha()),
                ),
        }
    }
}

impl LineDrawer for SvgLineDrawer {
    type Drawable = SvgNode;

    fn draw_line(&mut self, line: &Line) -> SvgNode {
        let color = line.stroke().color();
        let path = svg_element::Path::new()
            .set("d", line.path_data())
            .set("fill", "none");
        let mut path = strata_core::apply_stroke!(path, line.stroke());

        let markers = line.markers();
        if let Some(kind) = markers.start() {
            path = path.set("marker-start", self.register_marker(kind, color));
        }
        if let Some(kind) = markers.end() {
            path = path.set("marker-end", self.register_marker(kind, color));
        }

        Box::new(path)
    }
}
