//! The line-drawing service interface.
//!
//! Relation lines are the only primitive the timeline layout needs from a
//! renderer: a straight segment with a stroke (width, colour, dash pattern)
//! and optional end markers. [`LineDrawer`] is that contract; the SVG
//! exporter is one implementation.

use crate::{draw::StrokeDefinition, geometry::Point};

/// Shape drawn at a line end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Filled triangular arrow head
    Arrow,
    /// Small filled circle
    Dot,
}

impl MarkerKind {
    /// Returns a short name, usable in marker ids.
    pub fn name(self) -> &'static str {
        match self {
            Self::Arrow => "arrow",
            Self::Dot => "dot",
        }
    }
}

/// Optional markers at either end of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineMarkers {
    start: Option<MarkerKind>,
    end: Option<MarkerKind>,
}

impl LineMarkers {
    /// No markers at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, marker: MarkerKind) -> Self {
        self.start = Some(marker);
        self
    }

    pub fn with_end(mut self, marker: MarkerKind) -> Self {
        self.end = Some(marker);
        self
    }

    pub fn start(&self) -> Option<MarkerKind> {
        self.start
    }

    pub fn end(&self) -> Option<MarkerKind> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// A straight line segment ready to be drawn.
///
/// ```
/// use strata_core::draw::{Line, LineMarkers, MarkerKind, StrokeDefinition};
/// use strata_core::geometry::Point;
///
/// let line = Line::new(Point::new(0.0, 10.0), Point::new(40.0, 34.0), StrokeDefinition::default())
///     .with_markers(LineMarkers::none().with_end(MarkerKind::Arrow));
///
/// assert_eq!(line.path_data(), "M 0 10 L 40 34");
/// assert_eq!(line.markers().end(), Some(MarkerKind::Arrow));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    start: Point,
    end: Point,
    stroke: StrokeDefinition,
    markers: LineMarkers,
}

impl Line {
    pub fn new(start: Point, end: Point, stroke: StrokeDefinition) -> Self {
        Self {
            start,
            end,
            stroke,
            markers: LineMarkers::none(),
        }
    }

    pub fn with_markers(mut self, markers: LineMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn stroke(&self) -> &StrokeDefinition {
        &self.stroke
    }

    pub fn markers(&self) -> LineMarkers {
        self.markers
    }

    /// SVG path data for this segment.
    pub fn path_data(&self) -> String {
        format!(
            "M {} {} L {} {}",
            self.start.x(),
            self.start.y(),
            self.end.x(),
            self.end.y()
        )
    }
}

/// A service that turns [`Line`]s into drawable output.
///
/// Implementations may keep state across calls, e.g. to collect marker
/// definitions that must be emitted once per document.
pub trait LineDrawer {
    /// What a drawn line becomes (an SVG node, a test record, ...).
    type Drawable;

    fn draw_line(&mut self, line: &Line) -> Self::Drawable;
}
