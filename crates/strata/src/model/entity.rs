use std::collections::BTreeMap;

use strata_core::{color::Color, identifier::Id};

/// Largest absolute year an entry may use.
///
/// The layout grid has one column per year, so this also bounds its width.
pub const YEAR_LIMIT: i32 = 50_000;

/// A closed range of years, `end >= start`.
///
/// For layout purposes a span occupies the year cells
/// `[start, max(end, start + 1))`: a zero-length span is one unit wide.
///
/// ```
/// # use strata::model::Span;
/// let point = Span::new(1900, 1900);
/// assert_eq!(point.cell_end(), 1901);
///
/// let era = Span::new(1900, 1950);
/// assert_eq!(era.cell_end(), 1950);
/// assert!(era.conflicts_with(Span::new(1950, 1960)));
/// assert!(!era.conflicts_with(Span::new(1951, 1960)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    start: i32,
    end: i32,
}

impl Span {
    /// Creates a span. `end` is clamped to `start` if it is smaller.
    pub fn new(start: i32, end: i32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn start(self) -> i32 {
        self.start
    }

    pub fn end(self) -> i32 {
        self.end
    }

    /// Exclusive end of the occupied cells.
    pub fn cell_end(self) -> i32 {
        self.end.max(self.start.saturating_add(1))
    }

    /// Whether two spans may not share a row.
    ///
    /// Occupied cells plus one buffer year on each side of `self` must not
    /// intersect the occupied cells of `other`.
    pub fn conflicts_with(self, other: Span) -> bool {
        other.start <= self.cell_end() && self.start <= other.cell_end()
    }

    /// Years both spans cover, as a half-open cell range.
    pub fn overlap(self, other: Span) -> Option<(i32, i32)> {
        let start = self.start.max(other.start);
        let end = self.cell_end().min(other.cell_end());
        (start < end).then_some((start, end))
    }
}

/// One original input entry inside a collapsed `become` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    id: Id,
    span: Span,
}

impl Segment {
    pub(crate) fn new(id: Id, span: Span) -> Self {
        Self { id, span }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Position of an entity inside one cluster's local grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeRow {
    /// Row in the cluster-local grid.
    pub row: usize,
    /// Offset from the cluster master's local row.
    pub relative: isize,
}

/// A time span placed on a row.
///
/// Relations are indices into the owning [`Timeline`](super::Timeline)'s
/// entity list.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) id: Id,
    pub(crate) name: String,
    pub(crate) span: Span,
    pub(crate) segments: Vec<Segment>,
    pub(crate) color: Option<Color>,

    pub(crate) merge: Option<usize>,
    pub(crate) split: Option<usize>,
    /// Up to two successors.
    pub(crate) fork: Vec<usize>,
    pub(crate) links: Vec<usize>,

    pub(crate) manual_row: Option<usize>,
    /// Cluster members, self first. Only set when there is more than one.
    pub(crate) cluster: Option<Vec<usize>>,

    pub(crate) row: Option<usize>,
    /// Keyed by cluster master index.
    pub(crate) relative_rows: BTreeMap<usize, RelativeRow>,
    pub(crate) deviation: Option<u32>,
}

impl Entity {
    pub(crate) fn new(id: Id, name: String, span: Span) -> Self {
        Self {
            id,
            name,
            span,
            segments: vec![Segment::new(id, span)],
            color: None,
            merge: None,
            split: None,
            fork: Vec::new(),
            links: Vec::new(),
            manual_row: None,
            cluster: None,
            row: None,
            relative_rows: BTreeMap::new(),
            deviation: None,
        }
    }

    /// Id of the first entry of the chain.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Label text.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Combined span of all segments.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The original entries, in chain order. Always at least one.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn merge(&self) -> Option<usize> {
        self.merge
    }

    pub fn split(&self) -> Option<usize> {
        self.split
    }

    pub fn fork(&self) -> &[usize] {
        &self.fork
    }

    pub fn links(&self) -> &[usize] {
        &self.links
    }

    pub fn manual_row(&self) -> Option<usize> {
        self.manual_row
    }

    pub fn cluster(&self) -> Option<&[usize]> {
        self.cluster.as_deref()
    }

    pub fn row(&self) -> Option<usize> {
        self.row
    }

    pub fn relative_rows(&self) -> &BTreeMap<usize, RelativeRow> {
        &self.relative_rows
    }

    /// Distance from the rows its clusters wanted; `None` before layout.
    pub fn deviation(&self) -> Option<u32> {
        self.deviation
    }

    pub(crate) fn reset_layout(&mut self) {
        self.row = self.manual_row;
        self.relative_rows.clear();
        self.deviation = None;
    }
}
