//! Pixel geometry of a laid-out timeline.
//!
//! A [`Scene`] maps every entity's row and years to a bar box and every
//! relation to a line segment. Drawing is delegated to a
//! [`LineDrawer`]; the scene only decides where lines start and end, which
//! markers they carry and whether they are dashed.
//!
//! Rows grow downward: row `0` is the top of the drawing.

use std::collections::HashSet;

use log::debug;

use strata_core::{
    color::Color,
    draw::{Line, LineDrawer, LineMarkers, MarkerKind, StrokeDefinition, StrokeStyle},
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use crate::{
    config::StyleConfig,
    error::LayoutError,
    model::{Entity, RelationKind, Span, Timeline},
};

/// Maps years and rows to pixel coordinates.
///
/// ```
/// # use strata::{config::StyleConfig, scene::Projection};
/// let projection = Projection::new(1900, &StyleConfig::default());
/// assert_eq!(projection.year_to_x(1950), 200.0);
/// assert_eq!(projection.row_to_y(0), 44.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    year_start: i32,
    year_width: f32,
    row_height: f32,
    bar_height: f32,
    padding: f32,
}

impl Projection {
    pub fn new(year_start: i32, style: &StyleConfig) -> Self {
        Self {
            year_start,
            year_width: style.year_width(),
            row_height: style.row_height(),
            bar_height: style.bar_height(),
            padding: style.padding(),
        }
    }

    pub fn year_start(&self) -> i32 {
        self.year_start
    }

    pub fn year_width(&self) -> f32 {
        self.year_width
    }

    pub fn year_to_x(&self, year: i32) -> f32 {
        (year - self.year_start) as f32 * self.year_width
    }

    /// Vertical centre of `row`.
    pub fn row_to_y(&self, row: usize) -> f32 {
        (row + 1) as f32 * self.row_height + self.padding
    }

    /// Box of a bar covering `span` on `row`.
    pub fn bar_bounds(&self, span: Span, row: usize) -> Bounds {
        let left = self.year_to_x(span.start());
        let right = self.year_to_x(span.cell_end());
        let top = self.row_to_y(row) - self.bar_height / 2.0;
        Bounds::new_from_top_left(Point::new(left, top), Size::new(right - left, self.bar_height))
    }
}

/// The bar of one entity.
#[derive(Debug, Clone)]
pub struct EntityBox {
    id: Id,
    label: String,
    span: Span,
    row: usize,
    bounds: Bounds,
    color: Option<Color>,
}

impl EntityBox {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Color set on the entry itself, if any.
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// The point on the top or bottom edge facing `row`, or the centre when
    /// `row` is this box's own row.
    fn edge_y_towards(&self, row: usize) -> f32 {
        match row.cmp(&self.row) {
            std::cmp::Ordering::Greater => self.bounds.max_y(),
            std::cmp::Ordering::Less => self.bounds.min_y(),
            std::cmp::Ordering::Equal => self.bounds.center().y(),
        }
    }
}

/// Side of a bar a link connector attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSide {
    Top,
    Bottom,
    Left,
    Right,
}

/// Sides a link from `from` to `to` attaches to.
///
/// Entities on different rows connect vertically, facing each other. On the
/// same row the earlier entity connects from its right end to the left end
/// of the later one.
///
/// ```
/// # use strata::{model::Span, scene::{link_sides, LinkSide}};
/// let sides = link_sides((0, Span::new(1900, 1950)), (2, Span::new(1920, 1990)));
/// assert_eq!(sides, (LinkSide::Bottom, LinkSide::Top));
/// ```
pub fn link_sides(from: (usize, Span), to: (usize, Span)) -> (LinkSide, LinkSide) {
    let ((from_row, from_span), (to_row, to_span)) = (from, to);
    if to_row > from_row {
        (LinkSide::Bottom, LinkSide::Top)
    } else if to_row < from_row {
        (LinkSide::Top, LinkSide::Bottom)
    } else if from_span.start() < to_span.start() {
        (LinkSide::Right, LinkSide::Left)
    } else {
        (LinkSide::Left, LinkSide::Right)
    }
}

/// A relation as a line segment between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationLine {
    kind: RelationKind,
    from: Id,
    to: Option<Id>,
    start: Point,
    end: Point,
}

impl RelationLine {
    /// Continuation lines are [`RelationKind::Become`] separator ticks.
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn from(&self) -> Id {
        self.from
    }

    /// The other entity, `None` for continuation ticks.
    pub fn to(&self) -> Option<Id> {
        self.to
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    /// The drawable line for this relation based on `stroke`.
    ///
    /// Merge, split and fork lines end in an arrow; links are dashed with a
    /// dot at each end.
    pub fn to_line(&self, stroke: &StrokeDefinition) -> Line {
        let mut stroke = stroke.clone();
        let markers = match self.kind {
            RelationKind::Become => LineMarkers::none(),
            RelationKind::Merge | RelationKind::Split | RelationKind::Fork => {
                LineMarkers::none().with_end(MarkerKind::Arrow)
            }
            RelationKind::Link => {
                stroke.set_style(StrokeStyle::Dashed);
                LineMarkers::none()
                    .with_start(MarkerKind::Dot)
                    .with_end(MarkerKind::Dot)
            }
        };
        Line::new(self.start, self.end, stroke).with_markers(markers)
    }
}

/// Boxes and relation lines of a laid-out timeline.
#[derive(Debug, Clone)]
pub struct Scene {
    projection: Projection,
    boxes: Vec<EntityBox>,
    relations: Vec<RelationLine>,
    rows: usize,
    year_end: i32,
}

impl Scene {
    /// Computes the geometry of `timeline`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnplacedEntity`] if an entity has no row yet.
    pub fn new(timeline: &Timeline, style: &StyleConfig) -> Result<Self, LayoutError> {
        let (year_start, year_end) = timeline.year_range().unwrap_or((0, 0));
        let projection = Projection::new(year_start, style);

        let boxes = timeline
            .entities()
            .iter()
            .map(|entity| {
                let row = entity.row().ok_or_else(|| LayoutError::UnplacedEntity {
                    id: entity.id().to_string(),
                })?;
                Ok(EntityBox {
                    id: entity.id(),
                    label: entity.name().to_string(),
                    span: entity.span(),
                    row,
                    bounds: projection.bar_bounds(entity.span(), row),
                    color: entity.color(),
                })
            })
            .collect::<Result<Vec<_>, LayoutError>>()?;

        let rows = boxes.iter().map(|b| b.row + 1).max().unwrap_or(0);
        let mut scene = Self {
            projection,
            boxes,
            relations: Vec::new(),
            rows,
            year_end,
        };
        scene.relations = scene.relation_lines(timeline.entities());

        debug!(
            boxes = scene.boxes.len(),
            relations = scene.relations.len(),
            rows = rows;
            "Scene computed"
        );
        Ok(scene)
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// One box per entity, in entity order.
    pub fn boxes(&self) -> &[EntityBox] {
        &self.boxes
    }

    pub fn relations(&self) -> &[RelationLine] {
        &self.relations
    }

    /// Number of rows in use.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Last year covered by any entity.
    pub fn year_end(&self) -> i32 {
        self.year_end
    }

    /// The drawing area: all bars plus the padding around them and a free
    /// row above the first one for the axis.
    pub fn canvas(&self) -> Bounds {
        let padding = self.projection.padding;
        let width = self.projection.year_to_x(self.year_end) + 2.0 * padding;
        let height = self.projection.row_to_y(self.rows) + padding;
        Bounds::new_from_top_left(Point::new(-padding, 0.0), Size::new(width, height))
    }

    /// Hands every relation line to `drawer`.
    pub fn draw<D: LineDrawer>(&self, drawer: &mut D, stroke: &StrokeDefinition) -> Vec<D::Drawable> {
        self.relations
            .iter()
            .map(|relation| drawer.draw_line(&relation.to_line(stroke)))
            .collect()
    }

    fn relation_lines(&self, entities: &[Entity]) -> Vec<RelationLine> {
        let mut lines = Vec::new();
        let mut linked = HashSet::new();

        for (idx, entity) in entities.iter().enumerate() {
            lines.extend(self.continuation_ticks(idx, entity));

            if let Some(target) = entity.merge() {
                lines.push(self.merge_line(idx, target));
            }
            if let Some(parent) = entity.split() {
                lines.push(self.split_line(parent, idx));
            }
            for &successor in entity.fork() {
                lines.push(self.fork_line(idx, successor));
            }
            for &other in entity.links() {
                if linked.insert((idx.min(other), idx.max(other))) {
                    lines.push(self.link_line(idx, other));
                }
            }
        }

        lines
    }

    fn continuation_ticks<'a>(&'a self, idx: usize, entity: &'a Entity) -> impl Iterator<Item = RelationLine> + 'a {
        let bounds = self.boxes[idx].bounds;
        entity.segments().iter().skip(1).map(move |segment| {
            let x = self.projection.year_to_x(segment.span().start());
            RelationLine {
                kind: RelationKind::Become,
                from: entity.id(),
                to: None,
                start: Point::new(x, bounds.min_y()),
                end: Point::new(x, bounds.max_y()),
            }
        })
    }

    /// From the end of `idx` onto the facing edge of `target`, one year on.
    fn merge_line(&self, idx: usize, target: usize) -> RelationLine {
        let (from, to) = (&self.boxes[idx], &self.boxes[target]);
        let x = self.projection.year_to_x(from.span.cell_end());
        let end_x = to.bounds.clamp_x(x + self.projection.year_width);

        RelationLine {
            kind: RelationKind::Merge,
            from: from.id,
            to: Some(to.id),
            start: Point::new(x, from.bounds.center().y()),
            end: Point::new(end_x, to.edge_y_towards(from.row)),
        }
    }

    /// From the parent edge one year before the child starts, to the start
    /// of the child.
    fn split_line(&self, parent: usize, child: usize) -> RelationLine {
        let (parent, child) = (&self.boxes[parent], &self.boxes[child]);
        let x = self.projection.year_to_x(child.span.start());
        let start_x = parent.bounds.clamp_x(x - self.projection.year_width);

        RelationLine {
            kind: RelationKind::Split,
            from: child.id,
            to: Some(parent.id),
            start: Point::new(start_x, parent.edge_y_towards(child.row)),
            end: Point::new(x, child.bounds.center().y()),
        }
    }

    fn fork_line(&self, idx: usize, successor: usize) -> RelationLine {
        let (from, to) = (&self.boxes[idx], &self.boxes[successor]);
        RelationLine {
            kind: RelationKind::Fork,
            from: from.id,
            to: Some(to.id),
            start: Point::new(from.bounds.max_x(), from.bounds.center().y()),
            end: Point::new(to.bounds.min_x(), to.bounds.center().y()),
        }
    }

    fn link_line(&self, idx: usize, other: usize) -> RelationLine {
        let (from, to) = (&self.boxes[idx], &self.boxes[other]);
        let (from_side, to_side) = link_sides((from.row, from.span), (to.row, to.span));

        let shared_x = from.span.overlap(to.span).map(|(first, last)| {
            (self.projection.year_to_x(first) + self.projection.year_to_x(last)) / 2.0
        });
        let attach = |this: &EntityBox, that: &EntityBox, side: LinkSide| {
            let bounds = this.bounds;
            match side {
                LinkSide::Left => Point::new(bounds.min_x(), bounds.center().y()),
                LinkSide::Right => Point::new(bounds.max_x(), bounds.center().y()),
                LinkSide::Top | LinkSide::Bottom => {
                    let x = shared_x.unwrap_or_else(|| bounds.clamp_x(that.bounds.center().x()));
                    let y = if side == LinkSide::Top {
                        bounds.min_y()
                    } else {
                        bounds.max_y()
                    };
                    Point::new(x, y)
                }
            }
        };

        RelationLine {
            kind: RelationKind::Link,
            from: from.id,
            to: Some(to.id),
            start: attach(from, to, from_side),
            end: attach(to, from, to_side),
        }
    }
}
