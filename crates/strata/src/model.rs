//! The timeline entity model.
//!
//! Raw input records are turned into [`Entity`] values by the
//! [`builder`]. Relations between entities are stored as indices into the
//! [`Timeline`]'s entity list, so the positioner can walk them without
//! cloning or hashing identifiers.
//!
//! # Lifecycle
//!
//! 1. **Build**: `become` chains are collapsed and relations resolved.
//! 2. **Annotate**: cluster membership is computed by the builder; relative
//!    rows are recorded by the positioner's first phase.
//! 3. **Finalise**: every entity receives a `row`.

pub mod builder;

mod entity;

pub use builder::build;
pub use entity::{Entity, RelativeRow, Segment, Span, YEAR_LIMIT};

use std::fmt;

use indexmap::IndexMap;

use strata_core::identifier::Id;

use crate::error::LayoutError;

/// A kind of relation between entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Become,
    Merge,
    Split,
    Fork,
    Link,
}

impl RelationKind {
    /// The input field name of this relation.
    pub fn name(self) -> &'static str {
        match self {
            Self::Become => "become",
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Fork => "fork",
            Self::Link => "links",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A non-fatal condition found while building or laying out a timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A relation names an id no entry declares; the relation is dropped.
    UnresolvedReference {
        entry: Id,
        relation: RelationKind,
        target: String,
    },
    /// A relation points back at the entry itself; the relation is dropped.
    SelfReference { entry: Id, relation: RelationKind },
    /// Two entries both `become` the same target; the later claim is dropped.
    ContinuationConflict { target: Id, kept: Id, dropped: Id },
    /// A manual row overlaps another manually pinned entry on the same row.
    ManualRowConflict { entry: Id, row: usize },
    /// Forcing a cluster into place would have moved a manually pinned entry.
    PinnedEntityBlocksForce { pinned: Id, master: Id },
}

impl Warning {
    /// Short machine-friendly tag, used as a log key.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::SelfReference { .. } => "self_reference",
            Self::ContinuationConflict { .. } => "continuation_conflict",
            Self::ManualRowConflict { .. } => "manual_row_conflict",
            Self::PinnedEntityBlocksForce { .. } => "pinned_entity_blocks_force",
        }
    }

    /// Whether the warning was raised by the positioner rather than the builder.
    pub(crate) fn is_layout(&self) -> bool {
        matches!(
            self,
            Self::ManualRowConflict { .. } | Self::PinnedEntityBlocksForce { .. }
        )
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedReference {
                entry,
                relation,
                target,
            } => write!(
                f,
                "`{entry}` {relation} `{target}`, but no entry has that id; relation ignored"
            ),
            Self::SelfReference { entry, relation } => {
                write!(f, "`{entry}` {relation} refers to itself; relation ignored")
            }
            Self::ContinuationConflict {
                target,
                kept,
                dropped,
            } => write!(
                f,
                "`{dropped}` and `{kept}` both become `{target}`; keeping `{kept}`"
            ),
            Self::ManualRowConflict { entry, row } => {
                write!(f, "`{entry}` is pinned to row {row}, which overlaps another pinned entry")
            }
            Self::PinnedEntityBlocksForce { pinned, master } => write!(
                f,
                "pinned entry `{pinned}` is in the way of cluster `{master}`; cluster shunted instead"
            ),
        }
    }
}

/// Logs a warning and appends it to `warnings`.
pub(crate) fn record_warning(warnings: &mut Vec<Warning>, warning: Warning) {
    log::warn!(kind = warning.kind(); "{warning}");
    warnings.push(warning);
}

/// A built timeline: entities plus the id index and collected warnings.
#[derive(Debug, Clone)]
pub struct Timeline {
    entities: Vec<Entity>,
    /// Every input id, collapsed continuation ids included, in input order.
    index: IndexMap<Id, usize>,
    warnings: Vec<Warning>,
}

impl Timeline {
    pub(crate) fn new(entities: Vec<Entity>, index: IndexMap<Id, usize>, warnings: Vec<Warning>) -> Self {
        Self {
            entities,
            index,
            warnings,
        }
    }

    /// All entities, in the input order of their first segment.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub(crate) fn entities_mut(&mut self) -> &mut Vec<Entity> {
        &mut self.entities
    }

    /// Returns the entity an input id belongs to.
    ///
    /// Ids collapsed into a continuation chain resolve to the chain's entity.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.index_of(id).map(|idx| &self.entities[idx])
    }

    /// Index into [`entities`](Self::entities) for an input id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        let id = Id::lookup(id)?;
        self.index.get(&id).copied()
    }

    /// Final row of the entity an input id belongs to.
    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.get(id).and_then(Entity::row)
    }

    /// Rows for every input id, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnplacedEntity`] if the layout has not run yet.
    pub fn row_assignments(&self) -> Result<Vec<(Id, usize)>, LayoutError> {
        self.index
            .iter()
            .map(|(id, &idx)| {
                self.entities[idx]
                    .row()
                    .map(|row| (*id, row))
                    .ok_or_else(|| LayoutError::UnplacedEntity { id: id.to_string() })
            })
            .collect()
    }

    /// All warnings, builder warnings first.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn warnings_mut(&mut self) -> &mut Vec<Warning> {
        &mut self.warnings
    }

    /// First and last occupied year over all entities, `None` when empty.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let first = self.entities.iter().map(|e| e.span().start()).min()?;
        let last = self.entities.iter().map(|e| e.span().cell_end()).max()?;
        Some((first, last))
    }

    /// Sum of all entity deviations, `0` before the layout has run.
    pub fn total_deviation(&self) -> u32 {
        self.entities.iter().filter_map(Entity::deviation).sum()
    }

    /// Clears everything the positioner computed so the layout can run again.
    pub(crate) fn reset_layout(&mut self) {
        for entity in &mut self.entities {
            entity.reset_layout();
        }
        self.warnings.retain(|warning| !warning.is_layout());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawEntry;

    fn timeline() -> Timeline {
        build(vec![
            RawEntry::new("model-a", 1900, 1950).with_become("model-b"),
            RawEntry::new("model-b", 1950, 1980),
            RawEntry::new("model-c", 1800, 1820).with_merge("model-missing"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_by_collapsed_id() {
        let timeline = timeline();

        assert_eq!(timeline.entities().len(), 2);
        assert_eq!(timeline.index_of("model-a"), timeline.index_of("model-b"));
        assert_eq!(timeline.get("model-b").unwrap().id(), "model-a");
        assert!(timeline.get("model-nope").is_none());
    }

    #[test]
    fn test_row_assignments_before_layout() {
        let timeline = timeline();

        assert!(timeline.row_of("model-a").is_none());
        assert!(matches!(
            timeline.row_assignments(),
            Err(LayoutError::UnplacedEntity { .. })
        ));
    }

    #[test]
    fn test_year_range() {
        assert_eq!(timeline().year_range(), Some((1800, 1980)));
    }

    #[test]
    fn test_warning_display() {
        let timeline = timeline();
        let warning = &timeline.warnings()[0];

        assert_eq!(warning.kind(), "unresolved_reference");
        assert_eq!(
            warning.to_string(),
            "`model-c` merge `model-missing`, but no entry has that id; relation ignored"
        );
    }
}
