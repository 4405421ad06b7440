//! The row positioner.
//!
//! Runs the layout phases over a [`Timeline`]:
//!
//! 0. block manually pinned rows;
//! 1. lay out every cluster on its own local grid;
//! 2. place clusters in the global grid (see [`placement`](super::placement));
//! 3. move clustered entities to free rows closer to where their clusters
//!    want them;
//! 4. put everything still without a row on the first free row;
//! 5. score how far each entity ended up from its cluster targets.

use indexmap::IndexMap;
use log::{debug, info, trace};

use super::{cluster::Cluster, grid::Grid};
use crate::{
    config::LayoutConfig,
    error::LayoutError,
    model::{Entity, Timeline, Warning, record_warning},
};

/// Statistics of a finished layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSummary {
    /// Rows in the global grid.
    pub rows: usize,
    /// Clusters placed as a block.
    pub clusters: usize,
    /// Entities moved by the adjustment pass.
    pub adjusted: usize,
    /// Sum of all entity deviations.
    pub deviation: u32,
}

/// Assigns a row to every entity of `timeline`.
///
/// Any previous layout is discarded first, so running this twice gives the
/// same rows. Manually pinned rows are never changed.
///
/// # Errors
///
/// Returns a [`LayoutError`] if an internal invariant breaks.
///
/// # Examples
///
/// ```
/// # use strata::{config::LayoutConfig, input::RawEntry, layout, model};
/// let mut timeline = model::build(vec![
///     RawEntry::new("a", 1900, 1950),
///     RawEntry::new("b", 1900, 1950),
/// ])
/// .unwrap();
///
/// let summary = layout::layout(&mut timeline, &LayoutConfig::default()).unwrap();
/// assert_eq!(summary.rows, 2);
/// assert_ne!(timeline.row_of("a"), timeline.row_of("b"));
/// ```
pub fn layout(timeline: &mut Timeline, config: &LayoutConfig) -> Result<LayoutSummary, LayoutError> {
    info!(entities = timeline.entities().len(); "Laying out timeline");
    timeline.reset_layout();

    let mut positioner = Positioner::new(timeline.entities_mut());
    positioner.pin_manual_rows()?;
    positioner.calculate_cluster_positions()?;
    positioner.place_clusters()?;
    let adjusted = if config.adjustment_pass() {
        positioner.adjust()?
    } else {
        debug!("Adjustment pass disabled");
        0
    };
    positioner.place_leftovers()?;
    let deviation = positioner.account_deviation();

    let summary = LayoutSummary {
        rows: positioner.grid.rows(),
        clusters: positioner.order.len(),
        adjusted,
        deviation,
    };
    let warnings = positioner.warnings;
    timeline.warnings_mut().extend(warnings);

    info!(
        rows = summary.rows,
        clusters = summary.clusters,
        adjusted = summary.adjusted,
        deviation = summary.deviation;
        "Layout calculated"
    );
    Ok(summary)
}

/// Layout state: the entities being placed, the global grid and the clusters.
pub(super) struct Positioner<'a> {
    pub(super) entities: &'a mut [Entity],
    pub(super) grid: Grid,
    /// Keyed by master, in input order.
    pub(super) clusters: IndexMap<usize, Cluster>,
    /// Masters of every cluster an entity belongs to.
    pub(super) memberships: Vec<Vec<usize>>,
    /// Masters in the order their clusters were placed.
    pub(super) order: Vec<usize>,
    pub(super) warnings: Vec<Warning>,
}

impl<'a> Positioner<'a> {
    pub(super) fn new(entities: &'a mut [Entity]) -> Self {
        let grid = Grid::for_spans(entities.iter().map(Entity::span));
        let memberships = vec![Vec::new(); entities.len()];
        Self {
            entities,
            grid,
            clusters: IndexMap::new(),
            memberships,
            order: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Gives `entity` the row `row` and blocks it in the grid.
    pub(super) fn assign(&mut self, entity: usize, row: usize) -> Result<(), LayoutError> {
        let span = self.entities[entity].span;
        self.grid.ensure_rows(row + 1);
        self.grid.block(row, span)?;
        self.entities[entity].row = Some(row);
        Ok(())
    }

    /// Blocks every manually pinned row before anything else is placed.
    pub(super) fn pin_manual_rows(&mut self) -> Result<(), LayoutError> {
        for idx in 0..self.entities.len() {
            let Some(row) = self.entities[idx].manual_row else {
                continue;
            };
            let span = self.entities[idx].span;

            self.grid.ensure_rows(row + 1);
            if !self.grid.check_row(row, span)? {
                let entry = self.entities[idx].id;
                record_warning(&mut self.warnings, Warning::ManualRowConflict { entry, row });
            }
            self.assign(idx, row)?;
        }
        Ok(())
    }

    /// Phase 1: relative layout of every annotated cluster.
    pub(super) fn calculate_cluster_positions(&mut self) -> Result<(), LayoutError> {
        for master in 0..self.entities.len() {
            if self.entities[master].cluster.is_none() {
                continue;
            }
            let cluster = Cluster::calculate_positions(self.entities, master)?;
            for &member in &cluster.members {
                self.memberships[member].push(master);
            }
            self.clusters.insert(master, cluster);
        }

        debug!(clusters = self.clusters.len(); "Relative cluster layout done");
        Ok(())
    }

    /// Row an entity's cluster `master` wants it on, if the master is placed.
    fn cluster_target(&self, entity: usize, master: usize) -> Option<isize> {
        let relative = self.entities[entity].relative_rows.get(&master)?;
        let master_row = self.entities[master].row?;
        Some(master_row as isize + relative.relative)
    }

    /// Total distance of `row` from every cluster target of `entity`.
    fn cost(&self, entity: usize, row: usize) -> u32 {
        self.entities[entity]
            .relative_rows
            .keys()
            .filter(|&&master| master != entity)
            .filter_map(|&master| self.cluster_target(entity, master))
            .map(|target| target.abs_diff(row as isize) as u32)
            .sum()
    }

    /// Phase 3: moves automatically placed cluster members to free rows
    /// closer to their cluster targets, in reverse placement order.
    ///
    /// Returns the number of entities moved.
    pub(super) fn adjust(&mut self) -> Result<usize, LayoutError> {
        let mut adjusted = 0;
        let order: Vec<usize> = self.order.iter().rev().copied().collect();

        for master in order {
            let members = self.clusters[&master].members.clone();
            for member in members {
                if self.adjust_member(member)? {
                    adjusted += 1;
                }
            }
        }

        debug!(adjusted = adjusted; "Adjustment pass done");
        Ok(adjusted)
    }

    /// Moves `member` to the free row within its preference range that most
    /// lowers the deviation of `member` and of every entity whose cluster
    /// target follows it. Moves that do not strictly lower it are skipped.
    fn adjust_member(&mut self, member: usize) -> Result<bool, LayoutError> {
        if self.entities[member].manual_row.is_some() {
            return Ok(false);
        }
        let Some(row) = self.entities[member].row else {
            return Ok(false);
        };

        let preference: isize = self.entities[member]
            .relative_rows
            .keys()
            .filter(|&&master| master != member)
            .filter_map(|&master| self.cluster_target(member, master))
            .map(|target| target - row as isize)
            .sum();
        if preference == 0 {
            return Ok(false);
        }

        let row_signed = row as isize;
        let (low, high) = if preference < 0 {
            (row_signed + preference, row_signed - 1)
        } else {
            (row_signed + 1, row_signed + preference)
        };

        let affected = self.followers(member);
        let span = self.entities[member].span;
        let mut best = (row, self.deviation_with(member, row, &affected));
        for candidate in low.max(0)..=high {
            let candidate = candidate as usize;
            let free = candidate >= self.grid.rows() || self.grid.check_row(candidate, span)?;
            if !free {
                continue;
            }
            let deviation = self.deviation_with(member, candidate, &affected);
            if deviation < best.1 {
                best = (candidate, deviation);
            }
        }

        if best.0 == row {
            return Ok(false);
        }

        trace!(entity = member, from = row, to = best.0, deviation = best.1; "Adjusted entity row");
        self.grid.free(row, span)?;
        self.assign(member, best.0)?;
        Ok(true)
    }

    /// `entity` plus the members of the cluster it masters, whose targets
    /// move with it.
    fn followers(&self, entity: usize) -> Vec<usize> {
        let mut followers = vec![entity];
        if let Some(cluster) = self.clusters.get(&entity) {
            followers.extend(cluster.members.iter().copied().filter(|&m| m != entity));
        }
        followers
    }

    /// Deviation of `affected` if `entity` sat on `row`.
    fn deviation_with(&mut self, entity: usize, row: usize, affected: &[usize]) -> u32 {
        let previous = self.entities[entity].row.replace(row);
        let deviation = affected
            .iter()
            .filter_map(|&e| self.entities[e].row.map(|r| self.cost(e, r)))
            .sum();
        self.entities[entity].row = previous;
        deviation
    }

    /// Phase 4: first free row for every entity still without one.
    pub(super) fn place_leftovers(&mut self) -> Result<(), LayoutError> {
        let mut placed = 0;
        for idx in 0..self.entities.len() {
            if self.entities[idx].row.is_some() {
                continue;
            }
            let row = self.grid.find_first_free_row(self.entities[idx].span, 0)?;
            self.assign(idx, row)?;
            placed += 1;
        }

        debug!(placed = placed; "Leftover entities placed");
        Ok(())
    }

    /// Phase 5: records each entity's deviation and returns the total.
    pub(super) fn account_deviation(&mut self) -> u32 {
        let mut total = 0;
        for idx in 0..self.entities.len() {
            let deviation = match self.entities[idx].row {
                Some(row) => self.cost(idx, row),
                None => 0,
            };
            self.entities[idx].deviation = Some(deviation);
            total += deviation;
        }
        total
    }
}
