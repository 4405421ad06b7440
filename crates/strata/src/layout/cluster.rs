//! Cluster-local relative layout.
//!
//! Before anything is placed globally, every cluster is laid out on its own
//! small grid. The resulting rows are stored on each member as a
//! [`RelativeRow`] keyed by the cluster master, and the global placement only
//! ever moves the cluster as a whole.

use log::{debug, trace};

use super::grid::Grid;
use crate::{
    error::LayoutError,
    model::{Entity, RelativeRow},
};

/// A cluster and its local grid, keyed in the positioner by master index.
#[derive(Debug, Clone)]
pub(super) struct Cluster {
    pub(super) master: usize,
    /// Master first.
    pub(super) members: Vec<usize>,
    pub(super) grid: Grid,
}

impl Cluster {
    /// Lays out the cluster of `master` relative to the master's row.
    ///
    /// Members that already have a row keep their distances. The master goes
    /// first, then members directly connected to it by `split` or `merge`,
    /// then everybody else, each on the free local row nearest the master.
    pub(super) fn calculate_positions(entities: &mut [Entity], master: usize) -> Result<Self, LayoutError> {
        let members = entities[master]
            .cluster
            .clone()
            .unwrap_or_else(|| vec![master]);

        // Room above and below so nearest-row searches can go either way
        let headroom = members.len();
        let mut grid = Grid::for_spans(members.iter().map(|&m| entities[m].span));
        let lowest_pinned = members.iter().filter_map(|&m| entities[m].row).max();
        grid.ensure_rows(2 * headroom + lowest_pinned.map_or(1, |row| row + 1));

        let mut local: Vec<Option<usize>> = vec![None; members.len()];
        for (slot, &member) in local.iter_mut().zip(&members) {
            if let Some(row) = entities[member].row {
                grid.block(headroom + row, entities[member].span)?;
                *slot = Some(headroom + row);
            }
        }

        let master_row = match local[0] {
            Some(row) => row,
            None => {
                let target = local.iter().flatten().next().copied().unwrap_or(headroom);
                let row = grid.find_nearest_free_row(target, entities[master].span)?;
                grid.block(row, entities[master].span)?;
                local[0] = Some(row);
                row
            }
        };

        let connected = |member: usize| {
            entities[member].split == Some(master)
                || entities[member].merge == Some(master)
                || entities[master].merge == Some(member)
        };
        let connected: Vec<bool> = members.iter().map(|&m| connected(m)).collect();

        for direct_only in [true, false] {
            for (i, &member) in members.iter().enumerate().skip(1) {
                if local[i].is_some() || (direct_only && !connected[i]) {
                    continue;
                }
                let span = entities[member].span;
                let row = grid.find_nearest_free_row(master_row, span)?;
                grid.block(row, span)?;
                local[i] = Some(row);
            }
        }

        let trimmed = grid.trim_leading_empty_rows();
        let master_row = master_row - trimmed;

        for (&member, row) in members.iter().zip(local) {
            let Some(row) = row else { continue };
            let row = row - trimmed;
            let relative = row as isize - master_row as isize;
            trace!(master = master, member = member, row = row, relative = relative; "Relative row");
            entities[member]
                .relative_rows
                .insert(master, RelativeRow { row, relative });
        }

        debug!(
            master = master,
            members = members.len(),
            rows = grid.rows();
            "Cluster laid out"
        );

        Ok(Self {
            master,
            members,
            grid,
        })
    }

    /// Row of `member` in this cluster's local grid.
    pub(super) fn local_row(&self, entities: &[Entity], member: usize) -> usize {
        entities[member]
            .relative_rows
            .get(&self.master)
            .map_or(0, |relative| relative.row)
    }

    /// Inserts an empty local row at `at`, pushing members on it and below
    /// down by one, and recomputes every member's offset.
    pub(super) fn shunt(&mut self, entities: &mut [Entity], at: usize) -> Result<(), LayoutError> {
        self.grid.insert_row(at)?;

        for &member in &self.members {
            if let Some(relative) = entities[member].relative_rows.get_mut(&self.master) {
                if relative.row >= at {
                    relative.row += 1;
                }
            }
        }

        let master_row = self.local_row(entities, self.master) as isize;
        for &member in &self.members {
            if let Some(relative) = entities[member].relative_rows.get_mut(&self.master) {
                relative.relative = relative.row as isize - master_row;
            }
        }

        debug!(master = self.master, at = at; "Cluster shunted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{input::RawEntry, model};

    fn relative(entities: &[Entity], member: usize, master: usize) -> RelativeRow {
        entities[member].relative_rows[&master]
    }

    #[test]
    fn test_split_children_around_master() {
        let mut timeline = model::build(vec![
            RawEntry::new("parent", 1900, 2000),
            RawEntry::new("child-1", 1950, 2000).with_split("parent"),
            RawEntry::new("child-2", 1960, 1990).with_split("parent"),
        ])
        .unwrap();
        let entities = timeline.entities_mut();

        let cluster = Cluster::calculate_positions(entities, 0).unwrap();

        assert_eq!(cluster.members, [0, 1, 2]);
        // Ties go to the lower row, so the first child sits above the parent
        assert_eq!(relative(entities, 0, 0), RelativeRow { row: 1, relative: 0 });
        assert_eq!(relative(entities, 1, 0), RelativeRow { row: 0, relative: -1 });
        assert_eq!(relative(entities, 2, 0), RelativeRow { row: 2, relative: 1 });
        assert!(cluster.grid.rows() >= 3);
    }

    #[test]
    fn test_non_overlapping_member_shares_master_row() {
        let mut timeline = model::build(vec![
            RawEntry::new("first", 1850, 1900).with_merge("second"),
            RawEntry::new("second", 1900, 1950),
            RawEntry::new("late", 1960, 1990).with_split("first"),
        ])
        .unwrap();
        let entities = timeline.entities_mut();

        Cluster::calculate_positions(entities, 0).unwrap();

        // `second` touches `first`, `late` is far enough away to share its row
        assert_eq!(relative(entities, 1, 0).relative, -1);
        assert_eq!(relative(entities, 2, 0).relative, 0);
    }

    #[test]
    fn test_pinned_member_keeps_distance() {
        let mut timeline = model::build(vec![
            RawEntry::new("pin-parent", 1900, 2000),
            RawEntry::new("pin-child", 1950, 1990)
                .with_split("pin-parent")
                .with_row(4),
        ])
        .unwrap();
        let entities = timeline.entities_mut();

        Cluster::calculate_positions(entities, 0).unwrap();

        // The master lands next to the pinned child, on the lower index
        assert_eq!(relative(entities, 1, 0).relative, 1);
    }

    #[test]
    fn test_shunt_recomputes_offsets() {
        let mut timeline = model::build(vec![
            RawEntry::new("s-parent", 1900, 2000),
            RawEntry::new("s-child-1", 1950, 2000).with_split("s-parent"),
            RawEntry::new("s-child-2", 1960, 1990).with_split("s-parent"),
        ])
        .unwrap();
        let entities = timeline.entities_mut();
        let mut cluster = Cluster::calculate_positions(entities, 0).unwrap();
        let rows = cluster.grid.rows();

        cluster.shunt(entities, 2).unwrap();

        assert_eq!(cluster.grid.rows(), rows + 1);
        assert_eq!(relative(entities, 0, 0), RelativeRow { row: 1, relative: 0 });
        assert_eq!(relative(entities, 1, 0), RelativeRow { row: 0, relative: -1 });
        assert_eq!(relative(entities, 2, 0), RelativeRow { row: 3, relative: 2 });

        cluster.shunt(entities, 1).unwrap();
        assert_eq!(relative(entities, 1, 0).relative, -2);
    }
}
