//! Global placement of clusters.
//!
//! Clusters are visited from their root outward. Each one is placed as a
//! block: the cluster's local rows are translated by a base row chosen so
//! that members are free in the global grid. When a member of the cluster
//! already has a row (a manual pin, or a member shared with a cluster placed
//! earlier) the base is fixed by that anchor, and conflicts are resolved in
//! order by:
//!
//! 1. **forcing**: pushing the entities in the way down one row, cascading;
//! 2. **shunting**: inserting an empty local row to move the failing member
//!    away from the anchor, then retrying;
//! 3. **arbitrary placement**: the nearest free row to the member's target.

use std::collections::{HashSet, VecDeque};

use log::{debug, trace};

use super::positioner::Positioner;
use crate::{
    error::LayoutError,
    model::{Span, Warning, record_warning},
};

/// Shunts tried per cluster before falling back to arbitrary placement.
const MAX_SHUNTS: usize = 32;

impl Positioner<'_> {
    /// Places every cluster, root clusters first.
    pub(super) fn place_clusters(&mut self) -> Result<(), LayoutError> {
        let masters: Vec<usize> = self.clusters.keys().copied().collect();
        let mut visited = vec![false; self.entities.len()];

        for master in masters {
            let root = self.root_master(master)?;
            self.place_from(root, &mut visited)?;
            self.place_from(master, &mut visited)?;
        }

        debug!(clusters = self.order.len(); "Clusters placed");
        Ok(())
    }

    /// Topmost cluster master along the `split` parents of `master`.
    ///
    /// Merge targets are not followed: a merge can point at an entity that
    /// splits from the merging one, and `split` parents are the only links
    /// checked for cycles when the timeline is built.
    fn root_master(&self, master: usize) -> Result<usize, LayoutError> {
        let mut seen = HashSet::from([master]);
        let mut root = master;
        let mut current = master;

        while let Some(parent) = self.entities[current].split {
            if !seen.insert(parent) {
                return Err(LayoutError::RelationCycle {
                    id: self.entities[parent].id.to_string(),
                });
            }
            if self.clusters.contains_key(&parent) {
                root = parent;
            }
            current = parent;
        }

        Ok(root)
    }

    /// Breadth-first placement over clusters that share members.
    fn place_from(&mut self, start: usize, visited: &mut [bool]) -> Result<(), LayoutError> {
        let mut queue = VecDeque::from([start]);

        while let Some(master) = queue.pop_front() {
            if visited[master] || !self.clusters.contains_key(&master) {
                continue;
            }
            visited[master] = true;

            self.position_cluster(master)?;
            self.order.push(master);

            for &member in &self.clusters[&master].members {
                queue.extend(
                    self.memberships[member]
                        .iter()
                        .copied()
                        .filter(|&linked| !visited[linked]),
                );
            }
        }

        Ok(())
    }

    /// Gives every unplaced member of a cluster a row.
    pub(super) fn position_cluster(&mut self, master: usize) -> Result<(), LayoutError> {
        let mut shunts = 0;

        loop {
            let unplaced = self.unplaced_members(master);
            if unplaced.is_empty() {
                return Ok(());
            }

            let Some(anchor) = self.anchor(master) else {
                let base = self.fit_anywhere(master, &unplaced)?;
                debug!(master = master, base = base; "Cluster fitted");
                for member in unplaced {
                    let row = base + self.local_row(master, member);
                    self.assign(member, row)?;
                }
                return Ok(());
            };

            let base = self.base_for(master, anchor);
            let (reachable, stranded): (Vec<usize>, Vec<usize>) = unplaced
                .into_iter()
                .partition(|&member| self.target(master, base, member) >= 0);

            if self.fits_at(master, base, &reachable)? {
                debug!(master = master, anchor = anchor, base = base; "Cluster fitted at anchor");
                for &member in &reachable {
                    let row = self.target(master, base, member) as usize;
                    self.assign(member, row)?;
                }
                return self.place_arbitrarily(master, base, &stranded);
            }

            let Some(failing) = self.force_cluster(master, Some(anchor), base, &reachable)? else {
                return self.place_arbitrarily(master, base, &stranded);
            };

            let anchor_row = self.local_row(master, anchor);
            if shunts >= MAX_SHUNTS || failing == anchor_row {
                debug!(master = master, shunts = shunts; "Giving up on cluster shape");
                let remaining = self.unplaced_members(master);
                return self.place_arbitrarily(master, base, &remaining);
            }

            // Move the failing row away from the anchor
            let at = if failing < anchor_row { failing + 1 } else { failing };
            shunts += 1;
            if let Some(cluster) = self.clusters.get_mut(&master) {
                cluster.shunt(self.entities, at)?;
            }
        }
    }

    fn unplaced_members(&self, master: usize) -> Vec<usize> {
        self.clusters[&master]
            .members
            .iter()
            .copied()
            .filter(|&member| self.entities[member].row.is_none())
            .collect()
    }

    /// The master if it is placed, else the first placed member.
    fn anchor(&self, master: usize) -> Option<usize> {
        let members = &self.clusters[&master].members;
        members
            .iter()
            .copied()
            .find(|&member| self.entities[member].row.is_some())
    }

    pub(super) fn local_row(&self, master: usize, member: usize) -> usize {
        self.clusters[&master].local_row(self.entities, member)
    }

    /// Global row of local row 0 implied by the anchor's position.
    fn base_for(&self, master: usize, anchor: usize) -> isize {
        let anchor_row = self.entities[anchor].row.unwrap_or_default();
        anchor_row as isize - self.local_row(master, anchor) as isize
    }

    fn target(&self, master: usize, base: isize, member: usize) -> isize {
        base + self.local_row(master, member) as isize
    }

    /// Lowest base row at which all `members` are free.
    fn fit_anywhere(&self, master: usize, members: &[usize]) -> Result<usize, LayoutError> {
        let rows = self.grid.rows();
        for base in 0..rows {
            if self.fits_at(master, base as isize, members)? {
                return Ok(base);
            }
        }
        // Every row past the grid is free
        Ok(rows)
    }

    /// Whether every member is free at `base` plus its local row.
    ///
    /// Rows past the end of the grid count as free.
    fn fits_at(&self, master: usize, base: isize, members: &[usize]) -> Result<bool, LayoutError> {
        for &member in members {
            let target = self.target(master, base, member);
            if target < 0 {
                return Ok(false);
            }
            let target = target as usize;
            if target < self.grid.rows() && !self.grid.check_row(target, self.entities[member].span)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Forces `members` into their target rows around the anchor.
    ///
    /// Members are handled outward from the master: rows above it first,
    /// nearest first, then the master's row and the rows below. Each member
    /// placed becomes protected from later shifts.
    ///
    /// Returns the local row of the first member that could not be forced,
    /// or `None` when all of them were placed.
    ///
    /// # Errors
    ///
    /// [`LayoutError::ForceWithoutAnchor`] when `anchor` is `None`.
    pub(super) fn force_cluster(
        &mut self,
        master: usize,
        anchor: Option<usize>,
        base: isize,
        members: &[usize],
    ) -> Result<Option<usize>, LayoutError> {
        if anchor.is_none() {
            return Err(LayoutError::ForceWithoutAnchor {
                master: self.entities[master].id.to_string(),
            });
        }

        let master_row = self.local_row(master, master);
        let mut ordered = members.to_vec();
        ordered.sort_by_key(|&member| {
            let row = self.local_row(master, member);
            (row >= master_row, row.abs_diff(master_row))
        });

        let lowest = ordered
            .iter()
            .map(|&member| self.target(master, base, member))
            .max()
            .unwrap_or(base);
        self.grid.ensure_rows(lowest.max(0) as usize + 1);

        let mut protected: HashSet<usize> = self.clusters[&master]
            .members
            .iter()
            .copied()
            .filter(|&member| self.entities[member].row.is_some())
            .collect();

        for member in ordered {
            let target = self.target(master, base, member).max(0) as usize;
            let span = self.entities[member].span;

            if !self.grid.check_row(target, span)?
                && !self.shift_grid_entries(target, span, &protected, master)?
            {
                return Ok(Some(self.local_row(master, member)));
            }

            trace!(master = master, member = member, row = target; "Member forced");
            self.assign(member, target)?;
            protected.insert(member);
        }

        Ok(None)
    }

    /// Frees `span` on `row` by pushing every entity in the way down one row.
    ///
    /// Pushed entities push whatever is in their way on the next row, and so
    /// on. Nothing moves if the cascade reaches a manually pinned or a
    /// `protected` entity; `false` is returned in that case.
    pub(super) fn shift_grid_entries(
        &mut self,
        row: usize,
        span: Span,
        protected: &HashSet<usize>,
        master: usize,
    ) -> Result<bool, LayoutError> {
        let mut moving = vec![false; self.entities.len()];
        let mut moves: Vec<(usize, usize)> = Vec::new();
        let mut worklist = vec![(row, span)];

        while let Some((row, wanted)) = worklist.pop() {
            for (idx, entity) in self.entities.iter().enumerate() {
                if moving[idx] || entity.row != Some(row) || !entity.span.conflicts_with(wanted) {
                    continue;
                }

                if entity.manual_row.is_some() {
                    let warning = Warning::PinnedEntityBlocksForce {
                        pinned: entity.id,
                        master: self.entities[master].id,
                    };
                    if !self.warnings.contains(&warning) {
                        record_warning(&mut self.warnings, warning);
                    }
                    return Ok(false);
                }
                if protected.contains(&idx) {
                    trace!(row = row, blocker = idx; "Shift blocked by protected entity");
                    return Ok(false);
                }

                moving[idx] = true;
                moves.push((idx, row));
                worklist.push((row + 1, entity.span));
            }
        }

        // Deepest first
        moves.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(&(_, deepest)) = moves.first() {
            self.grid.ensure_rows(deepest + 2);
        }

        for (idx, from) in moves {
            let span = self.entities[idx].span;
            self.grid.free(from, span)?;
            self.grid.block(from + 1, span)?;
            self.entities[idx].row = Some(from + 1);
            trace!(entity = idx, from = from, to = from + 1; "Entity shifted down");
        }

        Ok(true)
    }

    /// Puts each member on the free row nearest its cluster target.
    fn place_arbitrarily(&mut self, master: usize, base: isize, members: &[usize]) -> Result<(), LayoutError> {
        for &member in members {
            let target = self.target(master, base, member).max(0) as usize;
            let row = self
                .grid
                .find_nearest_free_row(target, self.entities[member].span)?;
            debug!(master = master, member = member, target = target, row = row; "Member placed arbitrarily");
            self.assign(member, row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{input::RawEntry, model};

    fn positioner_for(timeline: &mut model::Timeline) -> Positioner<'_> {
        let mut positioner = Positioner::new(timeline.entities_mut());
        positioner.pin_manual_rows().unwrap();
        positioner.calculate_cluster_positions().unwrap();
        positioner
    }

    #[test]
    fn test_force_without_anchor_is_fatal() {
        let mut timeline = model::build(vec![
            RawEntry::new("f-parent", 1900, 2000),
            RawEntry::new("f-child", 1950, 1990).with_split("f-parent"),
        ])
        .unwrap();
        let mut positioner = positioner_for(&mut timeline);

        let err = positioner.force_cluster(0, None, 0, &[0, 1]).unwrap_err();
        assert_eq!(
            err,
            LayoutError::ForceWithoutAnchor {
                master: "f-parent".to_string()
            }
        );
        assert_eq!(err.to_string(), "cannot force position without a row (cluster `f-parent`)");
    }

    #[test]
    fn test_shift_cascades_downward() {
        let mut timeline = model::build(vec![
            RawEntry::new("top", 1900, 1950),
            RawEntry::new("middle", 1940, 1990),
            RawEntry::new("bottom", 1980, 2000),
            RawEntry::new("bystander", 1800, 1850),
        ])
        .unwrap();
        let mut positioner = positioner_for(&mut timeline);
        positioner.assign(0, 0).unwrap();
        positioner.assign(1, 1).unwrap();
        positioner.assign(2, 2).unwrap();
        positioner.assign(3, 0).unwrap();

        let shifted = positioner
            .shift_grid_entries(0, Span::new(1900, 1920), &HashSet::new(), 0)
            .unwrap();

        assert!(shifted);
        let rows: Vec<_> = positioner.entities.iter().map(|e| e.row).collect();
        assert_eq!(rows, [Some(1), Some(2), Some(3), Some(0)]);
        assert!(positioner.grid.check_row(0, Span::new(1900, 1920)).unwrap());
        assert!(!positioner.grid.check_row(0, Span::new(1800, 1850)).unwrap());
    }

    #[test]
    fn test_shift_blocked_by_pin_changes_nothing() {
        let mut timeline = model::build(vec![
            RawEntry::new("movable", 1900, 1950),
            RawEntry::new("pinned", 1940, 1990).with_row(1),
        ])
        .unwrap();
        let mut positioner = positioner_for(&mut timeline);
        positioner.assign(0, 0).unwrap();
        let grid = positioner.grid.clone();

        let shifted = positioner
            .shift_grid_entries(0, Span::new(1900, 1920), &HashSet::new(), 0)
            .unwrap();

        assert!(!shifted);
        assert_eq!(positioner.entities[0].row, Some(0));
        assert_eq!(positioner.grid, grid);
        assert!(matches!(
            positioner.warnings.as_slice(),
            [Warning::PinnedEntityBlocksForce { .. }]
        ));
    }

    #[test]
    fn test_shift_blocked_by_protected() {
        let mut timeline = model::build(vec![RawEntry::new("guarded", 1900, 1950)]).unwrap();
        let mut positioner = positioner_for(&mut timeline);
        positioner.assign(0, 0).unwrap();

        let shifted = positioner
            .shift_grid_entries(0, Span::new(1900, 1920), &HashSet::from([0]), 0)
            .unwrap();

        assert!(!shifted);
        assert!(positioner.warnings.is_empty());
    }

    #[test]
    fn test_anchored_cluster_forces_space() {
        let mut timeline = model::build(vec![
            RawEntry::new("anchor", 1900, 2000).with_row(0),
            RawEntry::new("occupant", 1960, 1990),
            RawEntry::new("up", 1950, 2000).with_split("anchor"),
            RawEntry::new("down", 1950, 2000).with_split("anchor"),
        ])
        .unwrap();
        let mut positioner = positioner_for(&mut timeline);
        assert_eq!(positioner.local_row(0, 2), 0);
        assert_eq!(positioner.local_row(0, 0), 1);
        assert_eq!(positioner.local_row(0, 3), 2);

        // `down` wants the row below the anchor, which is taken
        positioner.assign(1, 1).unwrap();
        positioner.position_cluster(0).unwrap();

        assert_eq!(positioner.entities[3].row, Some(1));
        assert_eq!(positioner.entities[1].row, Some(2));
        // `up` would be above row 0, so it goes to the nearest free row
        assert_eq!(positioner.entities[2].row, Some(3));
    }

    #[test]
    fn test_pinned_obstacle_shunts_member_away() {
        let mut timeline = model::build(vec![
            RawEntry::new("p-anchor", 1900, 2000).with_row(0),
            RawEntry::new("p-wall", 1960, 1990).with_row(1),
            RawEntry::new("p-up", 1950, 2000).with_split("p-anchor"),
            RawEntry::new("p-down", 1950, 2000).with_split("p-anchor"),
        ])
        .unwrap();
        let mut positioner = positioner_for(&mut timeline);

        positioner.position_cluster(0).unwrap();

        assert_eq!(positioner.entities[1].row, Some(1));
        assert_eq!(positioner.entities[3].row, Some(2));
        assert_eq!(positioner.local_row(0, 3) - positioner.local_row(0, 0), 2);
        assert!(matches!(
            positioner.warnings.as_slice(),
            [Warning::PinnedEntityBlocksForce { .. }]
        ));
    }
}
