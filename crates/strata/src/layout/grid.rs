//! Occupancy grid over (row, year) cells.
//!
//! The grid covers a fixed range of year columns and a growing list of rows.
//! Blocking a span marks its cells plus one buffer cell on each side, so two
//! spans blocked on the same row never touch.
//!
//! Cells count how many blocks cover them rather than holding a flag: a
//! buffer cell shared by two neighbours stays used until both are freed.
//!
//! ```
//! # use strata::layout::Grid;
//! # use strata::model::Span;
//! let mut grid = Grid::new(1899, 103);
//! grid.add_row();
//!
//! grid.block(0, Span::new(1900, 1950))?;
//! assert!(!grid.check_row(0, Span::new(1950, 1960))?); // buffer cell
//! assert!(grid.check_row(0, Span::new(1951, 1960))?);
//!
//! assert_eq!(grid.find_first_free_row(Span::new(1920, 1930), 0)?, 1);
//! assert_eq!(grid.rows(), 2);
//! # Ok::<(), strata::LayoutError>(())
//! ```

use std::ops::Range;

use log::trace;

use crate::{error::LayoutError, model::Span};

/// A 2-D occupancy map: rows of year cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Year of column 0.
    origin: i32,
    columns: usize,
    cells: Vec<Vec<u16>>,
}

impl Grid {
    /// Creates a grid with no rows covering `columns` years from `origin`.
    pub fn new(origin: i32, columns: usize) -> Self {
        Self {
            origin,
            columns,
            cells: Vec::new(),
        }
    }

    /// Creates an empty grid wide enough for `spans` and their buffers.
    pub fn for_spans(spans: impl IntoIterator<Item = Span>) -> Self {
        let mut first = None::<i32>;
        let mut last = None::<i32>;
        for span in spans {
            first = Some(first.map_or(span.start(), |f| f.min(span.start())));
            last = Some(last.map_or(span.cell_end(), |l| l.max(span.cell_end())));
        }

        match (first, last) {
            (Some(first), Some(last)) => {
                let origin = first.saturating_sub(1);
                // One buffer column past the last occupied cell
                let columns = i64::from(last) + 1 - i64::from(origin);
                Self::new(origin, usize::try_from(columns).unwrap_or(0))
            }
            _ => Self::new(0, 0),
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// Number of year columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Year of the first column.
    pub fn origin(&self) -> i32 {
        self.origin
    }

    fn column_range(&self, span: Span) -> Result<Range<usize>, LayoutError> {
        let origin = i64::from(self.origin);
        let last = origin + self.columns as i64;
        let (start, end) = (i64::from(span.start()), i64::from(span.cell_end()));
        if start < origin || end > last {
            return Err(LayoutError::ColumnOutOfBounds {
                start: span.start(),
                end: span.cell_end(),
                first: self.origin,
                last: i32::try_from(last).unwrap_or(i32::MAX),
            });
        }

        Ok((start - origin) as usize..(end - origin) as usize)
    }

    /// Column range of a span widened by the buffer cell on each side.
    fn buffered_range(&self, span: Span) -> Result<Range<usize>, LayoutError> {
        let range = self.column_range(span)?;
        Ok(range.start.saturating_sub(1)..(range.end + 1).min(self.columns))
    }

    fn row_cells(&self, row: usize) -> Result<&[u16], LayoutError> {
        self.cells
            .get(row)
            .map(Vec::as_slice)
            .ok_or(LayoutError::RowOutOfBounds {
                row,
                rows: self.rows(),
            })
    }

    fn row_cells_mut(&mut self, row: usize) -> Result<&mut [u16], LayoutError> {
        let rows = self.rows();
        self.cells
            .get_mut(row)
            .map(Vec::as_mut_slice)
            .ok_or(LayoutError::RowOutOfBounds { row, rows })
    }

    /// True when every cell of `span` is free on `row`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::RowOutOfBounds`] or [`LayoutError::ColumnOutOfBounds`].
    pub fn check_row(&self, row: usize, span: Span) -> Result<bool, LayoutError> {
        let columns = self.column_range(span)?;
        let cells = self.row_cells(row)?;
        Ok(cells[columns].iter().all(|&count| count == 0))
    }

    /// True when `span` is free on every row of `rows`.
    pub fn check_range(&self, rows: Range<usize>, span: Span) -> Result<bool, LayoutError> {
        for row in rows {
            if !self.check_row(row, span)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True when nothing is blocked on `row`.
    pub fn is_row_empty(&self, row: usize) -> Result<bool, LayoutError> {
        Ok(self.row_cells(row)?.iter().all(|&count| count == 0))
    }

    /// Marks `span` and its buffer cells as used on `row`.
    pub fn block(&mut self, row: usize, span: Span) -> Result<(), LayoutError> {
        let columns = self.buffered_range(span)?;
        trace!(row = row, start = span.start(), end = span.end(); "Grid block");

        for cell in &mut self.row_cells_mut(row)?[columns] {
            *cell += 1;
        }
        Ok(())
    }

    /// Releases a span previously passed to [`block`](Self::block).
    pub fn free(&mut self, row: usize, span: Span) -> Result<(), LayoutError> {
        let columns = self.buffered_range(span)?;
        trace!(row = row, start = span.start(), end = span.end(); "Grid free");

        for cell in &mut self.row_cells_mut(row)?[columns] {
            *cell = cell.saturating_sub(1);
        }
        Ok(())
    }

    /// Appends an empty row and returns its index.
    pub fn add_row(&mut self) -> usize {
        self.cells.push(vec![0; self.columns]);
        self.cells.len() - 1
    }

    /// Grows the grid to at least `rows` rows.
    pub fn ensure_rows(&mut self, rows: usize) {
        while self.rows() < rows {
            self.add_row();
        }
    }

    /// Inserts an empty row before `at`, shifting later rows down.
    pub fn insert_row(&mut self, at: usize) -> Result<(), LayoutError> {
        if at > self.rows() {
            return Err(LayoutError::RowOutOfBounds {
                row: at,
                rows: self.rows(),
            });
        }
        self.cells.insert(at, vec![0; self.columns]);
        Ok(())
    }

    /// Removes all-free rows from the top and returns how many were removed.
    pub fn trim_leading_empty_rows(&mut self) -> usize {
        let leading = self
            .cells
            .iter()
            .take_while(|row| row.iter().all(|&count| count == 0))
            .count();
        self.cells.drain(..leading);
        leading
    }

    /// First row at or after `from` where `span` is free.
    ///
    /// Grows the grid when no existing row qualifies.
    pub fn find_first_free_row(&mut self, span: Span, from: usize) -> Result<usize, LayoutError> {
        self.column_range(span)?;

        for row in from..self.rows() {
            if self.check_row(row, span)? {
                return Ok(row);
            }
        }

        if from >= self.rows() {
            self.ensure_rows(from + 1);
            return Ok(from);
        }
        Ok(self.add_row())
    }

    /// Free row closest to `target`; on equal distance the lower index wins.
    ///
    /// Rows at or past the end of the grid are free, so when `target` is
    /// beyond the last row the grid grows to include it.
    pub fn find_nearest_free_row(&mut self, target: usize, span: Span) -> Result<usize, LayoutError> {
        self.column_range(span)?;

        if target >= self.rows() {
            self.ensure_rows(target + 1);
            return Ok(target);
        }
        if self.check_row(target, span)? {
            return Ok(target);
        }

        for distance in 1.. {
            let above = target.checked_sub(distance);
            let below = Some(target + distance).filter(|&row| row < self.rows());
            if above.is_none() && below.is_none() {
                break;
            }

            if let Some(row) = above {
                if self.check_row(row, span)? {
                    return Ok(row);
                }
            }
            if let Some(row) = below {
                if self.check_row(row, span)? {
                    return Ok(row);
                }
            }
        }

        Ok(self.add_row())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize) -> Grid {
        let mut grid = Grid::for_spans([Span::new(1900, 2000)]);
        grid.ensure_rows(rows);
        grid
    }

    #[test]
    fn test_for_spans_covers_buffers() {
        let grid = Grid::for_spans([Span::new(1900, 1950), Span::new(1940, 2000)]);
        assert_eq!(grid.origin(), 1899);
        assert_eq!(grid.columns(), 102);
        assert_eq!(grid.rows(), 0);
    }

    #[test]
    fn test_zero_length_span_occupies_one_cell() {
        let mut grid = grid(1);
        grid.block(0, Span::new(1950, 1950)).unwrap();

        assert!(!grid.check_row(0, Span::new(1950, 1950)).unwrap());
        assert!(!grid.check_row(0, Span::new(1951, 1951)).unwrap());
        assert!(grid.check_row(0, Span::new(1952, 1952)).unwrap());
    }

    #[test]
    fn test_block_and_free_round_trip() {
        let mut grid = grid(1);
        let span = Span::new(1920, 1930);

        grid.block(0, span).unwrap();
        assert!(!grid.check_row(0, span).unwrap());
        grid.free(0, span).unwrap();
        assert!(grid.check_row(0, span).unwrap());
        assert!(grid.is_row_empty(0).unwrap());
    }

    #[test]
    fn test_free_keeps_shared_buffer() {
        let mut grid = grid(1);
        let left = Span::new(1900, 1920);
        let right = Span::new(1921, 1940);

        grid.block(0, left).unwrap();
        grid.block(0, right).unwrap();
        grid.free(0, right).unwrap();

        // 1920 is still the buffer of `left`
        assert!(!grid.check_row(0, Span::new(1920, 1920)).unwrap());
        assert!(grid.check_row(0, Span::new(1921, 1930)).unwrap());
    }

    #[test]
    fn test_block_at_grid_edges() {
        let mut grid = grid(1);
        grid.block(0, Span::new(1900, 2000)).unwrap();
        grid.free(0, Span::new(1900, 2000)).unwrap();
        assert!(grid.is_row_empty(0).unwrap());
    }

    #[test]
    fn test_out_of_bounds_is_error() {
        let mut grid = grid(1);

        assert_eq!(
            grid.check_row(3, Span::new(1900, 1910)),
            Err(LayoutError::RowOutOfBounds { row: 3, rows: 1 })
        );
        assert!(matches!(
            grid.block(0, Span::new(1800, 1910)),
            Err(LayoutError::ColumnOutOfBounds { .. })
        ));
        assert!(matches!(
            grid.find_first_free_row(Span::new(1990, 2100), 0),
            Err(LayoutError::ColumnOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_extreme_years_are_errors_not_overflows() {
        let grid = Grid::for_spans([Span::new(-2_000_000_000, -2_000_000_000), Span::new(i32::MAX, i32::MAX)]);
        assert_eq!(grid.origin(), -2_000_000_001);

        let mut narrow = Grid::new(1900, 10);
        narrow.add_row();
        assert!(matches!(
            narrow.check_row(0, Span::new(i32::MIN, i32::MAX)),
            Err(LayoutError::ColumnOutOfBounds { .. })
        ));
        assert!(matches!(
            narrow.block(0, Span::new(i32::MAX, i32::MAX)),
            Err(LayoutError::ColumnOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_check_range() {
        let mut grid = grid(3);
        grid.block(2, Span::new(1900, 1910)).unwrap();

        assert!(grid.check_range(0..2, Span::new(1900, 1910)).unwrap());
        assert!(!grid.check_range(0..3, Span::new(1900, 1910)).unwrap());
    }

    #[test]
    fn test_find_first_free_row() {
        let mut grid = grid(2);
        let span = Span::new(1900, 1950);
        grid.block(0, span).unwrap();

        assert_eq!(grid.find_first_free_row(span, 0).unwrap(), 1);
        grid.block(1, span).unwrap();
        assert_eq!(grid.find_first_free_row(span, 0).unwrap(), 2);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.find_first_free_row(span, 5).unwrap(), 5);
        assert_eq!(grid.rows(), 6);
    }

    #[test]
    fn test_find_nearest_free_row_prefers_lower_on_tie() {
        let mut grid = grid(5);
        let span = Span::new(1900, 1950);
        grid.block(2, span).unwrap();

        assert_eq!(grid.find_nearest_free_row(2, span).unwrap(), 1);

        grid.block(1, span).unwrap();
        assert_eq!(grid.find_nearest_free_row(2, span).unwrap(), 3);
    }

    #[test]
    fn test_find_nearest_free_row_grows_when_exhausted() {
        let mut grid = grid(2);
        let span = Span::new(1900, 1950);
        grid.block(0, span).unwrap();
        grid.block(1, span).unwrap();

        assert_eq!(grid.find_nearest_free_row(0, span).unwrap(), 2);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.find_nearest_free_row(7, span).unwrap(), 7);
        assert_eq!(grid.rows(), 8);
    }

    #[test]
    fn test_insert_and_trim_rows() {
        let mut grid = grid(2);
        let span = Span::new(1900, 1950);
        grid.block(1, span).unwrap();

        grid.insert_row(1).unwrap();
        assert!(grid.is_row_empty(1).unwrap());
        assert!(!grid.check_row(2, span).unwrap());

        assert_eq!(grid.trim_leading_empty_rows(), 2);
        assert_eq!(grid.rows(), 1);
        assert!(!grid.check_row(0, span).unwrap());

        assert!(grid.insert_row(5).is_err());
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn spans_strategy() -> impl Strategy<Value = Vec<Span>> {
        prop::collection::vec(
            (1900i32..2000, 0i32..30).prop_map(|(start, len)| Span::new(start, start + len)),
            1..20,
        )
    }

    fn check_first_free_rows_never_conflict(spans: Vec<Span>) -> Result<(), TestCaseError> {
        let mut grid = Grid::for_spans(spans.iter().copied());
        let mut placed: Vec<(usize, Span)> = Vec::new();

        for span in spans {
            let rows_before = grid.rows();
            let row = grid.find_first_free_row(span, 0).unwrap();
            prop_assert!(grid.rows() >= rows_before);

            grid.block(row, span).unwrap();
            for &(other_row, other) in &placed {
                prop_assert!(other_row != row || !other.conflicts_with(span));
            }
            placed.push((row, span));
        }
        Ok(())
    }

    fn check_check_row_matches_conflicts(a: Span, b: Span) -> Result<(), TestCaseError> {
        let mut grid = Grid::for_spans([a, b]);
        grid.add_row();
        grid.block(0, a).unwrap();

        prop_assert_eq!(grid.check_row(0, b).unwrap(), !a.conflicts_with(b));
        Ok(())
    }

    proptest! {
        #[test]
        fn first_free_rows_never_conflict(spans in spans_strategy()) {
            check_first_free_rows_never_conflict(spans)?;
        }

        #[test]
        fn check_row_matches_conflicts(
            (a_start, a_len, b_start, b_len) in (1900i32..1950, 0i32..10, 1900i32..1950, 0i32..10)
        ) {
            check_check_row_matches_conflicts(
                Span::new(a_start, a_start + a_len),
                Span::new(b_start, b_start + b_len),
            )?;
        }
    }
}
