use serde::{Deserialize, Serialize};

/// Sparse, banded DP matrix.
///
/// Only the cells inside the per-row column band are stored, rows laid out
/// back to back in one buffer. Two matrices built from the same band layout
/// (see [`DPTable::shaped_like`]) stay cell-for-cell compatible, which is
/// how the local-cost, cumulative-cost and predecessor matrices share one
/// corridor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DPTable<T> {
    // Total memory, row after row.
    mem: Vec<T>,
    // Offset of each row into `mem` and the acceptable range of j.
    offsets: Vec<(usize, usize, usize)>,
    // Value no comparison can prefer; untouched cells keep it.
    fill: T,
}

impl<T: Copy> DPTable<T> {
    /// One `(start, end)` half-open column interval per row.
    pub fn new(fill_range: &[(usize, usize)], fill: T) -> Self {
        let (mut offsets, mut total_cells) = (Vec::with_capacity(fill_range.len()), 0);
        for &(start, end) in fill_range {
            debug_assert!(start <= end);
            offsets.push((total_cells, start, end));
            total_cells += end - start;
        }
        let mem = vec![fill; total_cells];
        Self { mem, offsets, fill }
    }

    pub fn fill(&self) -> T {
        self.fill
    }

    pub fn rows(&self) -> usize {
        self.offsets.len()
    }

    /// Total number of stored (in-band) cells.
    pub fn cells(&self) -> usize {
        self.mem.len()
    }

    /// Valid column range `[start, end)` of row `i`.
    pub fn row_range(&self, i: usize) -> (usize, usize) {
        match self.offsets.get(i) {
            Some(&(_, start, end)) => (start, end),
            None => panic!("row {} out of range ({} rows)", i, self.offsets.len()),
        }
    }

    /// Read an in-band cell. Out-of-band access is a banding/indexing bug
    /// and panics.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        match self.offsets.get(i) {
            Some(&(ofs, start, end)) if (start..end).contains(&j) => self.mem[ofs + j - start],
            _ => self.out_of_band(i, j),
        }
    }

    /// Write an in-band cell. Out-of-band access is a banding/indexing bug
    /// and panics.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        match self.offsets.get(i) {
            Some(&(ofs, start, end)) if (start..end).contains(&j) => {
                self.mem[ofs + j - start] = value
            }
            _ => self.out_of_band(i, j),
        }
    }

    /// Band-edge probe: `None` outside the band instead of panicking.
    /// The recurrence uses this for predecessors that may fall off the
    /// corridor.
    #[inline]
    pub fn get_in_band(&self, i: usize, j: usize) -> Option<T> {
        match self.offsets.get(i) {
            Some(&(ofs, start, end)) if (start..end).contains(&j) => Some(self.mem[ofs + j - start]),
            _ => None,
        }
    }

    /// A second matrix with the identical band layout, independently
    /// mutable.
    pub fn shaped_like<U: Copy>(&self, fill: U) -> DPTable<U> {
        DPTable {
            mem: vec![fill; self.mem.len()],
            offsets: self.offsets.clone(),
            fill,
        }
    }

    /// Split the band's bounding rectangle into a `grid_rows` x `grid_cols`
    /// grid of tiles and hand out mutable views of the in-band cells of
    /// each tile. Tiles are pairwise disjoint and jointly cover every
    /// stored cell exactly once, so they can be filled from worker threads
    /// without any locking.
    pub fn partition(&mut self, grid_rows: usize, grid_cols: usize) -> Vec<Tile<'_, T>> {
        assert!(grid_rows >= 1 && grid_cols >= 1);
        let nrows = self.offsets.len();
        let ncols = self.offsets.iter().map(|&(_, _, end)| end).max().unwrap_or(0);
        let mut tiles: Vec<Tile<'_, T>> = (0..grid_rows * grid_cols)
            .map(|_| Tile { rows: Vec::new() })
            .collect();
        let mut rest = self.mem.as_mut_slice();
        let mut grid_row = 0;
        for (i, &(_, start, end)) in self.offsets.iter().enumerate() {
            let (row_mem, tail) = rest.split_at_mut(end - start);
            rest = tail;
            while i >= (grid_row + 1) * nrows / grid_rows {
                grid_row += 1;
            }
            let mut row_rest = row_mem;
            let mut col = start;
            for grid_col in 0..grid_cols {
                let hi = ((grid_col + 1) * ncols / grid_cols).min(end);
                if hi <= col {
                    continue;
                }
                let (segment, tail) = row_rest.split_at_mut(hi - col);
                row_rest = tail;
                tiles[grid_row * grid_cols + grid_col]
                    .rows
                    .push((i, col, segment));
                col = hi;
                if col == end {
                    break;
                }
            }
        }
        tiles
    }

    #[cold]
    fn out_of_band(&self, i: usize, j: usize) -> ! {
        match self.offsets.get(i) {
            Some(&(_, start, end)) => panic!(
                "out-of-band access at ({}, {}): row {} spans [{}, {})",
                i, j, i, start, end
            ),
            None => panic!("row {} out of range ({} rows)", i, self.offsets.len()),
        }
    }
}

/// Mutable view of the in-band cells of one rectangular tile.
/// Handed to exactly one worker; it cannot address cells outside the tile.
pub struct Tile<'a, T> {
    // (row index, first column of the fragment, cells)
    rows: Vec<(usize, usize, &'a mut [T])>,
}

impl<'a, T> Tile<'a, T> {
    pub fn cells(&self) -> usize {
        self.rows.iter().map(|(_, _, cells)| cells.len()).sum()
    }

    /// Fill every cell of the tile with `f(row, col)`, stopping at the
    /// first error. Returns the number of cells written.
    pub fn try_fill<E, F>(&mut self, mut f: F) -> Result<usize, E>
    where
        F: FnMut(usize, usize) -> Result<T, E>,
    {
        let mut computed = 0;
        for (i, start, cells) in self.rows.iter_mut() {
            for (k, slot) in cells.iter_mut().enumerate() {
                *slot = f(*i, *start + k)?;
                computed += 1;
            }
        }
        Ok(computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staircase() -> DPTable<f64> {
        // Row i spans [i, i + 3).
        let ranges: Vec<_> = (0..4).map(|i| (i, i + 3)).collect();
        DPTable::new(&ranges, f64::INFINITY)
    }

    #[test]
    fn get_set_in_band() {
        let mut dp = staircase();
        assert_eq!(dp.cells(), 12);
        dp.set(2, 4, -1.5);
        assert_eq!(dp.get(2, 4), -1.5);
        assert_eq!(dp.get(2, 2), f64::INFINITY);
        assert_eq!(dp.row_range(3), (3, 6));
    }

    #[test]
    fn band_edge_probe() {
        let dp = staircase();
        assert!(dp.get_in_band(0, 0).is_some());
        assert!(dp.get_in_band(0, 3).is_none());
        assert!(dp.get_in_band(4, 0).is_none());
    }

    #[test]
    #[should_panic(expected = "out-of-band")]
    fn out_of_band_get_panics() {
        let dp = staircase();
        dp.get(1, 0);
    }

    #[test]
    #[should_panic(expected = "out-of-band")]
    fn out_of_band_set_panics() {
        let mut dp = staircase();
        dp.set(0, 3, 1.0);
    }

    #[test]
    fn shared_layout() {
        let dp = staircase();
        let twin = dp.shaped_like(0u8);
        assert_eq!(twin.cells(), dp.cells());
        for i in 0..dp.rows() {
            assert_eq!(twin.row_range(i), dp.row_range(i));
        }
    }

    #[test]
    fn partition_covers_every_cell_once() {
        for &(gr, gc) in &[(1, 1), (2, 2), (3, 2), (5, 7)] {
            let mut dp = staircase();
            let total = dp.cells();
            let mut seen = std::collections::HashSet::new();
            let mut computed = 0;
            for mut tile in dp.partition(gr, gc) {
                computed += tile
                    .try_fill(|i, j| {
                        assert!(seen.insert((i, j)), "cell ({}, {}) visited twice", i, j);
                        Ok::<f64, ()>((i * 10 + j) as f64)
                    })
                    .unwrap();
            }
            assert_eq!(computed, total);
            assert_eq!(seen.len(), total);
            // Writes landed where they claim to.
            assert_eq!(dp.get(2, 4), 24.0);
        }
    }

    #[test]
    fn partition_with_more_tiles_than_rows() {
        let mut dp = DPTable::new(&[(0, 5)], 0u32);
        let tiles = dp.partition(4, 4);
        let total: usize = tiles.iter().map(|t| t.cells()).sum();
        assert_eq!(total, 5);
    }
}
