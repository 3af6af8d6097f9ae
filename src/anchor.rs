use crate::error::Error;
use log::*;
use serde::{Deserialize, Serialize};

/// A trusted correspondence between reference scan `row` and query scan
/// `col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Anchor {
    pub row: usize,
    pub col: usize,
}

impl Anchor {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Ordered anchor list shaping the alignment corridor.
///
/// The set always contains the virtual corner anchors `(0, 0)` and
/// `(rows - 1, cols - 1)`; supplied anchors that break monotonicity or sit
/// closer than the minimum spacing to the previously kept anchor are
/// dropped as redundant. Out-of-bounds anchors are hard errors.
#[derive(Debug, Clone)]
pub struct AnchorSet {
    rows: usize,
    cols: usize,
    anchors: Vec<Anchor>,
}

impl AnchorSet {
    pub fn new(
        rows: usize,
        cols: usize,
        anchors: &[Anchor],
        min_spacing: usize,
    ) -> Result<Self, Error> {
        assert!(rows > 0 && cols > 0, "empty alignment grid");
        for a in anchors {
            if a.row >= rows || a.col >= cols {
                return Err(Error::InvalidAnchor {
                    row: a.row,
                    col: a.col,
                    rows,
                    cols,
                });
            }
        }
        let spacing = min_spacing.max(1);
        let mut sorted = anchors.to_vec();
        sorted.sort();
        let mut kept = vec![Anchor::new(0, 0)];
        let terminus = Anchor::new(rows - 1, cols - 1);
        for a in sorted {
            let prev = *kept.last().unwrap();
            if a.col < prev.col {
                debug!("dropping non-monotone anchor ({}, {})", a.row, a.col);
                continue;
            }
            if a.row < prev.row + spacing || a.row + spacing > terminus.row {
                trace!("dropping crowded anchor ({}, {})", a.row, a.col);
                continue;
            }
            kept.push(a);
        }
        if *kept.last().unwrap() != terminus {
            kept.push(terminus);
        }
        Ok(Self {
            rows,
            cols,
            anchors: kept,
        })
    }

    /// The default set when no anchors are supplied: just the two corners.
    pub fn corners(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "empty alignment grid");
        let mut anchors = vec![Anchor::new(0, 0)];
        let terminus = Anchor::new(rows - 1, cols - 1);
        if terminus != anchors[0] {
            anchors.push(terminus);
        }
        Self {
            rows,
            cols,
            anchors,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Per-row half-open column intervals of the corridor: linear
    /// interpolation between consecutive anchors, expanded by `radius` and,
    /// with `use_global_band`, by `ceil(band_width_percentage * cols)`
    /// columns on each side. Both bounds are non-decreasing in the row
    /// index and the corners are always inside.
    pub fn fill_range(
        &self,
        radius: usize,
        band_width_percentage: f64,
        use_global_band: bool,
    ) -> Vec<(usize, usize)> {
        let extra = if use_global_band {
            (band_width_percentage * self.cols as f64).ceil() as usize
        } else {
            0
        };
        let half = radius + extra;
        let cols = self.cols;
        let mut ranges = vec![(cols, 0); self.rows];
        let mut update = |i: usize, center: usize, ranges: &mut Vec<(usize, usize)>| {
            let lo = center.saturating_sub(half);
            let hi = (center + half + 1).min(cols);
            let range = &mut ranges[i];
            range.0 = range.0.min(lo);
            range.1 = range.1.max(hi);
        };
        if self.anchors.len() == 1 {
            update(0, 0, &mut ranges);
            return ranges;
        }
        for pair in self.anchors.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.row == b.row {
                update(a.row, a.col, &mut ranges);
                update(b.row, b.col, &mut ranges);
                continue;
            }
            let span = (b.row - a.row) as f64;
            let delta = b.col as f64 - a.col as f64;
            for i in a.row..=b.row {
                let t = (i - a.row) as f64 / span;
                let center = (a.col as f64 + t * delta).round() as usize;
                update(i, center, &mut ranges);
            }
        }
        ranges
    }
}
