//! Banded, anchor-constrained dynamic time warping for chromatographic
//! runs.
//!
//! A run is a sequence of scans, each a fixed-width feature vector with an
//! optional retention timestamp. Alignment fills a sparse cumulative-cost
//! matrix restricted to a corridor interpolated between trusted anchors,
//! then traces the optimal monotone warping path back from the terminal
//! cell. Local costs are pluggable through [`CostFunction`] and can be
//! precomputed tile-parallel ahead of the sequential recurrence.
pub mod aligner;
pub mod anchor;
pub mod cost;
pub mod dptable;
mod error;
pub mod gen_scan;
pub mod precompute;
pub mod recurrence;

pub use aligner::{align, align_anchored, DtwAlignment};
pub use anchor::{Anchor, AnchorSet};
pub use cost::{Cosine, CostFunction, Dot, Euclidean, FnCost, Manhattan, ScanPair, TimePenalized};
pub use dptable::DPTable;
pub use error::Error;
pub use recurrence::{Predecessor, Weights};

use serde::{Deserialize, Serialize};

/// One chromatographic run. Every scan carries the same number of feature
/// channels; timestamps, when present, pair up with the scans one-to-one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    scans: Vec<Vec<f64>>,
    times: Option<Vec<f64>>,
}

impl Run {
    pub fn new(scans: Vec<Vec<f64>>) -> Self {
        Self { scans, times: None }
    }

    pub fn with_times(scans: Vec<Vec<f64>>, times: Vec<f64>) -> Self {
        assert_eq!(
            scans.len(),
            times.len(),
            "scan and timestamp counts must match"
        );
        Self {
            scans,
            times: Some(times),
        }
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn scan(&self, i: usize) -> &[f64] {
        &self.scans[i]
    }

    pub fn time(&self, i: usize) -> Option<f64> {
        self.times.as_ref().map(|ts| ts[i])
    }

    pub fn scans(&self) -> &[Vec<f64>] {
        &self.scans
    }

    pub fn times(&self) -> Option<&[f64]> {
        self.times.as_deref()
    }
}

/// Knobs of one alignment. The defaults run plain DTW over the full
/// matrix on one thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtwParams {
    pub weights: Weights,
    /// Columns added on each side of the interpolated anchor line.
    pub band_radius: usize,
    /// Fraction of the query length added on each side when the global
    /// band relaxation is on.
    pub band_width_percentage: f64,
    pub use_global_band: bool,
    /// Precompute all local costs before the recurrence instead of
    /// evaluating them on the fly.
    pub precompute: bool,
    /// Worker threads for precomputation. One means fully sequential.
    pub parallelism: usize,
    /// Minimum reference-scan gap between kept anchors.
    pub min_anchor_spacing: usize,
    /// Tile grid (rows, columns) of the precomputation scheduler.
    pub tile_grid: (usize, usize),
}

impl Default for DtwParams {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            band_radius: 10,
            band_width_percentage: 1.0,
            use_global_band: true,
            precompute: true,
            parallelism: 1,
            min_anchor_spacing: 10,
            tile_grid: (2, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_cover_the_full_matrix() {
        let params = DtwParams::default();
        let set = AnchorSet::corners(30, 45);
        let ranges = set.fill_range(
            params.band_radius,
            params.band_width_percentage,
            params.use_global_band,
        );
        assert!(ranges.iter().all(|&r| r == (0, 45)));
    }

    #[test]
    #[should_panic(expected = "must match")]
    fn mismatched_timestamps_panic() {
        Run::with_times(vec![vec![1.0], vec![2.0]], vec![0.0]);
    }
}
