use crate::anchor::{Anchor, AnchorSet};
use crate::cost::{CostFunction, ScanPair};
use crate::dptable::DPTable;
use crate::error::Error;
use crate::precompute::precompute_local;
use crate::recurrence::{cumulative_pass, traceback};
use crate::{DtwParams, Run};
use log::*;
use serde::{Deserialize, Serialize};

/// Result of one alignment: the terminal score, the warping path and the
/// two band-shaped matrices behind it, kept for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtwAlignment {
    pub score: f64,
    /// `(reference index, query index)` pairs from `(0, 0)` to the
    /// terminal cell, monotone in both coordinates.
    pub path: Vec<(usize, usize)>,
    pub cumulative: DPTable<f64>,
    pub predecessors: DPTable<u8>,
}

/// Align `query` onto `reference` without any anchors.
pub fn align(
    reference: &Run,
    query: &Run,
    cost: &dyn CostFunction,
    params: &DtwParams,
) -> Result<DtwAlignment, Error> {
    align_anchored(reference, query, &[], cost, params)
}

/// Align `query` onto `reference` inside the corridor shaped by `anchors`.
///
/// An empty anchor slice leaves only the two corner anchors, which under
/// the default band parameters degenerates to unconstrained DTW over the
/// full matrix.
pub fn align_anchored(
    reference: &Run,
    query: &Run,
    anchors: &[Anchor],
    cost: &dyn CostFunction,
    params: &DtwParams,
) -> Result<DtwAlignment, Error> {
    if reference.is_empty() {
        return Err(Error::EmptySequence { name: "reference" });
    }
    if query.is_empty() {
        return Err(Error::EmptySequence { name: "query" });
    }
    let (rows, cols) = (reference.len(), query.len());
    let anchor_set = AnchorSet::new(rows, cols, anchors, params.min_anchor_spacing)?;
    let fill_range = anchor_set.fill_range(
        params.band_radius,
        params.band_width_percentage,
        params.use_global_band,
    );
    let minimize = cost.minimize();
    let fill = if minimize {
        f64::INFINITY
    } else {
        f64::NEG_INFINITY
    };
    let mut local = DPTable::new(&fill_range, fill);
    let mut cumulative = local.shaped_like(fill);
    let mut predecessors = local.shaped_like(0u8);
    debug!(
        "aligning {} x {} scans, {} band cells, {} anchors",
        rows,
        cols,
        local.cells(),
        anchor_set.anchors().len()
    );
    let score = if params.precompute {
        let parallelism = params.parallelism.max(1);
        precompute_local(
            &mut local,
            reference,
            query,
            cost,
            params.tile_grid,
            parallelism,
        )?;
        cumulative_pass(
            &mut cumulative,
            &mut predecessors,
            &params.weights,
            minimize,
            |i, j| Ok(local.get(i, j)),
        )?
    } else {
        // Each cell's local cost is evaluated on its single use during the
        // pass; it is still recorded so the matrix stays inspectable.
        let local = &mut local;
        cumulative_pass(
            &mut cumulative,
            &mut predecessors,
            &params.weights,
            minimize,
            |i, j| {
                let c = cost.score(&ScanPair {
                    row: i,
                    col: j,
                    time_a: reference.time(i),
                    time_b: query.time(j),
                    scan_a: reference.scan(i),
                    scan_b: query.scan(j),
                })?;
                local.set(i, j, c);
                Ok(c)
            },
        )?
    };
    let path = traceback(&predecessors);
    assert_eq!(path.first(), Some(&(0, 0)));
    assert_eq!(path.last(), Some(&(rows - 1, cols - 1)));
    debug!("alignment score {:.4}, path length {}", score, path.len());
    Ok(DtwAlignment {
        score,
        path,
        cumulative,
        predecessors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{Euclidean, FnCost};
    use crate::gen_scan::{self, RunProfile};
    use crate::recurrence::{Predecessor, Weights};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn ramp(len: usize) -> Run {
        Run::new((0..len).map(|i| vec![i as f64, 2.0 * i as f64]).collect())
    }

    #[test]
    fn empty_runs_are_errors() {
        let empty = Run::new(vec![]);
        let one = ramp(1);
        let params = DtwParams::default();
        match align(&empty, &one, &Euclidean, &params).unwrap_err() {
            Error::EmptySequence { name } => assert_eq!(name, "reference"),
            other => panic!("unexpected error {:?}", other),
        }
        match align(&one, &empty, &Euclidean, &params).unwrap_err() {
            Error::EmptySequence { name } => assert_eq!(name, "query"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn single_cell_alignment() {
        let a = Run::new(vec![vec![0.0, 3.0]]);
        let b = Run::new(vec![vec![4.0, 0.0]]);
        let params = DtwParams {
            weights: Weights {
                diagonal: 2.0,
                ..Weights::default()
            },
            ..DtwParams::default()
        };
        let aln = align(&a, &b, &Euclidean, &params).unwrap();
        assert_eq!(aln.path, vec![(0, 0)]);
        assert!((aln.score - 10.0).abs() < 1e-12);
    }

    #[test]
    fn self_alignment_is_the_diagonal() {
        let run = ramp(12);
        let aln = align(&run, &run, &Euclidean, &DtwParams::default()).unwrap();
        assert_eq!(aln.score, 0.0);
        let diagonal: Vec<_> = (0..12).map(|i| (i, i)).collect();
        assert_eq!(aln.path, diagonal);
    }

    #[test]
    fn single_scan_query_gives_a_column_path() {
        let a = ramp(5);
        let b = Run::new(vec![vec![0.0, 0.0]]);
        let aln = align(&a, &b, &Euclidean, &DtwParams::default()).unwrap();
        let column: Vec<_> = (0..5).map(|i| (i, 0)).collect();
        assert_eq!(aln.path, column);
        for i in 1..5 {
            assert_eq!(
                Predecessor::from(aln.predecessors.get(i, 0)),
                Predecessor::Vertical
            );
        }
    }

    #[test]
    fn path_is_monotone_on_warped_runs() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(482_804);
        let reference = gen_scan::generate(&mut rng, 60, 8);
        let query = gen_scan::warp(&reference, &mut rng, &RunProfile::default());
        let aln = align(&reference, &query, &Euclidean, &DtwParams::default()).unwrap();
        assert_eq!(aln.path.first(), Some(&(0, 0)));
        assert_eq!(aln.path.last(), Some(&(59, query.len() - 1)));
        for w in aln.path.windows(2) {
            let (di, dj) = (w[1].0 - w[0].0, w[1].1 - w[0].1);
            assert!(di <= 1 && dj <= 1 && di + dj >= 1, "bad step {:?}", w);
        }
    }

    #[test]
    fn lazy_and_precomputed_paths_agree() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(99_174);
        let reference = gen_scan::generate(&mut rng, 40, 6);
        let query = gen_scan::warp(&reference, &mut rng, &RunProfile::default());
        let eager = DtwParams::default();
        let lazy = DtwParams {
            precompute: false,
            ..DtwParams::default()
        };
        let a = align(&reference, &query, &Euclidean, &eager).unwrap();
        let b = align(&reference, &query, &Euclidean, &lazy).unwrap();
        assert_eq!(a.score.to_bits(), b.score.to_bits());
        assert_eq!(a.path, b.path);
    }

    #[test]
    fn thread_count_does_not_change_the_result() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(7_772_001);
        let reference = gen_scan::generate(&mut rng, 50, 10);
        let query = gen_scan::warp(&reference, &mut rng, &RunProfile::default());
        let serial = DtwParams::default();
        let threaded = DtwParams {
            parallelism: 4,
            tile_grid: (3, 3),
            ..DtwParams::default()
        };
        let a = align(&reference, &query, &Euclidean, &serial).unwrap();
        let b = align(&reference, &query, &Euclidean, &threaded).unwrap();
        assert_eq!(a.score.to_bits(), b.score.to_bits());
        assert_eq!(a.path, b.path);
    }

    #[test]
    fn anchored_corridor_matches_the_full_matrix_near_the_diagonal() {
        let run = ramp(50);
        let anchors = [Anchor::new(25, 25)];
        let narrow = DtwParams {
            band_radius: 4,
            use_global_band: false,
            min_anchor_spacing: 5,
            ..DtwParams::default()
        };
        let aln = align_anchored(&run, &run, &anchors, &Euclidean, &narrow).unwrap();
        assert_eq!(aln.score, 0.0);
        let diagonal: Vec<_> = (0..50).map(|i| (i, i)).collect();
        assert_eq!(aln.path, diagonal);
        // The corridor really is narrow.
        assert!(aln.cumulative.cells() < 50 * 50 / 2);
    }

    #[test]
    fn unreachable_band_cells_surface_as_degenerate() {
        let a = ramp(3);
        let b = ramp(3);
        let cost = FnCost::new(|_: &ScanPair<'_>| Ok(f64::INFINITY), true);
        match align(&a, &b, &cost, &DtwParams::default()).unwrap_err() {
            Error::DegenerateRecurrence { row, col, .. } => assert_eq!((row, col), (1, 1)),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
