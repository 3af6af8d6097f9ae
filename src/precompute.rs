use crate::cost::{CostFunction, ScanPair};
use crate::dptable::DPTable;
use crate::error::Error;
use crate::Run;
use log::*;
use rayon::prelude::*;

/// Fill the local-cost matrix ahead of the recurrence pass.
///
/// The band's bounding rectangle is cut into a `grid` of tiles; each tile
/// is an independent unit of work writing only its own cells, so tiles run
/// on a bounded worker pool of `parallelism` threads without any locking.
/// The pool is joined before returning. The first error raised inside any
/// tile aborts the pass. Returns the number of cells computed, which must
/// match the matrix's stored-element count.
///
/// Precomputation performs no cross-cell arithmetic, so the recurrence
/// results are bit-for-bit identical whatever the thread count.
pub fn precompute_local(
    local: &mut DPTable<f64>,
    reference: &Run,
    query: &Run,
    cost: &dyn CostFunction,
    grid: (usize, usize),
    parallelism: usize,
) -> Result<usize, Error> {
    let expected = local.cells();
    let evaluate = |i: usize, j: usize| -> Result<f64, Error> {
        cost.score(&ScanPair {
            row: i,
            col: j,
            time_a: reference.time(i),
            time_b: query.time(j),
            scan_a: reference.scan(i),
            scan_b: query.scan(j),
        })
    };
    let mut tiles = local.partition(grid.0, grid.1);
    debug!(
        "precomputing {} cells over {} tiles on {} threads",
        expected,
        tiles.len(),
        parallelism
    );
    let computed = if parallelism <= 1 {
        let mut computed = 0;
        for tile in tiles.iter_mut() {
            computed += tile.try_fill(evaluate)?;
        }
        computed
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism)
            .build()?;
        pool.install(|| {
            tiles
                .par_iter_mut()
                .map(|tile| tile.try_fill(evaluate))
                .try_reduce(|| 0, |a, b| Ok(a + b))
        })?
    };
    assert_eq!(computed, expected, "tile partition missed band cells");
    Ok(computed)
}
