use crate::recurrence::Weights;

/// Failures that abort the current alignment.
///
/// All of these are unrecoverable for the run at hand; the caller may retry
/// the whole alignment with relaxed parameters (wider band, other cost
/// function), but no partial result is ever produced. Out-of-band matrix
/// access is deliberately *not* represented here: it is an internal
/// band-construction or indexing bug and panics instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An externally supplied anchor lies outside the sequence bounds.
    #[error("anchor ({row}, {col}) outside the {rows}x{cols} alignment grid")]
    InvalidAnchor {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    /// One of the two runs has no scans.
    #[error("{name} run is empty")]
    EmptySequence { name: &'static str },
    /// All three recurrence candidates tied at a non-finite value.
    /// Usually the corridor is too narrow for the chosen cost function.
    #[error(
        "degenerate recurrence at ({row}, {col}): all candidates tied at a \
         non-finite value under {weights:?}"
    )]
    DegenerateRecurrence {
        row: usize,
        col: usize,
        weights: Weights,
    },
    /// A local-cost evaluation failed. The precomputation scheduler
    /// surfaces the first such failure and discards the rest of the pass.
    #[error("cost evaluation failed at ({row}, {col}): {message}")]
    Cost {
        row: usize,
        col: usize,
        message: String,
    },
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
