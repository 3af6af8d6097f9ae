use crate::dptable::DPTable;
use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Direction the optimal cumulative cost of a cell came from.
/// Encoded as one byte (1/2/3) at the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predecessor {
    /// From (i-1, j-1).
    Diagonal,
    /// From (i-1, j), a compression step.
    Vertical,
    /// From (i, j-1), an expansion step.
    Horizontal,
}

impl std::convert::From<u8> for Predecessor {
    fn from(val: u8) -> Predecessor {
        match val {
            1 => Predecessor::Diagonal,
            2 => Predecessor::Vertical,
            3 => Predecessor::Horizontal,
            _ => panic!("invalid predecessor code {}", val),
        }
    }
}

impl std::convert::From<Predecessor> for u8 {
    fn from(val: Predecessor) -> u8 {
        match val {
            Predecessor::Diagonal => 1,
            Predecessor::Vertical => 2,
            Predecessor::Horizontal => 3,
        }
    }
}

/// Step weights of the recurrence. The gap penalty is added to the
/// compression and expansion terms, never to the diagonal one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub compression: f64,
    pub expansion: f64,
    pub diagonal: f64,
    pub gap_penalty: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            compression: 1.0,
            expansion: 1.0,
            diagonal: 1.0,
            gap_penalty: 0.0,
        }
    }
}

impl Weights {
    fn assert_valid(&self) {
        assert!(
            self.compression >= 0.0
                && self.expansion >= 0.0
                && self.diagonal >= 0.0
                && self.gap_penalty >= 0.0,
            "recurrence weights must be non-negative: {:?}",
            self
        );
    }
}

/// Sequential cumulative pass over the band.
///
/// Visits cells strictly in increasing row order and, within a row,
/// increasing column order; every cell only depends on its up, left and
/// diagonal neighbours, which are final by then. `local_of` supplies the
/// local cost of a cell, either from the precomputed matrix or evaluated
/// on the fly. Returns the cumulative score at the terminal cell.
///
/// Ties at the optimum resolve by priority diagonal > vertical >
/// horizontal. A three-way tie at a non-finite value means the corridor or
/// the weight configuration is unsatisfiable and aborts with
/// [`Error::DegenerateRecurrence`].
pub fn cumulative_pass<F>(
    cumulative: &mut DPTable<f64>,
    predecessors: &mut DPTable<u8>,
    weights: &Weights,
    minimize: bool,
    mut local_of: F,
) -> Result<f64, Error>
where
    F: FnMut(usize, usize) -> Result<f64, Error>,
{
    weights.assert_valid();
    let fill = cumulative.fill();
    let better = |candidate: f64, best: f64| {
        if minimize {
            candidate < best
        } else {
            candidate > best
        }
    };
    let rows = cumulative.rows();
    for i in 0..rows {
        let (start, end) = cumulative.row_range(i);
        for j in start..end {
            let c = local_of(i, j)?;
            let (value, pred) = if i == 0 && j == 0 {
                (weights.diagonal * c, Predecessor::Diagonal)
            } else if j == 0 {
                let up = cumulative.get_in_band(i - 1, 0).unwrap_or(fill);
                (
                    weights.compression * c + up + weights.gap_penalty,
                    Predecessor::Vertical,
                )
            } else if i == 0 {
                let left = cumulative.get_in_band(0, j - 1).unwrap_or(fill);
                (
                    weights.expansion * c + left + weights.gap_penalty,
                    Predecessor::Horizontal,
                )
            } else {
                let up = cumulative.get_in_band(i - 1, j).unwrap_or(fill);
                let diag = cumulative.get_in_band(i - 1, j - 1).unwrap_or(fill);
                let left = cumulative.get_in_band(i, j - 1).unwrap_or(fill);
                let n = weights.compression * c + up + weights.gap_penalty;
                let nw = weights.diagonal * c + diag;
                let w = weights.expansion * c + left + weights.gap_penalty;
                let all_nan = n.is_nan() && nw.is_nan() && w.is_nan();
                let tied_nonfinite = n == nw && nw == w && !nw.is_finite();
                if all_nan || tied_nonfinite {
                    return Err(Error::DegenerateRecurrence {
                        row: i,
                        col: j,
                        weights: *weights,
                    });
                }
                // Diagonal wins ties, then vertical, then horizontal.
                let (mut value, mut pred) = (nw, Predecessor::Diagonal);
                if better(n, value) {
                    value = n;
                    pred = Predecessor::Vertical;
                }
                if better(w, value) {
                    value = w;
                    pred = Predecessor::Horizontal;
                }
                (value, pred)
            };
            cumulative.set(i, j, value);
            predecessors.set(i, j, pred.into());
        }
    }
    let (_, end) = cumulative.row_range(rows - 1);
    Ok(cumulative.get(rows - 1, end - 1))
}

/// Walk the predecessor matrix back from the terminal cell to the origin.
/// The returned path runs from (0, 0) to the terminus, each step advancing
/// one or both coordinates by exactly one.
pub fn traceback(predecessors: &DPTable<u8>) -> Vec<(usize, usize)> {
    let rows = predecessors.rows();
    let (_, end) = predecessors.row_range(rows - 1);
    let (mut i, mut j) = (rows - 1, end - 1);
    let mut path = Vec::with_capacity(rows + end);
    path.push((i, j));
    while (i, j) != (0, 0) {
        match Predecessor::from(predecessors.get(i, j)) {
            Predecessor::Diagonal => {
                i -= 1;
                j -= 1;
            }
            Predecessor::Vertical => i -= 1,
            Predecessor::Horizontal => j -= 1,
        }
        path.push((i, j));
    }
    path.reverse();
    path
}
