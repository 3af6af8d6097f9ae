use crate::error::Error;

/// Everything a local cost function may look at for one cell: the scan
/// indices, the two feature vectors and, when the runs carry them, the two
/// timestamps.
#[derive(Debug, Clone, Copy)]
pub struct ScanPair<'a> {
    pub row: usize,
    pub col: usize,
    pub time_a: Option<f64>,
    pub time_b: Option<f64>,
    pub scan_a: &'a [f64],
    pub scan_b: &'a [f64],
}

/// Pluggable local cost/similarity between two scans.
///
/// Implementations must be pure and side-effect free; the precomputation
/// scheduler calls them concurrently from worker threads. `minimize`
/// declares the direction of the overall objective: `true` for
/// distance-style functions, `false` for similarities.
pub trait CostFunction: Sync {
    fn score(&self, pair: &ScanPair<'_>) -> Result<f64, Error>;
    fn minimize(&self) -> bool;
}

fn check_dims(pair: &ScanPair<'_>) -> Result<(), Error> {
    if pair.scan_a.len() != pair.scan_b.len() {
        return Err(Error::Cost {
            row: pair.row,
            col: pair.col,
            message: format!(
                "feature vector lengths differ: {} vs {}",
                pair.scan_a.len(),
                pair.scan_b.len()
            ),
        });
    }
    Ok(())
}

/// Euclidean distance between the two feature vectors (minimized).
/// Empty vectors yield 0 by convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl CostFunction for Euclidean {
    fn score(&self, pair: &ScanPair<'_>) -> Result<f64, Error> {
        check_dims(pair)?;
        let sum: f64 = pair
            .scan_a
            .iter()
            .zip(pair.scan_b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum();
        Ok(sum.sqrt())
    }
    fn minimize(&self) -> bool {
        true
    }
}

/// City-block distance (minimized).
#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl CostFunction for Manhattan {
    fn score(&self, pair: &ScanPair<'_>) -> Result<f64, Error> {
        check_dims(pair)?;
        Ok(pair
            .scan_a
            .iter()
            .zip(pair.scan_b.iter())
            .map(|(x, y)| (x - y).abs())
            .sum())
    }
    fn minimize(&self) -> bool {
        true
    }
}

/// Inner product of the two intensity profiles (maximized).
#[derive(Debug, Clone, Copy, Default)]
pub struct Dot;

impl CostFunction for Dot {
    fn score(&self, pair: &ScanPair<'_>) -> Result<f64, Error> {
        check_dims(pair)?;
        Ok(pair
            .scan_a
            .iter()
            .zip(pair.scan_b.iter())
            .map(|(x, y)| x * y)
            .sum())
    }
    fn minimize(&self) -> bool {
        false
    }
}

/// Cosine of the angle between the two profiles (maximized).
/// A zero-norm scan scores 0 against everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl CostFunction for Cosine {
    fn score(&self, pair: &ScanPair<'_>) -> Result<f64, Error> {
        check_dims(pair)?;
        let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);
        for (x, y) in pair.scan_a.iter().zip(pair.scan_b.iter()) {
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }
        let norm = (norm_a * norm_b).sqrt();
        if norm <= f64::EPSILON {
            return Ok(0.0);
        }
        Ok(dot / norm)
    }
    fn minimize(&self) -> bool {
        false
    }
}

/// Retention-time aware decorator: the Gaussian factor
/// `exp(-dt^2 / (2 tolerance^2))` damps similarities and inflates
/// distances as the two timestamps drift apart. Without timestamps the
/// inner score passes through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct TimePenalized<C> {
    inner: C,
    tolerance: f64,
}

impl<C: CostFunction> TimePenalized<C> {
    pub fn new(inner: C, tolerance: f64) -> Self {
        assert!(tolerance > 0.0, "time tolerance must be positive");
        Self { inner, tolerance }
    }
}

impl<C: CostFunction> CostFunction for TimePenalized<C> {
    fn score(&self, pair: &ScanPair<'_>) -> Result<f64, Error> {
        let score = self.inner.score(pair)?;
        let penalty = match (pair.time_a, pair.time_b) {
            (Some(ta), Some(tb)) => {
                let dt = ta - tb;
                (-dt * dt / (2.0 * self.tolerance * self.tolerance)).exp()
            }
            _ => 1.0,
        };
        if self.inner.minimize() {
            Ok(score / penalty)
        } else {
            Ok(score * penalty)
        }
    }
    fn minimize(&self) -> bool {
        self.inner.minimize()
    }
}

/// Escape hatch wrapping a user closure together with an explicit
/// objective direction.
pub struct FnCost<F> {
    f: F,
    minimize: bool,
}

impl<F> FnCost<F>
where
    F: Fn(&ScanPair<'_>) -> Result<f64, Error> + Sync,
{
    pub fn new(f: F, minimize: bool) -> Self {
        Self { f, minimize }
    }
}

impl<F> CostFunction for FnCost<F>
where
    F: Fn(&ScanPair<'_>) -> Result<f64, Error> + Sync,
{
    fn score(&self, pair: &ScanPair<'_>) -> Result<f64, Error> {
        (self.f)(pair)
    }
    fn minimize(&self) -> bool {
        self.minimize
    }
}
