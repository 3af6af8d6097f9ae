//! Synthetic scan runs for tests and benchmarks. Real detector traces are
//! smooth in both time and feature space, so the generator random-walks a
//! per-channel baseline instead of sampling independent noise.
use crate::Run;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct RunProfile {
    /// Probability of emitting a scan twice (the detector lingering).
    pub dup: f64,
    /// Probability of skipping a scan entirely.
    pub drop: f64,
    /// Half-width of the uniform intensity noise added per channel.
    pub noise: f64,
}

impl Default for RunProfile {
    fn default() -> Self {
        Self {
            dup: 0.05,
            drop: 0.05,
            noise: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Keep,
    Dup,
    Drop,
}

impl Op {
    fn weight(self, p: &RunProfile) -> f64 {
        match self {
            Op::Keep => 1. - p.dup - p.drop,
            Op::Dup => p.dup,
            Op::Drop => p.drop,
        }
    }
}

const OPERATIONS: [Op; 3] = [Op::Keep, Op::Dup, Op::Drop];

/// A smooth run of `len` scans with `dims` channels, timestamps at unit
/// spacing.
pub fn generate<T: Rng>(rng: &mut T, len: usize, dims: usize) -> Run {
    let mut baseline: Vec<f64> = (0..dims).map(|_| rng.gen_range(0.0..1.0)).collect();
    let scans: Vec<Vec<f64>> = (0..len)
        .map(|_| {
            for channel in baseline.iter_mut() {
                *channel = (*channel + rng.gen_range(-0.1..0.1)).clamp(0.0, 1.0);
            }
            baseline.clone()
        })
        .collect();
    let times = (0..len).map(|i| i as f64).collect();
    Run::with_times(scans, times)
}

/// A distorted copy of `template`: scans are duplicated or dropped per the
/// profile and every channel picks up uniform noise. The result keeps at
/// least one scan and unit-spaced timestamps of its own.
pub fn warp<T: Rng>(template: &Run, rng: &mut T, p: &RunProfile) -> Run {
    let mut scans: Vec<Vec<f64>> = vec![];
    for scan in template.scans() {
        let copies = match *OPERATIONS.choose_weighted(rng, |op| op.weight(p)).unwrap() {
            Op::Keep => 1,
            Op::Dup => 2,
            Op::Drop => 0,
        };
        for _ in 0..copies {
            let noisy = scan
                .iter()
                .map(|x| x + rng.gen_range(-p.noise..=p.noise))
                .collect();
            scans.push(noisy);
        }
    }
    if scans.is_empty() {
        scans.push(template.scan(0).to_vec());
    }
    let times = (0..scans.len()).map(|i| i as f64).collect();
    Run::with_times(scans, times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn generated_runs_have_the_requested_shape() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(320);
        let run = generate(&mut rng, 100, 12);
        assert_eq!(run.len(), 100);
        assert!(run.scans().iter().all(|s| s.len() == 12));
        assert_eq!(run.time(99), Some(99.0));
    }

    #[test]
    fn warped_runs_stay_near_the_template_length() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(4_382);
        let template = generate(&mut rng, 200, 4);
        let warped = warp(&template, &mut rng, &RunProfile::default());
        assert!(!warped.is_empty());
        assert!(150 < warped.len() && warped.len() < 250);
        assert!(warped.scans().iter().all(|s| s.len() == 4));
    }

    #[test]
    fn dropping_everything_still_leaves_one_scan() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let template = generate(&mut rng, 30, 2);
        let all_drop = RunProfile {
            dup: 0.0,
            drop: 1.0,
            noise: 0.0,
        };
        let warped = warp(&template, &mut rng, &all_drop);
        assert_eq!(warped.len(), 1);
    }
}
