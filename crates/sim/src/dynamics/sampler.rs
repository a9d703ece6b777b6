//! Random sampling for demographic and environmental stochasticity.
//!
//! Every replicate owns exactly one [`StochasticSampler`]. Demographic noise
//! is the finite-population sampling of individual fates (binomial survival,
//! Poisson births, binomial sex assignment). Environmental noise perturbs the
//! rates themselves once per step, so every individual of a class shares the
//! same good or bad year.
//!
//! With demographic noise disabled, every count is the expected value rounded
//! half to even, which turns the model into a deterministic matrix projection.

use crate::base::RateKind;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Distribution, Hypergeometric, Normal, Poisson};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Switches for the two noise sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Sample individual fates instead of rounding expected values.
    pub demographic: bool,
    /// Perturb vital rates each step.
    pub environmental: bool,
}

impl NoiseConfig {
    /// Both noise sources enabled.
    pub fn full() -> Self {
        Self {
            demographic: true,
            environmental: true,
        }
    }

    /// Both noise sources disabled.
    pub fn deterministic() -> Self {
        Self {
            demographic: false,
            environmental: false,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self::full()
    }
}

/// Derive one seed per replicate from a master seed.
///
/// A master Xoshiro256++ stream is seeded from `master_seed` and one `u64` is
/// drawn per replicate in index order, so replicate `i` always receives the
/// same seed regardless of how replicates are scheduled.
pub fn derive_replicate_seeds(master_seed: u64, n_replicates: usize) -> Vec<u64> {
    let mut master = Xoshiro256PlusPlus::seed_from_u64(master_seed);
    (0..n_replicates).map(|_| master.random()).collect()
}

/// Largest count handed to the exact binomial and hypergeometric samplers.
///
/// Both convert counts through `i64` internally. Larger counts fall back to
/// the rounded expectation.
pub const MAX_EXACT_DRAW: u64 = 1 << 62;

/// Round a non-negative expected count half to even.
#[inline]
pub fn round_expected(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round_ties_even() as u64
    } else {
        0
    }
}

/// Seeded random source for one replicate.
#[derive(Debug, Clone)]
pub struct StochasticSampler {
    rng: Xoshiro256PlusPlus,
    noise: NoiseConfig,
    clamped: usize,
}

impl StochasticSampler {
    /// Create a sampler from a replicate seed.
    pub fn from_seed(seed: u64, noise: NoiseConfig) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            noise,
            clamped: 0,
        }
    }

    /// The noise switches this sampler was built with.
    #[inline]
    pub fn noise(&self) -> NoiseConfig {
        self.noise
    }

    /// Number of environmental draws that had to be clamped so far.
    #[inline]
    pub fn clamped_rates(&self) -> usize {
        self.clamped
    }

    /// Perturb a rate by one multiplicative Normal(1, sd) deviate.
    ///
    /// Returns `base_rate` untouched when environmental noise is disabled or
    /// `sd` is zero. The result is clamped into the valid range of `kind`.
    pub fn sample_environmental_rate(&mut self, base_rate: f64, sd: f64, kind: RateKind) -> f64 {
        if !self.noise.environmental || sd <= 0.0 {
            return base_rate;
        }
        let deviate = match Normal::new(1.0, sd) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => 1.0,
        };
        let (rate, was_clamped) = kind.clamp(base_rate * deviate);
        if was_clamped {
            self.clamped += 1;
        }
        rate
    }

    /// Number of survivors out of `n_individuals` at `probability`.
    ///
    /// Binomial with demographic noise, expected value rounded half to even
    /// without or when `n_individuals` exceeds [`MAX_EXACT_DRAW`]. Never
    /// exceeds `n_individuals`.
    pub fn sample_demographic_survivors(&mut self, n_individuals: u64, probability: f64) -> u64 {
        if n_individuals == 0 || probability <= 0.0 {
            return 0;
        }
        if probability >= 1.0 {
            return n_individuals;
        }
        if self.noise.demographic && n_individuals <= MAX_EXACT_DRAW {
            match Binomial::new(n_individuals, probability) {
                Ok(binomial) => binomial.sample(&mut self.rng),
                Err(_) => round_expected(n_individuals as f64 * probability).min(n_individuals),
            }
        } else {
            round_expected(n_individuals as f64 * probability).min(n_individuals)
        }
    }

    /// Number of offspring produced by `n_breeding` individuals at
    /// `fertility_rate` expected offspring each.
    ///
    /// Poisson(n × rate) with demographic noise, rounded expectation without.
    pub fn sample_offspring(&mut self, n_breeding: u64, fertility_rate: f64) -> u64 {
        let lambda = n_breeding as f64 * fertility_rate;
        if !lambda.is_finite() || lambda <= 0.0 {
            return 0;
        }
        if self.noise.demographic {
            match Poisson::new(lambda) {
                Ok(poisson) => poisson.sample(&mut self.rng) as u64,
                Err(_) => round_expected(lambda),
            }
        } else {
            round_expected(lambda)
        }
    }

    /// Split `births` into `(females, males)`.
    pub fn split_offspring(&mut self, births: u64, male_proportion: f64) -> (u64, u64) {
        let males = self.sample_demographic_survivors(births, male_proportion);
        (births - males, males)
    }

    /// A single Bernoulli trial.
    #[inline]
    pub fn bernoulli(&mut self, probability: f64) -> bool {
        // random::<f64>() is in [0, 1), so p = 1.0 always fires and p = 0.0 never does
        self.rng.random::<f64>() < probability
    }

    /// Reduce `counts` to exactly `keep` individuals in total.
    ///
    /// With demographic noise every individual is equally likely to be kept
    /// (sequential hypergeometric draws). Without it the kept total is
    /// apportioned by largest remainder, ties going to the lower index.
    /// Does nothing when `keep` is at least the current total.
    pub fn thin(&mut self, counts: &mut [u64], keep: u64) {
        let total: u128 = counts.iter().map(|&count| count as u128).sum();
        if keep as u128 >= total {
            return;
        }
        if self.noise.demographic && total <= MAX_EXACT_DRAW as u128 {
            self.thin_random(counts, total as u64, keep);
        } else {
            thin_by_largest_remainder(counts, total, keep);
        }
    }

    fn thin_random(&mut self, counts: &mut [u64], total: u64, keep: u64) {
        let mut remaining_total = total;
        let mut remaining_keep = keep;
        for count in counts.iter_mut() {
            let class = *count;
            let kept = if remaining_keep == 0 {
                0
            } else {
                match Hypergeometric::new(remaining_total, class, remaining_keep) {
                    Ok(dist) => dist.sample(&mut self.rng),
                    Err(_) => class.min(remaining_keep),
                }
            };
            remaining_total -= class;
            remaining_keep -= kept;
            *count = kept;
        }
    }
}

fn thin_by_largest_remainder(counts: &mut [u64], total: u128, keep: u64) {
    let keep_wide = keep as u128;

    let mut assigned = 0u64;
    let mut remainders: Vec<(u128, usize)> = Vec::with_capacity(counts.len());
    for (idx, count) in counts.iter_mut().enumerate() {
        let scaled = *count as u128 * keep_wide;
        let floor = (scaled / total) as u64;
        remainders.push((scaled % total, idx));
        *count = floor;
        assigned += floor;
    }

    // Largest remainder first, lower index first on ties
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    let leftover = (keep - assigned) as usize;
    for &(_, idx) in remainders.iter().take(leftover) {
        counts[idx] += 1;
    }
}
