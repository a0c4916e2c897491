//! Reproducible random variates for every distribution family.
//!
//! A [`Sampler`] turns a stream of uniforms into draws from one
//! [`DistributionSpec`]. Each family consumes the generator in a fixed
//! order, so a given `(spec, seed)` always produces the same sequence.
//!
//! | Family | Method |
//! |---|---|
//! | Bernoulli | `u < p` |
//! | Binomial | sum of `n` Bernoulli draws |
//! | Geometric | inverse CDF |
//! | Poisson | Knuth's product of uniforms, `λ` split into chunks ≤ 30 |
//! | Negative binomial | sum of `r` geometric trial counts |
//! | Hypergeometric | sequential draws without replacement |
//! | Uniform, Exponential | inverse CDF |
//! | Normal | Box–Muller |
//! | Gamma | Marsaglia–Tsang, with the `u^{1/α}` boost for `α < 1` |
//!
//! # Large Parameters
//!
//! The discrete methods above are linear in their count parameter. Past
//! [`EXACT_COUNT_LIMIT`] (or [`NORMAL_VARIANCE_LIMIT`] for `λ`) each family
//! switches to a method whose cost does not grow with it:
//!
//! - Poisson, and Binomial or Hypergeometric with variance above
//!   [`NORMAL_VARIANCE_LIMIT`]: the normal approximation
//!   `round(μ + σ·z)`, clamped to the support.
//! - Binomial with smaller variance: geometric gaps between successes of
//!   the rarer outcome, `O(n·min(p, 1−p))`.
//! - Negative binomial: `r` plus a Poisson draw whose rate is
//!   `Gamma(r, p/(1−p))`.

use rand::Rng;

use crate::continuous::{Exponential, Uniform};
use crate::discrete::{
    Binomial, DiscreteDistribution, GeometricForm, Hypergeometric, NegativeBinomial,
};
use crate::distribution::DistributionSpec;
use crate::random::{open_unit, BoxMuller};

/// Largest rate handed to a single run of Knuth's algorithm; `e^{-30}`
/// is still far above the smallest normal `f64`.
const POISSON_CHUNK: f64 = 30.0;

/// Count parameters (`n`, `r`, draws) up to which the discrete samplers
/// simulate every trial.
pub const EXACT_COUNT_LIMIT: u64 = 10_000;

/// Variance above which Poisson, Binomial and Hypergeometric draws come
/// from the rounded normal approximation.
pub const NORMAL_VARIANCE_LIMIT: f64 = 10_000.0;

/// Draws variates from one distribution.
///
/// # Examples
/// ```
/// use u_probability::distribution::DistributionSpec;
/// use u_probability::random::create_rng;
/// use u_probability::sampling::Sampler;
///
/// let spec = DistributionSpec::poisson(3.0).unwrap();
/// let mut sampler = Sampler::new(spec);
/// let mut rng = create_rng(42);
/// let draws = sampler.sample_n(&mut rng, 1000);
/// assert!(draws.iter().all(|k| *k >= 0.0 && k.fract() == 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct Sampler {
    spec: DistributionSpec,
    normals: BoxMuller,
}

impl Sampler {
    pub fn new(spec: DistributionSpec) -> Self {
        Self {
            spec,
            normals: BoxMuller::new(),
        }
    }

    pub fn spec(&self) -> &DistributionSpec {
        &self.spec
    }

    /// One draw. Discrete families return integral values.
    pub fn sample<R: Rng>(&mut self, rng: &mut R) -> f64 {
        let normals = &mut self.normals;
        match self.spec {
            DistributionSpec::Bernoulli(d) => bernoulli(rng, d.p()),
            DistributionSpec::Binomial(d) => binomial(rng, normals, &d) as f64,
            DistributionSpec::Geometric(d) => geometric(rng, d.p(), d.form()) as f64,
            DistributionSpec::Poisson(d) => poisson(rng, normals, d.lambda()) as f64,
            DistributionSpec::NegativeBinomial(d) => negative_binomial(rng, normals, &d) as f64,
            DistributionSpec::Hypergeometric(d) => hypergeometric(rng, normals, &d) as f64,
            DistributionSpec::Uniform(d) => uniform(rng, &d),
            DistributionSpec::Normal(d) => d.mu() + d.sigma() * normals.next(rng),
            DistributionSpec::Exponential(d) => exponential(rng, &d),
            DistributionSpec::Gamma(d) => gamma(rng, normals, d.shape(), d.rate()),
        }
    }

    /// `n` consecutive draws.
    pub fn sample_n<R: Rng>(&mut self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.sample(rng)).collect()
    }
}

// ============================================================================
// Discrete Families
// ============================================================================

fn bernoulli<R: Rng>(rng: &mut R, p: f64) -> f64 {
    let u: f64 = rng.random();
    if u < p {
        1.0
    } else {
        0.0
    }
}

/// `round(mean + sd·z)` clamped to `[lo, hi]`.
fn rounded_normal<R: Rng>(
    rng: &mut R,
    normals: &mut BoxMuller,
    mean: f64,
    sd: f64,
    lo: f64,
    hi: f64,
) -> u64 {
    (mean + sd * normals.next(rng)).round().clamp(lo, hi) as u64
}

fn binomial<R: Rng>(rng: &mut R, normals: &mut BoxMuller, dist: &Binomial) -> u64 {
    let (n, p) = (dist.n(), dist.p());
    if n <= EXACT_COUNT_LIMIT {
        return (0..n).filter(|_| bernoulli(rng, p) == 1.0).count() as u64;
    }
    let variance = n as f64 * p * (1.0 - p);
    if variance > NORMAL_VARIANCE_LIMIT {
        return rounded_normal(rng, normals, n as f64 * p, variance.sqrt(), 0.0, n as f64);
    }
    if p > 0.5 {
        n - sparse_successes(rng, n, 1.0 - p)
    } else {
        sparse_successes(rng, n, p)
    }
}

/// Successes among `n` trials with success probability `q ≤ ½`, found by
/// jumping from one success to the next with geometric gaps.
fn sparse_successes<R: Rng>(rng: &mut R, n: u64, q: f64) -> u64 {
    if q <= 0.0 {
        return 0;
    }
    let mut position = 0_u64;
    let mut count = 0;
    loop {
        position = position.saturating_add(geometric(rng, q, GeometricForm::Trials));
        if position > n {
            return count;
        }
        count += 1;
    }
}

/// Inverse CDF: with `L = ln(1−u) / ln(1−p)`, the trial count is `⌈L⌉`
/// and the failure count `⌊L⌋`.
fn geometric<R: Rng>(rng: &mut R, p: f64, form: GeometricForm) -> u64 {
    let u: f64 = rng.random();
    let failures_form = form == GeometricForm::Failures;
    if p >= 1.0 {
        return if failures_form { 0 } else { 1 };
    }
    let ratio = (-u).ln_1p() / (-p).ln_1p();
    if failures_form {
        ratio.floor() as u64
    } else {
        (ratio.ceil() as u64).max(1)
    }
}

fn knuth_poisson<R: Rng>(rng: &mut R, lambda: f64) -> u64 {
    let threshold = (-lambda).exp();
    let mut count = 0_u64;
    let mut product: f64 = rng.random();
    while product > threshold {
        count += 1;
        product *= rng.random::<f64>();
    }
    count
}

fn poisson<R: Rng>(rng: &mut R, normals: &mut BoxMuller, lambda: f64) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    if lambda > NORMAL_VARIANCE_LIMIT {
        return rounded_normal(rng, normals, lambda, lambda.sqrt(), 0.0, f64::INFINITY);
    }
    let chunks = (lambda / POISSON_CHUNK).ceil() as u64;
    let last = lambda - (chunks - 1) as f64 * POISSON_CHUNK;
    (0..chunks)
        .map(|i| knuth_poisson(rng, if i + 1 == chunks { last } else { POISSON_CHUNK }))
        .sum()
}

fn negative_binomial<R: Rng>(
    rng: &mut R,
    normals: &mut BoxMuller,
    dist: &NegativeBinomial,
) -> u64 {
    let (r, p) = (dist.r(), dist.p());
    if r <= EXACT_COUNT_LIMIT {
        return (0..r).map(|_| geometric(rng, p, GeometricForm::Trials)).sum();
    }
    if p >= 1.0 {
        return r;
    }
    let lambda = gamma(rng, normals, r as f64, p / (1.0 - p));
    r.saturating_add(poisson(rng, normals, lambda))
}

fn hypergeometric<R: Rng>(rng: &mut R, normals: &mut BoxMuller, dist: &Hypergeometric) -> u64 {
    if dist.draws() > EXACT_COUNT_LIMIT && dist.variance() > NORMAL_VARIANCE_LIMIT {
        let lo = dist.support_min() as f64;
        let hi = dist.draws().min(dist.successes()) as f64;
        return rounded_normal(rng, normals, dist.mean(), dist.std_dev(), lo, hi);
    }
    let mut population = dist.population();
    let mut successes = dist.successes();
    let mut drawn = 0;
    for _ in 0..dist.draws() {
        let u: f64 = rng.random();
        if u * (population as f64) < successes as f64 {
            successes -= 1;
            drawn += 1;
        }
        population -= 1;
    }
    drawn
}

// ============================================================================
// Continuous Families
// ============================================================================

fn uniform<R: Rng>(rng: &mut R, dist: &Uniform) -> f64 {
    let u: f64 = rng.random();
    dist.a() + (dist.b() - dist.a()) * u
}

fn exponential<R: Rng>(rng: &mut R, dist: &Exponential) -> f64 {
    let u: f64 = rng.random();
    -(-u).ln_1p() / dist.lambda()
}

/// Marsaglia & Tsang (2000), "A Simple Method for Generating Gamma
/// Variables", *ACM TOMS* 26(3). For `α < 1` draws `Gamma(α + 1)` and
/// multiplies by `u^{1/α}`.
fn gamma<R: Rng>(rng: &mut R, normals: &mut BoxMuller, shape: f64, rate: f64) -> f64 {
    let (alpha, boost) = if shape < 1.0 {
        (shape + 1.0, Some(1.0 / shape))
    } else {
        (shape, None)
    };

    let d = alpha - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    let standard = loop {
        let x = normals.next(rng);
        let v = 1.0 + c * x;
        if v <= 0.0 {
            continue;
        }
        let v = v * v * v;
        let u = open_unit(rng);
        let x2 = x * x;
        if u < 1.0 - 0.0331 * x2 * x2 || u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
            break d * v;
        }
    };

    let scaled = match boost {
        Some(inv_shape) => standard * open_unit(rng).powf(inv_shape),
        None => standard,
    };
    scaled / rate
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn binomial_within_support(n in 0_u32..60, p in 0.0_f64..=1.0, seed in 0_u64..1000) {
            let spec = DistributionSpec::binomial(f64::from(n), p).unwrap();
            let xs = Sampler::new(spec).sample_n(&mut create_rng(seed), 50);
            prop_assert!(xs.iter().all(|&k| k >= 0.0 && k <= f64::from(n)));
        }

        #[test]
        fn gamma_draws_positive(shape in 0.05_f64..20.0, rate in 0.1_f64..10.0, seed in 0_u64..1000) {
            let spec = DistributionSpec::gamma(shape, rate).unwrap();
            let xs = Sampler::new(spec).sample_n(&mut create_rng(seed), 50);
            prop_assert!(xs.iter().all(|&x| x >= 0.0 && x.is_finite()));
        }

        #[test]
        fn exponential_draws_non_negative(lambda in 0.01_f64..100.0, seed in 0_u64..1000) {
            let spec = DistributionSpec::exponential(lambda).unwrap();
            let xs = Sampler::new(spec).sample_n(&mut create_rng(seed), 50);
            prop_assert!(xs.iter().all(|&x| x >= 0.0 && x.is_finite()));
        }
    }
}
