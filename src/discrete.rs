//! Discrete probability distributions.
//!
//! Integer-supported families with log-space PMFs, running-sum CDFs and
//! closed-form moments.
//!
//! # Supported Distributions
//!
//! | Distribution | Parameters | Support | Mean | Variance |
//! |---|---|---|---|---|
//! | [`Bernoulli`] | p | {0, 1} | p | p(1−p) |
//! | [`Binomial`] | n, p | 0..=n | np | np(1−p) |
//! | [`Geometric`] | p, form | k ≥ 1 or k ≥ 0 | 1/p or (1−p)/p | (1−p)/p² |
//! | [`Poisson`] | λ | k ≥ 0 | λ | λ |
//! | [`NegativeBinomial`] | r, p | k ≥ r | r/p | r(1−p)/p² |
//! | [`Hypergeometric`] | N, K, n | max(0,n−N+K)..=min(n,K) | nK/N | see docs |
//!
//! `kurtosis` is the standardized fourth central moment (not excess).
//! Both `skewness` and `kurtosis` are `None` for degenerate distributions.

use serde::{Deserialize, Serialize};

use crate::error::{ProbabilityError, ProbabilityResult};
use crate::special::log_binomial_coefficient;
use crate::special::{ln_factorial, standard_normal_cdf};
use crate::validation;

/// Returns the integer `k` if `x` is a finite whole number.
pub(crate) fn support_point(x: f64) -> Option<i64> {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 9.0e18 {
        Some(x as i64)
    } else {
        None
    }
}

/// A distribution over the integers.
pub trait DiscreteDistribution {
    /// Natural log of the PMF at integer `k`; `-∞` outside the support.
    fn ln_pmf(&self, k: i64) -> f64;

    /// Smallest value in the support.
    fn support_min(&self) -> i64;

    /// Largest value in the support, `None` when unbounded.
    fn support_max(&self) -> Option<i64>;

    fn mean(&self) -> f64;

    fn variance(&self) -> f64;

    /// Third standardized moment, `None` when the variance is zero.
    fn skewness(&self) -> Option<f64>;

    /// Fourth standardized moment, `None` when the variance is zero.
    fn kurtosis(&self) -> Option<f64>;

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// PMF at integer `k`.
    fn pmf_at(&self, k: i64) -> f64 {
        let ln = self.ln_pmf(k);
        if ln == f64::NEG_INFINITY {
            0.0
        } else {
            ln.exp()
        }
    }

    /// PMF at real `x`: zero unless `x` is an integer in the support.
    fn pmf(&self, x: f64) -> f64 {
        match support_point(x) {
            Some(k) => self.pmf_at(k),
            None => 0.0,
        }
    }

    /// CDF `P(X ≤ x)` as the running sum of the PMF.
    ///
    /// The sum starts at the first point whose PMF does not underflow to
    /// zero, found by bisection below the mean. Past the mean it stops once
    /// a term no longer changes the accumulated total. A sum that would need
    /// more than [`MAX_CDF_TERMS`] terms falls back to the continuity
    /// corrected normal approximation `Φ((⌊x⌋ + ½ − μ) / σ)`.
    fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let lo = self.support_min();
        if x < lo as f64 {
            return 0.0;
        }
        if let Some(hi) = self.support_max() {
            if x >= hi as f64 {
                return 1.0;
            }
        }
        if x >= 9.0e18 {
            return 1.0;
        }
        let k = x.floor() as i64;
        let mean = self.mean();
        let start = first_contributing_point(self, lo, k);
        let mut total = 0.0;
        for (terms, i) in (start..=k).enumerate() {
            if terms == MAX_CDF_TERMS {
                let z = (k as f64 + 0.5 - mean) / self.std_dev();
                return standard_normal_cdf(z);
            }
            let term = self.pmf_at(i);
            total += term;
            if i as f64 > mean && term <= total * f64::EPSILON * 0.5 {
                break;
            }
        }
        total.min(1.0)
    }
}

/// Most PMF terms the default [`DiscreteDistribution::cdf`] sums before
/// switching to the normal approximation.
pub const MAX_CDF_TERMS: usize = 1_000_000;

/// `exp` of anything below this is exactly `0.0` in `f64`.
const LN_PMF_UNDERFLOW: f64 = -745.2;

/// First `i` in `lo..=k` whose PMF survives `exp`, assuming a unimodal PMF
/// whose mode lies near the mean. Falls back to `lo` when the point nearest
/// the mean underflows too.
fn first_contributing_point<D: DiscreteDistribution + ?Sized>(dist: &D, lo: i64, k: i64) -> i64 {
    let contributes = |i: i64| dist.ln_pmf(i) > LN_PMF_UNDERFLOW;
    if contributes(lo) {
        return lo;
    }
    let centre = dist.mean().floor().clamp(lo as f64, k as f64) as i64;
    if !contributes(centre) {
        return lo;
    }
    // nonzero terms form one run, so everything in (below, hit] contributes
    let (mut below, mut hit) = (lo, centre);
    while hit - below > 1 {
        let mid = below + (hit - below) / 2;
        if contributes(mid) {
            hit = mid;
        } else {
            below = mid;
        }
    }
    hit
}

/// Standardized moment of `order` by direct summation over a finite
/// support. Used where closed forms divide by zero.
fn summed_standardized_moment<D: DiscreteDistribution>(dist: &D, order: i32) -> Option<f64> {
    let var = dist.variance();
    if var <= 0.0 {
        return None;
    }
    let hi = dist.support_max()?;
    let mean = dist.mean();
    let central: f64 = (dist.support_min()..=hi)
        .map(|k| dist.pmf_at(k) * (k as f64 - mean).powi(order))
        .sum();
    Some(central / var.powf(order as f64 / 2.0))
}

// ============================================================================
// Bernoulli Distribution
// ============================================================================

/// Bernoulli distribution: a single trial with success probability `p`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bernoulli {
    p: f64,
}

impl Bernoulli {
    /// # Errors
    /// Returns `Validation` if `p ∉ [0, 1]`.
    pub fn new(p: f64) -> ProbabilityResult<Self> {
        let p = validation::probability("p", p)?;
        Ok(Self { p })
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl DiscreteDistribution for Bernoulli {
    fn ln_pmf(&self, k: i64) -> f64 {
        match k {
            0 => (1.0 - self.p).ln(),
            1 => self.p.ln(),
            _ => f64::NEG_INFINITY,
        }
    }

    fn support_min(&self) -> i64 {
        0
    }

    fn support_max(&self) -> Option<i64> {
        Some(1)
    }

    fn pmf_at(&self, k: i64) -> f64 {
        match k {
            0 => 1.0 - self.p,
            1 => self.p,
            _ => 0.0,
        }
    }

    fn mean(&self) -> f64 {
        self.p
    }

    fn variance(&self) -> f64 {
        self.p * (1.0 - self.p)
    }

    fn skewness(&self) -> Option<f64> {
        let pq = self.variance();
        if pq == 0.0 {
            return None;
        }
        Some((1.0 - 2.0 * self.p) / pq.sqrt())
    }

    fn kurtosis(&self) -> Option<f64> {
        let pq = self.variance();
        if pq == 0.0 {
            return None;
        }
        Some(3.0 + (1.0 - 6.0 * pq) / pq)
    }
}

// ============================================================================
// Binomial Distribution
// ============================================================================

/// Binomial distribution: successes in `n` independent trials.
///
/// PMF evaluated as
/// `exp(ln C(n,k) + k·ln p + (n−k)·ln(1−p))`, which stays finite for
/// any `n` that fits the integer range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Binomial {
    n: u64,
    p: f64,
}

impl Binomial {
    /// # Errors
    /// Returns `Validation` if `p ∉ [0, 1]`.
    pub fn new(n: u64, p: f64) -> ProbabilityResult<Self> {
        let p = validation::probability("p", p)?;
        Ok(Self { n, p })
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl DiscreteDistribution for Binomial {
    fn ln_pmf(&self, k: i64) -> f64 {
        let n = self.n as i64;
        if k < 0 || k > n {
            return f64::NEG_INFINITY;
        }
        // 0·ln(0) must read as 0, not NaN
        if self.p == 0.0 {
            return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
        }
        if self.p == 1.0 {
            return if k == n { 0.0 } else { f64::NEG_INFINITY };
        }
        let kf = k as f64;
        log_binomial_coefficient(n, k) + kf * self.p.ln() + (n as f64 - kf) * (-self.p).ln_1p()
    }

    fn support_min(&self) -> i64 {
        0
    }

    fn support_max(&self) -> Option<i64> {
        Some(self.n as i64)
    }

    fn mean(&self) -> f64 {
        self.n as f64 * self.p
    }

    fn variance(&self) -> f64 {
        self.n as f64 * self.p * (1.0 - self.p)
    }

    fn skewness(&self) -> Option<f64> {
        let var = self.variance();
        if var == 0.0 {
            return None;
        }
        Some((1.0 - 2.0 * self.p) / var.sqrt())
    }

    fn kurtosis(&self) -> Option<f64> {
        let var = self.variance();
        if var == 0.0 {
            return None;
        }
        let pq = self.p * (1.0 - self.p);
        Some(3.0 + (1.0 - 6.0 * pq) / var)
    }
}

// ============================================================================
// Geometric Distribution
// ============================================================================

/// Which random variable a [`Geometric`] distribution counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeometricForm {
    /// Number of trials up to and including the first success (`k ≥ 1`).
    Trials,
    /// Number of failures before the first success (`k ≥ 0`).
    Failures,
}

/// Geometric distribution with success probability `p ∈ (0, 1]`.
///
/// - Trials form: `pmf(k) = p(1−p)^{k−1}`, mean `1/p`
/// - Failures form: `pmf(k) = p(1−p)^k`, mean `(1−p)/p`
///
/// Both share the variance `(1−p)/p²`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geometric {
    p: f64,
    form: GeometricForm,
}

impl Geometric {
    /// # Errors
    /// Returns `Validation` if `p ∉ (0, 1]`.
    pub fn new(p: f64, form: GeometricForm) -> ProbabilityResult<Self> {
        let p = validation::success_probability("p", p)?;
        Ok(Self { p, form })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn form(&self) -> GeometricForm {
        self.form
    }

    fn offset(&self) -> i64 {
        match self.form {
            GeometricForm::Trials => 1,
            GeometricForm::Failures => 0,
        }
    }
}

impl DiscreteDistribution for Geometric {
    fn ln_pmf(&self, k: i64) -> f64 {
        let failures = k - self.offset();
        if failures < 0 {
            return f64::NEG_INFINITY;
        }
        if self.p == 1.0 {
            return if failures == 0 { 0.0 } else { f64::NEG_INFINITY };
        }
        self.p.ln() + failures as f64 * (-self.p).ln_1p()
    }

    fn support_min(&self) -> i64 {
        self.offset()
    }

    fn support_max(&self) -> Option<i64> {
        None
    }

    /// Closed form `1 − (1−p)^{j+1}` of the running PMF sum, `j` being the
    /// number of failures up to `x`.
    fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let failures = x.floor() - self.offset() as f64;
        if failures < 0.0 {
            return 0.0;
        }
        -((failures + 1.0) * (-self.p).ln_1p()).exp_m1()
    }

    fn mean(&self) -> f64 {
        match self.form {
            GeometricForm::Trials => 1.0 / self.p,
            GeometricForm::Failures => (1.0 - self.p) / self.p,
        }
    }

    fn variance(&self) -> f64 {
        (1.0 - self.p) / (self.p * self.p)
    }

    fn skewness(&self) -> Option<f64> {
        let q = 1.0 - self.p;
        if q == 0.0 {
            return None;
        }
        Some((2.0 - self.p) / q.sqrt())
    }

    fn kurtosis(&self) -> Option<f64> {
        let q = 1.0 - self.p;
        if q == 0.0 {
            return None;
        }
        Some(9.0 + self.p * self.p / q)
    }
}

// ============================================================================
// Poisson Distribution
// ============================================================================

/// Poisson distribution with rate `λ > 0`.
///
/// `pmf(k) = exp(k·ln λ − λ − ln k!)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Poisson {
    lambda: f64,
}

impl Poisson {
    /// # Errors
    /// Returns `Validation` if `λ` is not finite and positive.
    pub fn new(lambda: f64) -> ProbabilityResult<Self> {
        let lambda = validation::positive("lambda", lambda)?;
        Ok(Self { lambda })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl DiscreteDistribution for Poisson {
    fn ln_pmf(&self, k: i64) -> f64 {
        if k < 0 {
            return f64::NEG_INFINITY;
        }
        k as f64 * self.lambda.ln() - self.lambda - ln_factorial(k as u64)
    }

    fn support_min(&self) -> i64 {
        0
    }

    fn support_max(&self) -> Option<i64> {
        None
    }

    fn mean(&self) -> f64 {
        self.lambda
    }

    fn variance(&self) -> f64 {
        self.lambda
    }

    fn skewness(&self) -> Option<f64> {
        Some(1.0 / self.lambda.sqrt())
    }

    fn kurtosis(&self) -> Option<f64> {
        Some(3.0 + 1.0 / self.lambda)
    }
}

// ============================================================================
// Negative Binomial Distribution
// ============================================================================

/// Negative binomial distribution: trials needed for the `r`-th success.
///
/// Support `k ≥ r`,
/// `pmf(k) = exp(ln C(k−1, r−1) + r·ln p + (k−r)·ln(1−p))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NegativeBinomial {
    r: u64,
    p: f64,
}

impl NegativeBinomial {
    /// # Errors
    /// Returns `Validation` if `r == 0` or `p ∉ (0, 1]`.
    pub fn new(r: u64, p: f64) -> ProbabilityResult<Self> {
        if r == 0 {
            return Err(ProbabilityError::Validation(
                "r must be a positive integer, got 0".into(),
            ));
        }
        let p = validation::success_probability("p", p)?;
        Ok(Self { r, p })
    }

    pub fn r(&self) -> u64 {
        self.r
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl DiscreteDistribution for NegativeBinomial {
    fn ln_pmf(&self, k: i64) -> f64 {
        let r = self.r as i64;
        if k < r {
            return f64::NEG_INFINITY;
        }
        if self.p == 1.0 {
            return if k == r { 0.0 } else { f64::NEG_INFINITY };
        }
        log_binomial_coefficient(k - 1, r - 1)
            + r as f64 * self.p.ln()
            + (k - r) as f64 * (-self.p).ln_1p()
    }

    fn support_min(&self) -> i64 {
        self.r as i64
    }

    fn support_max(&self) -> Option<i64> {
        None
    }

    fn mean(&self) -> f64 {
        self.r as f64 / self.p
    }

    fn variance(&self) -> f64 {
        self.r as f64 * (1.0 - self.p) / (self.p * self.p)
    }

    fn skewness(&self) -> Option<f64> {
        let rq = self.r as f64 * (1.0 - self.p);
        if rq == 0.0 {
            return None;
        }
        Some((2.0 - self.p) / rq.sqrt())
    }

    fn kurtosis(&self) -> Option<f64> {
        let r = self.r as f64;
        let rq = r * (1.0 - self.p);
        if rq == 0.0 {
            return None;
        }
        Some(3.0 + 6.0 / r + self.p * self.p / rq)
    }
}

// ============================================================================
// Hypergeometric Distribution
// ============================================================================

/// Hypergeometric distribution: successes in `n` draws without
/// replacement from a population of `N` items containing `K` successes.
///
/// `pmf(k) = C(K,k)·C(N−K,n−k)/C(N,n)` on
/// `max(0, n−(N−K)) ≤ k ≤ min(n, K)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hypergeometric {
    population: u64,
    successes: u64,
    draws: u64,
}

impl Hypergeometric {
    /// # Errors
    /// Returns `Validation` unless `N > 0`, `K ≤ N` and `0 < n ≤ N`.
    pub fn new(population: u64, successes: u64, draws: u64) -> ProbabilityResult<Self> {
        if population == 0 {
            return Err(ProbabilityError::Validation(
                "population N must be > 0".into(),
            ));
        }
        validation::count_in_range("successes K", successes, 0, population)?;
        validation::count_in_range("draws n", draws, 1, population)?;
        Ok(Self {
            population,
            successes,
            draws,
        })
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl DiscreteDistribution for Hypergeometric {
    fn ln_pmf(&self, k: i64) -> f64 {
        if k < self.support_min() || k > self.draws.min(self.successes) as i64 {
            return f64::NEG_INFINITY;
        }
        let (n_pop, k_pop, draws) = (
            self.population as i64,
            self.successes as i64,
            self.draws as i64,
        );
        log_binomial_coefficient(k_pop, k) + log_binomial_coefficient(n_pop - k_pop, draws - k)
            - log_binomial_coefficient(n_pop, draws)
    }

    fn support_min(&self) -> i64 {
        let failures = self.population - self.successes;
        self.draws.saturating_sub(failures) as i64
    }

    fn support_max(&self) -> Option<i64> {
        Some(self.draws.min(self.successes) as i64)
    }

    fn mean(&self) -> f64 {
        self.draws as f64 * self.successes as f64 / self.population as f64
    }

    fn variance(&self) -> f64 {
        if self.population == 1 {
            return 0.0;
        }
        let big_n = self.population as f64;
        let k = self.successes as f64;
        let n = self.draws as f64;
        n * (k / big_n) * ((big_n - k) / big_n) * ((big_n - n) / (big_n - 1.0))
    }

    fn skewness(&self) -> Option<f64> {
        if self.variance() <= 0.0 {
            return None;
        }
        if self.population <= 2 {
            return summed_standardized_moment(self, 3);
        }
        let big_n = self.population as f64;
        let k = self.successes as f64;
        let n = self.draws as f64;
        let num = (big_n - 2.0 * k) * (big_n - 1.0).sqrt() * (big_n - 2.0 * n);
        let den = (n * k * (big_n - k) * (big_n - n)).sqrt() * (big_n - 2.0);
        Some(num / den)
    }

    fn kurtosis(&self) -> Option<f64> {
        if self.variance() <= 0.0 {
            return None;
        }
        if self.population <= 3 {
            return summed_standardized_moment(self, 4);
        }
        let big_n = self.population as f64;
        let k = self.successes as f64;
        let n = self.draws as f64;
        let spread = n * k * (big_n - k) * (big_n - n);
        let num = (big_n - 1.0)
            * big_n
            * big_n
            * (big_n * (big_n + 1.0) - 6.0 * k * (big_n - k) - 6.0 * n * (big_n - n))
            + 6.0 * spread * (5.0 * big_n - 6.0);
        let den = spread * (big_n - 2.0) * (big_n - 3.0);
        Some(3.0 + num / den)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Sums the PMF over the support, stopping once the remaining mass of an
    /// unbounded family is negligible.
    fn total_mass<D: DiscreteDistribution>(d: &D) -> f64 {
        let lo = d.support_min();
        let hi = d.support_max().unwrap_or(lo + 100_000);
        let mut total = 0.0;
        for k in lo..=hi {
            let term = d.pmf_at(k);
            total += term;
            if k as f64 > d.mean() && term < 1e-18 {
                break;
            }
        }
        total
    }

    /// Standardized moment by brute-force summation.
    fn standardized<D: DiscreteDistribution>(d: &D, order: i32) -> f64 {
        let lo = d.support_min();
        let hi = d.support_max().unwrap_or(lo + 20_000);
        let mean = d.mean();
        let sd = d.std_dev();
        (lo..=hi)
            .map(|k| d.pmf_at(k) * ((k as f64 - mean) / sd).powi(order))
            .sum()
    }

    // --- Bernoulli ---

    #[test]
    fn test_bernoulli_fair_coin() {
        let b = Bernoulli::new(0.5).unwrap();
        assert_eq!(b.pmf(0.0), 0.5);
        assert_eq!(b.pmf(1.0), 0.5);
        assert_eq!(b.pmf(2.0), 0.0);
        assert_eq!(b.pmf(0.5), 0.0);
        assert_eq!(b.variance(), 0.25);
        assert_eq!(b.skewness(), Some(0.0));
        assert!((b.kurtosis().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bernoulli_variance_maximal_at_half() {
        let max = Bernoulli::new(0.5).unwrap().variance();
        for i in 0..=20 {
            let p = i as f64 / 20.0;
            assert!(Bernoulli::new(p).unwrap().variance() <= max);
        }
    }

    #[test]
    fn test_bernoulli_degenerate() {
        let b = Bernoulli::new(1.0).unwrap();
        assert_eq!(b.variance(), 0.0);
        assert_eq!(b.skewness(), None);
        assert_eq!(b.kurtosis(), None);
        assert_eq!(b.cdf(0.5), 0.0);
        assert_eq!(b.cdf(1.0), 1.0);
    }

    #[test]
    fn test_bernoulli_invalid() {
        assert!(Bernoulli::new(1.5).is_err());
        assert!(Bernoulli::new(-0.1).is_err());
        assert!(Bernoulli::new(f64::NAN).is_err());
    }

    // --- Binomial ---

    #[test]
    fn test_binomial_moments() {
        let b = Binomial::new(10, 0.3).unwrap();
        assert!((b.mean() - 3.0).abs() < 1e-12);
        assert!((b.variance() - 2.1).abs() < 1e-12);
        assert!((b.skewness().unwrap() - standardized(&b, 3)).abs() < 1e-9);
        assert!((b.kurtosis().unwrap() - standardized(&b, 4)).abs() < 1e-9);
    }

    #[test]
    fn test_binomial_pmf_known_value() {
        // C(10,3)·0.3³·0.7⁷ = 0.266827932
        let b = Binomial::new(10, 0.3).unwrap();
        assert!((b.pmf(3.0) - 0.266827932).abs() < 1e-9);
        assert_eq!(b.pmf(-1.0), 0.0);
        assert_eq!(b.pmf(11.0), 0.0);
        assert_eq!(b.pmf(2.5), 0.0);
    }

    #[test]
    fn test_binomial_edge_probabilities() {
        let zero = Binomial::new(5, 0.0).unwrap();
        assert_eq!(zero.pmf(0.0), 1.0);
        assert_eq!(zero.pmf(1.0), 0.0);
        let one = Binomial::new(5, 1.0).unwrap();
        assert_eq!(one.pmf(5.0), 1.0);
        assert_eq!(one.pmf(4.0), 0.0);
        assert_eq!(one.skewness(), None);
    }

    #[test]
    fn test_binomial_large_n_is_finite() {
        let b = Binomial::new(5000, 0.5).unwrap();
        let p = b.pmf(2500.0);
        assert!(p.is_finite() && p > 0.0);
        assert!((total_mass(&b) - 1.0).abs() < 1e-6);
    }

    // --- Geometric ---

    #[test]
    fn test_geometric_trials_moments() {
        let g = Geometric::new(0.2, GeometricForm::Trials).unwrap();
        assert!((g.mean() - 5.0).abs() < 1e-12);
        assert!((g.variance() - 20.0).abs() < 1e-12);
        assert_eq!(g.pmf(0.0), 0.0);
        assert!((g.pmf(1.0) - 0.2).abs() < 1e-15);
        assert!((g.pmf(3.0) - 0.2 * 0.8 * 0.8).abs() < 1e-15);
    }

    #[test]
    fn test_geometric_failures_moments() {
        let g = Geometric::new(0.2, GeometricForm::Failures).unwrap();
        assert!((g.mean() - 4.0).abs() < 1e-12);
        assert!((g.variance() - 20.0).abs() < 1e-12);
        assert!((g.pmf(0.0) - 0.2).abs() < 1e-15);
    }

    #[test]
    fn test_geometric_cdf_matches_running_sum() {
        for form in [GeometricForm::Trials, GeometricForm::Failures] {
            let g = Geometric::new(0.3, form).unwrap();
            let mut running = 0.0;
            for k in g.support_min()..40 {
                running += g.pmf_at(k);
                assert!((g.cdf(k as f64) - running).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_geometric_skew_kurtosis_match_summation() {
        let g = Geometric::new(0.4, GeometricForm::Trials).unwrap();
        assert!((g.skewness().unwrap() - standardized(&g, 3)).abs() < 1e-8);
        assert!((g.kurtosis().unwrap() - standardized(&g, 4)).abs() < 1e-8);
    }

    #[test]
    fn test_geometric_rejects_zero_p() {
        assert!(Geometric::new(0.0, GeometricForm::Trials).is_err());
        assert!(Geometric::new(1.0, GeometricForm::Trials).is_ok());
    }

    // --- Poisson ---

    #[test]
    fn test_poisson_mean_equals_variance() {
        for &lambda in &[0.1, 1.0, 4.5, 100.0] {
            let p = Poisson::new(lambda).unwrap();
            assert_eq!(p.mean(), lambda);
            assert_eq!(p.variance(), lambda);
        }
    }

    #[test]
    fn test_poisson_pmf_and_cdf() {
        let p = Poisson::new(3.0).unwrap();
        // e^{-3}·3²/2!
        assert!((p.pmf(2.0) - 0.224041807655).abs() < 1e-10);
        assert!((p.cdf(2.0) - 0.423190081858).abs() < 1e-10);
        assert_eq!(p.cdf(-0.5), 0.0);
        assert!((total_mass(&p) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_poisson_cdf_far_tail_is_one() {
        let p = Poisson::new(5.0).unwrap();
        assert!((p.cdf(1e12) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_poisson_cdf_skips_underflowed_head() {
        let p = Poisson::new(2000.0).unwrap();
        let plain: f64 = (0..=2000).map(|k| p.pmf_at(k)).sum();
        assert_eq!(p.cdf(2000.0), plain);
        assert!((p.cdf(2000.0) - 0.506).abs() < 0.01);
    }

    #[test]
    fn test_huge_parameters_cdf_is_bounded() {
        let p = Poisson::new(1e15).unwrap();
        assert!((p.cdf(1e15) - 0.5).abs() < 0.01);
        assert!(p.cdf(1e15 - 1e9) < 1e-12);

        let b = Binomial::new(1 << 53, 0.5).unwrap();
        let median = (1_u64 << 52) as f64;
        assert!((b.cdf(median) - 0.5).abs() < 0.01);
        assert!(b.cdf(median + 1e9) > 1.0 - 1e-12);
    }

    #[test]
    fn test_poisson_invalid() {
        assert!(Poisson::new(0.0).is_err());
        assert!(Poisson::new(-2.0).is_err());
    }

    // --- Negative Binomial ---

    #[test]
    fn test_negative_binomial_support_and_moments() {
        let nb = NegativeBinomial::new(3, 0.4).unwrap();
        assert_eq!(nb.pmf(2.0), 0.0);
        assert!((nb.pmf(3.0) - 0.064).abs() < 1e-12);
        assert!((nb.mean() - 7.5).abs() < 1e-12);
        assert!((nb.variance() - 3.0 * 0.6 / 0.16).abs() < 1e-12);
        assert!((total_mass(&nb) - 1.0).abs() < 1e-6);
        assert!((nb.skewness().unwrap() - standardized(&nb, 3)).abs() < 1e-7);
        assert!((nb.kurtosis().unwrap() - standardized(&nb, 4)).abs() < 1e-7);
    }

    #[test]
    fn test_negative_binomial_r1_is_geometric() {
        let nb = NegativeBinomial::new(1, 0.25).unwrap();
        let g = Geometric::new(0.25, GeometricForm::Trials).unwrap();
        for k in 1..20 {
            assert!((nb.pmf_at(k) - g.pmf_at(k)).abs() < 1e-14);
        }
    }

    #[test]
    fn test_negative_binomial_invalid() {
        assert!(NegativeBinomial::new(0, 0.5).is_err());
        assert!(NegativeBinomial::new(2, 0.0).is_err());
    }

    // --- Hypergeometric ---

    #[test]
    fn test_hypergeometric_known_value() {
        // Urn with 20 balls, 7 red, draw 12: P(X = 4) = C(7,4)C(13,8)/C(20,12)
        let h = Hypergeometric::new(20, 7, 12).unwrap();
        let expected = 35.0 * 1287.0 / 125_970.0;
        assert!((h.pmf(4.0) - expected).abs() < 1e-12);
        assert_eq!(h.support_min(), 0);
        assert_eq!(h.support_max(), Some(7));
        assert!((total_mass(&h) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_hypergeometric_support_lower_bound() {
        // 10 items, 8 successes, draw 5: at least 3 successes
        let h = Hypergeometric::new(10, 8, 5).unwrap();
        assert_eq!(h.support_min(), 3);
        assert_eq!(h.pmf(2.0), 0.0);
        assert_eq!(h.cdf(2.0), 0.0);
    }

    #[test]
    fn test_hypergeometric_moments_match_summation() {
        let h = Hypergeometric::new(20, 7, 12).unwrap();
        assert!((h.skewness().unwrap() - standardized(&h, 3)).abs() < 1e-9);
        assert!((h.kurtosis().unwrap() - standardized(&h, 4)).abs() < 1e-9);
        let small = Hypergeometric::new(3, 1, 1).unwrap();
        assert!((small.kurtosis().unwrap() - standardized(&small, 4)).abs() < 1e-12);
    }

    #[test]
    fn test_hypergeometric_invalid() {
        assert!(Hypergeometric::new(0, 0, 0).is_err());
        assert!(Hypergeometric::new(10, 11, 2).is_err());
        assert!(Hypergeometric::new(10, 5, 0).is_err());
        assert!(Hypergeometric::new(10, 5, 11).is_err());
    }
}
