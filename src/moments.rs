//! Moments and moment generating functions.
//!
//! Raw moments are computed exactly for every family:
//!
//! | Family | Method |
//! |---|---|
//! | Bernoulli | `E[X^r] = p` |
//! | Binomial, Poisson, Hypergeometric | factorial moments through Stirling numbers of the second kind |
//! | Geometric, Negative Binomial | factorial moments of the failure count, then shifted |
//! | Uniform | `(b^{r+1} − a^{r+1}) / ((r+1)(b−a))` |
//! | Normal | binomial expansion of `μ + σZ` |
//! | Exponential | `r! / λ^r` |
//! | Gamma | `α(α+1)···(α+r−1) / β^r` |
//!
//! Central moments are closed form for Normal, Poisson, Uniform and
//! Exponential. Other families use their closed-form variance, skewness and
//! kurtosis for orders 2 to 4 and the binomial transform of the raw moments
//! above that.
//!
//! # Precision
//! The binomial transform `E[(X−μ)^r] = Σ C(r,i) E[X^i] (−μ)^{r−i}` is exact
//! algebraically but subtracts large terms of alternating sign. For orders
//! above 4 on distributions whose mean is large relative to their standard
//! deviation the result may lose most of its significant digits.

use serde::Serialize;
use tracing::{debug, trace};

use crate::discrete::{DiscreteDistribution, GeometricForm};
use crate::distribution::DistributionSpec;
use crate::error::{ProbabilityError, ProbabilityResult};
use crate::special::{
    binomial_coefficient, double_factorial, factorial, falling_factorial, rising_factorial,
    stirling2_row,
};
use crate::validation;
use crate::MAX_MOMENT_ORDER;

/// Moments of orders `1..=order`.
///
/// Index `i` of each vector holds the moment of order `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentSet {
    pub order: u32,
    /// `E[X^r]`.
    pub raw: Vec<f64>,
    /// `E[(X−μ)^r]`; `central[0]` is always zero.
    pub central: Vec<f64>,
    /// `E[(X−μ)^r] / σ^r`; empty when the variance is zero.
    pub standardized: Vec<f64>,
    /// Point at which the MGF was evaluated, if requested.
    pub point: Option<f64>,
    /// `M(point)`.
    pub mgf: Option<f64>,
}

impl MomentSet {
    pub fn mean(&self) -> f64 {
        self.raw[0]
    }

    /// Second central moment, if `order ≥ 2`.
    pub fn variance(&self) -> Option<f64> {
        self.central.get(1).copied()
    }

    /// Third standardized moment.
    pub fn skewness(&self) -> Option<f64> {
        self.standardized.get(2).copied()
    }

    /// Fourth standardized moment (not excess).
    pub fn kurtosis(&self) -> Option<f64> {
        self.standardized.get(3).copied()
    }
}

// ============================================================================
// Moment Generating Function
// ============================================================================

/// Open interval of `t` on which the MGF of `spec` is finite.
///
/// # Examples
/// ```
/// use u_probability::distribution::DistributionSpec;
/// use u_probability::moments::mgf_domain;
///
/// let spec = DistributionSpec::exponential(3.0).unwrap();
/// assert_eq!(mgf_domain(&spec), (f64::NEG_INFINITY, 3.0));
/// ```
pub fn mgf_domain(spec: &DistributionSpec) -> (f64, f64) {
    let upper = match spec {
        DistributionSpec::Geometric(d) => -(-d.p()).ln_1p(),
        DistributionSpec::NegativeBinomial(d) => -(-d.p()).ln_1p(),
        DistributionSpec::Exponential(d) => d.lambda(),
        DistributionSpec::Gamma(d) => d.rate(),
        _ => f64::INFINITY,
    };
    (f64::NEG_INFINITY, upper)
}

/// Evaluates the moment generating function `M(t) = E[e^{tX}]`.
///
/// # Errors
/// - `Validation` if `t` is not finite.
/// - `Domain` if `t` lies outside [`mgf_domain`] or `M(t)` overflows.
///
/// # Examples
/// ```
/// use u_probability::distribution::DistributionSpec;
/// use u_probability::moments::mgf;
///
/// let spec = DistributionSpec::exponential(1.0).unwrap();
/// assert!((mgf(&spec, 0.5).unwrap() - 2.0).abs() < 1e-12);
/// assert!(mgf(&spec, 2.0).is_err());
/// ```
pub fn mgf(spec: &DistributionSpec, t: f64) -> ProbabilityResult<f64> {
    validation::finite("t", t)?;
    let (_, upper) = mgf_domain(spec);
    if t >= upper {
        debug!(%spec, t, upper, "mgf outside domain");
        return Err(ProbabilityError::Domain(format!(
            "MGF of {spec} exists only for t < {upper}, got t = {t}"
        )));
    }

    let value = match spec {
        DistributionSpec::Bernoulli(d) => 1.0 - d.p() + d.p() * t.exp(),
        DistributionSpec::Binomial(d) => (1.0 - d.p() + d.p() * t.exp()).powf(d.n() as f64),
        DistributionSpec::Geometric(d) => {
            let p = d.p();
            let failures = p / (1.0 - (1.0 - p) * t.exp());
            match d.form() {
                GeometricForm::Trials => failures * t.exp(),
                GeometricForm::Failures => failures,
            }
        }
        DistributionSpec::Poisson(d) => (d.lambda() * t.exp_m1()).exp(),
        DistributionSpec::NegativeBinomial(d) => {
            let p = d.p();
            (p * t.exp() / (1.0 - (1.0 - p) * t.exp())).powf(d.r() as f64)
        }
        DistributionSpec::Hypergeometric(d) => {
            let hi = d.support_max().unwrap_or_else(|| d.support_min());
            (d.support_min()..=hi)
                .map(|k| d.pmf_at(k) * (t * k as f64).exp())
                .sum()
        }
        DistributionSpec::Uniform(d) => {
            let width = d.b() - d.a();
            if t == 0.0 {
                1.0
            } else {
                (t * d.a()).exp() * (t * width).exp_m1() / (t * width)
            }
        }
        DistributionSpec::Normal(d) => {
            (d.mu() * t + 0.5 * d.sigma() * d.sigma() * t * t).exp()
        }
        DistributionSpec::Exponential(d) => d.lambda() / (d.lambda() - t),
        DistributionSpec::Gamma(d) => (d.rate() / (d.rate() - t)).powf(d.shape()),
    };

    if !value.is_finite() {
        return Err(ProbabilityError::Domain(format!(
            "MGF of {spec} overflows at t = {t}"
        )));
    }
    Ok(value)
}

// ============================================================================
// Moment Derivation
// ============================================================================

/// Raw, central and standardized moments of `spec` up to `order`, plus the
/// MGF at `point` when one is given.
///
/// # Errors
/// - `Validation` if `order ∉ [1, 10]` or `point` is not finite.
/// - `Domain` if `point` lies outside the MGF's domain.
///
/// # Examples
/// ```
/// use u_probability::distribution::DistributionSpec;
/// use u_probability::moments::moments;
///
/// let spec = DistributionSpec::normal(0.0, 2.0).unwrap();
/// let set = moments(&spec, 4, None).unwrap();
/// assert_eq!(set.central, vec![0.0, 4.0, 0.0, 48.0]);
/// assert!((set.kurtosis().unwrap() - 3.0).abs() < 1e-12);
/// ```
pub fn moments(spec: &DistributionSpec, order: u32, point: Option<f64>) -> ProbabilityResult<MomentSet> {
    validation::count_in_range("order", order as u64, 1, MAX_MOMENT_ORDER as u64)?;
    let mgf_value = point.map(|t| mgf(spec, t)).transpose()?;

    let raw = raw_moments(spec, order);
    let central = central_moments(spec, &raw, order);
    let variance = central.get(1).copied().unwrap_or_else(|| spec.variance());
    let standardized = standardize(&central, variance);
    trace!(%spec, order, ?raw, ?central, "moments derived");

    Ok(MomentSet {
        order,
        raw: raw[1..].to_vec(),
        central,
        standardized,
        point,
        mgf: mgf_value,
    })
}

/// `E[X^r]` for `r = 0..=order`.
fn raw_moments(spec: &DistributionSpec, order: u32) -> Vec<f64> {
    match spec {
        DistributionSpec::Bernoulli(d) => {
            let mut raw = vec![d.p(); order as usize + 1];
            raw[0] = 1.0;
            raw
        }
        DistributionSpec::Binomial(d) => {
            let (n, p) = (d.n() as f64, d.p());
            from_factorial_moments(order, |j| falling_factorial(n, j) * p.powi(j as i32))
        }
        DistributionSpec::Poisson(d) => {
            let lambda = d.lambda();
            from_factorial_moments(order, |j| lambda.powi(j as i32))
        }
        DistributionSpec::Hypergeometric(d) => {
            let (pop, succ, draws) = (
                d.population() as f64,
                d.successes() as f64,
                d.draws() as f64,
            );
            from_factorial_moments(order, |j| {
                let numerator = falling_factorial(succ, j) * falling_factorial(draws, j);
                // (N)_j vanishes only once j > N ≥ n, where the numerator does too.
                if numerator == 0.0 {
                    0.0
                } else {
                    numerator / falling_factorial(pop, j)
                }
            })
        }
        DistributionSpec::Geometric(d) => {
            let ratio = (1.0 - d.p()) / d.p();
            let failures = from_factorial_moments(order, |j| factorial(j as u64) * ratio.powi(j as i32));
            match d.form() {
                GeometricForm::Failures => failures,
                GeometricForm::Trials => shift(&failures, 1.0),
            }
        }
        DistributionSpec::NegativeBinomial(d) => {
            let r = d.r() as f64;
            let ratio = (1.0 - d.p()) / d.p();
            let failures = from_factorial_moments(order, |j| rising_factorial(r, j) * ratio.powi(j as i32));
            shift(&failures, r)
        }
        DistributionSpec::Uniform(d) => {
            let (a, b) = (d.a(), d.b());
            (0..=order as i32)
                .map(|r| (b.powi(r + 1) - a.powi(r + 1)) / ((r + 1) as f64 * (b - a)))
                .collect()
        }
        DistributionSpec::Normal(d) => {
            let standard: Vec<f64> = (0..=order).map(standard_normal_moment).collect();
            let scaled: Vec<f64> = standard
                .iter()
                .enumerate()
                .map(|(r, m)| m * d.sigma().powi(r as i32))
                .collect();
            shift(&scaled, d.mu())
        }
        DistributionSpec::Exponential(d) => (0..=order)
            .map(|r| factorial(r as u64) / d.lambda().powi(r as i32))
            .collect(),
        DistributionSpec::Gamma(d) => (0..=order)
            .map(|r| rising_factorial(d.shape(), r) / d.rate().powi(r as i32))
            .collect(),
    }
}

/// Central moments of orders `1..=order`.
fn central_moments(spec: &DistributionSpec, raw: &[f64], order: u32) -> Vec<f64> {
    let variance = spec.variance();
    let mut central: Vec<f64> = match spec {
        DistributionSpec::Normal(d) => (1..=order)
            .map(|r| standard_normal_moment(r) * d.sigma().powi(r as i32))
            .collect(),
        DistributionSpec::Poisson(d) => poisson_central(d.lambda(), order),
        DistributionSpec::Uniform(d) => {
            let half = (d.b() - d.a()) / 2.0;
            (1..=order as i32)
                .map(|r| {
                    if r % 2 == 0 {
                        half.powi(r) / (r + 1) as f64
                    } else {
                        0.0
                    }
                })
                .collect()
        }
        DistributionSpec::Exponential(d) => (1..=order)
            .map(|r| subfactorial(r) / d.lambda().powi(r as i32))
            .collect(),
        _ if variance == 0.0 => vec![0.0; order as usize],
        _ => {
            let mut central = shift(raw, -raw[1])[1..].to_vec();
            let sd = variance.sqrt();
            if let Some(c) = central.get_mut(1) {
                *c = variance;
            }
            if let (Some(c), Some(skew)) = (central.get_mut(2), spec.skewness()) {
                *c = skew * sd.powi(3);
            }
            if let (Some(c), Some(kurt)) = (central.get_mut(3), spec.kurtosis()) {
                *c = kurt * variance * variance;
            }
            central
        }
    };
    central[0] = 0.0;
    central
}

fn standardize(central: &[f64], variance: f64) -> Vec<f64> {
    if !(variance > 0.0 && variance.is_finite()) {
        return Vec::new();
    }
    let sd = variance.sqrt();
    let mut standardized: Vec<f64> = central
        .iter()
        .enumerate()
        .map(|(i, c)| c / sd.powi(i as i32 + 1))
        .collect();
    if let Some(s) = standardized.get_mut(1) {
        *s = 1.0;
    }
    standardized
}

/// `E[X^r] = Σ_j S(r, j) E[(X)_j]` for `r = 0..=order`.
fn from_factorial_moments<F: Fn(u32) -> f64>(order: u32, factorial_moment: F) -> Vec<f64> {
    let fm: Vec<f64> = (0..=order).map(&factorial_moment).collect();
    (0..=order as usize)
        .map(|r| {
            stirling2_row(r)
                .iter()
                .zip(&fm)
                .map(|(s, m)| s * m)
                .sum()
        })
        .collect()
}

/// Raw moments of `X + c` from those of `X` (index 0 must hold 1).
fn shift(raw: &[f64], c: f64) -> Vec<f64> {
    (0..raw.len())
        .map(|m| {
            (0..=m)
                .map(|i| binomial_coefficient(m as i64, i as i64) * c.powi((m - i) as i32) * raw[i])
                .sum()
        })
        .collect()
}

/// `E[Z^r]` for a standard normal `Z`: `(r−1)!!` for even `r`, else 0.
fn standard_normal_moment(r: u32) -> f64 {
    match r {
        0 => 1.0,
        r if r % 2 == 1 => 0.0,
        r => double_factorial(r - 1),
    }
}

/// Central moments of Poisson(λ) via `μ_{n+1} = λ Σ_{k=0}^{n−1} C(n,k) μ_k`.
fn poisson_central(lambda: f64, order: u32) -> Vec<f64> {
    let mut mu = vec![1.0, 0.0];
    for n in 1..order as usize {
        let next: f64 = (0..n)
            .map(|k| binomial_coefficient(n as i64, k as i64) * mu[k])
            .sum();
        mu.push(lambda * next);
    }
    mu[1..=order as usize].to_vec()
}

/// Number of derangements `!n = n! Σ_{k=0}^{n} (−1)^k / k!`.
fn subfactorial(n: u32) -> f64 {
    let mut d = [1.0, 0.0];
    for i in 2..=n {
        let next = (i - 1) as f64 * (d[0] + d[1]);
        d = [d[1], next];
    }
    if n == 0 {
        1.0
    } else {
        d[1]
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn first_central_zero_second_standardized_one(
            shape in 0.1_f64..20.0,
            rate in 0.1_f64..10.0,
            order in 2_u32..=10,
        ) {
            let spec = DistributionSpec::gamma(shape, rate).unwrap();
            let set = moments(&spec, order, None).unwrap();
            prop_assert_eq!(set.central[0], 0.0);
            prop_assert_eq!(set.standardized[1], 1.0);
            prop_assert_eq!(set.raw.len(), order as usize);
        }

        #[test]
        fn even_central_moments_non_negative(
            lambda in 0.1_f64..30.0,
            order in 2_u32..=10,
        ) {
            let spec = DistributionSpec::poisson(lambda).unwrap();
            let set = moments(&spec, order, None).unwrap();
            for (i, c) in set.central.iter().enumerate() {
                if i % 2 == 1 {
                    prop_assert!(*c > 0.0);
                }
            }
        }

        #[test]
        fn binomial_raw_second_moment(n in 0_u32..200, p in 0.0_f64..=1.0) {
            let spec = DistributionSpec::binomial(n as f64, p).unwrap();
            let set = moments(&spec, 2, None).unwrap();
            let mean = n as f64 * p;
            let expected = mean * (1.0 - p) + mean * mean;
            prop_assert!((set.raw[1] - expected).abs() <= 1e-9 * expected.max(1.0));
        }
    }
}
