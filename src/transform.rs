//! Transformations of a single random variable.
//!
//! [`transform`] maps a source distribution through an elementary
//! function and reports the resulting family where one is known, along
//! with the transformed mean and variance in every case.
//!
//! | Source | Transform | Result |
//! |---|---|---|
//! | Normal(μ, σ) | `aX + b` | Normal(aμ + b, \|a\|σ) |
//! | Normal(μ, σ) | `X²` | σ² · χ'²(1, (μ/σ)²) |
//! | Normal(μ, σ) | `e^X` | LogNormal(μ, σ) |
//! | Normal(μ, σ) | `\|X\|` | Folded normal |
//! | Exponential(λ) | `aX + b`, a > 0 | Exponential(λ/a) shifted by b |
//! | Exponential(λ) | min of n | Exponential(nλ) |
//! | Uniform(a, b) | `cX + d` | Uniform on the image interval |
//! | Uniform(a, b) | max / min of n | scaled Beta(n, 1) / Beta(1, n) |
//! | Gamma(α, β) | `aX`, a > 0 | Gamma(α, β/a) |
//! | Bernoulli(p) | min / max of n | Bernoulli(pⁿ) / Bernoulli(1 − (1−p)ⁿ) |
//! | Geometric(p) | min of n | Geometric(1 − (1−p)ⁿ) |
//!
//! Everything else is reported as [`TargetFamily::NoClosedForm`] with
//! moments computed from the source's raw moments, MGF, or an exact
//! summation over the discrete support.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::continuous::ContinuousDistribution;
use crate::discrete::DiscreteDistribution;
use crate::distribution::DistributionSpec;
use crate::error::{ProbabilityError, ProbabilityResult};
use crate::moments::{mgf, moments};
use crate::special::standard_normal_cdf;
use crate::validation;

/// Support points visited when summing a discrete order statistic.
const MAX_ORDER_STATISTIC_POINTS: i64 = 100_000;

/// Tail mass below which the order-statistic summation stops.
const ORDER_STATISTIC_TAIL: f64 = 1e-12;

/// Largest number of i.i.d. copies accepted by min/max.
pub const MAX_COPIES: u64 = 1_000_000;

// ============================================================================
// Transform Requests
// ============================================================================

/// An elementary transformation `Y = g(X)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum Transform {
    /// `Y = aX + b`.
    Linear { a: f64, b: f64 },
    /// `Y = X²`.
    Square,
    /// `Y = e^X`.
    Exp,
    /// `Y = |X|`.
    Abs,
    /// Minimum of `n` i.i.d. copies of `X`.
    Min { n: u64 },
    /// Maximum of `n` i.i.d. copies of `X`.
    Max { n: u64 },
}

/// The rule of a [`Transform`] without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformKind {
    Linear,
    Square,
    Exp,
    Abs,
    Min,
    Max,
}

impl Transform {
    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::Linear { .. } => TransformKind::Linear,
            Transform::Square => TransformKind::Square,
            Transform::Exp => TransformKind::Exp,
            Transform::Abs => TransformKind::Abs,
            Transform::Min { .. } => TransformKind::Min,
            Transform::Max { .. } => TransformKind::Max,
        }
    }

    fn validate(&self) -> ProbabilityResult<()> {
        match *self {
            Transform::Linear { a, b } => {
                validation::finite("a", a)?;
                validation::finite("b", b)?;
            }
            Transform::Min { n } | Transform::Max { n } => {
                validation::count_in_range("n", n, 1, MAX_COPIES)?;
            }
            Transform::Square | Transform::Exp | Transform::Abs => {}
        }
        Ok(())
    }
}

// ============================================================================
// Results
// ============================================================================

/// Distribution of the transformed variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetFamily {
    /// A family from the supported set.
    Distribution(DistributionSpec),
    /// `ln Y ~ Normal(mu, sigma)`.
    LogNormal { mu: f64, sigma: f64 },
    /// `Y / scale` is non-central chi-square.
    NonCentralChiSquare {
        df: u32,
        noncentrality: f64,
        scale: f64,
    },
    /// `|X|` for `X ~ Normal(mu, sigma)`.
    FoldedNormal { mu: f64, sigma: f64 },
    /// `Y − shift ~ Exponential(rate)`.
    ShiftedExponential { rate: f64, shift: f64 },
    /// `(Y − low) / (high − low) ~ Beta(alpha, beta)`.
    ScaledBeta {
        alpha: f64,
        beta: f64,
        low: f64,
        high: f64,
    },
    /// `Y = value` with probability one.
    PointMass { value: f64 },
    /// Only the moments are known.
    #[serde(rename = "no closed form")]
    NoClosedForm,
}

impl TargetFamily {
    pub fn name(&self) -> &'static str {
        match self {
            TargetFamily::Distribution(spec) => spec.family().name(),
            TargetFamily::LogNormal { .. } => "logNormal",
            TargetFamily::NonCentralChiSquare { .. } => "nonCentralChiSquare",
            TargetFamily::FoldedNormal { .. } => "foldedNormal",
            TargetFamily::ShiftedExponential { .. } => "shiftedExponential",
            TargetFamily::ScaledBeta { .. } => "scaledBeta",
            TargetFamily::PointMass { .. } => "pointMass",
            TargetFamily::NoClosedForm => "no closed form",
        }
    }

    /// Named parameters of the target family; empty without a closed form.
    pub fn params(&self) -> Vec<(&'static str, f64)> {
        match *self {
            TargetFamily::Distribution(spec) => spec.params().values(),
            TargetFamily::LogNormal { mu, sigma } => vec![("mu", mu), ("sigma", sigma)],
            TargetFamily::NonCentralChiSquare {
                df,
                noncentrality,
                scale,
            } => vec![
                ("df", df as f64),
                ("noncentrality", noncentrality),
                ("scale", scale),
            ],
            TargetFamily::FoldedNormal { mu, sigma } => vec![("mu", mu), ("sigma", sigma)],
            TargetFamily::ShiftedExponential { rate, shift } => {
                vec![("rate", rate), ("shift", shift)]
            }
            TargetFamily::ScaledBeta {
                alpha,
                beta,
                low,
                high,
            } => vec![("alpha", alpha), ("beta", beta), ("low", low), ("high", high)],
            TargetFamily::PointMass { value } => vec![("value", value)],
            TargetFamily::NoClosedForm => Vec::new(),
        }
    }

    /// The target as a supported distribution, if it is one.
    pub fn spec(&self) -> Option<&DistributionSpec> {
        match self {
            TargetFamily::Distribution(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Outcome of [`transform`].
///
/// Serializes with flat `targetFamily` and `targetParams` fields next to
/// the structured `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "TransformationRecord")]
pub struct TransformationResult {
    pub source: DistributionSpec,
    pub rule: TransformKind,
    pub transform: Transform,
    pub target: TargetFamily,
    pub derived_mean: f64,
    pub derived_variance: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransformationRecord {
    source: DistributionSpec,
    rule: TransformKind,
    transform: Transform,
    target: TargetFamily,
    target_family: &'static str,
    target_params: BTreeMap<&'static str, f64>,
    derived_mean: f64,
    derived_variance: f64,
}

impl From<TransformationResult> for TransformationRecord {
    fn from(result: TransformationResult) -> Self {
        Self {
            source: result.source,
            rule: result.rule,
            transform: result.transform,
            target: result.target,
            target_family: result.target.name(),
            target_params: result.target.params().into_iter().collect(),
            derived_mean: result.derived_mean,
            derived_variance: result.derived_variance,
        }
    }
}

impl TransformationResult {
    fn new(source: &DistributionSpec, transform: Transform, target: TargetFamily, mean: f64, variance: f64) -> Self {
        Self {
            source: *source,
            rule: transform.kind(),
            transform,
            target,
            derived_mean: mean,
            derived_variance: variance,
        }
    }

    fn exact(source: &DistributionSpec, transform: Transform, target: DistributionSpec) -> Self {
        Self::new(
            source,
            transform,
            TargetFamily::Distribution(target),
            target.mean(),
            target.variance(),
        )
    }

    fn moments_only(source: &DistributionSpec, transform: Transform, mean: f64, variance: f64) -> Self {
        Self::new(source, transform, TargetFamily::NoClosedForm, mean, variance)
    }
}

// ============================================================================
// Transformation Engine
// ============================================================================

/// Derives the distribution of `transform` applied to `spec`.
///
/// # Errors
/// - `Validation` for non-finite linear coefficients or `n ∉ [1, MAX_COPIES]`.
/// - `InvalidTransform` for a non-positive scale on an Exponential.
/// - `Domain` when the transformed moments do not exist or overflow
///   (e.g. `e^X` outside the MGF's domain).
/// - `UnsupportedOperation` for min/max of Normal or Gamma copies.
///
/// # Examples
/// ```
/// use u_probability::distribution::DistributionSpec;
/// use u_probability::transform::{transform, Transform};
///
/// let source = DistributionSpec::normal(1.0, 2.0).unwrap();
/// let result = transform(&source, Transform::Linear { a: 3.0, b: -1.0 }).unwrap();
/// assert_eq!(result.target.spec(), Some(&DistributionSpec::normal(2.0, 6.0).unwrap()));
/// ```
pub fn transform(spec: &DistributionSpec, transform: Transform) -> ProbabilityResult<TransformationResult> {
    transform.validate()?;
    let result = match transform {
        Transform::Linear { a, b } => linear(spec, transform, a, b),
        Transform::Square => square(spec, transform),
        Transform::Exp => exponential(spec, transform),
        Transform::Abs => absolute(spec, transform),
        Transform::Min { n } => order_statistic(spec, transform, n, Extreme::Min),
        Transform::Max { n } => order_statistic(spec, transform, n, Extreme::Max),
    }?;
    debug!(
        source = %spec,
        rule = ?result.rule,
        target = result.target.name(),
        mean = result.derived_mean,
        variance = result.derived_variance,
        "transformation resolved"
    );
    Ok(result)
}

/// Builds a derived spec, reporting parameters pushed out of range by the
/// transformation as a domain failure.
fn derived(spec: ProbabilityResult<DistributionSpec>) -> ProbabilityResult<DistributionSpec> {
    spec.map_err(|err| match err {
        ProbabilityError::Validation(msg) => {
            ProbabilityError::Domain(format!("transformed parameters out of range: {msg}"))
        }
        other => other,
    })
}

fn finite_moments(mean: f64, variance: f64, what: &str) -> ProbabilityResult<(f64, f64)> {
    if !mean.is_finite() || !variance.is_finite() {
        return Err(ProbabilityError::Domain(format!(
            "moments of {what} are not finite"
        )));
    }
    Ok((mean, variance.max(0.0)))
}

fn linear(spec: &DistributionSpec, t: Transform, a: f64, b: f64) -> ProbabilityResult<TransformationResult> {
    if let DistributionSpec::Exponential(d) = spec {
        if a <= 0.0 {
            return Err(ProbabilityError::InvalidTransform(format!(
                "Exponential requires a positive scale factor, got a = {a}"
            )));
        }
        let rate = d.lambda() / a;
        let target = derived(DistributionSpec::exponential(rate))?;
        if b == 0.0 {
            return Ok(TransformationResult::exact(spec, t, target));
        }
        return Ok(TransformationResult::new(
            spec,
            t,
            TargetFamily::ShiftedExponential { rate, shift: b },
            target.mean() + b,
            target.variance(),
        ));
    }

    if a == 1.0 && b == 0.0 {
        return Ok(TransformationResult::exact(spec, t, *spec));
    }
    if a == 0.0 {
        return Ok(TransformationResult::new(
            spec,
            t,
            TargetFamily::PointMass { value: b },
            b,
            0.0,
        ));
    }

    match spec {
        DistributionSpec::Normal(d) => {
            let target = derived(DistributionSpec::normal(a * d.mu() + b, a.abs() * d.sigma()))?;
            Ok(TransformationResult::exact(spec, t, target))
        }
        DistributionSpec::Uniform(d) => {
            let (x, y) = (a * d.a() + b, a * d.b() + b);
            let target = derived(DistributionSpec::uniform(x.min(y), x.max(y)))?;
            Ok(TransformationResult::exact(spec, t, target))
        }
        DistributionSpec::Gamma(d) if a > 0.0 && b == 0.0 => {
            let target = derived(DistributionSpec::gamma(d.shape(), d.rate() / a))?;
            Ok(TransformationResult::exact(spec, t, target))
        }
        _ => {
            let (mean, variance) =
                finite_moments(a * spec.mean() + b, a * a * spec.variance(), "aX + b")?;
            Ok(TransformationResult::moments_only(spec, t, mean, variance))
        }
    }
}

fn square(spec: &DistributionSpec, t: Transform) -> ProbabilityResult<TransformationResult> {
    match spec {
        DistributionSpec::Normal(d) => {
            let (mu, s2) = (d.mu(), d.sigma() * d.sigma());
            let (mean, variance) =
                finite_moments(mu * mu + s2, 2.0 * s2 * s2 + 4.0 * mu * mu * s2, "X²")?;
            Ok(TransformationResult::new(
                spec,
                t,
                TargetFamily::NonCentralChiSquare {
                    df: 1,
                    noncentrality: (mu / d.sigma()).powi(2),
                    scale: s2,
                },
                mean,
                variance,
            ))
        }
        // X² = X on {0, 1}
        DistributionSpec::Bernoulli(_) => Ok(TransformationResult::exact(spec, t, *spec)),
        _ => {
            let raw = moments(spec, 4, None)?.raw;
            let (mean, variance) = finite_moments(raw[1], raw[3] - raw[1] * raw[1], "X²")?;
            Ok(TransformationResult::moments_only(spec, t, mean, variance))
        }
    }
}

fn exponential(spec: &DistributionSpec, t: Transform) -> ProbabilityResult<TransformationResult> {
    if let DistributionSpec::Normal(d) = spec {
        let (mu, s2) = (d.mu(), d.sigma() * d.sigma());
        let mean = (mu + 0.5 * s2).exp();
        let variance = s2.exp_m1() * (2.0 * mu + s2).exp();
        let (mean, variance) = finite_moments(mean, variance, "e^X")?;
        return Ok(TransformationResult::new(
            spec,
            t,
            TargetFamily::LogNormal {
                mu,
                sigma: d.sigma(),
            },
            mean,
            variance,
        ));
    }

    // E[e^X] = M(1) and E[e^{2X}] = M(2)
    let first = mgf(spec, 1.0)?;
    let second = mgf(spec, 2.0)?;
    let (mean, variance) = finite_moments(first, second - first * first, "e^X")?;
    Ok(TransformationResult::moments_only(spec, t, mean, variance))
}

fn absolute(spec: &DistributionSpec, t: Transform) -> ProbabilityResult<TransformationResult> {
    let (lo, _) = spec.support();
    if lo >= 0.0 {
        return Ok(TransformationResult::exact(spec, t, *spec));
    }
    match spec {
        DistributionSpec::Normal(d) => {
            let (mu, sigma) = (d.mu(), d.sigma());
            let mean = sigma * (2.0 / std::f64::consts::PI).sqrt() * (-mu * mu / (2.0 * sigma * sigma)).exp()
                + mu * (1.0 - 2.0 * standard_normal_cdf(-mu / sigma));
            let variance = mu * mu + sigma * sigma - mean * mean;
            let (mean, variance) = finite_moments(mean, variance, "|X|")?;
            Ok(TransformationResult::new(
                spec,
                t,
                TargetFamily::FoldedNormal { mu, sigma },
                mean,
                variance,
            ))
        }
        DistributionSpec::Uniform(d) => {
            let (a, b) = (d.a(), d.b());
            if b <= 0.0 {
                let target = derived(DistributionSpec::uniform(-b, -a))?;
                return Ok(TransformationResult::exact(spec, t, target));
            }
            // Interval straddles zero: |X| mixes Uniform(0, |a|) and Uniform(0, b).
            let mean = (a * a + b * b) / (2.0 * (b - a));
            let second = d.variance() + d.mean() * d.mean();
            let (mean, variance) = finite_moments(mean, second - mean * mean, "|X|")?;
            Ok(TransformationResult::moments_only(spec, t, mean, variance))
        }
        _ => Err(ProbabilityError::UnsupportedOperation(format!(
            "|X| is not available for {spec}"
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Min,
    Max,
}

fn order_statistic(
    spec: &DistributionSpec,
    t: Transform,
    n: u64,
    extreme: Extreme,
) -> ProbabilityResult<TransformationResult> {
    if n == 1 {
        return Ok(TransformationResult::exact(spec, t, *spec));
    }
    let copies = n as f64;
    match (spec, extreme) {
        (DistributionSpec::Exponential(d), Extreme::Min) => {
            let target = derived(DistributionSpec::exponential(copies * d.lambda()))?;
            Ok(TransformationResult::exact(spec, t, target))
        }
        (DistributionSpec::Exponential(d), Extreme::Max) => {
            // Rényi representation: max = Σ_{i=1}^{n} E_i / (iλ)
            let lambda = d.lambda();
            let (harmonic, harmonic2) = (1..=n).fold((0.0, 0.0), |(h, h2), i| {
                let i = i as f64;
                (h + 1.0 / i, h2 + 1.0 / (i * i))
            });
            Ok(TransformationResult::moments_only(
                spec,
                t,
                harmonic / lambda,
                harmonic2 / (lambda * lambda),
            ))
        }
        (DistributionSpec::Uniform(d), _) => {
            let (low, high) = (d.a(), d.b());
            let width = high - low;
            let (alpha, beta) = match extreme {
                Extreme::Max => (copies, 1.0),
                Extreme::Min => (1.0, copies),
            };
            let mean = low + width * alpha / (alpha + beta);
            let variance = width * width * copies / ((copies + 1.0).powi(2) * (copies + 2.0));
            Ok(TransformationResult::new(
                spec,
                t,
                TargetFamily::ScaledBeta {
                    alpha,
                    beta,
                    low,
                    high,
                },
                mean,
                variance,
            ))
        }
        (DistributionSpec::Bernoulli(d), _) => {
            let p = match extreme {
                Extreme::Min => d.p().powf(copies),
                Extreme::Max => -(copies * (-d.p()).ln_1p()).exp_m1(),
            };
            let target = derived(DistributionSpec::bernoulli(p))?;
            Ok(TransformationResult::exact(spec, t, target))
        }
        (DistributionSpec::Geometric(d), Extreme::Min) => {
            let p = -(copies * (-d.p()).ln_1p()).exp_m1();
            let target = derived(DistributionSpec::geometric(p, d.form()))?;
            Ok(TransformationResult::exact(spec, t, target))
        }
        (DistributionSpec::Normal(_) | DistributionSpec::Gamma(_), _) => {
            Err(ProbabilityError::UnsupportedOperation(format!(
                "{:?} of {n} copies of {spec} has no closed form or summation fallback",
                extreme
            )))
        }
        _ => match spec.as_discrete() {
            Some(dist) => {
                let (mean, variance) = discrete_extreme_moments(dist, copies, extreme);
                let (mean, variance) = finite_moments(mean, variance, "order statistic")?;
                Ok(TransformationResult::moments_only(spec, t, mean, variance))
            }
            None => Err(ProbabilityError::UnsupportedOperation(format!(
                "{extreme:?} of copies of {spec}"
            ))),
        },
    }
}

/// Mean and variance of the min or max of `n` i.i.d. discrete copies,
/// summed from `P(max ≤ k) = F(k)ⁿ` and `P(min > k) = (1 − F(k))ⁿ`.
fn discrete_extreme_moments(dist: &dyn DiscreteDistribution, n: f64, extreme: Extreme) -> (f64, f64) {
    let lo = dist.support_min();
    let hi = dist.support_max();
    let (mut cdf, mut prev_cdf) = (0.0_f64, 0.0_f64);
    let (mut first, mut second) = (0.0, 0.0);
    let mut k = lo;
    loop {
        cdf = (cdf + dist.pmf_at(k)).min(1.0);
        let (mass, remaining) = match extreme {
            Extreme::Max => (cdf.powf(n) - prev_cdf.powf(n), 1.0 - cdf.powf(n)),
            Extreme::Min => {
                let tail = (1.0 - cdf).powf(n);
                ((1.0 - prev_cdf).powf(n) - tail, tail)
            }
        };
        let x = k as f64;
        first += mass * x;
        second += mass * x * x;
        prev_cdf = cdf;

        if hi == Some(k) || remaining < ORDER_STATISTIC_TAIL {
            break;
        }
        if k - lo >= MAX_ORDER_STATISTIC_POINTS {
            debug!(remaining, points = k - lo + 1, "order statistic summation truncated");
            break;
        }
        k += 1;
    }
    trace!(first, second, last = k, "order statistic summed");
    (first, second - first * first)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn normal_linear_moments(
            mu in -100.0_f64..100.0,
            sigma in 0.01_f64..50.0,
            a in -10.0_f64..10.0,
            b in -100.0_f64..100.0,
        ) {
            prop_assume!(a.abs() > 1e-6);
            let source = DistributionSpec::normal(mu, sigma).unwrap();
            let result = transform(&source, Transform::Linear { a, b }).unwrap();
            let expected_mean = a * mu + b;
            prop_assert!((result.derived_mean - expected_mean).abs() <= 1e-9 * expected_mean.abs().max(1.0));
            let expected_var = a * a * sigma * sigma;
            prop_assert!((result.derived_variance - expected_var).abs() <= 1e-9 * expected_var.max(1.0));
        }

        #[test]
        fn uniform_extremes_stay_in_interval(
            lo in -50.0_f64..50.0,
            width in 0.1_f64..20.0,
            n in 1_u64..50,
        ) {
            let source = DistributionSpec::uniform(lo, lo + width).unwrap();
            for t in [Transform::Min { n }, Transform::Max { n }] {
                let result = transform(&source, t).unwrap();
                prop_assert!(result.derived_mean >= lo - 1e-9 && result.derived_mean <= lo + width + 1e-9);
                prop_assert!(result.derived_variance <= width * width / 12.0 + 1e-12);
            }
        }

        #[test]
        fn binomial_max_not_below_mean(n in 1.0_f64..30.0, p in 0.05_f64..0.95, copies in 2_u64..6) {
            let source = DistributionSpec::binomial(n.floor(), p).unwrap();
            let result = transform(&source, Transform::Max { n: copies }).unwrap();
            prop_assert!(result.derived_mean >= source.mean() - 1e-9);
        }
    }
}
