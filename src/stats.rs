//! Descriptive statistics over simulated samples.
//!
//! All functions return `None` instead of a meaningless number when the
//! input is too short, contains NaN/Inf, or has zero spread.
//!
//! # Conventions
//!
//! | Quantity | Normalization |
//! |---|---|
//! | [`variance`], [`std_dev`] | sample (`n − 1`) |
//! | [`population_variance`] | population (`n`) |
//! | [`population_skewness`], [`population_excess_kurtosis`] | population moments `g₁`, `g₂` |
//! | [`skewness`], [`excess_kurtosis`] | bias-corrected `G₁`, `G₂` |
//! | [`quantile`] | R-7 linear interpolation |
//!
//! References:
//! - Welford (1962), "Note on a Method for Calculating Corrected Sums of
//!   Squares and Products", *Technometrics* 4(3).
//! - Hyndman & Fan (1996), "Sample Quantiles in Statistical Packages",
//!   *The American Statistician* 50(4).
//! - Joanes & Gill (1998), "Comparing measures of sample skewness and
//!   kurtosis", *The Statistician* 47(1).

use serde::Serialize;

fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|x| x.is_finite())
}

// ============================================================================
// Location and Spread
// ============================================================================

/// Neumaier compensated sum: error stays O(ε) regardless of `data.len()`.
///
/// Reference: Neumaier (1974), *ZAMM* 54(1), pp. 39–51.
///
/// # Examples
/// ```
/// use u_probability::stats::kahan_sum;
/// let data = [1e16, 1.0, -1e16];
/// assert_eq!(kahan_sum(&data), 1.0);
/// ```
pub fn kahan_sum(data: &[f64]) -> f64 {
    let (sum, compensation) = data.iter().fold((0.0_f64, 0.0_f64), |(sum, c), &x| {
        let t = sum + x;
        let lost = if sum.abs() >= x.abs() {
            (sum - t) + x
        } else {
            (x - t) + sum
        };
        (t, c + lost)
    });
    sum + compensation
}

/// Arithmetic mean via [`kahan_sum`].
///
/// # Examples
/// ```
/// use u_probability::stats::mean;
/// assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

/// Sample variance (`n − 1` denominator), accumulated with Welford's method.
///
/// # Examples
/// ```
/// use u_probability::stats::variance;
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((variance(&v).unwrap() - 32.0 / 7.0).abs() < 1e-12);
/// ```
pub fn variance(data: &[f64]) -> Option<f64> {
    if !all_finite(data) {
        return None;
    }
    data.iter().copied().collect::<WelfordAccumulator>().sample_variance()
}

/// Population variance (`n` denominator).
pub fn population_variance(data: &[f64]) -> Option<f64> {
    if !all_finite(data) {
        return None;
    }
    data.iter().copied().collect::<WelfordAccumulator>().population_variance()
}

/// Sample standard deviation, `√variance`.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Smallest and largest value, in one pass.
///
/// # Examples
/// ```
/// use u_probability::stats::extent;
/// assert_eq!(extent(&[3.0, -1.0, 4.0]), Some((-1.0, 4.0)));
/// ```
pub fn extent(data: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() || data.iter().any(|x| x.is_nan()) {
        return None;
    }
    Some(data.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
        (lo.min(x), hi.max(x))
    }))
}

// ============================================================================
// Order Statistics
// ============================================================================

/// Ascending copy of `data`; `None` if it is empty or contains NaN.
pub fn sorted(data: &[f64]) -> Option<Vec<f64>> {
    if data.is_empty() || data.iter().any(|x| x.is_nan()) {
        return None;
    }
    let mut copy = data.to_vec();
    copy.sort_unstable_by(f64::total_cmp);
    Some(copy)
}

/// R-7 quantile of already sorted data: with `h = (n − 1)p`, interpolates
/// linearly between `x[⌊h⌋]` and `x[⌊h⌋ + 1]`.
///
/// The caller guarantees `sorted_data` is non-decreasing.
///
/// # Examples
/// ```
/// use u_probability::stats::quantile_sorted;
/// let data = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(quantile_sorted(&data, 0.5), Some(2.5));
/// assert_eq!(quantile_sorted(&data, 1.0), Some(4.0));
/// ```
pub fn quantile_sorted(sorted_data: &[f64], p: f64) -> Option<f64> {
    let n = sorted_data.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    if j + 1 >= n {
        return Some(sorted_data[n - 1]);
    }
    let g = h - j as f64;
    Some(sorted_data[j] + g * (sorted_data[j + 1] - sorted_data[j]))
}

/// R-7 quantile of unsorted data.
pub fn quantile(data: &[f64], p: f64) -> Option<f64> {
    quantile_sorted(&sorted(data)?, p)
}

/// Median, equal to the R-7 quantile at `p = 0.5`.
///
/// # Examples
/// ```
/// use u_probability::stats::median;
/// assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
/// assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
/// ```
pub fn median(data: &[f64]) -> Option<f64> {
    quantile(data, 0.5)
}

/// First, second and third quartiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    /// Quartiles of sorted data.
    pub fn from_sorted(sorted_data: &[f64]) -> Option<Self> {
        Some(Self {
            q1: quantile_sorted(sorted_data, 0.25)?,
            median: quantile_sorted(sorted_data, 0.5)?,
            q3: quantile_sorted(sorted_data, 0.75)?,
        })
    }

    /// Interquartile range `q3 − q1`.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

// ============================================================================
// Shape
// ============================================================================

/// Central moment sums `Σd²`, `Σd³`, `Σd⁴` about the (Kahan) mean.
struct CentralSums {
    n: f64,
    s2: f64,
    s3: f64,
    s4: f64,
}

impl CentralSums {
    fn of(data: &[f64]) -> Option<Self> {
        let m = mean(data)?;
        let (s2, s3, s4) = data.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), &x| {
            let d = x - m;
            let d2 = d * d;
            (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
        });
        if s2 == 0.0 {
            return None;
        }
        Some(Self {
            n: data.len() as f64,
            s2,
            s3,
            s4,
        })
    }

    fn g1(&self) -> f64 {
        self.n.sqrt() * self.s3 / self.s2.powf(1.5)
    }

    fn g2(&self) -> f64 {
        self.n * self.s4 / (self.s2 * self.s2) - 3.0
    }
}

/// Population skewness `g₁ = m₃ / m₂^{3/2}` with `mₖ = Σ(xᵢ − x̄)ᵏ / n`.
///
/// # Returns
/// `None` for fewer than 2 points, non-finite data, or zero spread.
///
/// # Examples
/// ```
/// use u_probability::stats::population_skewness;
/// assert!(population_skewness(&[1.0, 2.0, 3.0]).unwrap().abs() < 1e-15);
/// assert!(population_skewness(&[1.0, 1.0, 1.0, 10.0]).unwrap() > 0.0);
/// ```
pub fn population_skewness(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    CentralSums::of(data).map(|s| s.g1())
}

/// Population excess kurtosis `g₂ = m₄ / m₂² − 3`.
///
/// # Returns
/// `None` for fewer than 2 points, non-finite data, or zero spread.
pub fn population_excess_kurtosis(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    CentralSums::of(data).map(|s| s.g2())
}

/// Bias-corrected sample skewness `G₁ = g₁ √(n(n−1)) / (n−2)`
/// (Excel `SKEW`, `scipy.stats.skew(bias=False)`).
///
/// # Returns
/// `None` for fewer than 3 points, non-finite data, or zero spread.
pub fn skewness(data: &[f64]) -> Option<f64> {
    if data.len() < 3 {
        return None;
    }
    let sums = CentralSums::of(data)?;
    let n = sums.n;
    Some(sums.g1() * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Bias-corrected excess kurtosis
/// `G₂ = (n−1) / ((n−2)(n−3)) · ((n+1) g₂ + 6)` (Excel `KURT`).
///
/// # Returns
/// `None` for fewer than 4 points, non-finite data, or zero spread.
pub fn excess_kurtosis(data: &[f64]) -> Option<f64> {
    if data.len() < 4 {
        return None;
    }
    let sums = CentralSums::of(data)?;
    let n = sums.n;
    Some((n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * sums.g2() + 6.0))
}

// ============================================================================
// Paired Samples
// ============================================================================

/// Sample covariance `Σ(xᵢ − x̄)(yᵢ − ȳ) / (n − 1)`.
///
/// # Returns
/// `None` if the lengths differ, `n < 2`, or either series is non-finite.
///
/// # Examples
/// ```
/// use u_probability::stats::covariance;
/// let cov = covariance(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
/// assert!((cov - 2.0).abs() < 1e-15);
/// ```
pub fn covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (mx, my) = (mean(x)?, mean(y)?);
    let cross: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    Some(cross / (x.len() - 1) as f64)
}

/// Pearson correlation coefficient, clamped to `[−1, 1]`.
///
/// # Returns
/// `None` under the same conditions as [`covariance`], or when either
/// series is constant.
///
/// # Examples
/// ```
/// use u_probability::stats::correlation;
/// let r = correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
/// assert!((r + 1.0).abs() < 1e-15);
/// ```
pub fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let cov = covariance(x, y)?;
    let (sx, sy) = (std_dev(x)?, std_dev(y)?);
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    Some((cov / (sx * sy)).clamp(-1.0, 1.0))
}

// ============================================================================
// Streaming Accumulator
// ============================================================================

/// Single-pass accumulator of count, mean and central moment sums M₂..M₄.
///
/// Used for convergence traces where statistics are read off after every
/// prefix of a sample. Updates apply M₄, then M₃, then M₂ so each sees the
/// previous values of the lower moments.
///
/// References:
/// - Welford (1962), *Technometrics* 4(3).
/// - Pébay (2008), Sandia Report SAND2008-6212.
///
/// # Examples
/// ```
/// use u_probability::stats::WelfordAccumulator;
/// let acc: WelfordAccumulator = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
/// assert_eq!(acc.count(), 8);
/// assert!((acc.mean().unwrap() - 5.0).abs() < 1e-15);
/// assert!((acc.population_variance().unwrap() - 4.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WelfordAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl WelfordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one observation.
    pub fn update(&mut self, value: f64) {
        let prior = self.count as f64;
        self.count += 1;
        if self.count == 1 {
            // Leave the moment sums at zero so a huge first value cannot overflow them.
            self.mean = value;
            return;
        }
        let n = self.count as f64;
        let delta = value - self.mean;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term = delta * delta_n * prior;

        self.m4 += term * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term;
        self.mean += delta_n;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// `M₂ / (n − 1)`; needs at least two observations.
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }

    /// `M₂ / n`.
    pub fn population_variance(&self) -> Option<f64> {
        (self.count > 0).then(|| self.m2 / self.count as f64)
    }

    pub fn sample_std_dev(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }

    /// Population skewness `g₁`; `None` before two observations or with
    /// zero spread.
    pub fn population_skewness(&self) -> Option<f64> {
        if self.count < 2 || self.m2 == 0.0 {
            return None;
        }
        Some((self.count as f64).sqrt() * self.m3 / self.m2.powf(1.5))
    }

    /// Population excess kurtosis `g₂`.
    pub fn population_excess_kurtosis(&self) -> Option<f64> {
        if self.count < 2 || self.m2 == 0.0 {
            return None;
        }
        Some(self.count as f64 * self.m4 / (self.m2 * self.m2) - 3.0)
    }

    /// Combines two accumulators as if all observations had been fed to
    /// one (Chan, Golub & LeVeque 1979; Pébay 2008 for M₃ and M₄).
    pub fn merge(&mut self, other: &WelfordAccumulator) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        let (na, nb) = (self.count as f64, other.count as f64);
        let n = na + nb;
        let d = other.mean - self.mean;
        let (d2, d3, d4) = (d * d, d * d * d, d * d * d * d);

        let m4 = self.m4
            + other.m4
            + d4 * na * nb * (na * na - na * nb + nb * nb) / (n * n * n)
            + 6.0 * d2 * (na * na * other.m2 + nb * nb * self.m2) / (n * n)
            + 4.0 * d * (na * other.m3 - nb * self.m3) / n;
        let m3 = self.m3
            + other.m3
            + d3 * na * nb * (na - nb) / (n * n)
            + 3.0 * d * (na * other.m2 - nb * self.m2) / n;
        let m2 = self.m2 + other.m2 + d2 * na * nb / n;

        self.count += other.count;
        self.mean += d * nb / n;
        self.m2 = m2;
        self.m3 = m3;
        self.m4 = m4;
    }
}

impl Extend<f64> for WelfordAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.update(x);
        }
    }
}

impl FromIterator<f64> for WelfordAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}
