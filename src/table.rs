//! Probability tables.
//!
//! A table is an ordered run of [`ProbabilityPoint`]s suitable for
//! charting. Discrete tables walk the support upward from its lower bound
//! and stop once enough mass has been covered; continuous tables sample
//! the density on an evenly spaced grid.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::continuous::ContinuousDistribution;
use crate::discrete::DiscreteDistribution;
use crate::distribution::{DistributionSpec, Law};
use crate::error::{ProbabilityError, ProbabilityResult};

/// One row of a probability table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilityPoint {
    pub x: f64,
    /// PMF for discrete families, PDF for continuous ones.
    pub pmf_or_pdf: f64,
    /// `P(X ≤ x)`.
    pub cdf: f64,
}

/// Truncation and resolution settings for [`probability_table`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableOptions {
    /// Discrete walks stop once the cumulative probability exceeds this.
    pub mass_threshold: f64,
    /// Hard cap on discrete support points.
    pub max_points: usize,
    /// Grid size for continuous tables.
    pub continuous_points: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            mass_threshold: 0.999,
            max_points: 500,
            continuous_points: 201,
        }
    }
}

impl TableOptions {
    /// # Errors
    /// `Validation` unless `mass_threshold ∈ (0, 1]`, `max_points ≥ 1`
    /// and `continuous_points ≥ 2`.
    pub fn validate(&self) -> ProbabilityResult<()> {
        if !(self.mass_threshold > 0.0 && self.mass_threshold <= 1.0) {
            return Err(ProbabilityError::Validation(format!(
                "mass_threshold must be in (0,1], got {}",
                self.mass_threshold
            )));
        }
        if self.max_points == 0 {
            return Err(ProbabilityError::Validation(
                "max_points must be >= 1".into(),
            ));
        }
        if self.continuous_points < 2 {
            return Err(ProbabilityError::Validation(format!(
                "continuous_points must be >= 2, got {}",
                self.continuous_points
            )));
        }
        Ok(())
    }
}

/// Builds the probability table of `spec`.
///
/// For discrete families the `cdf` column is the running sum of the
/// `pmf_or_pdf` column, so it is non-decreasing by construction.
///
/// # Errors
/// `Validation` if `options` is invalid.
///
/// # Examples
/// ```
/// use u_probability::distribution::DistributionSpec;
/// use u_probability::table::{probability_table, TableOptions};
///
/// let spec = DistributionSpec::binomial(4.0, 0.5).unwrap();
/// let table = probability_table(&spec, &TableOptions::default()).unwrap();
/// assert_eq!(table.len(), 5);
/// assert!((table[2].pmf_or_pdf - 0.375).abs() < 1e-12);
/// ```
pub fn probability_table(
    spec: &DistributionSpec,
    options: &TableOptions,
) -> ProbabilityResult<Vec<ProbabilityPoint>> {
    options.validate()?;
    let table = match spec.law() {
        Law::Discrete(dist) => discrete_table(spec, dist, options),
        Law::Continuous(dist) => continuous_table(dist, options),
    };
    Ok(table)
}

fn discrete_table(
    spec: &DistributionSpec,
    dist: &dyn DiscreteDistribution,
    options: &TableOptions,
) -> Vec<ProbabilityPoint> {
    let lo = dist.support_min();
    let hi = dist.support_max();
    let mut points = Vec::new();
    let mut cumulative = 0.0_f64;
    let mut k = lo;
    loop {
        let pmf = dist.pmf_at(k);
        cumulative = (cumulative + pmf).min(1.0);
        points.push(ProbabilityPoint {
            x: k as f64,
            pmf_or_pdf: pmf,
            cdf: cumulative,
        });

        if hi == Some(k) {
            break;
        }
        if cumulative > options.mass_threshold {
            debug!(%spec, points = points.len(), cumulative, "table reached mass threshold");
            break;
        }
        if points.len() >= options.max_points {
            debug!(%spec, points = points.len(), cumulative, "table truncated at point cap");
            break;
        }
        k += 1;
    }
    points
}

fn continuous_table(dist: &dyn ContinuousDistribution, options: &TableOptions) -> Vec<ProbabilityPoint> {
    let (support_lo, support_hi) = dist.support();
    let tail = ((1.0 - options.mass_threshold) / 2.0).max(1e-9);
    let spread = 4.0 * dist.std_dev();

    let lo = if support_lo.is_finite() {
        support_lo
    } else {
        dist.quantile(tail)
            .filter(|q| q.is_finite())
            .unwrap_or(dist.mean() - spread)
    };
    let hi = if support_hi.is_finite() {
        support_hi
    } else {
        dist.quantile(1.0 - tail)
            .filter(|q| q.is_finite())
            .unwrap_or(dist.mean() + spread)
    };

    let steps = options.continuous_points - 1;
    let width = (hi - lo) / steps as f64;
    (0..=steps)
        .map(|i| {
            let x = if i == steps { hi } else { lo + width * i as f64 };
            ProbabilityPoint {
                x,
                pmf_or_pdf: dist.pdf(x),
                cdf: dist.cdf(x),
            }
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn discrete_cdf_column_non_decreasing(lambda in 0.1_f64..80.0) {
            let spec = DistributionSpec::poisson(lambda).unwrap();
            let table = probability_table(&spec, &TableOptions::default()).unwrap();
            for w in table.windows(2) {
                prop_assert!(w[0].cdf <= w[1].cdf);
                prop_assert!(w[0].x < w[1].x);
            }
        }

        #[test]
        fn truncated_mass_close_to_one(n in 1.0_f64..200.0, p in 0.01_f64..0.99) {
            let spec = DistributionSpec::binomial(n.floor(), p).unwrap();
            let table = probability_table(&spec, &TableOptions::default()).unwrap();
            let total: f64 = table.iter().map(|pt| pt.pmf_or_pdf).sum();
            prop_assert!(total > 0.999 - 1e-9 && total <= 1.0 + 1e-9);
        }
    }
}
