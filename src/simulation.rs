//! Monte Carlo simulation.
//!
//! [`simulate`] draws a seeded sample from a [`DistributionSpec`] and
//! aggregates it in one of three [`SimulationMode`]s. Every aggregate is a
//! pure function of the stored samples, so a [`SimulationRun`] can be
//! re-read in any mode and stays consistent with itself.
//!
//! # Conventions
//!
//! Summary variance and standard deviation use the sample (`n − 1`)
//! denominator; skewness and excess kurtosis are the population moments
//! `g₁` and `g₂`. Quartiles are R-7.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distribution::DistributionSpec;
use crate::error::{ProbabilityError, ProbabilityResult};
use crate::random::{create_rng, random_seed};
use crate::sampling::Sampler;
use crate::stats::{self, Quartiles, WelfordAccumulator};
use crate::validation;
use crate::{MAX_SAMPLE_SIZE, MIN_SAMPLE_SIZE};

/// Upper bound on histogram bins for binned families.
pub const MAX_HISTOGRAM_BINS: usize = 100;

/// Smallest prefix reported in a convergence trace.
const FIRST_CHECKPOINT: usize = 10;

// ============================================================================
// Modes
// ============================================================================

/// How a simulated sample is aggregated.
///
/// Serialized by [`name`](Self::name); deserialized through [`FromStr`], so
/// an unknown name fails with the same `Validation` message as `parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SimulationMode {
    Statistics,
    Histogram,
    Convergence,
}

impl SimulationMode {
    pub fn name(self) -> &'static str {
        match self {
            SimulationMode::Statistics => "statistics",
            SimulationMode::Histogram => "histogram",
            SimulationMode::Convergence => "convergence",
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for SimulationMode {
    type Error = ProbabilityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SimulationMode> for String {
    fn from(mode: SimulationMode) -> Self {
        mode.name().to_owned()
    }
}

impl FromStr for SimulationMode {
    type Err = ProbabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "statistics" => Ok(SimulationMode::Statistics),
            "histogram" => Ok(SimulationMode::Histogram),
            "convergence" => Ok(SimulationMode::Convergence),
            _ => Err(ProbabilityError::Validation(format!(
                "unknown simulation type '{s}', expected statistics, histogram or convergence"
            ))),
        }
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Descriptive statistics of a sample next to the theoretical values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample variance (`n − 1`).
    pub variance: f64,
    pub std_dev: f64,
    /// Population skewness `g₁`; `None` when every draw is equal.
    pub skewness: Option<f64>,
    /// Population excess kurtosis `g₂`; `None` when every draw is equal.
    pub excess_kurtosis: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub quartiles: Quartiles,
    pub iqr: f64,
    pub theoretical_mean: f64,
    pub theoretical_variance: f64,
    /// `|mean − theoretical_mean| / |theoretical_mean|`; `None` when the
    /// theoretical mean is zero.
    pub mean_relative_error: Option<f64>,
    /// Same for the variance.
    pub variance_relative_error: Option<f64>,
}

impl SummaryStatistics {
    /// # Errors
    /// `Domain` if `samples` has fewer than two values or any non-finite one.
    pub fn compute(spec: &DistributionSpec, samples: &[f64]) -> ProbabilityResult<Self> {
        let undefined = || {
            ProbabilityError::Domain(format!(
                "statistics need at least two finite samples, got {}",
                samples.len()
            ))
        };
        let sorted = stats::sorted(samples).ok_or_else(undefined)?;
        let mean = stats::mean(&sorted).ok_or_else(undefined)?;
        let variance = stats::variance(&sorted).ok_or_else(undefined)?;
        let quartiles = Quartiles::from_sorted(&sorted).ok_or_else(undefined)?;
        let (min, max) = (sorted[0], sorted[sorted.len() - 1]);

        let theoretical_mean = spec.mean();
        let theoretical_variance = spec.variance();
        Ok(Self {
            count: samples.len(),
            mean,
            median: quartiles.median,
            variance,
            std_dev: variance.sqrt(),
            skewness: stats::population_skewness(&sorted),
            excess_kurtosis: stats::population_excess_kurtosis(&sorted),
            min,
            max,
            iqr: quartiles.iqr(),
            quartiles,
            theoretical_mean,
            theoretical_variance,
            mean_relative_error: relative_error(mean, theoretical_mean),
            variance_relative_error: relative_error(variance, theoretical_variance),
        })
    }
}

fn relative_error(observed: f64, expected: f64) -> Option<f64> {
    (expected != 0.0).then(|| (observed - expected).abs() / expected.abs())
}

/// Observed frequency of one exact value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueCount {
    pub value: f64,
    pub count: usize,
    /// `count / n`.
    pub frequency: f64,
}

/// One equal-width bin `[lower, upper)`; the last bin is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub frequency: f64,
}

/// Frequency view of a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Histogram {
    /// Bounded discrete families: counts per observed value, ascending.
    Exact { values: Vec<ValueCount> },
    /// Everything else: `min(100, ⌈√n⌉)` equal-width bins over `[min, max]`.
    Binned { bins: Vec<HistogramBin> },
}

impl Histogram {
    /// Builds the histogram `spec` calls for.
    pub fn compute(spec: &DistributionSpec, samples: &[f64]) -> Self {
        if spec.has_bounded_discrete_support() {
            Self::exact(samples)
        } else {
            Self::binned(samples)
        }
    }

    fn exact(samples: &[f64]) -> Self {
        let n = samples.len() as f64;
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for &x in samples {
            *counts.entry(x as i64).or_default() += 1;
        }
        let values = counts
            .into_iter()
            .map(|(value, count)| ValueCount {
                value: value as f64,
                count,
                frequency: count as f64 / n,
            })
            .collect();
        Histogram::Exact { values }
    }

    fn binned(samples: &[f64]) -> Self {
        let Some((min, max)) = stats::extent(samples) else {
            return Histogram::Binned { bins: Vec::new() };
        };
        let n = samples.len();
        let bin_count = if min == max {
            1
        } else {
            ((n as f64).sqrt().ceil() as usize).clamp(1, MAX_HISTOGRAM_BINS)
        };
        // spans wider than f64::MAX are split before dividing
        let span = max - min;
        let width = if span.is_finite() {
            span / bin_count as f64
        } else {
            max / bin_count as f64 - min / bin_count as f64
        };

        let mut counts = vec![0_usize; bin_count];
        for &x in samples {
            let index = if width > 0.0 {
                let offset = x - min;
                let position = if offset.is_finite() {
                    offset / width
                } else {
                    x / width - min / width
                };
                (position as usize).min(bin_count - 1)
            } else {
                0
            };
            counts[index] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: min + width * i as f64,
                upper: if i + 1 == bin_count {
                    max
                } else {
                    min + width * (i + 1) as f64
                },
                count,
                frequency: count as f64 / n as f64,
            })
            .collect();
        Histogram::Binned { bins }
    }

    /// Total number of samples counted.
    pub fn total(&self) -> usize {
        match self {
            Histogram::Exact { values } => values.iter().map(|v| v.count).sum(),
            Histogram::Binned { bins } => bins.iter().map(|b| b.count).sum(),
        }
    }
}

/// Running statistics after the first `size` draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergencePoint {
    pub size: usize,
    pub mean: f64,
    /// Sample variance of the prefix.
    pub variance: f64,
    pub theoretical_mean: f64,
    pub mean_relative_error: Option<f64>,
}

/// Prefix sizes `10, 50, 100, 500, …` below `n`, followed by `n` itself.
pub fn convergence_checkpoints(n: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut decade = FIRST_CHECKPOINT;
    'outer: loop {
        for size in [decade, decade * 5] {
            if size >= n {
                break 'outer;
            }
            sizes.push(size);
        }
        decade *= 10;
    }
    if n > 0 {
        sizes.push(n);
    }
    sizes
}

/// Convergence trace of `samples` toward the theoretical mean.
pub fn convergence(spec: &DistributionSpec, samples: &[f64]) -> Vec<ConvergencePoint> {
    let theoretical_mean = spec.mean();
    let mut checkpoints = convergence_checkpoints(samples.len()).into_iter().peekable();
    let mut acc = WelfordAccumulator::new();
    let mut trace = Vec::new();
    for &x in samples {
        acc.update(x);
        let seen = acc.count() as usize;
        if checkpoints.next_if_eq(&seen).is_none() {
            continue;
        }
        let mean = acc.mean().unwrap_or(f64::NAN);
        trace.push(ConvergencePoint {
            size: seen,
            mean,
            variance: acc.sample_variance().unwrap_or(0.0),
            theoretical_mean,
            mean_relative_error: relative_error(mean, theoretical_mean),
        });
    }
    trace
}

/// Mode-specific output of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "result", rename_all = "camelCase")]
pub enum SimulationReport {
    Statistics(SummaryStatistics),
    Histogram(Histogram),
    Convergence(Vec<ConvergencePoint>),
}

// ============================================================================
// Runs
// ============================================================================

/// One simulation invocation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRun {
    pub spec: DistributionSpec,
    /// Seed supplied by the caller, if any.
    pub seed: Option<u64>,
    /// Seed actually used; replaying with it reproduces `samples`.
    pub effective_seed: u64,
    pub sample_size: usize,
    pub samples: Vec<f64>,
    pub summary: SummaryStatistics,
    pub mode: SimulationMode,
    pub report: SimulationReport,
}

impl SimulationRun {
    /// Aggregates the stored samples in `mode`.
    pub fn aggregate(&self, mode: SimulationMode) -> SimulationReport {
        match mode {
            SimulationMode::Statistics => SimulationReport::Statistics(self.summary.clone()),
            SimulationMode::Histogram => {
                SimulationReport::Histogram(Histogram::compute(&self.spec, &self.samples))
            }
            SimulationMode::Convergence => {
                SimulationReport::Convergence(convergence(&self.spec, &self.samples))
            }
        }
    }
}

/// Draws `sample_size` values from `spec` and aggregates them in `mode`.
///
/// Without a seed, one is drawn from the thread RNG and recorded as
/// [`SimulationRun::effective_seed`].
///
/// # Errors
/// `Validation` if `sample_size ∉ [MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE]`.
///
/// # Examples
/// ```
/// use u_probability::distribution::DistributionSpec;
/// use u_probability::simulation::{simulate, SimulationMode};
///
/// let spec = DistributionSpec::normal(10.0, 2.0).unwrap();
/// let run = simulate(&spec, 10_000, Some(7), SimulationMode::Statistics).unwrap();
/// assert_eq!(run.samples.len(), 10_000);
/// assert!((run.summary.mean - 10.0).abs() < 0.1);
/// ```
pub fn simulate(
    spec: &DistributionSpec,
    sample_size: usize,
    seed: Option<u64>,
    mode: SimulationMode,
) -> ProbabilityResult<SimulationRun> {
    validation::count_in_range(
        "sample size",
        sample_size as u64,
        MIN_SAMPLE_SIZE as u64,
        MAX_SAMPLE_SIZE as u64,
    )?;

    let effective_seed = seed.unwrap_or_else(random_seed);
    debug!(%spec, sample_size, effective_seed, %mode, "simulation started");

    let mut rng = create_rng(effective_seed);
    let samples = Sampler::new(*spec).sample_n(&mut rng, sample_size);
    let summary = SummaryStatistics::compute(spec, &samples)?;
    debug!(
        %spec,
        mean = summary.mean,
        variance = summary.variance,
        "simulation finished"
    );

    let mut run = SimulationRun {
        spec: *spec,
        seed,
        effective_seed,
        sample_size,
        samples,
        report: SimulationReport::Statistics(summary.clone()),
        summary,
        mode,
    };
    if mode != SimulationMode::Statistics {
        run.report = run.aggregate(mode);
    }
    Ok(run)
}

/// A simulation request as a presentation layer submits it.
///
/// ```
/// use u_probability::simulation::SimulationRequest;
/// let json = r#"{"spec":{"family":"poisson","lambda":2.0},"sampleSize":500,"seed":1,"simulationType":"histogram"}"#;
/// let request: SimulationRequest = serde_json::from_str(json).unwrap();
/// let run = request.run().unwrap();
/// assert_eq!(run.effective_seed, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub spec: DistributionSpec,
    pub sample_size: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(rename = "simulationType")]
    pub mode: SimulationMode,
}

impl SimulationRequest {
    pub fn run(&self) -> ProbabilityResult<SimulationRun> {
        simulate(&self.spec, self.sample_size, self.seed, self.mode)
    }
}
