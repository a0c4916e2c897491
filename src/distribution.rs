//! The distribution model shared by every engine component.
//!
//! A [`DistributionSpec`] is a tagged union over the ten supported
//! families. Each variant wraps a family struct whose constructor is the
//! only place its parameters are checked, so a spec that exists is valid.
//! Raw, unvalidated input arrives as [`SpecParams`] (for instance
//! deserialized from a presentation layer's JSON) and becomes a spec
//! through `TryFrom`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::continuous::{ContinuousDistribution, Exponential, Gamma, Normal, Uniform};
use crate::discrete::{
    Bernoulli, Binomial, DiscreteDistribution, Geometric, GeometricForm, Hypergeometric,
    NegativeBinomial, Poisson,
};
use crate::error::{ProbabilityError, ProbabilityResult};
use crate::validation;

// ============================================================================
// Family
// ============================================================================

/// Distribution family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Family {
    Bernoulli,
    Binomial,
    Geometric,
    Poisson,
    NegativeBinomial,
    Hypergeometric,
    Uniform,
    Normal,
    Exponential,
    Gamma,
}

impl Family {
    pub const ALL: [Family; 10] = [
        Family::Bernoulli,
        Family::Binomial,
        Family::Geometric,
        Family::Poisson,
        Family::NegativeBinomial,
        Family::Hypergeometric,
        Family::Uniform,
        Family::Normal,
        Family::Exponential,
        Family::Gamma,
    ];

    /// The camelCase name used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Family::Bernoulli => "bernoulli",
            Family::Binomial => "binomial",
            Family::Geometric => "geometric",
            Family::Poisson => "poisson",
            Family::NegativeBinomial => "negativeBinomial",
            Family::Hypergeometric => "hypergeometric",
            Family::Uniform => "uniform",
            Family::Normal => "normal",
            Family::Exponential => "exponential",
            Family::Gamma => "gamma",
        }
    }

    pub fn is_discrete(self) -> bool {
        matches!(
            self,
            Family::Bernoulli
                | Family::Binomial
                | Family::Geometric
                | Family::Poisson
                | Family::NegativeBinomial
                | Family::Hypergeometric
        )
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = ProbabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Family::ALL
            .into_iter()
            .find(|family| family.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProbabilityError::Validation(format!("unknown distribution family '{s}'")))
    }
}

// ============================================================================
// Raw Parameters
// ============================================================================

/// Unvalidated family parameters, as a presentation layer supplies them.
///
/// Counts are carried as `f64` so that negative or fractional input can be
/// reported as a validation failure instead of being rejected by the
/// type system at a distance from the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "camelCase")]
pub enum SpecParams {
    Bernoulli {
        p: f64,
    },
    Binomial {
        n: f64,
        p: f64,
    },
    Geometric {
        p: f64,
        form: GeometricForm,
    },
    Poisson {
        lambda: f64,
    },
    NegativeBinomial {
        r: f64,
        p: f64,
    },
    Hypergeometric {
        population: f64,
        successes: f64,
        draws: f64,
    },
    Uniform {
        a: f64,
        b: f64,
    },
    Normal {
        mu: f64,
        sigma: f64,
    },
    Exponential {
        lambda: f64,
    },
    Gamma {
        shape: f64,
        rate: f64,
    },
}

impl SpecParams {
    /// Named numeric parameters in declaration order.
    pub fn values(&self) -> Vec<(&'static str, f64)> {
        match *self {
            SpecParams::Bernoulli { p } => vec![("p", p)],
            SpecParams::Binomial { n, p } => vec![("n", n), ("p", p)],
            SpecParams::Geometric { p, .. } => vec![("p", p)],
            SpecParams::Poisson { lambda } => vec![("lambda", lambda)],
            SpecParams::NegativeBinomial { r, p } => vec![("r", r), ("p", p)],
            SpecParams::Hypergeometric {
                population,
                successes,
                draws,
            } => vec![
                ("population", population),
                ("successes", successes),
                ("draws", draws),
            ],
            SpecParams::Uniform { a, b } => vec![("a", a), ("b", b)],
            SpecParams::Normal { mu, sigma } => vec![("mu", mu), ("sigma", sigma)],
            SpecParams::Exponential { lambda } => vec![("lambda", lambda)],
            SpecParams::Gamma { shape, rate } => vec![("shape", shape), ("rate", rate)],
        }
    }
}

// ============================================================================
// DistributionSpec
// ============================================================================

/// A validated distribution: family plus parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "SpecParams", try_from = "SpecParams")]
pub enum DistributionSpec {
    Bernoulli(Bernoulli),
    Binomial(Binomial),
    Geometric(Geometric),
    Poisson(Poisson),
    NegativeBinomial(NegativeBinomial),
    Hypergeometric(Hypergeometric),
    Uniform(Uniform),
    Normal(Normal),
    Exponential(Exponential),
    Gamma(Gamma),
}

/// Borrowed view of a spec through its family trait.
pub(crate) enum Law<'a> {
    Discrete(&'a dyn DiscreteDistribution),
    Continuous(&'a dyn ContinuousDistribution),
}

impl DistributionSpec {
    pub fn bernoulli(p: f64) -> ProbabilityResult<Self> {
        Ok(Self::Bernoulli(Bernoulli::new(p)?))
    }

    /// # Errors
    /// `Validation` if `n` is not a non-negative integer or `p ∉ [0, 1]`.
    pub fn binomial(n: f64, p: f64) -> ProbabilityResult<Self> {
        let n = validation::count("n", n)?;
        Ok(Self::Binomial(Binomial::new(n, p)?))
    }

    pub fn geometric(p: f64, form: GeometricForm) -> ProbabilityResult<Self> {
        Ok(Self::Geometric(Geometric::new(p, form)?))
    }

    pub fn poisson(lambda: f64) -> ProbabilityResult<Self> {
        Ok(Self::Poisson(Poisson::new(lambda)?))
    }

    /// # Errors
    /// `Validation` if `r` is not a positive integer or `p ∉ (0, 1]`.
    pub fn negative_binomial(r: f64, p: f64) -> ProbabilityResult<Self> {
        let r = validation::positive_count("r", r)?;
        Ok(Self::NegativeBinomial(NegativeBinomial::new(r, p)?))
    }

    /// # Errors
    /// `Validation` unless all three are integers with `N > 0`,
    /// `0 ≤ K ≤ N` and `0 < n ≤ N`.
    pub fn hypergeometric(population: f64, successes: f64, draws: f64) -> ProbabilityResult<Self> {
        let population = validation::count("population N", population)?;
        let successes = validation::count("successes K", successes)?;
        let draws = validation::count("draws n", draws)?;
        Ok(Self::Hypergeometric(Hypergeometric::new(
            population, successes, draws,
        )?))
    }

    pub fn uniform(a: f64, b: f64) -> ProbabilityResult<Self> {
        Ok(Self::Uniform(Uniform::new(a, b)?))
    }

    pub fn normal(mu: f64, sigma: f64) -> ProbabilityResult<Self> {
        Ok(Self::Normal(Normal::new(mu, sigma)?))
    }

    pub fn exponential(lambda: f64) -> ProbabilityResult<Self> {
        Ok(Self::Exponential(Exponential::new(lambda)?))
    }

    pub fn gamma(shape: f64, rate: f64) -> ProbabilityResult<Self> {
        Ok(Self::Gamma(Gamma::new(shape, rate)?))
    }

    pub fn family(&self) -> Family {
        match self {
            Self::Bernoulli(_) => Family::Bernoulli,
            Self::Binomial(_) => Family::Binomial,
            Self::Geometric(_) => Family::Geometric,
            Self::Poisson(_) => Family::Poisson,
            Self::NegativeBinomial(_) => Family::NegativeBinomial,
            Self::Hypergeometric(_) => Family::Hypergeometric,
            Self::Uniform(_) => Family::Uniform,
            Self::Normal(_) => Family::Normal,
            Self::Exponential(_) => Family::Exponential,
            Self::Gamma(_) => Family::Gamma,
        }
    }

    pub fn is_discrete(&self) -> bool {
        self.family().is_discrete()
    }

    pub(crate) fn law(&self) -> Law<'_> {
        match self {
            Self::Bernoulli(d) => Law::Discrete(d),
            Self::Binomial(d) => Law::Discrete(d),
            Self::Geometric(d) => Law::Discrete(d),
            Self::Poisson(d) => Law::Discrete(d),
            Self::NegativeBinomial(d) => Law::Discrete(d),
            Self::Hypergeometric(d) => Law::Discrete(d),
            Self::Uniform(d) => Law::Continuous(d),
            Self::Normal(d) => Law::Continuous(d),
            Self::Exponential(d) => Law::Continuous(d),
            Self::Gamma(d) => Law::Continuous(d),
        }
    }

    /// The spec as a discrete distribution, if it is one.
    pub fn as_discrete(&self) -> Option<&dyn DiscreteDistribution> {
        match self.law() {
            Law::Discrete(d) => Some(d),
            Law::Continuous(_) => None,
        }
    }

    /// The spec as a continuous distribution, if it is one.
    pub fn as_continuous(&self) -> Option<&dyn ContinuousDistribution> {
        match self.law() {
            Law::Continuous(c) => Some(c),
            Law::Discrete(_) => None,
        }
    }

    /// PMF for discrete families, PDF for continuous ones.
    pub fn pmf_or_pdf(&self, x: f64) -> f64 {
        match self.law() {
            Law::Discrete(d) => d.pmf(x),
            Law::Continuous(c) => c.pdf(x),
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match self.law() {
            Law::Discrete(d) => d.cdf(x),
            Law::Continuous(c) => c.cdf(x),
        }
    }

    pub fn mean(&self) -> f64 {
        match self.law() {
            Law::Discrete(d) => d.mean(),
            Law::Continuous(c) => c.mean(),
        }
    }

    pub fn variance(&self) -> f64 {
        match self.law() {
            Law::Discrete(d) => d.variance(),
            Law::Continuous(c) => c.variance(),
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// `None` when the distribution is degenerate.
    pub fn skewness(&self) -> Option<f64> {
        match self.law() {
            Law::Discrete(d) => d.skewness(),
            Law::Continuous(c) => Some(c.skewness()),
        }
    }

    /// Non-excess kurtosis; `None` when the distribution is degenerate.
    pub fn kurtosis(&self) -> Option<f64> {
        match self.law() {
            Law::Discrete(d) => d.kurtosis(),
            Law::Continuous(c) => Some(c.kurtosis()),
        }
    }

    /// Support interval as reals; unbounded ends are infinite.
    pub fn support(&self) -> (f64, f64) {
        match self.law() {
            Law::Discrete(d) => (
                d.support_min() as f64,
                d.support_max().map_or(f64::INFINITY, |hi| hi as f64),
            ),
            Law::Continuous(c) => c.support(),
        }
    }

    /// Whether the support is a finite set of integers.
    pub fn has_bounded_discrete_support(&self) -> bool {
        self.as_discrete()
            .is_some_and(|d| d.support_max().is_some())
    }

    /// Raw parameters of this spec.
    pub fn params(&self) -> SpecParams {
        SpecParams::from(*self)
    }
}

impl fmt::Display for DistributionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.family())?;
        for (i, (name, value)) in self.params().values().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

impl From<DistributionSpec> for SpecParams {
    fn from(spec: DistributionSpec) -> Self {
        match spec {
            DistributionSpec::Bernoulli(d) => SpecParams::Bernoulli { p: d.p() },
            DistributionSpec::Binomial(d) => SpecParams::Binomial {
                n: d.n() as f64,
                p: d.p(),
            },
            DistributionSpec::Geometric(d) => SpecParams::Geometric {
                p: d.p(),
                form: d.form(),
            },
            DistributionSpec::Poisson(d) => SpecParams::Poisson { lambda: d.lambda() },
            DistributionSpec::NegativeBinomial(d) => SpecParams::NegativeBinomial {
                r: d.r() as f64,
                p: d.p(),
            },
            DistributionSpec::Hypergeometric(d) => SpecParams::Hypergeometric {
                population: d.population() as f64,
                successes: d.successes() as f64,
                draws: d.draws() as f64,
            },
            DistributionSpec::Uniform(d) => SpecParams::Uniform { a: d.a(), b: d.b() },
            DistributionSpec::Normal(d) => SpecParams::Normal {
                mu: d.mu(),
                sigma: d.sigma(),
            },
            DistributionSpec::Exponential(d) => SpecParams::Exponential { lambda: d.lambda() },
            DistributionSpec::Gamma(d) => SpecParams::Gamma {
                shape: d.shape(),
                rate: d.rate(),
            },
        }
    }
}

impl TryFrom<SpecParams> for DistributionSpec {
    type Error = ProbabilityError;

    fn try_from(params: SpecParams) -> Result<Self, Self::Error> {
        match params {
            SpecParams::Bernoulli { p } => Self::bernoulli(p),
            SpecParams::Binomial { n, p } => Self::binomial(n, p),
            SpecParams::Geometric { p, form } => Self::geometric(p, form),
            SpecParams::Poisson { lambda } => Self::poisson(lambda),
            SpecParams::NegativeBinomial { r, p } => Self::negative_binomial(r, p),
            SpecParams::Hypergeometric {
                population,
                successes,
                draws,
            } => Self::hypergeometric(population, successes, draws),
            SpecParams::Uniform { a, b } => Self::uniform(a, b),
            SpecParams::Normal { mu, sigma } => Self::normal(mu, sigma),
            SpecParams::Exponential { lambda } => Self::exponential(lambda),
            SpecParams::Gamma { shape, rate } => Self::gamma(shape, rate),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Scalar quantities [`evaluate`] can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Pmf,
    Cdf,
    Mean,
    Variance,
    Skewness,
    Kurtosis,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Pmf => "pmf",
            Operation::Cdf => "cdf",
            Operation::Mean => "mean",
            Operation::Variance => "variance",
            Operation::Skewness => "skewness",
            Operation::Kurtosis => "kurtosis",
        }
    }

    /// Whether the operation is evaluated at a point `x`.
    pub fn takes_argument(self) -> bool {
        matches!(self, Operation::Pmf | Operation::Cdf)
    }
}

impl FromStr for Operation {
    type Err = ProbabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pmf" | "pdf" => Ok(Operation::Pmf),
            "cdf" => Ok(Operation::Cdf),
            "mean" => Ok(Operation::Mean),
            "variance" => Ok(Operation::Variance),
            "skewness" => Ok(Operation::Skewness),
            "kurtosis" => Ok(Operation::Kurtosis),
            _ => Err(ProbabilityError::Validation(format!(
                "unknown operation '{s}'"
            ))),
        }
    }
}

/// Evaluates one scalar quantity of `spec`.
///
/// `x` is required for [`Operation::Pmf`] and [`Operation::Cdf`] and
/// ignored otherwise. For continuous families `Pmf` yields the density.
///
/// # Errors
/// - `Validation` if a required `x` is missing or NaN.
/// - `Domain` if skewness or kurtosis is requested for a degenerate
///   distribution.
///
/// # Examples
/// ```
/// use u_probability::distribution::{evaluate, DistributionSpec, Operation};
/// let spec = DistributionSpec::binomial(10.0, 0.3).unwrap();
/// let mean = evaluate(&spec, Operation::Mean, None).unwrap();
/// assert!((mean - 3.0).abs() < 1e-12);
/// ```
pub fn evaluate(spec: &DistributionSpec, operation: Operation, x: Option<f64>) -> ProbabilityResult<f64> {
    let point = if operation.takes_argument() {
        match x {
            Some(v) if !v.is_nan() => Some(v),
            Some(v) => {
                return Err(ProbabilityError::Validation(format!(
                    "{} argument must be a number, got {v}",
                    operation.name()
                )))
            }
            None => {
                return Err(ProbabilityError::Validation(format!(
                    "{} requires an argument x",
                    operation.name()
                )))
            }
        }
    } else {
        None
    };

    match operation {
        Operation::Pmf => Ok(spec.pmf_or_pdf(point.unwrap_or_default())),
        Operation::Cdf => Ok(spec.cdf(point.unwrap_or_default())),
        Operation::Mean => Ok(spec.mean()),
        Operation::Variance => Ok(spec.variance()),
        Operation::Skewness => spec.skewness().ok_or_else(|| degenerate(spec, "skewness")),
        Operation::Kurtosis => spec.kurtosis().ok_or_else(|| degenerate(spec, "kurtosis")),
    }
}

fn degenerate(spec: &DistributionSpec, what: &str) -> ProbabilityError {
    ProbabilityError::Domain(format!(
        "{what} is undefined for {spec}: variance is zero"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parse_roundtrip() {
        for family in Family::ALL {
            assert_eq!(family.name().parse::<Family>().unwrap(), family);
        }
        assert_eq!("NEGATIVEBINOMIAL".parse::<Family>().unwrap(), Family::NegativeBinomial);
        assert!(matches!(
            "cauchy".parse::<Family>(),
            Err(ProbabilityError::Validation(_))
        ));
    }

    #[test]
    fn test_binomial_negative_n_is_validation_error() {
        assert!(matches!(
            DistributionSpec::binomial(-1.0, 0.5),
            Err(ProbabilityError::Validation(_))
        ));
        assert!(DistributionSpec::binomial(2.5, 0.5).is_err());
        assert!(DistributionSpec::binomial(10.0, 1.5).is_err());
    }

    #[test]
    fn test_hypergeometric_constraints() {
        assert!(DistributionSpec::hypergeometric(10.0, 4.0, 3.0).is_ok());
        assert!(DistributionSpec::hypergeometric(0.0, 0.0, 0.0).is_err());
        assert!(DistributionSpec::hypergeometric(10.0, 4.5, 3.0).is_err());
        assert!(DistributionSpec::hypergeometric(10.0, 4.0, 12.0).is_err());
    }

    #[test]
    fn test_params_roundtrip() {
        let specs = [
            DistributionSpec::bernoulli(0.3).unwrap(),
            DistributionSpec::binomial(12.0, 0.4).unwrap(),
            DistributionSpec::geometric(0.2, GeometricForm::Failures).unwrap(),
            DistributionSpec::poisson(2.5).unwrap(),
            DistributionSpec::negative_binomial(3.0, 0.5).unwrap(),
            DistributionSpec::hypergeometric(50.0, 10.0, 5.0).unwrap(),
            DistributionSpec::uniform(-1.0, 3.0).unwrap(),
            DistributionSpec::normal(1.0, 2.0).unwrap(),
            DistributionSpec::exponential(0.5).unwrap(),
            DistributionSpec::gamma(2.0, 3.0).unwrap(),
        ];
        for spec in specs {
            let back = DistributionSpec::try_from(spec.params()).unwrap();
            assert_eq!(back, spec);
        }
    }

    #[test]
    fn test_evaluate_operations() {
        let spec = DistributionSpec::poisson(4.0).unwrap();
        assert_eq!(evaluate(&spec, Operation::Mean, None).unwrap(), 4.0);
        assert_eq!(evaluate(&spec, Operation::Variance, None).unwrap(), 4.0);
        assert!((evaluate(&spec, Operation::Skewness, None).unwrap() - 0.5).abs() < 1e-15);
        assert!((evaluate(&spec, Operation::Kurtosis, None).unwrap() - 3.25).abs() < 1e-15);
        let p0 = evaluate(&spec, Operation::Pmf, Some(0.0)).unwrap();
        assert!((p0 - (-4.0_f64).exp()).abs() < 1e-15);
        let c0 = evaluate(&spec, Operation::Cdf, Some(0.0)).unwrap();
        assert!((c0 - p0).abs() < 1e-15);
    }

    #[test]
    fn test_evaluate_requires_argument() {
        let spec = DistributionSpec::normal(0.0, 1.0).unwrap();
        assert!(matches!(
            evaluate(&spec, Operation::Pmf, None),
            Err(ProbabilityError::Validation(_))
        ));
        assert!(evaluate(&spec, Operation::Cdf, Some(f64::NAN)).is_err());
        assert_eq!(evaluate(&spec, Operation::Cdf, Some(f64::INFINITY)).unwrap(), 1.0);
    }

    #[test]
    fn test_evaluate_degenerate_skewness_is_domain_error() {
        let spec = DistributionSpec::bernoulli(0.0).unwrap();
        assert!(matches!(
            evaluate(&spec, Operation::Skewness, None),
            Err(ProbabilityError::Domain(_))
        ));
    }

    #[test]
    fn test_operation_parse() {
        assert_eq!("PDF".parse::<Operation>().unwrap(), Operation::Pmf);
        assert_eq!("kurtosis".parse::<Operation>().unwrap(), Operation::Kurtosis);
        assert!("median".parse::<Operation>().is_err());
    }

    #[test]
    fn test_display() {
        let spec = DistributionSpec::binomial(10.0, 0.3).unwrap();
        assert_eq!(spec.to_string(), "binomial(n=10, p=0.3)");
    }

    #[test]
    fn test_support() {
        let spec = DistributionSpec::negative_binomial(3.0, 0.5).unwrap();
        assert_eq!(spec.support(), (3.0, f64::INFINITY));
        assert!(!spec.has_bounded_discrete_support());
        let spec = DistributionSpec::binomial(4.0, 0.5).unwrap();
        assert!(spec.has_bounded_discrete_support());
    }
}
