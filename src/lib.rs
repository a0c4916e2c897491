//! # u-probability
//!
//! Probability computation engine: distribution evaluation, moments,
//! transformations of random variables, and Monte Carlo simulation.
//!
//! The engine is a set of pure functions over a validated
//! [`DistributionSpec`]. It holds no global state; every call returns its
//! own table, moment set, transformation result or simulation run.
//!
//! ## Modules
//!
//! - [`special`] — Log-space combinatorics, gamma and error functions
//! - [`discrete`] — Bernoulli, Binomial, Geometric, Poisson, Negative Binomial, Hypergeometric
//! - [`continuous`] — Uniform, Normal, Exponential, Gamma
//! - [`distribution`] — The `DistributionSpec` tagged union and [`evaluate`]
//! - [`table`] — Probability tables for charting
//! - [`moments`](mod@moments) — Raw, central and standardized moments; MGFs
//! - [`transform`](mod@transform) — Linear, square, exp, abs, min and max transformations
//! - [`random`] — Seeded RNG construction and Gaussian variates
//! - [`sampling`] — Per-family reproducible samplers
//! - [`stats`] — Descriptive statistics with numerical stability guarantees
//! - [`simulation`] — Monte Carlo runs with statistics, histogram and convergence views
//!
//! ## Design Philosophy
//!
//! - **Validate once**: a spec that exists satisfies its family's constraints
//! - **Log space first**: factorials and binomial coefficients never overflow
//! - **Reproducible**: the same `(spec, seed)` always yields the same sample
//! - **Property-based testing**: Mathematical invariants verified via proptest
//!
//! ## Quick Start
//!
//! ```
//! use u_probability::{evaluate, moments, DistributionSpec, Operation};
//!
//! let spec = DistributionSpec::binomial(10.0, 0.3).unwrap();
//! assert!((evaluate(&spec, Operation::Variance, None).unwrap() - 2.1).abs() < 1e-12);
//!
//! let set = moments(&spec, 4, Some(0.5)).unwrap();
//! assert_eq!(set.central[0], 0.0);
//! ```

pub mod continuous;
pub mod discrete;
pub mod distribution;
pub mod error;
pub mod moments;
pub mod random;
pub mod sampling;
pub mod simulation;
pub mod special;
pub mod stats;
pub mod table;
pub mod transform;

mod validation;

pub use distribution::{evaluate, DistributionSpec, Family, Operation, SpecParams};
pub use error::{ProbabilityError, ProbabilityResult};
pub use moments::{mgf, moments, MomentSet};
pub use simulation::{simulate, SimulationMode, SimulationRequest, SimulationRun};
pub use table::{probability_table, ProbabilityPoint, TableOptions};
pub use transform::{transform, TargetFamily, Transform, TransformationResult};

/// Smallest accepted Monte Carlo sample size.
pub const MIN_SAMPLE_SIZE: usize = 100;

/// Largest accepted Monte Carlo sample size.
pub const MAX_SAMPLE_SIZE: usize = 1_000_000;

/// Highest moment order [`moments()`] computes.
pub const MAX_MOMENT_ORDER: u32 = 10;
