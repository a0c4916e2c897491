//! Random number generation.
//!
//! Provides seeded RNG construction and the uniform and Gaussian variates
//! the samplers are built on.
//!
//! # Reproducibility
//!
//! For reproducible experiments, use [`create_rng`] with a fixed seed.
//! The underlying algorithm (SmallRng) is deterministic for a given seed
//! on the same platform.

use rand::Rng;

/// Creates a fast, seeded random number generator.
///
/// Uses `SmallRng` (Xoshiro256++) for high performance.
/// The sequence is deterministic for a given seed on the same platform.
///
/// # Examples
/// ```
/// use u_probability::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

/// Draws a fresh seed from the thread-local entropy source.
pub fn random_seed() -> u64 {
    rand::rng().random()
}

/// Uniform variate on the open interval `(0, 1)`.
///
/// Excluding zero keeps `ln(u)` finite in inverse-transform samplers.
pub fn open_unit<R: Rng>(rng: &mut R) -> f64 {
    loop {
        let u: f64 = rng.random();
        if u > 0.0 {
            return u;
        }
    }
}

/// Standard normal variates by the Box–Muller transform.
///
/// Each transform of two uniforms yields two independent normals; the
/// second is cached and returned by the next call.
///
/// Reference: Box & Muller (1958), "A Note on the Generation of Random
/// Normal Deviates", *Annals of Mathematical Statistics* 29(2).
///
/// # Examples
/// ```
/// use u_probability::random::{create_rng, BoxMuller};
/// let mut rng = create_rng(7);
/// let mut normals = BoxMuller::new();
/// let z = normals.next(&mut rng);
/// assert!(z.is_finite());
/// ```
#[derive(Debug, Clone, Default)]
pub struct BoxMuller {
    spare: Option<f64>,
}

impl BoxMuller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next standard normal variate.
    pub fn next<R: Rng>(&mut self, rng: &mut R) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        let u1 = open_unit(rng);
        let u2: f64 = rng.random();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = 2.0 * std::f64::consts::PI * u2;
        self.spare = Some(radius * angle.sin());
        radius * angle.cos()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rng_deterministic() {
        let mut rng1 = create_rng(42);
        let mut rng2 = create_rng(42);
        let vals1: Vec<f64> = (0..10).map(|_| rng1.random()).collect();
        let vals2: Vec<f64> = (0..10).map(|_| rng2.random()).collect();
        assert_eq!(vals1, vals2);
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut rng1 = create_rng(1);
        let mut rng2 = create_rng(2);
        let a: u64 = rng1.random();
        let b: u64 = rng2.random();
        assert_ne!(a, b);
    }

    #[test]
    fn test_box_muller_uses_spare() {
        let mut rng = create_rng(3);
        let mut normals = BoxMuller::new();
        normals.next(&mut rng);
        assert!(normals.spare.is_some());
        normals.next(&mut rng);
        assert!(normals.spare.is_none());
    }

    #[test]
    fn test_box_muller_moments() {
        let mut rng = create_rng(2024);
        let mut normals = BoxMuller::new();
        let n = 200_000;
        let draws: Vec<f64> = (0..n).map(|_| normals.next(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        assert!(mean.abs() < 0.01, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.02, "var = {var}");
    }
}
