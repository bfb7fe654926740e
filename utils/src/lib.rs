//! The scalar type and numeric conveniences shared by the potentials crates.

use na::SVector;
use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};

/// Floating point scalar used by every differentiable function.
///
/// This is implemented for `f32` and `f64`. All domain thresholds are expressed in terms of
/// `eps`, which is much larger than machine epsilon so that guards stay meaningful
/// after a few rounds of arithmetic.
pub trait Real: na::RealField + Copy + Send + Sync + 'static {
    /// Scale-relative tolerance for this precision: `1e-4` for `f32` and `1e-8` for `f64`.
    fn eps() -> Self;

    /// Widen to `f64`, used for reporting.
    fn as_f64(self) -> f64;
}

impl Real for f32 {
    #[inline]
    fn eps() -> Self {
        1e-4
    }
    #[inline]
    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Real for f64 {
    #[inline]
    fn eps() -> Self {
        1e-8
    }
    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

/// Sign of `x` as `-1`, `0` or `1`.
///
/// Unlike `signum`, zero maps to zero.
#[inline]
pub fn sign<T: Real>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else if x < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}

/// Norm threshold below which vectors are considered degenerate for normalization purposes.
#[inline]
pub fn min_norm<T: Real>() -> T {
    T::eps() * na::convert::<f64, T>(100.0)
}

/// Generate `n` seeded random vectors with entries uniformly drawn from `[-|range|, |range|]`.
///
/// The same `seed` always produces the same samples, which keeps derivative tests reproducible.
/// A zero `range` produces zero vectors.
///
/// # Panics
///
/// Panics if `range` is not finite.
pub fn random_vectors<T: Real, const N: usize>(n: usize, range: f64, seed: u64) -> Vec<SVector<T, N>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = symmetric_uniform(range);
    (0..n)
        .map(|_| SVector::<T, N>::from_fn(|_, _| na::convert(rng.sample(dist))))
        .collect()
}

/// Perturb `x` by seeded uniform noise in `[-|range|, |range|]` per entry.
///
/// # Panics
///
/// Panics if `range` is not finite.
pub fn jitter<T: Real, const N: usize>(x: &SVector<T, N>, range: f64, seed: u64) -> SVector<T, N> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = symmetric_uniform(range);
    x.map(|v| v + na::convert::<f64, T>(rng.sample(dist)))
}

fn symmetric_uniform(range: f64) -> Uniform<f64> {
    assert!(range.is_finite(), "sample range must be finite");
    let range = range.abs();
    Uniform::new_inclusive(-range, range)
}
