/*!
 * Tools for verifying analytic derivatives.
 *
 * Derivatives are checked two ways: against central finite differences of the next lower
 * order, and by evaluating the same function on two different execution targets and comparing
 * the results.
 */

use std::fmt;

use na::{SMatrix, SVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use utils::Real;

use crate::function::Function;
use crate::tensor::HessianTensor;
use crate::Error;

/// The order of the quantity being compared.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivativeKind {
    Value,
    Jacobian,
    Hessian,
}

impl fmt::Display for DerivativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivativeKind::Value => write!(f, "Value"),
            DerivativeKind::Jacobian => write!(f, "Jacobian"),
            DerivativeKind::Hessian => write!(f, "Hessian"),
        }
    }
}

/// Finite difference derivative checker.
///
/// An analytic entry `a` passes against its approximation `b` when
/// `|a - b| <= tolerance · max(|a|, 1)`.
///
/// The step and tolerance depend on the precision of the scalar being checked, so construct
/// checkers for `f32` functions with `DerivativeCheck::for_scalar::<f32>()`. The `Default`
/// configuration is the `f64` one.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivativeCheck {
    /// Central difference step size.
    pub step: f64,
    /// Scale-relative tolerance.
    pub tolerance: f64,
}

/// Defaults are tuned for `f64`. Use [`DerivativeCheck::for_scalar`] when checking functions
/// of other scalar types.
impl Default for DerivativeCheck {
    fn default() -> Self {
        DerivativeCheck::for_scalar::<f64>()
    }
}

impl DerivativeCheck {
    /// Step and tolerance of `√eps` for the given scalar type.
    pub fn for_scalar<T: Real>() -> Self {
        let root_eps = T::eps().sqrt().as_f64();
        DerivativeCheck {
            step: root_eps,
            tolerance: root_eps,
        }
    }

    fn compare(
        &self,
        kind: DerivativeKind,
        index: &[usize],
        analytic: f64,
        approximate: f64,
    ) -> Result<(), Error> {
        let error = (analytic - approximate).abs();
        // Written so that NaNs fail.
        if error <= self.tolerance * analytic.abs().max(1.0) {
            Ok(())
        } else {
            log::warn!(
                "{} mismatch at {:?}: {:e} vs {:e}",
                kind,
                index,
                analytic,
                approximate
            );
            Err(Error::DerivativeMismatch {
                kind,
                index: index.to_vec(),
                analytic,
                approximate,
            })
        }
    }

    /// Compare the Jacobian of `f` at `x` against central differences of `eval`.
    pub fn check_jacobian<T, F, const IN: usize, const OUT: usize>(
        &self,
        f: &F,
        x: &SVector<T, IN>,
    ) -> Result<(), Error>
    where
        T: Real,
        F: Function<T, IN, OUT>,
    {
        if !f.valid_input(x) {
            return Err(Error::InvalidInput);
        }
        log::debug!("Checking {}x{} Jacobian", OUT, IN);
        let jac = f.jacobian(x);
        for j in 0..IN {
            let diff = self.finite_difference(x, j, |y| f.valid_input(y), |y| f.eval(y))?;
            for i in 0..OUT {
                self.compare(
                    DerivativeKind::Jacobian,
                    &[i, j],
                    jac[(i, j)].as_f64(),
                    diff[i].as_f64(),
                )?;
            }
        }
        Ok(())
    }

    /// Compare the Hessian of `f` at `x` against central differences of `jacobian`.
    pub fn check_hessian<T, F, const IN: usize, const OUT: usize>(
        &self,
        f: &F,
        x: &SVector<T, IN>,
    ) -> Result<(), Error>
    where
        T: Real,
        F: Function<T, IN, OUT>,
    {
        if !f.valid_input(x) {
            return Err(Error::InvalidInput);
        }
        log::debug!("Checking {}x{}x{} Hessian", OUT, IN, IN);
        let hess = f.hessian(x);
        for k in 0..IN {
            let diff = self.finite_difference(x, k, |y| f.valid_input(y), |y| f.jacobian(y))?;
            for i in 0..OUT {
                for j in 0..IN {
                    self.compare(
                        DerivativeKind::Hessian,
                        &[i, j, k],
                        hess[(i, j, k)].as_f64(),
                        diff[(i, j)].as_f64(),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Run both checks at every valid sample.
    ///
    /// Samples outside the domain of `f` are skipped. Returns the number of samples checked.
    pub fn check_derivatives<T, F, const IN: usize, const OUT: usize>(
        &self,
        f: &F,
        samples: &[SVector<T, IN>],
    ) -> Result<usize, Error>
    where
        T: Real,
        F: Function<T, IN, OUT>,
    {
        let mut checked = 0;
        for (i, x) in samples.iter().enumerate() {
            if !f.valid_input(x) {
                log::debug!("Skipping sample {} outside of the domain", i);
                continue;
            }
            self.check_jacobian(f, x)?;
            self.check_hessian(f, x)?;
            checked += 1;
        }
        log::debug!("Checked {} of {} samples", checked, samples.len());
        Ok(checked)
    }

    /// Difference quotient of `g` along coordinate `j`.
    ///
    /// Central differences are used where both perturbed points are in the domain. Near the
    /// boundary this falls back to a one-sided difference towards the valid neighbour, and fails
    /// with [`Error::DifferenceOutsideDomain`] if neither neighbour is valid. `x` itself is
    /// assumed valid.
    fn finite_difference<T, V, G, const IN: usize, const R: usize, const C: usize>(
        &self,
        x: &SVector<T, IN>,
        j: usize,
        valid: V,
        g: G,
    ) -> Result<SMatrix<T, R, C>, Error>
    where
        T: Real,
        V: Fn(&SVector<T, IN>) -> bool,
        G: Fn(&SVector<T, IN>) -> SMatrix<T, R, C>,
    {
        let h: T = na::convert(self.step);
        let mut forward = *x;
        forward[j] += h;
        let mut backward = *x;
        backward[j] -= h;
        // Divide by the representable step rather than the requested one.
        match (valid(&forward), valid(&backward)) {
            (true, true) => Ok((g(&forward) - g(&backward)) / (forward[j] - backward[j])),
            (true, false) => {
                log::trace!("Forward difference along {} at the domain boundary", j);
                Ok((g(&forward) - g(x)) / (forward[j] - x[j]))
            }
            (false, true) => {
                log::trace!("Backward difference along {} at the domain boundary", j);
                Ok((g(x) - g(&backward)) / (x[j] - backward[j]))
            }
            (false, false) => {
                log::warn!("Finite difference along {} leaves the domain on both sides", j);
                Err(Error::DifferenceOutsideDomain { coordinate: j })
            }
        }
    }
}

/// Value and derivatives of a function at a single point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Evaluation<T: Real, const IN: usize, const OUT: usize> {
    pub value: SVector<T, OUT>,
    pub jacobian: SMatrix<T, OUT, IN>,
    pub hessian: HessianTensor<T, OUT, IN>,
}

impl<T: Real, const IN: usize, const OUT: usize> Evaluation<T, IN, OUT> {
    #[inline]
    pub fn of<F: Function<T, IN, OUT>>(f: &F, x: &SVector<T, IN>) -> Self {
        Evaluation {
            value: f.eval(x),
            jacobian: f.jacobian(x),
            hessian: f.hessian(x),
        }
    }

    /// Largest difference per quantity relative to the magnitude of `self`.
    fn relative_differences(&self, other: &Self) -> [(DerivativeKind, f64); 3] {
        fn relative<'a, T: Real>(
            a: impl Iterator<Item = &'a T>,
            b: impl Iterator<Item = &'a T>,
        ) -> f64 {
            let (diff, scale) = a.zip(b).fold((0.0_f64, 1.0_f64), |(diff, scale), (x, y)| {
                let (x, y) = (x.as_f64(), y.as_f64());
                (diff.max((x - y).abs()), scale.max(x.abs()))
            });
            diff / scale
        }
        let self_hessian = self.hessian.components().iter().flat_map(|m| m.iter());
        let other_hessian = other.hessian.components().iter().flat_map(|m| m.iter());
        [
            (
                DerivativeKind::Value,
                relative(self.value.iter(), other.value.iter()),
            ),
            (
                DerivativeKind::Jacobian,
                relative(self.jacobian.iter(), other.jacobian.iter()),
            ),
            (
                DerivativeKind::Hessian,
                relative(self_hessian, other_hessian),
            ),
        ]
    }
}

/// A strategy for evaluating a function over a batch of inputs.
pub trait ExecutionTarget {
    fn name(&self) -> &'static str;

    fn evaluate<T, F, const IN: usize, const OUT: usize>(
        &self,
        f: &F,
        xs: &[SVector<T, IN>],
    ) -> Vec<Evaluation<T, IN, OUT>>
    where
        T: Real,
        F: Function<T, IN, OUT> + Sync;
}

/// Evaluate inputs one after another on the calling thread.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Serial;

/// Evaluate inputs concurrently on the global rayon thread pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Parallel {
    /// Minimum number of inputs handed to a single task.
    pub min_len: usize,
}

impl Default for Parallel {
    fn default() -> Self {
        Parallel { min_len: 1 }
    }
}

impl ExecutionTarget for Serial {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn evaluate<T, F, const IN: usize, const OUT: usize>(
        &self,
        f: &F,
        xs: &[SVector<T, IN>],
    ) -> Vec<Evaluation<T, IN, OUT>>
    where
        T: Real,
        F: Function<T, IN, OUT> + Sync,
    {
        xs.iter().map(|x| Evaluation::of(f, x)).collect()
    }
}

impl ExecutionTarget for Parallel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn evaluate<T, F, const IN: usize, const OUT: usize>(
        &self,
        f: &F,
        xs: &[SVector<T, IN>],
    ) -> Vec<Evaluation<T, IN, OUT>>
    where
        T: Real,
        F: Function<T, IN, OUT> + Sync,
    {
        xs.par_iter()
            .with_min_len(self.min_len.max(1))
            .map(|x| Evaluation::of(f, x))
            .collect()
    }
}

/// Evaluate `f` at every valid input on two targets and compare the results.
///
/// Each quantity must agree to within `tolerance` relative to its magnitude. Returns the number
/// of samples compared.
pub fn cross_check_targets<T, F, A, B, const IN: usize, const OUT: usize>(
    f: &F,
    a: &A,
    b: &B,
    xs: &[SVector<T, IN>],
    tolerance: f64,
) -> Result<usize, Error>
where
    T: Real,
    F: Function<T, IN, OUT> + Sync,
    A: ExecutionTarget,
    B: ExecutionTarget,
{
    let (indices, valid): (Vec<usize>, Vec<SVector<T, IN>>) = xs
        .iter()
        .enumerate()
        .filter(|(_, x)| f.valid_input(x))
        .map(|(i, x)| (i, *x))
        .unzip();

    log::debug!(
        "Comparing {} and {} targets on {} samples",
        a.name(),
        b.name(),
        valid.len()
    );

    let first = a.evaluate(f, &valid);
    let second = b.evaluate(f, &valid);

    for ((sample, x), y) in indices.into_iter().zip(first.iter()).zip(second.iter()) {
        for (kind, difference) in x.relative_differences(y) {
            // Written so that NaNs fail.
            if !(difference <= tolerance) {
                log::warn!(
                    "{} mismatch between {} and {} at sample {}: {:e}",
                    kind,
                    a.name(),
                    b.name(),
                    sample,
                    difference
                );
                return Err(Error::TargetMismatch {
                    kind,
                    sample,
                    difference,
                });
            }
        }
    }
    Ok(valid.len())
}
