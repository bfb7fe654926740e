/*!
 * The interface shared by every differentiable function along with the generic combinators used
 * to assemble composite functions.
 *
 * Functions map fixed size vectors to fixed size vectors. Matrix valued inputs and outputs are
 * flattened in column-major order, which is the storage order used by `nalgebra`.
 */

use na::{SMatrix, SVector};
use utils::Real;

use crate::tensor::HessianTensor;

/// A twice differentiable function `y: R^IN -> R^OUT` with exact derivatives.
///
/// `valid_input` marks where the function and both of its derivatives are defined. It is a
/// precondition: `eval`, `jacobian` and `hessian` never check it, and calling them outside the
/// valid domain produces unspecified (typically non-finite) values. Callers in hot loops are
/// expected to check the predicate once per element.
pub trait Function<T: Real, const IN: usize, const OUT: usize> {
    /// Returns `true` if `x` is in the domain of the function and its derivatives.
    fn valid_input(&self, x: &SVector<T, IN>) -> bool;
    /// Value of the function at `x`.
    fn eval(&self, x: &SVector<T, IN>) -> SVector<T, OUT>;
    /// First derivative `∂y_i/∂x_j` at `x`.
    fn jacobian(&self, x: &SVector<T, IN>) -> SMatrix<T, OUT, IN>;
    /// Second derivatives `∂²y_i/∂x_j∂x_k` at `x`.
    fn hessian(&self, x: &SVector<T, IN>) -> HessianTensor<T, OUT, IN>;
}

/// Convenience accessors for scalar valued functions such as energies.
pub trait ScalarFunction<T: Real, const IN: usize>: Function<T, IN, 1> {
    #[inline]
    fn value(&self, x: &SVector<T, IN>) -> T {
        self.eval(x)[0]
    }

    #[inline]
    fn gradient(&self, x: &SVector<T, IN>) -> SVector<T, IN> {
        self.jacobian(x).transpose()
    }

    #[inline]
    fn hessian_matrix(&self, x: &SVector<T, IN>) -> SMatrix<T, IN, IN> {
        self.hessian(x).into_matrix()
    }
}

impl<T: Real, F, const IN: usize> ScalarFunction<T, IN> for F where F: Function<T, IN, 1> {}

impl<'a, T: Real, F, const IN: usize, const OUT: usize> Function<T, IN, OUT> for &'a F
where
    F: Function<T, IN, OUT>,
{
    #[inline]
    fn valid_input(&self, x: &SVector<T, IN>) -> bool {
        (**self).valid_input(x)
    }
    #[inline]
    fn eval(&self, x: &SVector<T, IN>) -> SVector<T, OUT> {
        (**self).eval(x)
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, IN>) -> SMatrix<T, OUT, IN> {
        (**self).jacobian(x)
    }
    #[inline]
    fn hessian(&self, x: &SVector<T, IN>) -> HessianTensor<T, OUT, IN> {
        (**self).hessian(x)
    }
}

/// The composition `y = outer(inner(x))`.
///
/// `MID` is the output dimension of `inner`, which is also the input dimension of `outer`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Compose<F1, F2, const MID: usize> {
    pub inner: F1,
    pub outer: F2,
}

impl<F1, F2, const MID: usize> Compose<F1, F2, MID> {
    #[inline]
    pub fn new(inner: F1, outer: F2) -> Self {
        Compose { inner, outer }
    }
}

impl<T, F1, F2, const IN: usize, const MID: usize, const OUT: usize> Function<T, IN, OUT>
    for Compose<F1, F2, MID>
where
    T: Real,
    F1: Function<T, IN, MID>,
    F2: Function<T, MID, OUT>,
{
    #[inline]
    fn valid_input(&self, x: &SVector<T, IN>) -> bool {
        self.inner.valid_input(x) && self.outer.valid_input(&self.inner.eval(x))
    }

    #[inline]
    fn eval(&self, x: &SVector<T, IN>) -> SVector<T, OUT> {
        self.outer.eval(&self.inner.eval(x))
    }

    #[inline]
    fn jacobian(&self, x: &SVector<T, IN>) -> SMatrix<T, OUT, IN> {
        self.outer.jacobian(&self.inner.eval(x)) * self.inner.jacobian(x)
    }

    /// Second order chain rule.
    ///
    /// The first term is the curvature of `outer` pulled back through the Jacobian of `inner`,
    /// the second is the curvature of `inner` weighted by the Jacobian of `outer`. Both are
    /// needed for an exact Hessian.
    fn hessian(&self, x: &SVector<T, IN>) -> HessianTensor<T, OUT, IN> {
        let y = self.inner.eval(x);
        let inner_jac = self.inner.jacobian(x);
        let outer_jac = self.outer.jacobian(&y);
        self.outer.hessian(&y).right_sandwich(&inner_jac)
            + self.inner.hessian(x).left_apply(&outer_jac)
    }
}

/// The identity map on `R^N`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity<const N: usize>;

impl<T: Real, const N: usize> Function<T, N, N> for Identity<N> {
    #[inline]
    fn valid_input(&self, _: &SVector<T, N>) -> bool {
        true
    }
    #[inline]
    fn eval(&self, x: &SVector<T, N>) -> SVector<T, N> {
        *x
    }
    #[inline]
    fn jacobian(&self, _: &SVector<T, N>) -> SMatrix<T, N, N> {
        SMatrix::identity()
    }
    #[inline]
    fn hessian(&self, _: &SVector<T, N>) -> HessianTensor<T, N, N> {
        HessianTensor::zeros()
    }
}

/// Compile time check that two stacked output dimensions add up to the total.
struct DimSum<const A: usize, const B: usize, const SUM: usize>;

impl<const A: usize, const B: usize, const SUM: usize> DimSum<A, B, SUM> {
    const CHECK: () = assert!(A + B == SUM, "stacked output dimensions must add up");
}

/// Two functions of the same input evaluated side by side: `y = [first(x); second(x)]`.
///
/// `OUT` is the total output dimension and must equal `OUT1 + OUT2`, which is verified when
/// the stack is instantiated.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Stack<F, G, const OUT1: usize, const OUT2: usize, const OUT: usize> {
    pub first: F,
    pub second: G,
}

impl<F, G, const OUT1: usize, const OUT2: usize, const OUT: usize> Stack<F, G, OUT1, OUT2, OUT> {
    #[inline]
    pub fn new(first: F, second: G) -> Self {
        let () = DimSum::<OUT1, OUT2, OUT>::CHECK;
        Stack { first, second }
    }
}

impl<T, F, G, const IN: usize, const OUT1: usize, const OUT2: usize, const OUT: usize>
    Function<T, IN, OUT> for Stack<F, G, OUT1, OUT2, OUT>
where
    T: Real,
    F: Function<T, IN, OUT1>,
    G: Function<T, IN, OUT2>,
{
    #[inline]
    fn valid_input(&self, x: &SVector<T, IN>) -> bool {
        self.first.valid_input(x) && self.second.valid_input(x)
    }

    fn eval(&self, x: &SVector<T, IN>) -> SVector<T, OUT> {
        let () = DimSum::<OUT1, OUT2, OUT>::CHECK;
        let a = self.first.eval(x);
        let b = self.second.eval(x);
        SVector::from_fn(|r, _| if r < OUT1 { a[r] } else { b[r - OUT1] })
    }

    fn jacobian(&self, x: &SVector<T, IN>) -> SMatrix<T, OUT, IN> {
        let () = DimSum::<OUT1, OUT2, OUT>::CHECK;
        let a = self.first.jacobian(x);
        let b = self.second.jacobian(x);
        SMatrix::from_fn(|r, c| if r < OUT1 { a[(r, c)] } else { b[(r - OUT1, c)] })
    }

    fn hessian(&self, x: &SVector<T, IN>) -> HessianTensor<T, OUT, IN> {
        let () = DimSum::<OUT1, OUT2, OUT>::CHECK;
        let a = self.first.hessian(x);
        let b = self.second.hessian(x);
        HessianTensor::from_fn(|i| {
            if i < OUT1 {
                *a.component(i)
            } else {
                *b.component(i - OUT1)
            }
        })
    }
}
