use na::{SMatrix, SVector};
use utils::Real;

use crate::function::Function;
use crate::tensor::HessianTensor;

/// The affine map `y = A·x + b`.
///
/// Its Jacobian is the constant matrix `A` and its Hessian vanishes, which makes it the natural
/// carrier for precomputed linear operators such as vertex-to-edge differences or rest shape
/// transforms.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AffineMap<T: Real, const IN: usize, const OUT: usize> {
    pub matrix: SMatrix<T, OUT, IN>,
    pub offset: SVector<T, OUT>,
}

impl<T: Real, const IN: usize, const OUT: usize> AffineMap<T, IN, OUT> {
    #[inline]
    pub fn new(matrix: SMatrix<T, OUT, IN>, offset: SVector<T, OUT>) -> Self {
        AffineMap { matrix, offset }
    }

    /// A linear map `y = A·x`.
    #[inline]
    pub fn linear(matrix: SMatrix<T, OUT, IN>) -> Self {
        AffineMap::new(matrix, SVector::zeros())
    }

    /// Extract the contiguous block `x[start..start + OUT]`.
    ///
    /// # Panics
    ///
    /// Panics if the block doesn't fit inside the input.
    pub fn select(start: usize) -> Self {
        assert!(start + OUT <= IN, "selected block is out of bounds");
        AffineMap::linear(SMatrix::from_fn(|r, c| {
            if c == start + r {
                T::one()
            } else {
                T::zero()
            }
        }))
    }
}

impl<T: Real, const IN: usize, const OUT: usize> Function<T, IN, OUT> for AffineMap<T, IN, OUT> {
    #[inline]
    fn valid_input(&self, _: &SVector<T, IN>) -> bool {
        true
    }
    #[inline]
    fn eval(&self, x: &SVector<T, IN>) -> SVector<T, OUT> {
        self.matrix * x + self.offset
    }
    #[inline]
    fn jacobian(&self, _: &SVector<T, IN>) -> SMatrix<T, OUT, IN> {
        self.matrix
    }
    #[inline]
    fn hessian(&self, _: &SVector<T, IN>) -> HessianTensor<T, OUT, IN> {
        HessianTensor::zeros()
    }
}

/// Scales the output of a function: `y = factor · f(x)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MultiplyConstant<T, F> {
    pub function: F,
    pub factor: T,
}

impl<T: Real, F> MultiplyConstant<T, F> {
    #[inline]
    pub fn new(function: F, factor: T) -> Self {
        MultiplyConstant { function, factor }
    }
}

impl<T: Real, F, const IN: usize, const OUT: usize> Function<T, IN, OUT> for MultiplyConstant<T, F>
where
    F: Function<T, IN, OUT>,
{
    #[inline]
    fn valid_input(&self, x: &SVector<T, IN>) -> bool {
        self.function.valid_input(x)
    }
    #[inline]
    fn eval(&self, x: &SVector<T, IN>) -> SVector<T, OUT> {
        self.function.eval(x) * self.factor
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, IN>) -> SMatrix<T, OUT, IN> {
        self.function.jacobian(x) * self.factor
    }
    #[inline]
    fn hessian(&self, x: &SVector<T, IN>) -> HessianTensor<T, OUT, IN> {
        self.function.hessian(x) * self.factor
    }
}

/// Shifts the output of a function: `y = f(x) + offset`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlusConstant<T: Real, F, const OUT: usize> {
    pub function: F,
    pub offset: SVector<T, OUT>,
}

impl<T: Real, F, const OUT: usize> PlusConstant<T, F, OUT> {
    #[inline]
    pub fn new(function: F, offset: SVector<T, OUT>) -> Self {
        PlusConstant { function, offset }
    }
}

impl<T: Real, F> PlusConstant<T, F, 1> {
    /// Shift a scalar function by `offset`.
    #[inline]
    pub fn scalar(function: F, offset: T) -> Self {
        PlusConstant::new(function, SVector::from_element(offset))
    }
}

impl<T: Real, F, const IN: usize, const OUT: usize> Function<T, IN, OUT> for PlusConstant<T, F, OUT>
where
    F: Function<T, IN, OUT>,
{
    #[inline]
    fn valid_input(&self, x: &SVector<T, IN>) -> bool {
        self.function.valid_input(x)
    }
    #[inline]
    fn eval(&self, x: &SVector<T, IN>) -> SVector<T, OUT> {
        self.function.eval(x) + self.offset
    }
    #[inline]
    fn jacobian(&self, x: &SVector<T, IN>) -> SMatrix<T, OUT, IN> {
        self.function.jacobian(x)
    }
    #[inline]
    fn hessian(&self, x: &SVector<T, IN>) -> HessianTensor<T, OUT, IN> {
        self.function.hessian(x)
    }
}
