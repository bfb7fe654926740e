mod test_utils;

use na::{Matrix3, SVector, Vector3};
use potentials::elementary::*;
use potentials::energy_models::*;
use potentials::validation::DerivativeCheck;
use potentials::{Compose, Function, Identity, ScalarFunction};
use test_utils::*;

#[test]
fn elementary_functions() {
    init_logger();
    let check = DerivativeCheck::default();

    let samples = utils::random_vectors::<f64, 9>(50, 1.0, 1);
    assert_eq!(check.check_derivatives(&Determinant3, &samples).unwrap(), 50);

    // Keep away from singular matrices where finite differences lose accuracy.
    let identity = SVector::<f64, 9>::from_column_slice(Matrix3::<f64>::identity().as_slice());
    let samples = perturbations(&identity, 0.2, 50);
    assert_eq!(check.check_derivatives(&LogDeterminant3, &samples).unwrap(), 50);
    assert_eq!(check.check_derivatives(&LogSquareDeterminant3, &samples).unwrap(), 50);

    let samples = utils::random_vectors::<f64, 6>(50, 1.0, 2);
    assert_eq!(check.check_derivatives(&Cross3, &samples).unwrap(), 50);
    assert_eq!(check.check_derivatives(&Dot3, &samples).unwrap(), 50);

    let samples = utils::random_vectors::<f64, 4>(50, 1.0, 3);
    assert_eq!(check.check_derivatives(&VecLength::<4>, &samples).unwrap(), 50);
    assert_eq!(check.check_derivatives(&VecNormalized::<4>, &samples).unwrap(), 50);
    assert_eq!(check.check_derivatives(&SquaredNorm::<4>, &samples).unwrap(), 50);

    let samples = utils::random_vectors::<f64, 2>(50, 1.0, 4);
    assert_eq!(check.check_derivatives(&Atan2, &samples).unwrap(), 50);
}

#[test]
fn log_determinants_of_rotations() {
    init_logger();
    // Rotations have unit determinant so both logarithms and their gradients vanish.
    let r = na::Rotation3::from_euler_angles(0.2, 0.4, -1.0);
    let x = SVector::<f64, 9>::from_column_slice(r.matrix().as_slice());
    approx::assert_relative_eq!(LogDeterminant3.value(&x), 0.0, epsilon = 1e-14);
    approx::assert_relative_eq!(LogSquareDeterminant3.value(&x), 0.0, epsilon = 1e-28);
    approx::assert_relative_eq!(
        LogSquareDeterminant3.gradient(&x),
        SVector::zeros(),
        epsilon = 1e-12
    );
}

#[test]
fn constant_hessians() {
    let [a, b]: [SVector<f64, 6>; 2] = [
        SVector::from_column_slice(&[1.0, -2.0, 0.5, 3.0, 0.0, 1.0]),
        SVector::from_column_slice(&[-7.0, 0.1, 2.0, 0.0, 9.0, -4.0]),
    ];
    assert_eq!(
        Function::<f64, 6, 3>::hessian(&Cross3, &a),
        Function::<f64, 6, 3>::hessian(&Cross3, &b)
    );
    assert_eq!(Dot3.hessian_matrix(&a), Dot3.hessian_matrix(&b));
}

#[test]
fn deep_composition() {
    init_logger();
    // log det(A·x) for a fixed linear map A, with curvature in the last stage only.
    let a = na::SMatrix::<f64, 9, 9>::from_fn(|r, c| {
        if r == c {
            1.0
        } else {
            0.001 * (r + 2 * c) as f64
        }
    });
    let f: Compose<Compose<AffineMap<f64, 9, 9>, Identity<9>, 9>, LogDeterminant3, 9> =
        Compose::new(Compose::new(AffineMap::linear(a), Identity), LogDeterminant3);
    let x = SVector::<f64, 9>::from_column_slice(Matrix3::<f64>::identity().as_slice());
    let check = DerivativeCheck::default();
    for x in perturbations(&x, 0.1, 10) {
        check.check_jacobian(&f, &x).unwrap();
        check.check_hessian(&f, &x).unwrap();
    }
}

#[test]
fn energy_models() {
    init_logger();
    let check = DerivativeCheck::default();

    let tet = TetNeoHookeanEnergy::from_rest_positions(&rest_tet(), &material()).unwrap();
    let x = stack::<f64, 4, 12>(&rest_tet());
    assert_eq!(check.check_derivatives(&tet, &perturbations(&x, 0.1, 10)).unwrap(), 10);

    let tri = TriNeoHookeanEnergy::from_rest_positions(&rest_triangle(), &material()).unwrap();
    let x = stack::<f64, 3, 9>(&rest_triangle());
    assert_eq!(check.check_derivatives(&tri, &perturbations(&x, 0.15, 10)).unwrap(), 10);

    let bend = DihedralEnergy::from_rest_positions(&rest_hinge())
        .unwrap()
        .with_stiffness(0.5);
    let x = stack::<f64, 4, 12>(&rest_hinge());
    assert_eq!(check.check_derivatives(&bend, &perturbations(&x, 0.2, 10)).unwrap(), 10);
}

#[test]
fn dihedral_energy_is_nonnegative() {
    init_logger();
    let rest = rest_hinge::<f64>();
    let energy = DihedralEnergy::from_rest_positions(&rest).unwrap();
    let x = stack::<f64, 4, 12>(&rest);
    assert_eq!(energy.value(&x), 0.0);
    for y in perturbations(&x, 0.5, 100) {
        if energy.valid_input(&y) {
            assert!(energy.value(&y) >= 0.0);
        }
    }
}

#[test]
fn signed_distance_functions() {
    init_logger();
    let check = DerivativeCheck::default();
    let samples: Vec<Vector3<f64>> = utils::random_vectors(100, 3.0, 5);

    let sphere = SphereSdf::new(vec3(0.5, 0.0, -0.5), 1.0);
    assert_eq!(check.check_derivatives(&sphere, &samples).unwrap(), 100);

    let capsule = CapsuleSdf::new(vec3(-1.0, 0.0, 0.0), vec3(1.0, 0.5, 0.0), 0.3);
    assert_eq!(check.check_derivatives(&capsule, &samples).unwrap(), 100);

    let cube = CubeSdf::new(Vector3::zeros(), Vector3::repeat(1.0));
    assert_eq!(cube.value(&vec3(2.0, 0.0, 0.0)), 1.0);
    assert_eq!(cube.value(&vec3(0.5, 0.0, 0.0)), -0.5);
    assert!(check.check_derivatives(&cube, &samples).unwrap() > 90);
}
