mod test_utils;

use na::Vector3;
use potentials::elementary::*;
use potentials::energy_models::*;
use potentials::validation::DerivativeCheck;
use potentials::{Function, ScalarFunction};
use test_utils::*;

#[test]
fn elementary_functions() {
    init_logger();
    let check = DerivativeCheck::for_scalar::<f32>();

    let samples = utils::random_vectors::<f32, 9>(20, 1.0, 1);
    assert_eq!(check.check_derivatives(&Determinant3, &samples).unwrap(), 20);

    let samples = perturbations(&Vector3::new(1.0_f32, -0.5, 0.8), 0.3, 20);
    assert_eq!(check.check_derivatives(&VecLength::<3>, &samples).unwrap(), 20);
    assert_eq!(check.check_derivatives(&VecNormalized::<3>, &samples).unwrap(), 20);
}

#[test]
fn energies() {
    init_logger();
    let check = DerivativeCheck::for_scalar::<f32>();

    let nh = ElasticNeoHookean::<f32>::new(1.0, 1.0);
    let identity = na::SVector::<f32, 9>::from_column_slice(na::Matrix3::<f32>::identity().as_slice());
    assert_eq!(nh.value(&identity), 0.0);
    check.check_jacobian(&nh, &utils::jitter(&identity, 0.1, 3)).unwrap();
    check.check_hessian(&nh, &utils::jitter(&identity, 0.1, 3)).unwrap();

    let tet = TetNeoHookeanEnergy::<f32>::from_rest_positions(&rest_tet(), &material()).unwrap();
    let x = utils::jitter(&stack::<f32, 4, 12>(&rest_tet()), 0.1, 7);
    check.check_jacobian(&tet, &x).unwrap();
    check.check_hessian(&tet, &x).unwrap();

    let cube = CubeSdf::<f32>::new(Vector3::zeros(), Vector3::repeat(1.0));
    assert_eq!(cube.value(&Vector3::new(2.0, 0.0, 0.0)), 1.0);
    assert_eq!(cube.value(&Vector3::new(0.5, 0.0, 0.0)), -0.5);
    assert!(!cube.valid_input(&Vector3::new(1.0, 0.0, 0.0)));
}
