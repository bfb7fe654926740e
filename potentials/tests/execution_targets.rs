mod test_utils;

use na::Vector3;
use potentials::elementary::*;
use potentials::energy_models::*;
use potentials::validation::{cross_check_targets, ExecutionTarget, Parallel, Serial};
use potentials::{Error, Real};
use test_utils::*;

#[test]
fn serial_and_parallel_agree() {
    init_logger();
    let parallel = Parallel { min_len: 4 };

    let tet = TetNeoHookeanEnergy::from_rest_positions(&rest_tet(), &material()).unwrap();
    let xs = perturbations(&stack::<f64, 4, 12>(&rest_tet()), 0.1, 256);
    assert_eq!(cross_check_targets(&tet, &Serial, &parallel, &xs, 0.0), Ok(256));

    let bend = DihedralEnergy::from_rest_positions(&rest_hinge()).unwrap();
    let xs = perturbations(&stack::<f64, 4, 12>(&rest_hinge()), 0.2, 256);
    assert_eq!(cross_check_targets(&bend, &Serial, &parallel, &xs, 0.0), Ok(256));

    let cube = CubeSdf::new(Vector3::new(0.0, 0.5, 0.0), Vector3::new(1.0, 0.5, 2.0));
    let xs: Vec<Vector3<f64>> = utils::random_vectors(256, 3.0, 8);
    assert!(cross_check_targets(&cube, &Serial, &parallel, &xs, 0.0).unwrap() > 250);
}

#[test]
fn invalid_samples_are_skipped() {
    init_logger();
    let xs = vec![Vector3::zeros(), Vector3::new(1.0, 2.0, 3.0)];
    assert_eq!(
        cross_check_targets(&VecNormalized::<3>, &Serial, &Parallel::default(), &xs, 0.0),
        Ok(1)
    );
}

/// Evaluates in single precision and widens the result.
struct SinglePrecision;

impl ExecutionTarget for SinglePrecision {
    fn name(&self) -> &'static str {
        "single precision"
    }

    fn evaluate<T, F, const IN: usize, const OUT: usize>(
        &self,
        f: &F,
        xs: &[na::SVector<T, IN>],
    ) -> Vec<potentials::validation::Evaluation<T, IN, OUT>>
    where
        T: Real,
        F: potentials::Function<T, IN, OUT> + Sync,
    {
        // Round the inputs to single precision, which perturbs the results slightly.
        let rounded: Vec<_> = xs
            .iter()
            .map(|x| x.map(|v| na::convert::<f64, T>(f64::from(v.as_f64() as f32))))
            .collect();
        Serial.evaluate(f, &rounded)
    }
}

#[test]
fn mismatched_targets_are_reported() {
    init_logger();
    let xs: Vec<Vector3<f64>> = utils::random_vectors(16, 1.0, 2);
    let sphere = SphereSdf::new(Vector3::zeros(), 0.5);
    match cross_check_targets(&sphere, &Serial, &SinglePrecision, &xs, 1e-12) {
        Err(Error::TargetMismatch { difference, .. }) => assert!(difference > 1e-12),
        other => panic!("expected a mismatch, got {:?}", other),
    }
    assert_eq!(
        cross_check_targets(&sphere, &Serial, &SinglePrecision, &xs, 1e-5),
        Ok(16)
    );
}
