mod common;

use approx::assert_relative_eq;
use common::{mindless_blyp, mindless_pbe, numerical_gradient};
use dftd4::{
    DampingParam, DispersionModel, Method, ModelKind, ModelOptions, Structure,
    get_default_parameters,
};

fn check_gradient(structure: Structure, options: ModelOptions, param: DampingParam) {
    let model =
        DispersionModel::with_options(structure.clone(), get_default_parameters(), options).unwrap();
    let analytic = model.get_dispersion(&param, true).unwrap().gradient.unwrap();
    let numeric = numerical_gradient(&structure, options, &param, 1e-5);

    for (atom, (a, n)) in analytic.iter().zip(&numeric).enumerate() {
        for d in 0..3 {
            assert!(
                (a[d] - n[d]).abs() < 1e-8,
                "atom {} component {}: analytic {:.3e}, numeric {:.3e}",
                atom,
                d,
                a[d],
                n[d]
            );
        }
    }
}

#[test]
fn test_d4_gradient_matches_finite_differences() {
    check_gradient(
        mindless_pbe(),
        ModelOptions::default(),
        DampingParam::from_method(Method::Pbe),
    );
}

#[test]
fn test_d4s_gradient_matches_finite_differences() {
    let options = ModelOptions {
        kind: ModelKind::D4S,
        ..ModelOptions::default()
    };
    check_gradient(mindless_blyp(), options, DampingParam::from_method(Method::Blyp));
}

#[test]
fn test_gradient_of_charged_system_matches_finite_differences() {
    check_gradient(
        mindless_blyp().with_charge(1.0),
        ModelOptions::default(),
        DampingParam::from_method(Method::Pw6b95),
    );
}

#[test]
fn test_gradient_sums_to_zero() {
    let model = DispersionModel::new(mindless_blyp(), get_default_parameters()).unwrap();
    let gradient = model
        .get_dispersion(&DampingParam::from_method(Method::B3lyp), true)
        .unwrap()
        .gradient
        .unwrap();
    for d in 0..3 {
        let total: f64 = gradient.iter().map(|g| g[d]).sum();
        assert_relative_eq!(total, 0.0, epsilon = 1e-10);
    }
}
