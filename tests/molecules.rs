mod common;

use approx::assert_relative_eq;
use common::{mindless_blyp, mindless_pbe};
use dftd4::{
    DampingParam, DispersionModel, Method, ModelKind, ModelOptions, Structure,
    get_default_parameters,
};

fn rotate(structure: &Structure) -> Structure {
    let (s, c) = (0.7f64.sin(), 0.7f64.cos());
    let (s2, c2) = (1.3f64.sin(), 1.3f64.cos());
    let positions = structure
        .positions()
        .iter()
        .map(|p| {
            // Rotation about z followed by a rotation about x.
            let q = [c * p[0] - s * p[1], s * p[0] + c * p[1], p[2]];
            [q[0], c2 * q[1] - s2 * q[2], s2 * q[1] + c2 * q[2]]
        })
        .collect();
    Structure::new(structure.numbers().to_vec(), positions, None).unwrap()
}

#[test]
fn test_gradient_request_does_not_change_the_energy() {
    for (structure, method) in [(mindless_blyp(), Method::Blyp), (mindless_pbe(), Method::Pbe)] {
        let model = DispersionModel::new(structure, get_default_parameters()).unwrap();
        let param = DampingParam::from_method(method);

        let plain = model.get_dispersion(&param, false).unwrap();
        let full = model.get_dispersion(&param, true).unwrap();

        println!("{}-D4 energy: {:.12}", method, plain.energy);
        assert!(plain.energy.is_finite());
        assert!(plain.energy < 0.0);
        assert!(plain.gradient.is_none());
        assert_eq!(plain.energy, full.energy);
        assert_eq!(full.gradient.as_ref().map(Vec::len), Some(16));
        assert!(full.virial.is_none());
        assert!(full.lattice_gradient.is_none());
    }
}

#[test]
fn test_results_are_reproducible() {
    let model = DispersionModel::new(mindless_pbe(), get_default_parameters()).unwrap();
    let param = DampingParam::from_method(Method::Pbe);
    let first = model.get_dispersion(&param, true).unwrap();
    let second = model.get_dispersion(&param, true).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_energy_is_invariant_under_rigid_motion() {
    let structure = mindless_blyp();
    let param = DampingParam::from_method(Method::Blyp);
    let reference = DispersionModel::new(structure.clone(), get_default_parameters())
        .unwrap()
        .get_dispersion(&param, false)
        .unwrap()
        .energy;

    let rotated = DispersionModel::new(rotate(&structure), get_default_parameters())
        .unwrap()
        .get_dispersion(&param, false)
        .unwrap()
        .energy;
    assert_relative_eq!(rotated, reference, max_relative = 1e-10);

    let shifted_positions = structure
        .positions()
        .iter()
        .map(|p| [p[0] + 3.1, p[1] - 7.4, p[2] + 0.25])
        .collect();
    let shifted = Structure::new(structure.numbers().to_vec(), shifted_positions, None).unwrap();
    let translated = DispersionModel::new(shifted, get_default_parameters())
        .unwrap()
        .get_dispersion(&param, false)
        .unwrap()
        .energy;
    assert_relative_eq!(translated, reference, max_relative = 1e-10);
}

#[test]
fn test_energy_is_invariant_under_relabeling() {
    let structure = mindless_pbe();
    let param = DampingParam::from_method(Method::Pbe);
    let n = structure.len();
    let order: Vec<usize> = (0..n).rev().collect();
    let permuted = Structure::new(
        order.iter().map(|&i| structure.numbers()[i]).collect(),
        order.iter().map(|&i| structure.positions()[i]).collect(),
        None,
    )
    .unwrap();

    let model = DispersionModel::new(structure, get_default_parameters()).unwrap();
    let permuted_model = DispersionModel::new(permuted, get_default_parameters()).unwrap();
    let reference = model.get_dispersion(&param, true).unwrap();
    let relabeled = permuted_model.get_dispersion(&param, true).unwrap();

    assert_relative_eq!(relabeled.energy, reference.energy, max_relative = 1e-10);
    let gradient = reference.gradient.unwrap();
    let permuted_gradient = relabeled.gradient.unwrap();
    for (new_index, &old_index) in order.iter().enumerate() {
        for d in 0..3 {
            assert_relative_eq!(
                permuted_gradient[new_index][d],
                gradient[old_index][d],
                epsilon = 1e-12,
                max_relative = 1e-8
            );
        }
    }
}

#[test]
fn test_three_body_term_is_switched_by_s9() {
    let model = DispersionModel::new(mindless_blyp(), get_default_parameters()).unwrap();
    let with_atm = DampingParam::from_method(Method::Blyp);
    let without_atm = DampingParam { s9: 0.0, ..with_atm };

    let e_with = model.get_dispersion(&with_atm, false).unwrap().energy;
    let e_without = model.get_dispersion(&without_atm, false).unwrap().energy;
    let non_additive: f64 = model
        .get_pairwise_dispersion(&with_atm)
        .unwrap()
        .non_additive
        .iter()
        .flatten()
        .sum();

    assert_ne!(e_with, e_without);
    assert_relative_eq!(e_with - e_without, non_additive, epsilon = 1e-12, max_relative = 1e-8);
}

#[test]
fn test_smooth_model_differs_from_d4() {
    let param = DampingParam::from_method(Method::Tpss);
    let d4 = DispersionModel::new(mindless_blyp(), get_default_parameters())
        .unwrap()
        .get_dispersion(&param, false)
        .unwrap()
        .energy;

    let options = ModelOptions {
        kind: ModelKind::D4S,
        ..ModelOptions::default()
    };
    let model = DispersionModel::with_options(mindless_blyp(), get_default_parameters(), options)
        .unwrap();
    let plain = model.get_dispersion(&param, false).unwrap();
    let full = model.get_dispersion(&param, true).unwrap();

    assert!(plain.energy < 0.0);
    assert_eq!(plain.energy, full.energy);
    assert_ne!(plain.energy, d4);
    assert_relative_eq!(plain.energy, d4, max_relative = 0.2);
}

#[test]
fn test_composite_method_without_dipole_quadrupole_term() {
    let model = DispersionModel::new(mindless_pbe(), get_default_parameters()).unwrap();
    let param = DampingParam::from_method("r2SCAN-3c".parse().unwrap());
    assert_eq!(param.s8, 0.0);
    let energy = model.get_dispersion(&param, false).unwrap().energy;
    assert!(energy < 0.0);
}

#[test]
fn test_charges_follow_the_total_charge() {
    let structure = mindless_pbe().with_charge(-1.0);
    let model = DispersionModel::new(structure, get_default_parameters()).unwrap();
    let properties = model.get_properties().unwrap();
    let total: f64 = properties.partial_charges.iter().sum();
    assert_relative_eq!(total, -1.0, epsilon = 1e-7);
    assert!(properties.coordination_numbers.iter().all(|cn| cn.is_finite() && *cn >= 0.0));
}
