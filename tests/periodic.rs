mod common;

use approx::assert_relative_eq;
use common::{
    ammonia_crystal, energy, hydrogen_chloride_crystal, numerical_gradient, numerical_virial,
};
use dftd4::math::linalg::inverse;
use dftd4::{
    DampingParam, DispersionModel, EeqOptions, Method, ModelOptions, RealspaceCutoff, Structure,
    get_default_parameters,
};

fn assert_all_close(values: &[f64], tolerance: f64) {
    for value in values {
        assert!(
            (value - values[0]).abs() < tolerance,
            "{} differs from {} by more than {}",
            value,
            values[0],
            tolerance
        );
    }
}

#[test]
fn test_equivalent_atoms_of_ammonia_crystal_agree() {
    let model = DispersionModel::new(ammonia_crystal(), get_default_parameters()).unwrap();
    let properties = model.get_properties().unwrap();

    let (nitrogen_cn, hydrogen_cn) = properties.coordination_numbers.split_at(4);
    let (nitrogen_q, hydrogen_q) = properties.partial_charges.split_at(4);
    let (nitrogen_alpha, hydrogen_alpha) = properties.polarizabilities.split_at(4);

    assert_all_close(nitrogen_cn, 1e-4);
    assert_all_close(hydrogen_cn, 1e-4);
    assert_all_close(nitrogen_q, 1e-4);
    assert_all_close(hydrogen_q, 1e-4);
    assert_all_close(nitrogen_alpha, 1e-3);
    assert_all_close(hydrogen_alpha, 1e-3);

    assert!(nitrogen_cn[0] > 2.0 && nitrogen_cn[0] < 3.5);
    assert!(hydrogen_cn[0] > 0.5 && hydrogen_cn[0] < 1.2);
    assert!(nitrogen_q[0] < 0.0 && hydrogen_q[0] > 0.0);
    assert_relative_eq!(properties.partial_charges.iter().sum::<f64>(), 0.0, epsilon = 1e-7);
    assert!(nitrogen_alpha[0] > hydrogen_alpha[0]);
}

#[test]
fn test_ammonia_crystal_reference_properties() {
    let model = DispersionModel::new(ammonia_crystal(), get_default_parameters()).unwrap();
    let properties = model.get_properties().unwrap();

    let cn = [
        2.5775156287150218, 2.5775155620078536, 2.5775157938667150, 2.5775157704485387,
        0.8591731475439074, 0.8591680526841657, 0.8591744284869478, 0.8591732359038715,
        0.8591678667769283, 0.8591744593270527, 0.8591684383407867, 0.8591754863625011,
        0.8591751690053771, 0.8591719636497469, 0.8591686377934131, 0.8591718691634261,
    ];
    let charges = [
        -0.86974543285813199, -0.86974501326130316, -0.86974658178316333, -0.86974643466661739,
        0.28992010784471012, 0.28989847135893759, 0.28992738637932841, 0.28992042841052362,
        0.28989746859382759, 0.28992753735979965, 0.28990032127437559, 0.28993196014690176,
        0.28993044356403513, 0.28991421277784613, 0.28990119160907674, 0.28991393324985348,
    ];
    for (value, expected) in properties.coordination_numbers.iter().zip(cn) {
        assert_relative_eq!(*value, expected, epsilon = 1e-7);
    }
    for (value, expected) in properties.partial_charges.iter().zip(charges) {
        assert_relative_eq!(*value, expected, epsilon = 1e-5);
    }
}

#[test]
fn test_ammonia_charges_are_converged_in_the_ewald_tolerance() {
    let tight = ModelOptions {
        eeq: EeqOptions {
            ewald_tolerance: 1e-14,
            ..EeqOptions::default()
        },
        ..ModelOptions::default()
    };
    let default = DispersionModel::new(ammonia_crystal(), get_default_parameters())
        .unwrap()
        .get_properties()
        .unwrap();
    let converged = DispersionModel::with_options(ammonia_crystal(), get_default_parameters(), tight)
        .unwrap()
        .get_properties()
        .unwrap();
    for (q, reference) in default.partial_charges.iter().zip(&converged.partial_charges) {
        assert_relative_eq!(*q, *reference, epsilon = 1e-8);
    }
}

#[test]
fn test_periodic_properties_are_reproducible() {
    let model = DispersionModel::new(ammonia_crystal(), get_default_parameters()).unwrap();
    assert_eq!(model.get_properties().unwrap(), model.get_properties().unwrap());
}

#[test]
fn test_periodic_result_carries_strain_derivatives() {
    let structure = hydrogen_chloride_crystal();
    let model = DispersionModel::new(structure.clone(), get_default_parameters()).unwrap();
    let result = model
        .get_dispersion(&DampingParam::from_method(Method::Pbe), true)
        .unwrap();

    let virial = result.virial.unwrap();
    let lattice_gradient = result.lattice_gradient.unwrap();
    let gradient = result.gradient.unwrap();
    assert!(result.energy < 0.0);

    // The virial of a rotationally invariant energy is symmetric.
    for a in 0..3 {
        for b in 0..3 {
            assert_relative_eq!(virial[a][b], virial[b][a], epsilon = 1e-10);
        }
    }

    // Σ_k L_ka G_kb recovers the virial.
    let lattice = structure.lattice().unwrap();
    for a in 0..3 {
        for b in 0..3 {
            let recovered: f64 = (0..3).map(|k| lattice[k][a] * lattice_gradient[k][b]).sum();
            assert_relative_eq!(recovered, virial[a][b], epsilon = 1e-10);
        }
    }

    for d in 0..3 {
        let total: f64 = gradient.iter().map(|g| g[d]).sum();
        assert_relative_eq!(total, 0.0, epsilon = 1e-10);
    }
}

#[test]
fn test_periodic_gradient_matches_finite_differences() {
    let structure = hydrogen_chloride_crystal();
    let options = ModelOptions::default();
    let param = DampingParam::from_method(Method::Pbe);
    let analytic = DispersionModel::new(structure.clone(), get_default_parameters())
        .unwrap()
        .get_dispersion(&param, true)
        .unwrap()
        .gradient
        .unwrap();
    let numeric = numerical_gradient(&structure, options, &param, 1e-5);
    for (a, n) in analytic.iter().zip(&numeric) {
        for d in 0..3 {
            assert_relative_eq!(a[d], n[d], epsilon = 1e-7);
        }
    }
}

#[test]
fn test_virial_matches_strain_finite_differences() {
    // A long two-body cutoff keeps the energy steps of pairs crossing the
    // cutoff sphere well below the tolerance.
    let options = ModelOptions {
        cutoff: RealspaceCutoff {
            disp2: 150.0,
            ..RealspaceCutoff::default()
        },
        ..ModelOptions::default()
    };
    let param = DampingParam {
        s9: 0.0,
        ..DampingParam::from_method(Method::Tpss)
    };
    let structure = hydrogen_chloride_crystal();
    let model =
        DispersionModel::with_options(structure.clone(), get_default_parameters(), options).unwrap();
    let virial = model.get_dispersion(&param, true).unwrap().virial.unwrap();
    let numeric = numerical_virial(&structure, options, &param, 1e-5);
    for a in 0..3 {
        for b in 0..3 {
            assert_relative_eq!(virial[a][b], numeric[a][b], epsilon = 1e-5);
        }
    }
}

#[test]
fn test_lattice_gradient_matches_finite_differences() {
    let options = ModelOptions {
        cutoff: RealspaceCutoff {
            disp2: 150.0,
            ..RealspaceCutoff::default()
        },
        ..ModelOptions::default()
    };
    let param = DampingParam {
        s9: 0.0,
        ..DampingParam::from_method(Method::Pbe)
    };
    let structure = hydrogen_chloride_crystal();
    let lattice = *structure.lattice().unwrap();
    let analytic = DispersionModel::with_options(structure.clone(), get_default_parameters(), options)
        .unwrap()
        .get_dispersion(&param, true)
        .unwrap()
        .lattice_gradient
        .unwrap();

    // Fractional coordinates stay fixed while one lattice component moves.
    let inv = inverse(&lattice).unwrap();
    let fractional: Vec<[f64; 3]> = structure
        .positions()
        .iter()
        .map(|p| std::array::from_fn(|k| (0..3).map(|a| p[a] * inv[a][k]).sum()))
        .collect();
    let step = 1e-5;
    for k in 0..3 {
        for b in 0..3 {
            let displaced = |delta: f64| {
                let mut cell = lattice;
                cell[k][b] += delta;
                let positions = fractional
                    .iter()
                    .map(|f| std::array::from_fn(|a| (0..3).map(|m| f[m] * cell[m][a]).sum()))
                    .collect();
                let moved =
                    Structure::new(structure.numbers().to_vec(), positions, Some(cell)).unwrap();
                energy(&moved, options, &param)
            };
            let numeric = (displaced(step) - displaced(-step)) / (2.0 * step);
            assert_relative_eq!(analytic[k][b], numeric, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_results_do_not_depend_on_the_stored_image_of_an_atom() {
    let structure = hydrogen_chloride_crystal();
    let lattice = *structure.lattice().unwrap();
    let mut positions = structure.positions().to_vec();
    for d in 0..3 {
        positions[1][d] += 10.0 * lattice[0][d];
        positions[0][d] += -3.0 * lattice[1][d] + 2.0 * lattice[2][d];
    }
    let shifted = Structure::new(structure.numbers().to_vec(), positions, Some(lattice)).unwrap();

    let param = DampingParam::from_method(Method::Pbe);
    let reference = DispersionModel::new(structure, get_default_parameters()).unwrap();
    let moved = DispersionModel::new(shifted, get_default_parameters()).unwrap();
    let expected = reference.get_dispersion(&param, true).unwrap();
    let actual = moved.get_dispersion(&param, true).unwrap();

    assert_relative_eq!(actual.energy, expected.energy, max_relative = 1e-10);
    for (a, e) in actual.gradient.unwrap().iter().zip(&expected.gradient.unwrap()) {
        for d in 0..3 {
            assert_relative_eq!(a[d], e[d], epsilon = 1e-10);
        }
    }
    let (virial, expected_virial) = (actual.virial.unwrap(), expected.virial.unwrap());
    for a in 0..3 {
        for b in 0..3 {
            assert_relative_eq!(virial[a][b], expected_virial[a][b], epsilon = 1e-10);
        }
    }

    let properties = moved.get_properties().unwrap();
    let expected_properties = reference.get_properties().unwrap();
    for (q, e) in properties.partial_charges.iter().zip(&expected_properties.partial_charges) {
        assert_relative_eq!(*q, *e, epsilon = 1e-10);
    }
}
