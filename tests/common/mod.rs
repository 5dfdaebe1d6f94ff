#![allow(dead_code)]

use dftd4::{DampingParam, DispersionModel, ModelOptions, Structure, get_default_parameters};

pub fn mindless_blyp() -> Structure {
    Structure::new(
        vec![1, 1, 6, 5, 1, 15, 8, 17, 13, 15, 5, 1, 9, 15, 1, 15],
        vec![
            [2.79274810283778, 3.82998228828316, -2.79287054959216],
            [-1.43447454186833, 0.43418729987882, 5.53854345129809],
            [-3.26268343665218, -2.50644032426151, -1.56631149351046],
            [2.14548759959147, -0.88798018953965, -2.24592534506187],
            [-4.30233097423181, -3.93631518670031, -0.48930754109119],
            [0.06107643564880, -3.82467931731366, -2.22333344469482],
            [0.41168550401858, 0.58105573172764, 5.56854609916143],
            [4.41363836635653, 3.92515871809283, 2.57961724984000],
            [1.33707758998700, 1.40194471661647, 1.97530004949523],
            [3.08342709834868, 1.72520024666801, -4.42666116106828],
            [-3.02346932078505, 0.04438199934191, -0.27636197425010],
            [1.11508390868455, -0.97617412809198, 6.25462847718180],
            [0.61938955433011, 2.17903547389232, -6.21279842416963],
            [-2.67491681346835, 3.00175899761859, 1.05038813614845],
            [-4.13181080289514, -2.34226739863660, -3.44356159392859],
            [2.85007173009739, -2.64884892757600, 0.71010806424206],
        ],
        None,
    )
    .unwrap()
}

pub fn mindless_pbe() -> Structure {
    Structure::new(
        vec![1, 9, 15, 13, 1, 1, 13, 5, 3, 15, 8, 1, 1, 5, 16, 1],
        vec![
            [-2.14132037405479, -1.34402701877044, -2.32492500904728],
            [4.46671289205392, -2.04800110524830, 0.44422406067087],
            [-4.92212517643478, -1.73734240529793, 0.96890323821450],
            [-1.30966093045696, -0.52977363497805, 3.44453452239668],
            [-4.34208759006189, -4.30470270977329, 0.39887431726215],
            [0.61788392767516, 2.62484136683297, -3.28228926932647],
            [4.23562873444840, -1.68839322682951, -3.53824299552792],
            [2.23130060612446, 1.93579813100155, -1.80384647554323],
            [-2.32285463652832, 2.90603947535842, -1.39684847191937],
            [2.34557941578250, 2.86074312333371, 1.82827238641666],
            [-3.66431367659153, -0.42910188232667, -1.81957402856634],
            [-0.34927881505446, -1.75988134003940, 5.98017466326572],
            [0.29500802281217, -2.00226104143537, 0.53023447931897],
            [2.10449364205058, -0.56741404446633, 0.30975625014335],
            [-1.59355304432499, 3.69176153150419, 2.87878226787916],
            [4.34858700256050, 2.39171478113440, -2.61802993563738],
        ],
        None,
    )
    .unwrap()
}

/// Crown-shaped S8 ring; atom `i` is bonded to `i ± 1 (mod 8)`.
pub fn sulfur_ring() -> Structure {
    let (a, b, c) = (4.15128787379191, 1.71951973863958, 0.93066267097296);
    Structure::new(
        vec![16; 8],
        vec![
            [-a, b, -c],
            [-a, -b, c],
            [-b, -a, -c],
            [b, -a, c],
            [a, -b, -c],
            [a, b, c],
            [b, a, -c],
            [-b, a, c],
        ],
        None,
    )
    .unwrap()
}

/// Cubic ammonia crystal with four molecules per cell.
pub fn ammonia_crystal() -> Structure {
    let a = 9.69523775911749;
    let mut numbers = vec![7; 4];
    numbers.extend([1; 12]);
    Structure::new(
        numbers,
        vec![
            [1.97420621099560, 1.97415497783241, 1.97424596974304],
            [6.82182427659395, 2.87346383480995, 7.72099517560089],
            [7.72104957181201, 6.82177051521773, 2.87336561318016],
            [2.87343220660781, 7.72108897828386, 6.82187093171878],
            [3.51863272100286, 2.63865333484548, 1.00652979981286],
            [2.63877594964754, 1.00647313885594, 3.51882748086447],
            [1.00639728563189, 3.51850454450845, 2.63869202592387],
            [8.36624975982697, 2.20896711017229, 8.68870955681018],
            [7.48639684558259, 3.84114715917956, 6.17640982573725],
            [5.85401675167715, 1.32911569888797, 7.05654606696031],
            [7.05646299938990, 5.85409590282274, 1.32879923864813],
            [8.68882633853582, 8.36611541129785, 2.20894120662207],
            [3.84121223226912, 6.17673669892998, 7.48629723649480],
            [1.32897854262127, 7.05658604099926, 5.85414031368096],
            [2.20884896069885, 8.68875820985799, 8.36643568423387],
            [6.17659142004652, 7.48627051643848, 3.84109594690835],
        ],
        Some([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]),
    )
    .unwrap()
}

/// Hydrogen chloride in a small oblique cell.
pub fn hydrogen_chloride_crystal() -> Structure {
    Structure::new(
        vec![1, 17],
        vec![[0.3, 0.2, 0.1], [2.6, 0.9, 0.4]],
        Some([[9.0, 0.0, 0.0], [1.5, 8.5, 0.0], [0.7, -0.4, 9.5]]),
    )
    .unwrap()
}

pub fn energy(structure: &Structure, options: ModelOptions, param: &DampingParam) -> f64 {
    DispersionModel::with_options(structure.clone(), get_default_parameters(), options)
        .unwrap()
        .get_dispersion(param, false)
        .unwrap()
        .energy
}

/// Central finite-difference gradient with respect to the Cartesian positions.
pub fn numerical_gradient(
    structure: &Structure,
    options: ModelOptions,
    param: &DampingParam,
    step: f64,
) -> Vec<[f64; 3]> {
    let mut gradient = vec![[0.0; 3]; structure.len()];
    for (atom, g) in gradient.iter_mut().enumerate() {
        for d in 0..3 {
            let mut moved = structure.clone();
            let mut positions = structure.positions().to_vec();
            positions[atom][d] += step;
            moved.update(positions.clone(), None).unwrap();
            let plus = energy(&moved, options, param);
            positions[atom][d] -= 2.0 * step;
            moved.update(positions, None).unwrap();
            let minus = energy(&moved, options, param);
            g[d] = (plus - minus) / (2.0 * step);
        }
    }
    gradient
}

/// Central finite-difference derivative with respect to a homogeneous strain
/// applied to both the positions and the lattice.
pub fn numerical_virial(
    structure: &Structure,
    options: ModelOptions,
    param: &DampingParam,
    step: f64,
) -> [[f64; 3]; 3] {
    let lattice = *structure.lattice().unwrap();
    let mut virial = [[0.0; 3]; 3];
    for a in 0..3 {
        for b in 0..3 {
            let strained = |eps: f64| {
                let deform = |v: [f64; 3]| {
                    let mut out = v;
                    out[a] += eps * v[b];
                    out
                };
                let positions = structure.positions().iter().map(|&p| deform(p)).collect();
                let cell = [deform(lattice[0]), deform(lattice[1]), deform(lattice[2])];
                let mut moved = structure.clone();
                moved.update(positions, Some(cell)).unwrap();
                energy(&moved, options, param)
            };
            virial[a][b] = (strained(step) - strained(-step)) / (2.0 * step);
        }
    }
    virial
}
