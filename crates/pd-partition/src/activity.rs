//! Multicomponent regular-solution activity coefficients for Fe-rich alloys.
//!
//! Wagner-type interaction-parameter expansion in the form that stays
//! thermodynamically consistent at finite solute concentrations (Ma, 2001).
//! Index 0 of every vector is the solvent; the remaining entries are solutes.
//! Products are expanded so that `x = 0` never divides.

use nalgebra::{DMatrix, DVector};

/// ln gamma for every alloy component.
///
/// `x` are the alloy fractions, `eps` the epsilon matrix and `ln_gamma0` the
/// infinite-dilution terms, both already scaled to the working temperature.
pub fn ln_activity_coefficients(
    x: &DVector<f64>,
    eps: &DMatrix<f64>,
    ln_gamma0: &DVector<f64>,
) -> DVector<f64> {
    let n = x.len();
    let mut ln_gamma = DVector::zeros(n);
    if n == 0 {
        return ln_gamma;
    }

    let ln_solvent = ln_solvent_coefficient(x, eps);
    ln_gamma[0] = ln_solvent;

    for i in 1..n {
        let xi = x[i];
        let one_minus_xi = 1.0 - xi;
        let mut value = ln_solvent + ln_gamma0[i] - eps[(i, i)] * (-xi).ln_1p();

        for k in 1..n {
            if k == i {
                continue;
            }
            let xk = x[k];
            let e = eps[(i, k)];
            if e == 0.0 {
                continue;
            }
            value -= e * (xk + (-xk).ln_1p() - xk / one_minus_xi);
            value += e
                * xk
                * xk
                * xi
                * (1.0 / one_minus_xi + 1.0 / (1.0 - xk) + xi / (2.0 * one_minus_xi * one_minus_xi)
                    - 1.0);
        }
        ln_gamma[i] = value;
    }

    ln_gamma
}

fn ln_solvent_coefficient(x: &DVector<f64>, eps: &DMatrix<f64>) -> f64 {
    let n = x.len();
    let mut value = 0.0;

    for i in 1..n {
        value += eps[(i, i)] * (x[i] + (-x[i]).ln_1p());
    }

    for j in 1..n {
        for k in (j + 1)..n {
            let e = eps[(j, k)];
            if e == 0.0 {
                continue;
            }
            let (xj, xk) = (x[j], x[k]);
            value -= e * (xj * xk + xk * (-xj).ln_1p() + xj * (-xk).ln_1p());
            value += 0.5
                * e
                * xj
                * xj
                * xk
                * xk
                * (1.0 / (1.0 - xj) + 1.0 / (1.0 - xk) - 1.0);
        }
    }

    for i in 1..n {
        let xi = x[i];
        let one_minus_xi = 1.0 - xi;
        for k in 1..n {
            if k == i {
                continue;
            }
            let e = eps[(i, k)];
            if e == 0.0 {
                continue;
            }
            let xk = x[k];
            value += e * xi * (xk + (-xk).ln_1p() - xk / one_minus_xi);
            value -= e
                * xi
                * xi
                * xk
                * xk
                * (1.0 / one_minus_xi + 1.0 / (1.0 - xk) + xi / (2.0 * one_minus_xi * one_minus_xi)
                    - 1.0);
        }
    }

    value
}
