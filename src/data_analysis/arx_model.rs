// src/data_analysis/arx_model.rs

use ndarray::{Array1, Array2};

use crate::constants::{DEGENERATE_STEP_INDEX, STEP_RESPONSE_LEN};

/// Model orders for ARX identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArxOrders {
    /// Order of the autoregressive part.
    pub na: usize,
    /// Order of the exogenous input part.
    pub nb: usize,
    /// Input delay in samples.
    pub nk: usize,
}

impl Default for ArxOrders {
    fn default() -> Self {
        Self { na: 4, nb: 4, nk: 1 }
    }
}

/// Identified discrete-time model A(q)y(t) = B(q)u(t-nk), together with its
/// free-run prediction, fit quality, and synthetic unit-step response.
#[derive(Debug, Clone)]
pub struct ArxModel {
    pub orders: ArxOrders,
    /// Estimated parameter vector theta, AR coefficients first.
    pub parameters: Vec<f64>,
    /// A polynomial [1, a1, .., a_na].
    pub a_poly: Vec<f64>,
    /// B polynomial [b1, .., b_nb].
    pub b_poly: Vec<f64>,
    /// Free-run model output, seeded with the first na true output samples.
    pub predicted: Vec<f64>,
    /// NRMSE-based fit percentage. 100 is a perfect fit; can be negative.
    pub fit_percent: f64,
    /// Simulated response to a unit step input.
    pub step_response: Vec<f64>,
}

/// Identification outcome. A degenerate result carries a placeholder model
/// so downstream consumers always have arrays to work with, but the variant
/// keeps it from being mistaken for a meaningful fit.
#[derive(Debug, Clone)]
pub enum ArxFit {
    Fitted(ArxModel),
    Degenerate(ArxModel),
}

impl ArxFit {
    pub fn model(&self) -> &ArxModel {
        match self {
            ArxFit::Fitted(model) | ArxFit::Degenerate(model) => model,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, ArxFit::Degenerate(_))
    }
}

/// Identifies an ARX model from setpoint (input) and measured rate (output).
///
/// Never fails: inputs too short for the requested orders, singular
/// regressions, and unstable recursions all produce `ArxFit::Degenerate`
/// with the placeholder model instead of an error.
pub fn identify_arx(setpoint: &[f64], measured: &[f64], orders: &ArxOrders) -> ArxFit {
    let n = measured.len();
    let (na, nb, nk) = (orders.na, orders.nb, orders.nk);

    if n != setpoint.len() || n <= na + nb {
        return ArxFit::Degenerate(degenerate_model(orders, n));
    }

    // Regression matrix: negated output lags 1..na, then input lags
    // starting at the delay nk. Out-of-range lags stay zero.
    let rows = n - na;
    let mut phi = Array2::<f64>::zeros((rows, na + nb));
    for i in 0..rows {
        for j in 0..na {
            let idx = (i + na) as isize - 1 - j as isize;
            if idx >= 0 {
                phi[[i, j]] = -measured[idx as usize];
            }
        }
        for j in 0..nb {
            let idx = (i + na) as isize - nk as isize - j as isize;
            if idx >= 0 && (idx as usize) < n {
                phi[[i, na + j]] = setpoint[idx as usize];
            }
        }
    }
    let targets = Array1::from_iter(measured[na..].iter().copied());

    let theta = solve_least_squares(&phi, &targets);
    if theta.iter().any(|v| !v.is_finite()) {
        return ArxFit::Degenerate(degenerate_model(orders, n));
    }

    let a_poly: Vec<f64> = std::iter::once(1.0)
        .chain(theta.iter().take(na).copied())
        .collect();
    let b_poly: Vec<f64> = theta.iter().skip(na).copied().collect();

    let predicted = free_run_prediction(setpoint, measured, &theta, orders);
    if predicted.iter().any(|v| !v.is_finite()) {
        return ArxFit::Degenerate(degenerate_model(orders, n));
    }

    let fit_percent = fit_percentage(measured, &predicted);
    if !fit_percent.is_finite() {
        return ArxFit::Degenerate(degenerate_model(orders, n));
    }

    let step_response = simulate_step_response(&a_poly, &b_poly, orders);
    if step_response.iter().any(|v| !v.is_finite()) {
        return ArxFit::Degenerate(degenerate_model(orders, n));
    }

    ArxFit::Fitted(ArxModel {
        orders: *orders,
        parameters: theta.to_vec(),
        a_poly,
        b_poly,
        predicted,
        fit_percent,
        step_response,
    })
}

/// Placeholder result used whenever identification cannot produce a
/// trustworthy model: zero parameters, zero fit, and a canned unit step
/// so step-response consumers still have a plausible shape.
fn degenerate_model(orders: &ArxOrders, n_samples: usize) -> ArxModel {
    let mut a_poly = vec![0.0; orders.na + 1];
    a_poly[0] = 1.0;

    let step_len = n_samples.min(STEP_RESPONSE_LEN);
    let mut step_response = vec![0.0; step_len];
    for value in step_response.iter_mut().skip(DEGENERATE_STEP_INDEX) {
        *value = 1.0;
    }

    ArxModel {
        orders: *orders,
        parameters: vec![0.0; orders.na + orders.nb],
        a_poly,
        b_poly: vec![0.0; orders.nb],
        predicted: vec![0.0; n_samples],
        fit_percent: 0.0,
        step_response,
    }
}

/// Free-run simulation of the identified model: the recursion feeds on its
/// own past outputs (not the measurements), seeded with the first na true
/// samples, so prediction error compounds honestly.
fn free_run_prediction(
    setpoint: &[f64],
    measured: &[f64],
    theta: &Array1<f64>,
    orders: &ArxOrders,
) -> Vec<f64> {
    let n = measured.len();
    let (na, nb, nk) = (orders.na, orders.nb, orders.nk);

    let mut predicted = vec![0.0; n];
    predicted[..na].copy_from_slice(&measured[..na]);

    for i in na..n {
        let mut acc = 0.0;
        for j in 0..na {
            acc -= theta[j] * predicted[i - j - 1];
        }
        for j in 0..nb {
            let idx = i as isize - j as isize - nk as isize;
            if idx >= 0 {
                acc += theta[na + j] * setpoint[idx as usize];
            }
        }
        predicted[i] = acc;
    }

    predicted
}

/// NRMSE fit: 100 * (1 - ||y - y_hat|| / ||y - mean(y)||). Non-finite when
/// the output has zero variance; callers treat that as degenerate.
fn fit_percentage(measured: &[f64], predicted: &[f64]) -> f64 {
    let mean = measured.iter().sum::<f64>() / measured.len() as f64;

    let residual_norm = measured
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p) * (y - p))
        .sum::<f64>()
        .sqrt();
    let deviation_norm = measured
        .iter()
        .map(|y| (y - mean) * (y - mean))
        .sum::<f64>()
        .sqrt();

    100.0 * (1.0 - residual_norm / deviation_norm)
}

/// Simulates the model against a unit step input. The first na samples are
/// held at zero as initial conditions.
fn simulate_step_response(a_poly: &[f64], b_poly: &[f64], orders: &ArxOrders) -> Vec<f64> {
    let (na, nb, nk) = (orders.na, orders.nb, orders.nk);

    let mut output = vec![0.0; STEP_RESPONSE_LEN];
    for i in na..STEP_RESPONSE_LEN {
        let mut acc = 0.0;
        for j in 0..na {
            acc -= a_poly[j + 1] * output[i - j - 1];
        }
        for j in 0..nb {
            let idx = i as isize - j as isize - nk as isize;
            if idx >= 0 && (idx as usize) < STEP_RESPONSE_LEN {
                acc += b_poly[j];
            }
        }
        output[i] = acc;
    }

    output
}

/// Least-squares solve of an overdetermined system through the normal
/// equations. Rank deficiency is tolerated: skipped pivots leave their
/// components at zero instead of failing.
fn solve_least_squares(phi: &Array2<f64>, targets: &Array1<f64>) -> Array1<f64> {
    let ata = phi.t().dot(phi);
    let atb = phi.t().dot(targets);
    solve_linear_system(&ata, &atb)
}

/// Gaussian elimination with partial pivoting on the augmented matrix.
///
/// Pivots below a scale-relative tolerance are skipped, which zeroes the
/// corresponding solution component. For the positive semi-definite normal
/// equations this turns redundant regressor directions into zeros instead
/// of amplifying cancellation residue.
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut aug = Array2::<f64>::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    // The largest entry of a PSD matrix sits on its diagonal.
    let scale = (0..n).fold(0.0_f64, |acc, i| acc.max(a[[i, i]].abs()));
    let tolerance = scale * 1e-12;

    // Forward elimination
    for col in 0..n {
        let mut max_val = aug[[col, col]].abs();
        let mut max_row = col;
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }
        if max_val <= tolerance {
            continue;
        }
        if max_row != col {
            for j in 0..=n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[max_row, j]];
                aug[[max_row, j]] = tmp;
            }
        }

        let pivot = aug[[col, col]];
        for row in (col + 1)..n {
            let factor = aug[[row, col]] / pivot;
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    // Back substitution
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        if aug[[i, i]].abs() > tolerance {
            x[i] = sum / aug[[i, i]];
        }
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 30) as f64) - 1.0
            })
            .collect()
    }

    #[test]
    fn test_identity_system_fit_approaches_100_percent() {
        // Two sinusoids satisfy a fourth-order linear recurrence exactly, so
        // measured == setpoint is representable by the AR part alone.
        let n = 600;
        let signal: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / 500.0;
                (2.0 * std::f64::consts::PI * 7.0 * t).sin()
                    + 0.5 * (2.0 * std::f64::consts::PI * 13.0 * t).sin()
            })
            .collect();

        let fit = identify_arx(&signal, &signal, &ArxOrders::default());
        assert!(!fit.is_degenerate());
        assert!(
            fit.model().fit_percent > 99.0,
            "identity fit was {:.2}%",
            fit.model().fit_percent
        );
        assert_eq!(fit.model().predicted.len(), n);
    }

    #[test]
    fn test_too_few_samples_returns_degenerate() {
        let orders = ArxOrders::default();
        let u = vec![1.0; orders.na + orders.nb];
        let y = vec![2.0; orders.na + orders.nb];

        let fit = identify_arx(&u, &y, &orders);
        assert!(fit.is_degenerate());

        let model = fit.model();
        assert_eq!(model.parameters, vec![0.0; 8]);
        assert_eq!(model.a_poly, vec![1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(model.b_poly, vec![0.0; 4]);
        assert_eq!(model.fit_percent, 0.0);
        assert_eq!(model.predicted, vec![0.0; 8]);
        // Too short to reach the placeholder step index, so all zeros.
        assert_eq!(model.step_response, vec![0.0; 8]);
    }

    #[test]
    fn test_zero_variance_output_returns_degenerate_with_placeholder_step() {
        let u = vec![0.0; 100];
        let y = vec![0.0; 100];

        let fit = identify_arx(&u, &y, &ArxOrders::default());
        assert!(fit.is_degenerate());

        let step = &fit.model().step_response;
        assert_eq!(step.len(), 100);
        assert_eq!(step[DEGENERATE_STEP_INDEX - 1], 0.0);
        assert_eq!(step[DEGENERATE_STEP_INDEX], 1.0);
        assert_eq!(step[step.len() - 1], 1.0);
    }

    #[test]
    fn test_first_order_system_is_recovered() {
        // y[i] = 0.5*y[i-1] + 0.5*u[i-1] plus a little equation noise, so
        // the regression is full rank and the solution unique.
        let u = noise(800, 7);
        let e = noise(800, 11);
        let mut y = vec![0.0; 800];
        for i in 1..800 {
            y[i] = 0.5 * y[i - 1] + 0.5 * u[i - 1] + 0.005 * e[i];
        }

        let fit = identify_arx(&u, &y, &ArxOrders::default());
        assert!(!fit.is_degenerate());

        let model = fit.model();
        assert!(model.fit_percent > 95.0, "fit was {:.2}%", model.fit_percent);
        assert!(
            (model.a_poly[1] + 0.5).abs() < 0.05,
            "a1 was {:.4}",
            model.a_poly[1]
        );
        assert!(
            (model.b_poly[0] - 0.5).abs() < 0.05,
            "b1 was {:.4}",
            model.b_poly[0]
        );

        // DC gain 0.5 / (1 - 0.5) = 1, so the step settles near 1.
        let step = &model.step_response;
        assert_eq!(step.len(), STEP_RESPONSE_LEN);
        let tail_mean: f64 = step[step.len() - 20..].iter().sum::<f64>() / 20.0;
        assert!((tail_mean - 1.0).abs() < 0.05, "steady state was {:.4}", tail_mean);
    }

    #[test]
    fn test_linear_solver_exact_and_singular() {
        let a = ndarray::arr2(&[[2.0, 1.0], [1.0, 3.0]]);
        let b = ndarray::arr1(&[5.0, 10.0]);
        let x = solve_linear_system(&a, &b);
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);

        // Singular but consistent: the redundant component is left at zero.
        let a = ndarray::arr2(&[[1.0, 1.0], [1.0, 1.0]]);
        let b = ndarray::arr1(&[2.0, 2.0]);
        let x = solve_linear_system(&a, &b);
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert_eq!(x[1], 0.0);
    }

    #[test]
    fn test_parameter_vector_shapes() {
        let u = noise(200, 3);
        let y = noise(200, 4);
        let orders = ArxOrders { na: 3, nb: 2, nk: 1 };

        let fit = identify_arx(&u, &y, &orders);
        let model = fit.model();
        assert_eq!(model.parameters.len(), 5);
        assert_eq!(model.a_poly.len(), 4);
        assert_eq!(model.b_poly.len(), 2);
        assert_eq!(model.a_poly[0], 1.0);
    }
}
