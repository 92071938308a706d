// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Saturation Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Exponential saturation model and the nonlinear coefficient fit.
//!
//! Diode response flattens at high count rates. The correction factor
//! `f(rate) = c - a * exp(-b * rate)` rises from `c - a` at rate zero
//! toward the plateau `c`; how the factor combines with a measurement is
//! the per-variant rule `CorrectionVariant::combine`.

use dosim_math::linalg::{invert3, solve3};
use dosim_types::config::{validate_fit_config, FitConfig, SaturationCoefficients};
use dosim_types::error::{DosimError, DosimResult};
use ndarray::Array2;

/// Denominator guard for relative-improvement convergence tests.
const RESIDUAL_FLOOR: f64 = 1e-30;

/// Marquardt regularization never scales a diagonal entry below this.
const DIAG_FLOOR: f64 = 1e-30;

/// Step halvings attempted before an update is abandoned.
const BACKTRACK_TRIES: usize = 8;

/// Correction factor at one count rate.
pub fn correction_factor(rate: f64, coeffs: &SaturationCoefficients) -> f64 {
    coeffs.c - coeffs.a * (-coeffs.b * rate).exp()
}

/// Correction factors for a whole rate array, elementwise.
pub fn correction_factor_map(rates: &Array2<f64>, coeffs: &SaturationCoefficients) -> Array2<f64> {
    rates.mapv(|rate| correction_factor(rate, coeffs))
}

/// Result of fitting the saturation model to calibration points.
#[derive(Debug, Clone)]
pub struct SaturationFit {
    pub coefficients: SaturationCoefficients,
    /// Parameter covariance in (a, b, c) order: `sigma^2 (J^T J)^-1`.
    /// Zero when the fit is exactly determined or the information
    /// matrix is singular.
    pub covariance: [[f64; 3]; 3],
    /// RMS residual at the solution.
    pub residual: f64,
    pub iterations: usize,
    pub residual_history: Vec<f64>,
}

fn model_residuals(params: &[f64; 3], rates: &[f64], signal: &[f64]) -> Vec<f64> {
    rates
        .iter()
        .zip(signal.iter())
        .map(|(&x, &y)| params[2] - params[0] * (-params[1] * x).exp() - y)
        .collect()
}

fn rms(values: &[f64]) -> f64 {
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Normal-equation pieces with the analytic Jacobian
/// `df/d(a,b,c) = [-e, a*x*e, 1]`, `e = exp(-b*x)`.
fn gauss_newton_matrices(
    params: &[f64; 3],
    rates: &[f64],
    residuals: &[f64],
) -> ([[f64; 3]; 3], [f64; 3]) {
    let mut jtj = [[0.0; 3]; 3];
    let mut jtr = [0.0; 3];
    for (&x, &r) in rates.iter().zip(residuals.iter()) {
        let e = (-params[1] * x).exp();
        let row = [-e, params[0] * x * e, 1.0];
        for i in 0..3 {
            jtr[i] += row[i] * r;
            for j in 0..3 {
                jtj[i][j] += row[i] * row[j];
            }
        }
    }
    (jtj, jtr)
}

/// Fit the saturation coefficients to measured (rate, relative signal)
/// calibration points by damped Gauss-Newton with Marquardt
/// regularization and backtracking step control.
///
/// Fails with `FitDiverged` when no convergent sequence of steps exists
/// within `config.max_iterations`; the initial guess is never returned
/// silently as a result.
pub fn fit_saturation_curve(
    rates: &[f64],
    relative_signal: &[f64],
    initial: SaturationCoefficients,
    config: &FitConfig,
) -> DosimResult<SaturationFit> {
    validate_fit_config(config)?;
    if rates.len() != relative_signal.len() {
        return Err(DosimError::ConfigError(format!(
            "Length mismatch: rates={}, signals={}",
            rates.len(),
            relative_signal.len()
        )));
    }
    if rates.len() < 3 {
        return Err(DosimError::ConfigError(format!(
            "At least 3 calibration points required, got {}",
            rates.len()
        )));
    }
    if rates
        .iter()
        .chain(relative_signal.iter())
        .any(|v| !v.is_finite())
    {
        return Err(DosimError::ConfigError(
            "Calibration points must be finite".to_string(),
        ));
    }

    let n = rates.len();
    let mut p = [initial.a, initial.b, initial.c];
    let mut residual_history = Vec::with_capacity(config.max_iterations + 1);
    let mut converged = false;
    let mut iter_done = 0;
    let mut damping = config.damping;
    let mut accepted_any = false;

    for iter in 0..config.max_iterations {
        let residual_vec = model_residuals(&p, rates, relative_signal);
        let residual = rms(&residual_vec);
        if !residual.is_finite() {
            return Err(DosimError::FitDiverged {
                iterations: iter_done,
                residual,
            });
        }
        residual_history.push(residual);
        iter_done = iter + 1;

        // Converged once a successful step sequence stops improving.
        if iter > 0 && accepted_any {
            let previous = residual_history[iter - 1];
            if previous - residual <= config.tolerance * previous.max(RESIDUAL_FLOOR) {
                converged = true;
                break;
            }
        }

        let (jtj, jtr) = gauss_newton_matrices(&p, rates, &residual_vec);
        let mut augmented = jtj;
        for k in 0..3 {
            augmented[k][k] += config.tikhonov * jtj[k][k].max(DIAG_FLOOR);
        }
        let delta = match solve3(augmented, [-jtr[0], -jtr[1], -jtr[2]]) {
            Some(d) => d,
            None => {
                return Err(DosimError::FitDiverged {
                    iterations: iter_done,
                    residual,
                })
            }
        };

        let mut accepted = false;
        let mut local_damping = damping;
        for _ in 0..BACKTRACK_TRIES {
            let trial = [
                p[0] + local_damping * delta[0],
                p[1] + local_damping * delta[1],
                p[2] + local_damping * delta[2],
            ];
            let trial_residual = rms(&model_residuals(&trial, rates, relative_signal));
            if trial_residual.is_finite() && trial_residual <= residual {
                p = trial;
                damping = (local_damping * 1.2).min(1.0);
                accepted = true;
                accepted_any = true;
                break;
            }
            local_damping *= 0.5;
        }

        if !accepted {
            break;
        }
    }

    let final_residuals = model_residuals(&p, rates, relative_signal);
    let final_residual = rms(&final_residuals);

    if !converged || !final_residual.is_finite() || p.iter().any(|v| !v.is_finite()) {
        return Err(DosimError::FitDiverged {
            iterations: iter_done,
            residual: final_residual,
        });
    }

    let (jtj, _) = gauss_newton_matrices(&p, rates, &final_residuals);
    let covariance = match invert3(jtj) {
        Some(inv) if n > 3 => {
            let ssr = final_residual * final_residual * n as f64;
            let sigma2 = ssr / (n - 3) as f64;
            let mut cov = [[0.0; 3]; 3];
            for i in 0..3 {
                for j in 0..3 {
                    cov[i][j] = sigma2 * inv[i][j];
                }
            }
            cov
        }
        _ => [[0.0; 3]; 3],
    };

    Ok(SaturationFit {
        coefficients: SaturationCoefficients {
            a: p[0],
            b: p[1],
            c: p[2],
        },
        covariance,
        residual: final_residual,
        iterations: iter_done,
        residual_history,
    })
}
