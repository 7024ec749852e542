//! Single-peak pseudo-Voigt fitting by coordinate pattern search.
//!
//! Each iteration tries `{-step, 0, +step}` on every parameter separately
//! and keeps the single trial with the lowest squared error across all five
//! parameters (strict `<`, so the first trial wins ties). Steps then shrink
//! by 10%.

use super::voigt::{GAUSSIAN_FWHM_FACTOR, VoigtParams, find_width_at_height_voigt};
use crate::domain::Band;
use crate::numerics::{SavitzkyGolay, first_argmax};

pub const MAX_ITERATIONS: usize = 100;
pub const CONVERGENCE_TOLERANCE: f64 = 1.0e-6;
pub const STEP_DECAY: f64 = 0.9;
pub const INITIAL_ETA: f64 = 0.7;
pub const ETA_BOUNDS: (f64, f64) = (0.2, 0.9);
pub const MAX_COMPONENT_WIDTH: f64 = 100.0;
pub const WIDTH_SEARCH_STEP: f64 = 0.5;

const SIGMA: usize = 2;
const GAMMA: usize = 3;
const ETA: usize = 4;

/// Initial width guess per band, in cm⁻¹.
pub const fn expected_width(band: Band) -> f64 {
    match band {
        Band::D => 300.0,
        Band::G => 200.0,
    }
}

/// How far from the centre the width crossing is searched for.
pub const fn width_search_range(band: Band) -> f64 {
    match band {
        Band::D => 600.0,
        Band::G => 400.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoigtFit {
    pub params: VoigtParams,
    pub fwhm: f64,
    pub left_x: f64,
    pub right_x: f64,
    pub target_height: f64,
    pub iterations: usize,
}

pub fn sum_squared_error(x: &[f64], y: &[f64], params: &VoigtParams) -> f64 {
    x.iter()
        .zip(y)
        .map(|(x, y)| {
            let residual = params.evaluate(*x) - y;
            residual * residual
        })
        .sum()
}

pub fn initial_guess(
    x: &[f64],
    y: &[f64],
    band: Band,
    smoother: &SavitzkyGolay,
) -> Option<VoigtParams> {
    let smoothed = smoother.smooth(y);
    let apex = first_argmax(&smoothed)?;
    let width = expected_width(band);
    Some(VoigtParams::new(
        smoothed[apex],
        x[apex],
        width / GAUSSIAN_FWHM_FACTOR,
        width / 2.0,
        INITIAL_ETA,
    ))
}

/// Fits one pseudo-Voigt to a window and measures its width at
/// `width_fraction` of the fitted amplitude. Returns `None` for an empty window.
///
/// The fitted centre is kept as found. It is not pulled back inside the
/// band's nominal range (1200..1500 for D, 1500..1700 for G, inset by half
/// the FWHM) before the width is measured, so a peak fitted near a band edge
/// reports its true position.
pub fn fit_pseudo_voigt(
    x: &[f64],
    y: &[f64],
    band: Band,
    width_fraction: f64,
    smoother: &SavitzkyGolay,
) -> Option<VoigtFit> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }
    let guess = initial_guess(x, y, band, smoother)?;

    let mut params = guess.to_array();
    let mut steps = [
        guess.amplitude * 0.1,
        1.0,
        guess.sigma * 0.2,
        guess.gamma * 0.2,
        0.1,
    ];

    let mut iterations = 0;
    for _ in 0..MAX_ITERATIONS {
        iterations += 1;
        let mut best_error = f64::INFINITY;
        let mut best = params;

        for index in 0..VoigtParams::COUNT {
            for delta in [-steps[index], 0.0, steps[index]] {
                let mut trial = params;
                trial[index] += delta;
                clamp_trial(&mut trial, index);

                let error = sum_squared_error(x, y, &VoigtParams::from_array(trial));
                if error < best_error {
                    best_error = error;
                    best = trial;
                }
            }
        }

        let change: f64 = params
            .iter()
            .zip(&best)
            .map(|(old, new)| (new - old).abs())
            .sum();
        params = best;
        for step in &mut steps {
            *step *= STEP_DECAY;
        }
        if change < CONVERGENCE_TOLERANCE {
            break;
        }
    }

    let params = VoigtParams::from_array(params);
    let (left_x, right_x, target_height) = measure_width(&params, band, width_fraction);

    tracing::debug!(
        band = band.label(),
        iterations,
        amplitude = params.amplitude,
        center = params.center,
        "pseudo-Voigt fit finished"
    );

    Some(VoigtFit {
        params,
        fwhm: right_x - left_x,
        left_x,
        right_x,
        target_height,
        iterations,
    })
}

/// `(left_x, right_x, target_height)` of a fitted peak at `width_fraction`
/// of its amplitude, falling back to `center ± fwhm/2` per missing side.
pub fn measure_width(params: &VoigtParams, band: Band, width_fraction: f64) -> (f64, f64, f64) {
    let model_fwhm = params.fwhm();
    let target_height = params.amplitude * width_fraction;
    let crossing = find_width_at_height_voigt(
        params,
        target_height,
        width_search_range(band),
        WIDTH_SEARCH_STEP,
    );
    let left_x = crossing.left.unwrap_or(params.center - model_fwhm / 2.0);
    let right_x = crossing.right.unwrap_or(params.center + model_fwhm / 2.0);
    (left_x, right_x, target_height)
}

fn clamp_trial(trial: &mut [f64; VoigtParams::COUNT], index: usize) {
    match index {
        ETA => trial[ETA] = trial[ETA].clamp(ETA_BOUNDS.0, ETA_BOUNDS.1),
        SIGMA | GAMMA => trial[index] = trial[index].min(MAX_COMPONENT_WIDTH),
        _ => {}
    }
}
