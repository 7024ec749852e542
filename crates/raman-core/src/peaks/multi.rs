//! Joint fit of the five D-complex sub-bands and the G band.
//!
//! All six pseudo-Voigts (30 parameters) are evaluated at every sample of
//! both windows, so the bands leak into each other's windows. Intensities
//! are normalised by the largest absolute sample before optimisation and the
//! amplitudes are scaled back afterwards.

use super::fit::measure_width;
use super::voigt::{GAUSSIAN_FWHM_FACTOR, VoigtParams};
use crate::domain::{Band, CurveKind, FittedCurve, Interval, PeakRecord};
use crate::numerics::first_argmax;

pub const PEAK_COUNT: usize = 6;
pub const PARAMETER_COUNT: usize = PEAK_COUNT * VoigtParams::COUNT;

const D1_SEARCH: Interval = Interval::new(1320.0, 1390.0);
const G_CENTER_BOUNDS: Interval = Interval::new(1570.0, 1630.0);
const G_INITIAL_FWHM: f64 = 80.0;
const INITIAL_ETA: f64 = 0.5;
const WIDTH_BOUNDS: (f64, f64) = (1.0, 200.0);
const AMPLITUDE_FLOOR: f64 = 1.0e-6;
const AMPLITUDE_CEILING_FACTOR: f64 = 2.0;

/// Per-kind gradient multipliers: amplitude, center, sigma, gamma, eta.
const STEP_SCALE: [f64; VoigtParams::COUNT] = [1.0, 1.0e3, 1.0e3, 1.0e3, 10.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubBand {
    pub label: &'static str,
    /// Initial amplitude relative to D1.
    pub amplitude_fraction: f64,
    /// Fixed initial centre; `None` means located from the data.
    pub center: Option<f64>,
    pub fwhm: f64,
    pub center_bounds: Interval,
}

pub const D_SUB_BANDS: [SubBand; 5] = [
    SubBand {
        label: "D1",
        amplitude_fraction: 1.0,
        center: None,
        fwhm: 150.0,
        center_bounds: D1_SEARCH,
    },
    SubBand {
        label: "D2",
        amplitude_fraction: 0.25,
        center: Some(1620.0),
        fwhm: 60.0,
        center_bounds: Interval::new(1600.0, 1640.0),
    },
    SubBand {
        label: "D3",
        amplitude_fraction: 0.2,
        center: Some(1510.0),
        fwhm: 50.0,
        center_bounds: Interval::new(1480.0, 1540.0),
    },
    SubBand {
        label: "D4",
        amplitude_fraction: 0.15,
        center: Some(1200.0),
        fwhm: 40.0,
        center_bounds: Interval::new(1150.0, 1250.0),
    },
    SubBand {
        label: "D5",
        amplitude_fraction: 0.1,
        center: Some(1445.0),
        fwhm: 30.0,
        center_bounds: Interval::new(1420.0, 1470.0),
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiPeakOptions {
    pub max_iterations: usize,
    pub learning_rate: f64,
    pub patience: usize,
    /// Relative error improvement below which an iteration counts as stalled.
    pub improvement_tolerance: f64,
}

impl Default for MultiPeakOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            learning_rate: 3.5e-4,
            patience: 2,
            improvement_tolerance: 1.0e-7,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiPeakFit {
    /// D1..D5 followed by G, amplitudes in input units.
    pub peaks: [VoigtParams; PEAK_COUNT],
    pub d1: PeakRecord,
    pub g: PeakRecord,
    pub curves: Vec<FittedCurve>,
    /// Squared error in normalised units before and after optimisation.
    pub initial_error: f64,
    pub best_error: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone)]
struct Problem {
    x: Vec<f64>,
    y: Vec<f64>,
    lower: [f64; PARAMETER_COUNT],
    upper: [f64; PARAMETER_COUNT],
}

impl Problem {
    fn error(&self, params: &[f64; PARAMETER_COUNT]) -> f64 {
        let peaks = unpack(params);
        self.x
            .iter()
            .zip(&self.y)
            .map(|(x, y)| {
                let model: f64 = peaks.iter().map(|peak| peak.evaluate(*x)).sum();
                let residual = model - y;
                residual * residual
            })
            .sum()
    }

    fn gradient(&self, params: &[f64; PARAMETER_COUNT]) -> [f64; PARAMETER_COUNT] {
        let mut gradient = [0.0; PARAMETER_COUNT];
        for (index, slot) in gradient.iter_mut().enumerate() {
            let h = (params[index].abs() * 1.0e-4).max(1.0e-6);
            let mut forward = *params;
            forward[index] += h;
            let mut backward = *params;
            backward[index] -= h;
            *slot = (self.error(&forward) - self.error(&backward)) / (2.0 * h);
        }
        gradient
    }

    fn clamp(&self, params: &mut [f64; PARAMETER_COUNT]) {
        for (index, value) in params.iter_mut().enumerate() {
            *value = value.clamp(self.lower[index], self.upper[index]);
        }
    }
}

/// Fits D1..D5 and G jointly by central-difference gradient descent and
/// returns the lowest-error parameter set seen. `None` when either window
/// is empty.
pub fn fit_d_complex_and_g(
    d_window: (&[f64], &[f64]),
    g_window: (&[f64], &[f64]),
    width_fractions: [f64; 2],
    options: &MultiPeakOptions,
) -> Option<MultiPeakFit> {
    let (x_d, y_d) = d_window;
    let (x_g, y_g) = g_window;
    if x_d.is_empty() || x_g.is_empty() || x_d.len() != y_d.len() || x_g.len() != y_g.len() {
        return None;
    }

    let scale = y_d
        .iter()
        .chain(y_g)
        .fold(0.0_f64, |max, value| max.max(value.abs()));
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let y_d_norm: Vec<f64> = y_d.iter().map(|value| value / scale).collect();
    let y_g_norm: Vec<f64> = y_g.iter().map(|value| value / scale).collect();

    let (d1_center, d1_amplitude) = locate_d1(x_d, &y_d_norm)?;
    let g_apex = first_argmax(&y_g_norm)?;
    let (g_center, g_amplitude) = (x_g[g_apex], y_g_norm[g_apex]);

    let mut params = [0.0; PARAMETER_COUNT];
    let mut lower = [0.0; PARAMETER_COUNT];
    let mut upper = [0.0; PARAMETER_COUNT];
    let initial = D_SUB_BANDS
        .iter()
        .map(|band| {
            (
                d1_amplitude * band.amplitude_fraction,
                band.center.unwrap_or(d1_center),
                band.fwhm,
                band.center_bounds,
            )
        })
        .chain(std::iter::once((
            g_amplitude,
            g_center,
            G_INITIAL_FWHM,
            G_CENTER_BOUNDS,
        )));
    for (peak, (amplitude, center, fwhm, bounds)) in initial.enumerate() {
        let base = peak * VoigtParams::COUNT;
        params[base..base + VoigtParams::COUNT].copy_from_slice(&[
            amplitude,
            center,
            fwhm / GAUSSIAN_FWHM_FACTOR,
            fwhm / 2.0,
            INITIAL_ETA,
        ]);
        lower[base..base + VoigtParams::COUNT].copy_from_slice(&[
            AMPLITUDE_FLOOR,
            bounds.start,
            WIDTH_BOUNDS.0,
            WIDTH_BOUNDS.0,
            0.0,
        ]);
        upper[base..base + VoigtParams::COUNT].copy_from_slice(&[
            AMPLITUDE_CEILING_FACTOR * amplitude.max(AMPLITUDE_FLOOR),
            bounds.end,
            WIDTH_BOUNDS.1,
            WIDTH_BOUNDS.1,
            1.0,
        ]);
    }

    let problem = Problem {
        x: x_d.iter().chain(x_g).copied().collect(),
        y: y_d_norm.iter().chain(&y_g_norm).copied().collect(),
        lower,
        upper,
    };
    problem.clamp(&mut params);

    let initial_error = problem.error(&params);
    let mut best = params;
    let mut best_error = initial_error;
    let mut previous_error = initial_error;
    let mut stalled = 0;
    let mut iterations = 0;

    for _ in 0..options.max_iterations {
        iterations += 1;
        let gradient = problem.gradient(&params);
        for (index, value) in params.iter_mut().enumerate() {
            let scale = STEP_SCALE[index % VoigtParams::COUNT];
            *value -= options.learning_rate * scale * gradient[index];
        }
        problem.clamp(&mut params);

        let error = problem.error(&params);
        if error < best_error {
            best = params;
            best_error = error;
        }

        let improvement = previous_error - error;
        if improvement < options.improvement_tolerance * previous_error.max(f64::MIN_POSITIVE) {
            stalled += 1;
            if stalled >= options.patience {
                break;
            }
        } else {
            stalled = 0;
        }
        previous_error = error;
    }

    tracing::debug!(
        iterations,
        initial_error,
        best_error,
        "D-complex gradient descent finished"
    );

    let mut peaks = unpack(&best);
    for peak in &mut peaks {
        peak.amplitude *= scale;
    }

    let d1 = record_for(&peaks[0], Band::D, width_fractions[Band::D.index()]);
    let g = record_for(&peaks[PEAK_COUNT - 1], Band::G, width_fractions[Band::G.index()]);
    let curves = build_curves(&problem.x, &peaks);

    Some(MultiPeakFit {
        peaks,
        d1,
        g,
        curves,
        initial_error,
        best_error,
        iterations,
    })
}

fn locate_d1(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let restricted: Vec<usize> = (0..x.len())
        .filter(|index| D1_SEARCH.contains(x[*index]))
        .collect();
    let candidates: Vec<usize> = if restricted.is_empty() {
        (0..x.len()).collect()
    } else {
        restricted
    };
    let values: Vec<f64> = candidates.iter().map(|index| y[*index]).collect();
    let best = candidates[first_argmax(&values)?];
    Some((x[best], y[best]))
}

fn unpack(params: &[f64; PARAMETER_COUNT]) -> [VoigtParams; PEAK_COUNT] {
    std::array::from_fn(|peak| {
        let base = peak * VoigtParams::COUNT;
        VoigtParams::new(
            params[base],
            params[base + 1],
            params[base + 2],
            params[base + 3],
            params[base + 4],
        )
    })
}

fn record_for(params: &VoigtParams, band: Band, fraction: f64) -> PeakRecord {
    let (left_x, right_x, target_height) = measure_width(params, band, fraction);
    PeakRecord::new(params.center, params.amplitude).with_width(left_x, right_x, target_height)
}

fn build_curves(x: &[f64], peaks: &[VoigtParams; PEAK_COUNT]) -> Vec<FittedCurve> {
    let labels = D_SUB_BANDS.iter().map(|band| band.label).chain(["G"]);
    let mut curves: Vec<FittedCurve> = peaks
        .iter()
        .zip(labels)
        .map(|(peak, label)| FittedCurve {
            x: x.to_vec(),
            y: x.iter().map(|x| peak.evaluate(*x)).collect(),
            label: label.to_string(),
            kind: CurveKind::SubPeak,
        })
        .collect();
    curves.push(FittedCurve {
        x: x.to_vec(),
        y: x
            .iter()
            .map(|x| peaks.iter().map(|peak| peak.evaluate(*x)).sum())
            .collect(),
        label: "Total fit".to_string(),
        kind: CurveKind::TotalFit,
    });
    curves
}
