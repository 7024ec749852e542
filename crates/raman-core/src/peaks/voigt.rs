//! Pseudo-Voigt line shape.
//!
//! Both components are normalised to peak amplitude `A` (not area), so
//! `pseudo_voigt(mu, ..) == A` regardless of width or mixing.

use serde::{Deserialize, Serialize};

/// `2·sqrt(2·ln 2)`, the Gaussian FWHM in units of sigma.
pub const GAUSSIAN_FWHM_FACTOR: f64 = 2.354_820_045_030_949_4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoigtParams {
    pub amplitude: f64,
    pub center: f64,
    pub sigma: f64,
    pub gamma: f64,
    pub eta: f64,
}

impl VoigtParams {
    pub const COUNT: usize = 5;

    pub const fn new(amplitude: f64, center: f64, sigma: f64, gamma: f64, eta: f64) -> Self {
        Self {
            amplitude,
            center,
            sigma,
            gamma,
            eta,
        }
    }

    pub fn from_array(values: [f64; Self::COUNT]) -> Self {
        let [amplitude, center, sigma, gamma, eta] = values;
        Self::new(amplitude, center, sigma, gamma, eta)
    }

    pub fn to_array(self) -> [f64; Self::COUNT] {
        [self.amplitude, self.center, self.sigma, self.gamma, self.eta]
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        pseudo_voigt(x, self)
    }

    pub fn fwhm(&self) -> f64 {
        approximate_voigt_fwhm(self.sigma, self.gamma, self.eta)
    }
}

pub fn pseudo_voigt(x: f64, params: &VoigtParams) -> f64 {
    let offset = x - params.center;
    let gaussian =
        params.amplitude * (-(offset * offset) / (2.0 * params.sigma * params.sigma)).exp();
    let gamma_sq = params.gamma * params.gamma;
    let lorentzian = params.amplitude * (gamma_sq / (offset * offset + gamma_sq));
    params.eta * lorentzian + (1.0 - params.eta) * gaussian
}

/// Linear blend of the component FWHMs. This is not the true Voigt FWHM.
pub fn approximate_voigt_fwhm(sigma: f64, gamma: f64, eta: f64) -> f64 {
    eta * (2.0 * gamma) + (1.0 - eta) * (sigma * GAUSSIAN_FWHM_FACTOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WidthCrossing {
    pub left: Option<f64>,
    pub right: Option<f64>,
}

/// Walks outward from the centre in `step` increments until the model drops
/// to `target_height`, then linearly interpolates the crossing between the
/// last two samples. A side stays `None` if no crossing lies within
/// `search_range`.
pub fn find_width_at_height_voigt(
    params: &VoigtParams,
    target_height: f64,
    search_range: f64,
    step: f64,
) -> WidthCrossing {
    if step.is_nan() || step <= 0.0 || search_range.is_nan() || search_range < 0.0 {
        return WidthCrossing::default();
    }
    let steps = (search_range / step).floor() as usize;
    let mu = params.center;

    let left = (0..=steps).find_map(|k| {
        let x = mu - k as f64 * step;
        let y = params.evaluate(x);
        (y <= target_height).then(|| {
            let inner = x + step;
            interpolate_crossing(x, y, inner, params.evaluate(inner), target_height)
        })
    });

    let right = (0..=steps).find_map(|k| {
        let x = mu + k as f64 * step;
        let y = params.evaluate(x);
        (y <= target_height).then(|| {
            let inner = x - step;
            interpolate_crossing(inner, params.evaluate(inner), x, y, target_height)
        })
    });

    WidthCrossing { left, right }
}

fn interpolate_crossing(x1: f64, y1: f64, x2: f64, y2: f64, target: f64) -> f64 {
    if y2 == y1 {
        return x1;
    }
    x1 + (target - y1) * (x2 - x1) / (y2 - y1)
}

#[cfg(test)]
mod tests {
    use super::{
        GAUSSIAN_FWHM_FACTOR, VoigtParams, approximate_voigt_fwhm, find_width_at_height_voigt,
        pseudo_voigt,
    };

    #[test]
    fn model_peaks_at_amplitude_for_any_shape() {
        for (sigma, gamma, eta) in [(10.0, 5.0, 0.0), (40.0, 45.0, 0.5), (3.0, 90.0, 1.0)] {
            let params = VoigtParams::new(17.5, 1350.0, sigma, gamma, eta);
            assert!((pseudo_voigt(1350.0, &params) - 17.5).abs() < 1.0e-12);
        }
    }

    #[test]
    fn gaussian_factor_matches_closed_form() {
        let expected = 2.0 * (2.0 * std::f64::consts::LN_2).sqrt();
        assert!((GAUSSIAN_FWHM_FACTOR - expected).abs() < 1.0e-15);
    }

    #[test]
    fn fwhm_is_a_convex_blend_of_component_widths() {
        let sigma = 30.0;
        let gamma = 20.0;
        let lorentz = 2.0 * gamma;
        let gauss = sigma * GAUSSIAN_FWHM_FACTOR;
        for step in 0..=10 {
            let eta = step as f64 / 10.0;
            let fwhm = approximate_voigt_fwhm(sigma, gamma, eta);
            assert!(fwhm >= lorentz.min(gauss) - 1.0e-12);
            assert!(fwhm <= lorentz.max(gauss) + 1.0e-12);
        }
        assert_eq!(approximate_voigt_fwhm(sigma, gamma, 1.0), lorentz);
    }

    #[test]
    fn lorentzian_half_width_is_found_by_interpolation() {
        let params = VoigtParams::new(10.0, 1590.0, 1.0, 25.0, 1.0);
        let crossing = find_width_at_height_voigt(&params, 5.0, 400.0, 0.5);
        let left = crossing.left.expect("left crossing");
        let right = crossing.right.expect("right crossing");
        assert!((left - 1565.0).abs() < 0.05);
        assert!((right - 1615.0).abs() < 0.05);
    }

    #[test]
    fn crossing_outside_search_range_is_none() {
        let params = VoigtParams::new(10.0, 1350.0, 80.0, 80.0, 0.5);
        let crossing = find_width_at_height_voigt(&params, 1.0, 20.0, 0.5);
        assert_eq!(crossing.left, None);
        assert_eq!(crossing.right, None);
    }
}
