use super::{Spectrum, SpectrumError, interpolate_intensity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineAnchors {
    pub low_anchor: f64,
    pub high_anchor: f64,
}

impl Default for BaselineAnchors {
    fn default() -> Self {
        Self {
            low_anchor: 850.0,
            high_anchor: 2150.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineCorrection {
    pub corrected: Spectrum,
    pub slope: f64,
    pub intercept: f64,
}

/// Subtracts the straight line through the intensities at the two anchors,
/// then crops to `[low_anchor, high_anchor]`.
pub fn subtract_linear_baseline(
    spectrum: &Spectrum,
    anchors: BaselineAnchors,
) -> Result<BaselineCorrection, SpectrumError> {
    let low = anchors.low_anchor;
    let high = anchors.high_anchor;
    let low_intensity = interpolate_intensity(spectrum, low);
    let high_intensity = interpolate_intensity(spectrum, high);

    let slope = if high == low {
        0.0
    } else {
        (high_intensity - low_intensity) / (high - low)
    };
    let intercept = low_intensity - slope * low;

    let (wavelengths, intensities): (Vec<f64>, Vec<f64>) = spectrum
        .wavelengths()
        .iter()
        .zip(spectrum.intensities())
        .filter(|(wavelength, _)| **wavelength >= low && **wavelength <= high)
        .map(|(wavelength, intensity)| {
            (*wavelength, intensity - (slope * wavelength + intercept))
        })
        .unzip();

    tracing::debug!(slope, intercept, kept = wavelengths.len(), "subtracted linear baseline");

    Ok(BaselineCorrection {
        corrected: Spectrum::new(wavelengths, intensities)?,
        slope,
        intercept,
    })
}

#[cfg(test)]
mod tests {
    use super::{BaselineAnchors, subtract_linear_baseline};
    use crate::spectrum::{Spectrum, SpectrumError};

    #[test]
    fn linear_background_is_removed_and_range_cropped() {
        let spectrum =
            Spectrum::sampled(800.0, 2200.0, 10.0, |x| 0.01 * x + 3.0).expect("spectrum");
        let correction =
            subtract_linear_baseline(&spectrum, BaselineAnchors::default()).expect("baseline");

        assert!((correction.slope - 0.01).abs() < 1.0e-12);
        assert!((correction.intercept - 3.0).abs() < 1.0e-9);
        let corrected = &correction.corrected;
        assert_eq!(corrected.wavelengths().first().copied(), Some(850.0));
        assert_eq!(corrected.wavelengths().last().copied(), Some(2150.0));
        assert!(corrected.intensities().iter().all(|value| value.abs() < 1.0e-9));
    }

    #[test]
    fn peaks_survive_subtraction() {
        let spectrum = Spectrum::sampled(800.0, 2200.0, 1.0, |x| {
            5.0 + 20.0 * (-((x - 1350.0) / 30.0).powi(2) / 2.0).exp()
        })
        .expect("spectrum");
        let correction =
            subtract_linear_baseline(&spectrum, BaselineAnchors::default()).expect("baseline");
        let index = correction
            .corrected
            .wavelengths()
            .iter()
            .position(|x| *x == 1350.0)
            .expect("apex sample");
        assert!((correction.corrected.intensities()[index] - 20.0).abs() < 1.0e-6);
    }

    #[test]
    fn spectrum_outside_anchor_range_has_nothing_left() {
        let spectrum = Spectrum::sampled(100.0, 200.0, 10.0, |_| 1.0).expect("spectrum");
        let error = subtract_linear_baseline(&spectrum, BaselineAnchors::default())
            .expect_err("nothing inside the anchors");
        assert!(matches!(error, SpectrumError::Empty));
    }
}
