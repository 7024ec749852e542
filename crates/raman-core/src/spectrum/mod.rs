//! Spectrum model: paired wavelength/intensity samples.
//!
//! Wavelengths are assumed ascending with one intensity per wavelength.
//! Construction checks lengths only; monotonicity is never re-validated.

mod baseline;
mod parser;

pub use baseline::{BaselineAnchors, BaselineCorrection, subtract_linear_baseline};
pub use parser::load_spectrum;

use crate::domain::{Interval, RamanError};
use crate::numerics::interpolate_linear;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SpectrumError {
    #[error("spectrum has {wavelengths} wavelengths but {intensities} intensities")]
    LengthMismatch {
        wavelengths: usize,
        intensities: usize,
    },
    #[error("spectrum must contain at least one sample")]
    Empty,
    #[error("no valid spectrum rows found ({skipped} malformed lines skipped)")]
    NoRows { skipped: usize },
    #[error("failed to read spectrum '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<SpectrumError> for RamanError {
    fn from(error: SpectrumError) -> Self {
        match error {
            SpectrumError::LengthMismatch { .. } => {
                RamanError::input_validation("INPUT.SPECTRUM_SHAPE", error.to_string())
            }
            SpectrumError::Empty | SpectrumError::NoRows { .. } => {
                RamanError::input_validation("INPUT.SPECTRUM_EMPTY", error.to_string())
            }
            SpectrumError::Read { .. } => {
                RamanError::io_system("IO.SPECTRUM_READ", error.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelengths: Vec<f64>,
    intensities: Vec<f64>,
}

impl Spectrum {
    pub fn new(wavelengths: Vec<f64>, intensities: Vec<f64>) -> Result<Self, SpectrumError> {
        if wavelengths.len() != intensities.len() {
            return Err(SpectrumError::LengthMismatch {
                wavelengths: wavelengths.len(),
                intensities: intensities.len(),
            });
        }
        if wavelengths.is_empty() {
            return Err(SpectrumError::Empty);
        }
        Ok(Self {
            wavelengths,
            intensities,
        })
    }

    /// Builds a spectrum by sampling `f` on `start, start + step, ..` up to `end` inclusive.
    pub fn sampled(
        start: f64,
        end: f64,
        step: f64,
        f: impl Fn(f64) -> f64,
    ) -> Result<Self, SpectrumError> {
        if step.is_nan() || step <= 0.0 || end < start {
            return Err(SpectrumError::Empty);
        }
        let count = ((end - start) / step).floor() as usize + 1;
        let wavelengths: Vec<f64> = (0..count).map(|index| start + index as f64 * step).collect();
        let intensities = wavelengths.iter().map(|x| f(*x)).collect();
        Self::new(wavelengths, intensities)
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// Indices of samples whose wavelength lies inside `interval` (inclusive).
    pub fn points_in(&self, interval: Interval) -> Vec<usize> {
        self.wavelengths
            .iter()
            .enumerate()
            .filter(|(_, wavelength)| interval.contains(**wavelength))
            .map(|(index, _)| index)
            .collect()
    }

    /// Copies the samples inside `interval`, taking intensities from `values`
    /// (raw or smoothed, same length as the spectrum).
    pub fn window(&self, interval: Interval, values: &[f64]) -> (Vec<f64>, Vec<f64>) {
        self.points_in(interval)
            .into_iter()
            .map(|index| (self.wavelengths[index], values[index]))
            .unzip()
    }

    pub fn to_tsv(&self) -> String {
        let mut out = String::with_capacity(self.len() * 24);
        for (wavelength, intensity) in self.wavelengths.iter().zip(&self.intensities) {
            out.push_str(&format!("{wavelength}\t{intensity}\n"));
        }
        out
    }
}

/// Intensity at `x`: exact sample, linear interpolation between neighbours,
/// or the first/last intensity when `x` is outside the data range.
pub fn interpolate_intensity(spectrum: &Spectrum, x: f64) -> f64 {
    interpolate_linear(x, spectrum.wavelengths(), spectrum.intensities())
        .unwrap_or(spectrum.intensities[0])
}
