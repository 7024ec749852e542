pub mod errors;

pub use errors::{AnalysisResult, RamanError, RamanErrorCategory, RamanResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMethod {
    #[default]
    Simple,
    Voigt,
    Voigt5d,
}

impl AnalysisMethod {
    pub const ALL: [AnalysisMethod; 3] = [Self::Simple, Self::Voigt, Self::Voigt5d];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Voigt => "voigt",
            Self::Voigt5d => "voigt5d",
        }
    }

    /// Fitting methods compare smoothed intensities and fit inside the broad
    /// windows split at the division point.
    pub const fn is_fitting(self) -> bool {
        matches!(self, Self::Voigt | Self::Voigt5d)
    }
}

impl Display for AnalysisMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for AnalysisMethod {
    type Err = RamanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                RamanError::input_validation(
                    "INPUT.ANALYSIS_METHOD",
                    format!(
                        "unknown analysis method '{}'; expected one of simple, voigt, voigt5d",
                        value
                    ),
                )
            })
    }
}

/// Which of the two characteristic carbon bands a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    D,
    G,
}

impl Band {
    pub const BOTH: [Band; 2] = [Band::D, Band::G];

    pub const fn index(self) -> usize {
        match self {
            Self::D => 0,
            Self::G => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::D => "D",
            Self::G => "G",
        }
    }
}

/// Inclusive wavelength range in cm⁻¹.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, wavelength: f64) -> bool {
        wavelength >= self.start && wavelength <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakRecord {
    pub wavelength: f64,
    pub intensity: f64,
    pub height: f64,
    pub width: Option<f64>,
    pub width_left_x: Option<f64>,
    pub width_right_x: Option<f64>,
    pub width_height: Option<f64>,
}

impl PeakRecord {
    pub fn new(wavelength: f64, intensity: f64) -> Self {
        Self {
            wavelength,
            intensity,
            height: intensity,
            width: None,
            width_left_x: None,
            width_right_x: None,
            width_height: None,
        }
    }

    pub fn with_width(mut self, left_x: f64, right_x: f64, target_height: f64) -> Self {
        self.width = Some(right_x - left_x);
        self.width_left_x = Some(left_x);
        self.width_right_x = Some(right_x);
        self.width_height = Some(target_height);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurveKind {
    Fit,
    SubPeak,
    TotalFit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub label: String,
    pub kind: CurveKind,
}

#[cfg(test)]
mod tests {
    use super::{AnalysisMethod, Band, Interval, PeakRecord};

    #[test]
    fn analysis_method_parses_case_insensitively() {
        assert_eq!("voigt".parse::<AnalysisMethod>(), Ok(AnalysisMethod::Voigt));
        assert_eq!(
            " VOIGT5D ".parse::<AnalysisMethod>(),
            Ok(AnalysisMethod::Voigt5d)
        );
        let error = "lorentz"
            .parse::<AnalysisMethod>()
            .expect_err("unknown methods should be rejected");
        assert_eq!(error.placeholder(), "INPUT.ANALYSIS_METHOD");
        assert_eq!(AnalysisMethod::Voigt5d.to_string(), "voigt5d");
    }

    #[test]
    fn only_voigt_variants_are_fitting_methods() {
        assert!(!AnalysisMethod::Simple.is_fitting());
        assert!(AnalysisMethod::Voigt.is_fitting());
        assert!(AnalysisMethod::Voigt5d.is_fitting());
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        let interval = Interval::new(1300.0, 1400.0);
        assert!(interval.contains(1300.0));
        assert!(interval.contains(1400.0));
        assert!(!interval.contains(1400.5));
        assert!(Interval::new(1400.0, 1310.0).is_inverted());
    }

    #[test]
    fn peak_record_width_is_right_minus_left() {
        let record = PeakRecord::new(1350.0, 20.0).with_width(1314.0, 1386.0, 10.0);
        assert_eq!(record.height, 20.0);
        assert_eq!(record.width, Some(72.0));
        assert_eq!(record.width_height, Some(10.0));
        assert_eq!(Band::G.index(), 1);
    }
}
