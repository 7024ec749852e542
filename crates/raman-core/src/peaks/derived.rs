use super::PeakAnalysis;
use crate::domain::{PeakRecord, RamanError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Ratios and widths used as thermal-history proxies. Any value whose
/// inputs are missing or zero is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedParameters {
    pub hd_hg: Option<f64>,
    pub d_width: Option<f64>,
    pub g_width: Option<f64>,
    pub wd_wg: Option<f64>,
}

impl DerivedParameters {
    pub fn from_peaks(d_peak: Option<&PeakRecord>, g_peak: Option<&PeakRecord>) -> Self {
        let d_width = d_peak.and_then(|peak| nonzero_width(peak.width));
        let g_width = g_peak.and_then(|peak| nonzero_width(peak.width));
        Self {
            hd_hg: guarded_ratio(d_peak.map(|peak| peak.height), g_peak.map(|peak| peak.height)),
            d_width,
            g_width,
            wd_wg: guarded_ratio(d_width, g_width),
        }
    }

    pub fn from_analysis(analysis: &PeakAnalysis) -> Self {
        let [d_peak, g_peak] = &analysis.top_peaks;
        Self::from_peaks(d_peak.as_ref(), g_peak.as_ref())
    }

    pub fn value(&self, parameter: CalibrationParameter) -> Option<f64> {
        match parameter {
            CalibrationParameter::HdHg => self.hd_hg,
            CalibrationParameter::DWidth => self.d_width,
            CalibrationParameter::GWidth => self.g_width,
            CalibrationParameter::WdWg => self.wd_wg,
        }
    }
}

/// A zero width is treated as unmeasured.
fn nonzero_width(width: Option<f64>) -> Option<f64> {
    width.filter(|width| *width != 0.0 && width.is_finite())
}

/// `numerator / denominator`, or `None` when either side is missing or zero.
pub fn guarded_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let numerator = numerator?;
    let denominator = denominator?;
    if numerator == 0.0 || denominator == 0.0 {
        return None;
    }
    let ratio = numerator / denominator;
    ratio.is_finite().then_some(ratio)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalibrationParameter {
    HdHg,
    DWidth,
    GWidth,
    WdWg,
}

impl CalibrationParameter {
    pub const ALL: [CalibrationParameter; 4] = [Self::HdHg, Self::DWidth, Self::GWidth, Self::WdWg];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HdHg => "hdHg",
            Self::DWidth => "dWidth",
            Self::GWidth => "gWidth",
            Self::WdWg => "wdWg",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HdHg => "HD/HG",
            Self::DWidth => "D width",
            Self::GWidth => "G width",
            Self::WdWg => "WD/WG",
        }
    }
}

impl Display for CalibrationParameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CalibrationParameter {
    type Err = RamanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|parameter| {
                parameter.as_str().eq_ignore_ascii_case(trimmed)
                    || parameter.label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| {
                RamanError::input_validation(
                    "INPUT.CALIBRATION_PARAMETER",
                    format!("unknown calibration parameter '{value}'"),
                )
            })
    }
}
