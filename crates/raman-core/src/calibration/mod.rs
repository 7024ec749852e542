mod cache;
mod inversion;
mod sample;
mod stats;

pub use cache::{CalibrationCache, CalibrationKey, CalibrationSet, reference_fingerprint};
pub use inversion::{
    FLAT_SEGMENT_TOLERANCE, TemperatureEstimate, TemperatureRange, UNCONSTRAINED_SENTINEL,
    Uncertainty, find_temperature_ranges_within_sd, find_temperatures_for_value,
};
pub use sample::{ReferenceSample, temperature_label_from_name};
pub use stats::{CalibrationPoint, build_calibration_points};

use crate::peaks::CalibrationParameter;
use serde::Serialize;

/// Best-estimate crossings and plausible SD ranges for one measured value.
/// The two lists are independent and may disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureReport {
    pub parameter: CalibrationParameter,
    pub value: f64,
    pub estimates: Vec<TemperatureEstimate>,
    pub sd_ranges: Vec<TemperatureRange>,
}

pub fn estimate_temperatures(
    set: &CalibrationSet,
    parameter: CalibrationParameter,
    value: f64,
) -> TemperatureReport {
    let points = set.points(parameter);
    TemperatureReport {
        parameter,
        value,
        estimates: find_temperatures_for_value(points, value),
        sd_ranges: find_temperature_ranges_within_sd(points, value),
    }
}
