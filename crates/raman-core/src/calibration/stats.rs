use super::sample::ReferenceSample;
use crate::numerics::{mean, population_std_dev};
use crate::peaks::CalibrationParameter;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Mean ± population standard deviation of one parameter at one reference
/// temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationPoint {
    pub temperature: f64,
    pub mean_value: f64,
    pub std_dev: f64,
    pub sample_count: usize,
}

impl CalibrationPoint {
    pub const fn new(temperature: f64, mean_value: f64, std_dev: f64) -> Self {
        Self {
            temperature,
            mean_value,
            std_dev,
            sample_count: 1,
        }
    }
}

/// Groups the included samples by temperature and aggregates `parameter`.
/// Samples without a temperature label or without a value are ignored.
/// The result is sorted ascending by temperature.
pub fn build_calibration_points(
    samples: &[ReferenceSample],
    included: &BTreeSet<String>,
    parameter: CalibrationParameter,
) -> Vec<CalibrationPoint> {
    let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        if !included.contains(&sample.name) {
            continue;
        }
        let (Some(temperature), Some(value)) = (sample.temperature(), sample.value(parameter))
        else {
            continue;
        };
        groups.entry(temperature).or_default().push(value);
    }

    groups
        .into_iter()
        .filter_map(|(temperature, values)| {
            Some(CalibrationPoint {
                temperature: f64::from(temperature),
                mean_value: mean(&values)?,
                std_dev: population_std_dev(&values)?,
                sample_count: values.len(),
            })
        })
        .collect()
}
