use super::sample::ReferenceSample;
use super::stats::{CalibrationPoint, build_calibration_points};
use crate::config::AnalysisConfig;
use crate::domain::AnalysisMethod;
use crate::peaks::CalibrationParameter;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const CHECKSUM_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const CHECKSUM_PRIME: u64 = 0x00000100000001B3;

/// Calibration curves for every parameter, built from one reference set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CalibrationSet {
    curves: BTreeMap<CalibrationParameter, Vec<CalibrationPoint>>,
}

impl CalibrationSet {
    pub fn build(samples: &[ReferenceSample], included: &BTreeSet<String>) -> Self {
        let curves = CalibrationParameter::ALL
            .into_iter()
            .map(|parameter| {
                (
                    parameter,
                    build_calibration_points(samples, included, parameter),
                )
            })
            .collect();
        Self { curves }
    }

    pub fn points(&self, parameter: CalibrationParameter) -> &[CalibrationPoint] {
        self.curves
            .get(&parameter)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.values().all(Vec::is_empty)
    }
}

/// Identifies the inputs a [`CalibrationSet`] was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalibrationKey {
    pub method: AnalysisMethod,
    d_width_fraction_bits: u64,
    g_width_fraction_bits: u64,
    pub reference_fingerprint: u64,
}

impl CalibrationKey {
    pub fn new(
        config: &AnalysisConfig,
        samples: &[ReferenceSample],
        included: &BTreeSet<String>,
    ) -> Self {
        let [d_fraction, g_fraction] = config.width_fractions();
        Self {
            method: config.method,
            d_width_fraction_bits: d_fraction.to_bits(),
            g_width_fraction_bits: g_fraction.to_bits(),
            reference_fingerprint: reference_fingerprint(samples, included),
        }
    }

    pub fn width_fractions(&self) -> [f64; 2] {
        [
            f64::from_bits(self.d_width_fraction_bits),
            f64::from_bits(self.g_width_fraction_bits),
        ]
    }
}

/// FNV-1a over the included samples' names, labels and parameter values,
/// visited in name order.
pub fn reference_fingerprint(samples: &[ReferenceSample], included: &BTreeSet<String>) -> u64 {
    let mut selected: Vec<&ReferenceSample> = samples
        .iter()
        .filter(|sample| included.contains(&sample.name))
        .collect();
    selected.sort_by(|left, right| left.name.cmp(&right.name));

    let mut checksum = CHECKSUM_OFFSET_BASIS;
    for sample in selected {
        checksum = checksum_bytes(checksum, sample.name.as_bytes());
        checksum = checksum_bytes(checksum, &[0]);
        checksum = checksum_bytes(
            checksum,
            sample.temperature_label.as_deref().unwrap_or("").as_bytes(),
        );
        checksum = checksum_bytes(checksum, &[0]);
        for parameter in CalibrationParameter::ALL {
            match sample.value(parameter) {
                Some(value) => {
                    checksum = checksum_bytes(checksum, &[1]);
                    checksum = checksum_bytes(checksum, &value.to_bits().to_le_bytes());
                }
                None => checksum = checksum_bytes(checksum, &[0]),
            }
        }
    }
    checksum
}

fn checksum_bytes(mut checksum: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        checksum ^= u64::from(*byte);
        checksum = checksum.wrapping_mul(CHECKSUM_PRIME);
    }
    checksum
}

/// Caller-owned store of calibration sets keyed by [`CalibrationKey`].
#[derive(Debug, Default)]
pub struct CalibrationCache {
    entries: HashMap<CalibrationKey, CalibrationSet>,
}

impl CalibrationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CalibrationKey) -> Option<&CalibrationSet> {
        self.entries.get(key)
    }

    pub fn get_or_build(
        &mut self,
        config: &AnalysisConfig,
        samples: &[ReferenceSample],
        included: &BTreeSet<String>,
    ) -> &CalibrationSet {
        let key = CalibrationKey::new(config, samples, included);
        self.entries.entry(key).or_insert_with(|| {
            tracing::debug!(
                method = key.method.as_str(),
                fingerprint = key.reference_fingerprint,
                "building calibration set"
            );
            CalibrationSet::build(samples, included)
        })
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
