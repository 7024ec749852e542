use super::stats::CalibrationPoint;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Stand-in uncertainty reported for flat calibration segments.
pub const UNCONSTRAINED_SENTINEL: f64 = 9999.0;
/// Segments whose mean values differ by less than this are treated as flat.
pub const FLAT_SEGMENT_TOLERANCE: f64 = 1.0e-9;
const COINCIDENT_TEMPERATURE_TOLERANCE: f64 = 1.0e-9;
const BAND_EDGE_TOLERANCE: f64 = 1.0e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uncertainty {
    Value(f64),
    /// The segment is flat, so the temperature is not constrained by it.
    Unconstrained,
}

impl Uncertainty {
    /// Numeric view, with [`UNCONSTRAINED_SENTINEL`] for flat segments.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Value(value) => value,
            Self::Unconstrained => UNCONSTRAINED_SENTINEL,
        }
    }

    pub fn is_unconstrained(self) -> bool {
        matches!(self, Self::Unconstrained)
    }
}

impl Display for Uncertainty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => write!(f, "±{value:.0}"),
            Self::Unconstrained => f.write_str("uncertain"),
        }
    }
}

impl Serialize for Uncertainty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => serializer.serialize_f64(*value),
            Self::Unconstrained => serializer.serialize_str("uncertain"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureEstimate {
    pub temperature: f64,
    pub uncertainty: Uncertainty,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureRange {
    pub start: f64,
    pub end: f64,
}

/// Temperatures at which the piecewise-linear mean curve crosses `value`.
///
/// Every segment whose endpoint means bracket `value` (inclusive) contributes
/// one estimate, so a non-monotonic curve can yield several. Estimates are
/// then collapsed by temperature: when `value` equals the mean at an interior
/// calibration point, both neighbouring segments bracket it but only one
/// estimate is returned for that temperature, not one per segment.
pub fn find_temperatures_for_value(
    points: &[CalibrationPoint],
    value: f64,
) -> Vec<TemperatureEstimate> {
    let mut estimates: Vec<TemperatureEstimate> = Vec::new();
    if !value.is_finite() {
        return estimates;
    }

    for segment in points.windows(2) {
        let (p1, p2) = (segment[0], segment[1]);
        let low = p1.mean_value.min(p2.mean_value);
        let high = p1.mean_value.max(p2.mean_value);
        if value < low || value > high {
            continue;
        }

        let delta_mean = p2.mean_value - p1.mean_value;
        let estimate = if delta_mean.abs() < FLAT_SEGMENT_TOLERANCE {
            TemperatureEstimate {
                temperature: 0.5 * (p1.temperature + p2.temperature),
                uncertainty: Uncertainty::Unconstrained,
            }
        } else {
            let fraction = (value - p1.mean_value) / delta_mean;
            let delta_temperature = p2.temperature - p1.temperature;
            let std_dev = p1.std_dev + fraction * (p2.std_dev - p1.std_dev);
            let slope = delta_mean / delta_temperature;
            let uncertainty = (std_dev / slope).abs();
            TemperatureEstimate {
                temperature: p1.temperature + fraction * delta_temperature,
                uncertainty: if uncertainty.is_finite() {
                    Uncertainty::Value(uncertainty)
                } else {
                    Uncertainty::Unconstrained
                },
            }
        };

        let duplicate = estimates.iter().any(|existing| {
            (existing.temperature - estimate.temperature).abs() < COINCIDENT_TEMPERATURE_TOLERANCE
        });
        if !duplicate {
            estimates.push(estimate);
        }
    }
    estimates
}

/// Temperature ranges over which `value` lies inside the mean ± SD band.
///
/// Each segment is cut at the points where either envelope line crosses
/// `value`; pieces whose midpoint sits inside the band are kept, then
/// overlapping or touching pieces from all segments are merged. Cut points
/// that lie on the band themselves are kept as `[t, t]`, which is how a
/// zero-SD curve passing exactly through `value` is reported.
pub fn find_temperature_ranges_within_sd(
    points: &[CalibrationPoint],
    value: f64,
) -> Vec<TemperatureRange> {
    if !value.is_finite() {
        return Vec::new();
    }

    if let [point] = points {
        let within = (value - point.mean_value).abs() <= point.std_dev;
        return if within {
            vec![TemperatureRange {
                start: point.temperature,
                end: point.temperature,
            }]
        } else {
            Vec::new()
        };
    }

    let mut ranges = Vec::new();
    for segment in points.windows(2) {
        let (p1, p2) = (segment[0], segment[1]);
        let (t1, t2) = (p1.temperature, p2.temperature);
        if t2 <= t1 {
            continue;
        }

        let mut breakpoints = vec![t1, t2];
        let envelopes = [
            (p1.mean_value - p1.std_dev, p2.mean_value - p2.std_dev),
            (p1.mean_value + p1.std_dev, p2.mean_value + p2.std_dev),
        ];
        for (start, end) in envelopes {
            if let Some(crossing) = line_crossing(t1, t2, start, end, value) {
                breakpoints.push(crossing);
            }
        }
        breakpoints.sort_by(f64::total_cmp);
        breakpoints.dedup();

        let within_band = |temperature: f64, tolerance: f64| {
            let fraction = (temperature - t1) / (t2 - t1);
            let mean = p1.mean_value + fraction * (p2.mean_value - p1.mean_value);
            let std_dev = p1.std_dev + fraction * (p2.std_dev - p1.std_dev);
            value >= mean - std_dev - tolerance && value <= mean + std_dev + tolerance
        };

        for piece in breakpoints.windows(2) {
            let (start, end) = (piece[0], piece[1]);
            if within_band(0.5 * (start + end), 0.0) {
                ranges.push(TemperatureRange { start, end });
            }
        }
        let edge_tolerance = BAND_EDGE_TOLERANCE * value.abs().max(1.0);
        for &temperature in &breakpoints {
            if within_band(temperature, edge_tolerance) {
                ranges.push(TemperatureRange {
                    start: temperature,
                    end: temperature,
                });
            }
        }
    }

    merge_ranges(ranges)
}

fn line_crossing(t1: f64, t2: f64, y1: f64, y2: f64, value: f64) -> Option<f64> {
    let delta = y2 - y1;
    if delta.abs() < FLAT_SEGMENT_TOLERANCE {
        return None;
    }
    let fraction = (value - y1) / delta;
    (0.0..=1.0).contains(&fraction).then(|| t1 + fraction * (t2 - t1))
}

fn merge_ranges(mut ranges: Vec<TemperatureRange>) -> Vec<TemperatureRange> {
    ranges.sort_by(|left, right| left.start.total_cmp(&right.start));
    let mut merged: Vec<TemperatureRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(previous) if range.start <= previous.end => {
                previous.end = previous.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}
