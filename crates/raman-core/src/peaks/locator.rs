use crate::domain::{Band, Interval};
use crate::numerics::{first_argmax, first_argmin};
use crate::spectrum::Spectrum;

pub const DEFAULT_DIVISION_POINT: f64 = 1500.0;
pub const DIVISION_MARGIN: f64 = 50.0;
pub const BROAD_WINDOW_START: f64 = 1150.0;
pub const BROAD_WINDOW_END: f64 = 1700.0;

/// Wavelength of the most intense sample inside each interval, compared on
/// `values` (raw intensities for the simple method, smoothed for fitting).
/// An interval without samples yields `None`.
pub fn locate_approximate_peaks(
    spectrum: &Spectrum,
    intervals: [Interval; 2],
    values: &[f64],
) -> [Option<f64>; 2] {
    intervals.map(|interval| locate_peak(spectrum, interval, values).map(|(x, _)| x))
}

/// `(wavelength, value)` of the first maximum inside `interval`.
pub fn locate_peak(spectrum: &Spectrum, interval: Interval, values: &[f64]) -> Option<(f64, f64)> {
    let indices = spectrum.points_in(interval);
    let window: Vec<f64> = indices.iter().map(|index| values[*index]).collect();
    let best = indices[first_argmax(&window)?];
    Some((spectrum.wavelengths()[best], values[best]))
}

/// Valley between the two approximate centres, pushed at least
/// [`DIVISION_MARGIN`] away from each centre.
///
/// When the centres are closer than twice the margin the clamp resolves to
/// `d_center + DIVISION_MARGIN`, which lies past `g_center - DIVISION_MARGIN`.
pub fn division_point(spectrum: &Spectrum, values: &[f64], centers: [Option<f64>; 2]) -> f64 {
    let [Some(d_center), Some(g_center)] = centers else {
        return DEFAULT_DIVISION_POINT;
    };
    if d_center >= g_center {
        return DEFAULT_DIVISION_POINT;
    }

    let indices = spectrum.points_in(Interval::new(d_center, g_center));
    let valley_values: Vec<f64> = indices.iter().map(|index| values[*index]).collect();
    let Some(valley) = first_argmin(&valley_values) else {
        return DEFAULT_DIVISION_POINT;
    };
    let valley_x = spectrum.wavelengths()[indices[valley]];

    let clamped = (d_center + DIVISION_MARGIN).max(valley_x.min(g_center - DIVISION_MARGIN));
    if clamped != valley_x {
        tracing::debug!(valley_x, clamped, "division point clamped away from peak centres");
    }
    clamped
}

/// Broad fitting windows either side of the division point.
pub fn fitting_windows(division_point: f64) -> [Interval; 2] {
    [
        Interval::new(BROAD_WINDOW_START, division_point),
        Interval::new(division_point, BROAD_WINDOW_END),
    ]
}

pub fn fitting_window(band: Band, division_point: f64) -> Interval {
    fitting_windows(division_point)[band.index()]
}
