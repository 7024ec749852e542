use crate::spectrum::Spectrum;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthAtHeight {
    pub left_x: f64,
    pub right_x: f64,
    pub width: f64,
    pub target_height: f64,
}

/// Full width at `fraction` of the peak intensity, walking the raw samples.
///
/// The walk starts at the first sample at or above `peak_wavelength` and
/// moves outward while the intensity stays strictly above the target. The
/// crossing is the sample where the walk stopped; nothing is interpolated.
pub fn width_at_height(
    spectrum: &Spectrum,
    peak_wavelength: f64,
    peak_intensity: f64,
    fraction: f64,
) -> Option<WidthAtHeight> {
    let wavelengths = spectrum.wavelengths();
    let intensities = spectrum.intensities();
    let target_height = peak_intensity * fraction;

    let start = wavelengths
        .iter()
        .position(|wavelength| *wavelength >= peak_wavelength)?;

    let mut left = start;
    while left > 0 && intensities[left] > target_height {
        left -= 1;
    }
    let mut right = start;
    while right + 1 < intensities.len() && intensities[right] > target_height {
        right += 1;
    }

    let left_x = wavelengths[left];
    let right_x = wavelengths[right];
    Some(WidthAtHeight {
        left_x,
        right_x,
        width: right_x - left_x,
        target_height,
    })
}
