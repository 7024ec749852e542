//! Savitzky-Golay smoothing.
//!
//! The kernel is the first row of `(XᵀX)⁻¹Xᵀ` for the Vandermonde design
//! matrix over offsets `-h..=h`. Near the edges, taps that fall outside the
//! data are dropped and the remaining weighted sum is used as-is (no
//! renormalisation), so the first and last `h` outputs are attenuated.

use super::linalg::{LinalgError, dense_from_rows, matrix_inverse, matrix_multiply, transpose};
use crate::domain::RamanError;

pub const DEFAULT_WINDOW_SIZE: usize = 11;
pub const DEFAULT_POLYNOMIAL_ORDER: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SmoothingError {
    #[error("window size must be odd and >= 3, got {window_size}")]
    InvalidWindow { window_size: usize },
    #[error(
        "polynomial order must be less than window size, got order {polynomial_order} for window {window_size}"
    )]
    OrderTooHigh {
        window_size: usize,
        polynomial_order: usize,
    },
    #[error("failed to derive smoothing coefficients: {0}")]
    Coefficients(#[from] LinalgError),
}

impl From<SmoothingError> for RamanError {
    fn from(error: SmoothingError) -> Self {
        match error {
            SmoothingError::InvalidWindow { .. } => {
                RamanError::input_validation("INPUT.SMOOTHING_WINDOW", error.to_string())
            }
            SmoothingError::OrderTooHigh { .. } => {
                RamanError::input_validation("INPUT.SMOOTHING_ORDER", error.to_string())
            }
            SmoothingError::Coefficients(_) => {
                RamanError::computation("RUN.SMOOTHING_COEFFICIENTS", error.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavitzkyGolay {
    window_size: usize,
    polynomial_order: usize,
    coefficients: Vec<f64>,
}

impl SavitzkyGolay {
    pub fn new(window_size: usize, polynomial_order: usize) -> Result<Self, SmoothingError> {
        let coefficients = savitzky_golay_coefficients(window_size, polynomial_order)?;
        Ok(Self {
            window_size,
            polynomial_order,
            coefficients,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn polynomial_order(&self) -> usize {
        self.polynomial_order
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn smooth(&self, data: &[f64]) -> Vec<f64> {
        let half_window = (self.window_size / 2) as isize;
        let len = data.len() as isize;

        (0..len)
            .map(|center| {
                let mut sum = 0.0;
                for offset in -half_window..=half_window {
                    let index = center + offset;
                    if index >= 0 && index < len {
                        sum += data[index as usize]
                            * self.coefficients[(offset + half_window) as usize];
                    }
                }
                sum
            })
            .collect()
    }
}

/// The filter every fitting path uses (window 11, quadratic).
pub fn default_smoother() -> Result<SavitzkyGolay, SmoothingError> {
    SavitzkyGolay::new(DEFAULT_WINDOW_SIZE, DEFAULT_POLYNOMIAL_ORDER)
}

pub fn savitzky_golay_smooth(
    data: &[f64],
    window_size: usize,
    polynomial_order: usize,
) -> Result<Vec<f64>, SmoothingError> {
    Ok(SavitzkyGolay::new(window_size, polynomial_order)?.smooth(data))
}

pub fn savitzky_golay_coefficients(
    window_size: usize,
    polynomial_order: usize,
) -> Result<Vec<f64>, SmoothingError> {
    if window_size % 2 == 0 || window_size < 3 {
        return Err(SmoothingError::InvalidWindow { window_size });
    }
    if polynomial_order >= window_size {
        return Err(SmoothingError::OrderTooHigh {
            window_size,
            polynomial_order,
        });
    }

    let half_window = (window_size / 2) as i32;
    let design_rows: Vec<Vec<f64>> = (-half_window..=half_window)
        .map(|offset| {
            (0..=polynomial_order)
                .map(|power| f64::from(offset).powi(power as i32))
                .collect()
        })
        .collect();

    let design = dense_from_rows(&design_rows)?;
    let design_t = transpose(&design);
    let normal = matrix_multiply(&design_t, &design)?;
    let normal_inv = matrix_inverse(&normal)?;
    let projection = matrix_multiply(&normal_inv, &design_t)?;

    Ok((0..window_size).map(|col| projection[(0, col)]).collect())
}

#[cfg(test)]
mod tests {
    use super::{
        SavitzkyGolay, SmoothingError, default_smoother, savitzky_golay_coefficients,
        savitzky_golay_smooth,
    };
    use crate::domain::RamanErrorCategory;

    #[test]
    fn rejects_even_or_tiny_windows() {
        assert_eq!(
            SavitzkyGolay::new(4, 2),
            Err(SmoothingError::InvalidWindow { window_size: 4 })
        );
        assert_eq!(
            SavitzkyGolay::new(1, 0),
            Err(SmoothingError::InvalidWindow { window_size: 1 })
        );
        assert_eq!(
            SavitzkyGolay::new(5, 5),
            Err(SmoothingError::OrderTooHigh {
                window_size: 5,
                polynomial_order: 5,
            })
        );
    }

    #[test]
    fn invalid_configuration_maps_to_input_validation() {
        let error: crate::domain::RamanError = SmoothingError::InvalidWindow { window_size: 4 }.into();
        assert_eq!(error.category(), RamanErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.SMOOTHING_WINDOW");
    }

    #[test]
    fn five_point_quadratic_kernel_matches_classic_table() {
        let coefficients = savitzky_golay_coefficients(5, 2).expect("coefficients");
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|value| value / 35.0);
        for (actual, expected) in coefficients.iter().zip(expected) {
            assert!((actual - expected).abs() < 1.0e-12);
        }
    }

    #[test]
    fn kernel_sums_to_one_for_every_supported_order() {
        for (window, order) in [(5, 2), (11, 2), (7, 3), (9, 4), (11, 0)] {
            let coefficients = savitzky_golay_coefficients(window, order).expect("coefficients");
            let sum: f64 = coefficients.iter().sum();
            assert!((sum - 1.0).abs() < 1.0e-9, "window {window} order {order}: {sum}");
        }
    }

    #[test]
    fn constant_input_is_preserved_away_from_edges() {
        let data = vec![5.0; 40];
        let smoothed = default_smoother().expect("filter").smooth(&data);
        assert_eq!(smoothed.len(), data.len());
        for value in &smoothed[5..35] {
            assert!((value - 5.0).abs() < 1.0e-9);
        }
        // truncated edge sums are not renormalised
        assert!((smoothed[0] - 5.0).abs() > 1.0e-3);
    }

    #[test]
    fn quadratic_signal_passes_through_interior_unchanged() {
        let data: Vec<f64> = (0..30)
            .map(|index| {
                let x = index as f64;
                0.5 * x * x - 3.0 * x + 2.0
            })
            .collect();
        let smoothed = savitzky_golay_smooth(&data, 7, 2).expect("smoothing");
        for index in 3..27 {
            assert!((smoothed[index] - data[index]).abs() < 1.0e-8);
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(savitzky_golay_smooth(&[], 5, 2).expect("smoothing").is_empty());
    }
}
