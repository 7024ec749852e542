pub mod linalg;
pub mod smoothing;

pub use linalg::{
    DenseMatrix, LinalgError, dense_from_rows, invert_3x3, matrix_inverse, matrix_multiply,
    transpose,
};
pub use smoothing::{
    DEFAULT_POLYNOMIAL_ORDER, DEFAULT_WINDOW_SIZE, SavitzkyGolay, SmoothingError,
    default_smoother, savitzky_golay_coefficients, savitzky_golay_smooth,
};

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(stable_sum(values) / values.len() as f64)
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let center = mean(values)?;
    let squared: Vec<f64> = values
        .iter()
        .map(|value| (value - center) * (value - center))
        .collect();
    Some((stable_sum(&squared) / values.len() as f64).sqrt())
}

/// Index of the first maximum; ties keep the earliest sample.
pub fn first_argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, value) in values.iter().enumerate() {
        match best {
            Some(current) if *value <= values[current] => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Index of the first minimum; ties keep the earliest sample.
pub fn first_argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, value) in values.iter().enumerate() {
        match best {
            Some(current) if *value >= values[current] => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Linear interpolation on an ascending grid with boundary clamping.
pub fn interpolate_linear(x: f64, x_grid: &[f64], y_grid: &[f64]) -> Option<f64> {
    if x_grid.is_empty() || x_grid.len() != y_grid.len() {
        return None;
    }

    if let Some(index) = x_grid.iter().position(|grid_x| *grid_x == x) {
        return Some(y_grid[index]);
    }

    if x <= x_grid[0] {
        return Some(y_grid[0]);
    }

    let last_index = x_grid.len() - 1;
    if x >= x_grid[last_index] {
        return Some(y_grid[last_index]);
    }

    let upper = x_grid.iter().position(|grid_x| *grid_x >= x)?;
    let lower = upper - 1;
    let x0 = x_grid[lower];
    let x1 = x_grid[upper];
    if x1 == x0 {
        return Some(y_grid[lower]);
    }

    Some(y_grid[lower] + (y_grid[upper] - y_grid[lower]) * (x - x0) / (x1 - x0))
}

#[cfg(test)]
mod tests {
    use super::{
        first_argmax, first_argmin, interpolate_linear, mean, population_std_dev, stable_sum,
    };

    #[test]
    fn stable_sum_reduces_order_loss_for_large_and_small_values() {
        let input = [1.0e16, 1.0, -1.0e16];
        assert_eq!(stable_sum(&input), 0.0);
    }

    #[test]
    fn population_statistics_divide_by_count() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_std_dev(&[]), None);
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values).expect("mean") - 5.0).abs() < 1.0e-12);
        assert!((population_std_dev(&values).expect("sd") - 2.0).abs() < 1.0e-12);
        assert_eq!(population_std_dev(&[3.5]), Some(0.0));
    }

    #[test]
    fn argmax_and_argmin_keep_first_tie() {
        let values = [1.0, 3.0, 3.0, 0.5, 0.5];
        assert_eq!(first_argmax(&values), Some(1));
        assert_eq!(first_argmin(&values), Some(3));
        assert_eq!(first_argmax(&[]), None);
    }

    #[test]
    fn interpolate_linear_clamps_and_interpolates() {
        let x_grid = [0.0, 1.0, 2.0];
        let y_grid = [10.0, 20.0, 30.0];

        assert_eq!(interpolate_linear(-1.0, &x_grid, &y_grid), Some(10.0));
        assert_eq!(interpolate_linear(3.0, &x_grid, &y_grid), Some(30.0));
        assert_eq!(interpolate_linear(0.5, &x_grid, &y_grid), Some(15.0));
        assert_eq!(interpolate_linear(1.0, &x_grid, &y_grid), Some(20.0));
        assert_eq!(interpolate_linear(0.5, &[0.0, 1.0], &[1.0]), None);
    }
}
