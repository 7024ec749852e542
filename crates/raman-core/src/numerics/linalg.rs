//! Small dense real-matrix helpers used to derive Savitzky-Golay kernels.
//!
//! Matrices are `faer::Mat<f64>` and are only ever a few rows/columns wide
//! (window size by polynomial order + 1), so everything here is plain loops.

use faer::Mat;

pub type DenseMatrix = Mat<f64>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinalgError {
    #[error("matrix must be non-empty")]
    Empty,
    #[error("matrix inverse requires a square matrix, got {rows}x{cols}")]
    NonSquare { rows: usize, cols: usize },
    #[error("cannot multiply {lhs_rows}x{lhs_cols} by {rhs_rows}x{rhs_cols}")]
    ShapeMismatch {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },
    #[error("matrix not invertible")]
    NotInvertible,
}

pub fn dense_from_rows(rows: &[Vec<f64>]) -> Result<DenseMatrix, LinalgError> {
    let row_count = rows.len();
    let col_count = rows.first().map(Vec::len).unwrap_or(0);
    if row_count == 0 || col_count == 0 {
        return Err(LinalgError::Empty);
    }

    let mut matrix = DenseMatrix::zeros(row_count, col_count);
    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != col_count {
            return Err(LinalgError::ShapeMismatch {
                lhs_rows: row_count,
                lhs_cols: col_count,
                rhs_rows: row_index + 1,
                rhs_cols: row.len(),
            });
        }
        for (col_index, value) in row.iter().copied().enumerate() {
            matrix[(row_index, col_index)] = value;
        }
    }
    Ok(matrix)
}

pub fn transpose(matrix: &DenseMatrix) -> DenseMatrix {
    let mut transposed = DenseMatrix::zeros(matrix.ncols(), matrix.nrows());
    for row in 0..matrix.nrows() {
        for col in 0..matrix.ncols() {
            transposed[(col, row)] = matrix[(row, col)];
        }
    }
    transposed
}

pub fn matrix_multiply(lhs: &DenseMatrix, rhs: &DenseMatrix) -> Result<DenseMatrix, LinalgError> {
    if lhs.ncols() != rhs.nrows() {
        return Err(LinalgError::ShapeMismatch {
            lhs_rows: lhs.nrows(),
            lhs_cols: lhs.ncols(),
            rhs_rows: rhs.nrows(),
            rhs_cols: rhs.ncols(),
        });
    }

    let mut product = DenseMatrix::zeros(lhs.nrows(), rhs.ncols());
    for row in 0..lhs.nrows() {
        for col in 0..rhs.ncols() {
            let mut sum = 0.0;
            for inner in 0..lhs.ncols() {
                sum += lhs[(row, inner)] * rhs[(inner, col)];
            }
            product[(row, col)] = sum;
        }
    }
    Ok(product)
}

/// Inverts a square matrix. 3x3 inputs use the explicit adjugate formula;
/// other sizes fall back to Gauss-Jordan elimination with partial pivoting.
/// Only an exactly-zero determinant (or pivot) is treated as singular.
pub fn matrix_inverse(matrix: &DenseMatrix) -> Result<DenseMatrix, LinalgError> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows == 0 || cols == 0 {
        return Err(LinalgError::Empty);
    }
    if rows != cols {
        return Err(LinalgError::NonSquare { rows, cols });
    }

    if rows == 3 {
        invert_3x3(matrix)
    } else {
        invert_gauss_jordan(matrix)
    }
}

pub fn invert_3x3(matrix: &DenseMatrix) -> Result<DenseMatrix, LinalgError> {
    if matrix.nrows() != 3 || matrix.ncols() != 3 {
        return Err(LinalgError::NonSquare {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
        });
    }

    let (a, b, c) = (matrix[(0, 0)], matrix[(0, 1)], matrix[(0, 2)]);
    let (d, e, f) = (matrix[(1, 0)], matrix[(1, 1)], matrix[(1, 2)]);
    let (g, h, i) = (matrix[(2, 0)], matrix[(2, 1)], matrix[(2, 2)]);

    let determinant = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
    if determinant == 0.0 {
        return Err(LinalgError::NotInvertible);
    }
    let inv_det = 1.0 / determinant;

    let adjugate = [
        [e * i - f * h, c * h - b * i, b * f - c * e],
        [f * g - d * i, a * i - c * g, c * d - a * f],
        [d * h - e * g, b * g - a * h, a * e - b * d],
    ];

    let mut inverse = DenseMatrix::zeros(3, 3);
    for (row, values) in adjugate.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            inverse[(row, col)] = value * inv_det;
        }
    }
    Ok(inverse)
}

fn invert_gauss_jordan(matrix: &DenseMatrix) -> Result<DenseMatrix, LinalgError> {
    let dimension = matrix.nrows();
    let mut work = matrix.clone();
    let mut inverse = DenseMatrix::zeros(dimension, dimension);
    for index in 0..dimension {
        inverse[(index, index)] = 1.0;
    }

    for pivot_col in 0..dimension {
        let mut pivot_row = pivot_col;
        for row in (pivot_col + 1)..dimension {
            if work[(row, pivot_col)].abs() > work[(pivot_row, pivot_col)].abs() {
                pivot_row = row;
            }
        }

        let pivot = work[(pivot_row, pivot_col)];
        if pivot == 0.0 {
            return Err(LinalgError::NotInvertible);
        }

        if pivot_row != pivot_col {
            swap_rows(&mut work, pivot_col, pivot_row);
            swap_rows(&mut inverse, pivot_col, pivot_row);
        }

        for col in 0..dimension {
            work[(pivot_col, col)] /= pivot;
            inverse[(pivot_col, col)] /= pivot;
        }

        for row in 0..dimension {
            if row == pivot_col {
                continue;
            }
            let factor = work[(row, pivot_col)];
            if factor == 0.0 {
                continue;
            }
            for col in 0..dimension {
                work[(row, col)] -= factor * work[(pivot_col, col)];
                inverse[(row, col)] -= factor * inverse[(pivot_col, col)];
            }
        }
    }

    Ok(inverse)
}

fn swap_rows(matrix: &mut DenseMatrix, lhs: usize, rhs: usize) {
    for col in 0..matrix.ncols() {
        let value = matrix[(lhs, col)];
        matrix[(lhs, col)] = matrix[(rhs, col)];
        matrix[(rhs, col)] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DenseMatrix, LinalgError, dense_from_rows, invert_3x3, matrix_inverse, matrix_multiply,
        transpose,
    };

    fn assert_identity(matrix: &DenseMatrix, tolerance: f64) {
        for row in 0..matrix.nrows() {
            for col in 0..matrix.ncols() {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert!(
                    (matrix[(row, col)] - expected).abs() <= tolerance,
                    "entry ({row},{col}) was {}",
                    matrix[(row, col)]
                );
            }
        }
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let matrix = dense_from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).expect("matrix");
        let transposed = transpose(&matrix);
        assert_eq!(transposed.nrows(), 3);
        assert_eq!(transposed.ncols(), 2);
        assert_eq!(transposed[(2, 0)], 3.0);
        assert_eq!(transposed[(0, 1)], 4.0);
    }

    #[test]
    fn multiply_checks_inner_dimensions() {
        let lhs = dense_from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).expect("lhs");
        let rhs = dense_from_rows(&[vec![5.0], vec![6.0]]).expect("rhs");
        let product = matrix_multiply(&lhs, &rhs).expect("product");
        assert_eq!(product[(0, 0)], 17.0);
        assert_eq!(product[(1, 0)], 39.0);

        let error = matrix_multiply(&rhs, &rhs).expect_err("2x1 by 2x1 is invalid");
        assert!(matches!(error, LinalgError::ShapeMismatch { .. }));
    }

    #[test]
    fn adjugate_inverse_reproduces_identity() {
        let matrix = dense_from_rows(&[
            vec![11.0, 0.0, 110.0],
            vec![0.0, 110.0, 0.0],
            vec![110.0, 0.0, 1958.0],
        ])
        .expect("matrix");
        let inverse = invert_3x3(&matrix).expect("matrix should be invertible");
        let product = matrix_multiply(&matrix, &inverse).expect("product");
        assert_identity(&product, 1.0e-12);
    }

    #[test]
    fn singular_matrix_is_rejected_only_at_exact_zero_determinant() {
        let singular = dense_from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![2.0, 4.0, 6.0],
            vec![1.0, 1.0, 1.0],
        ])
        .expect("matrix");
        assert_eq!(invert_3x3(&singular), Err(LinalgError::NotInvertible));
        assert_eq!(
            LinalgError::NotInvertible.to_string(),
            "matrix not invertible"
        );
    }

    #[test]
    fn general_inverse_handles_other_square_sizes() {
        let matrix = dense_from_rows(&[
            vec![4.0, 7.0, 2.0, 0.0],
            vec![3.0, 6.0, 1.0, 2.0],
            vec![2.0, 5.0, 3.0, 1.0],
            vec![0.0, 1.0, 2.0, 5.0],
        ])
        .expect("matrix");
        let inverse = matrix_inverse(&matrix).expect("matrix should be invertible");
        let product = matrix_multiply(&matrix, &inverse).expect("product");
        assert_identity(&product, 1.0e-10);

        let rectangular = dense_from_rows(&[vec![1.0, 2.0]]).expect("matrix");
        assert_eq!(
            matrix_inverse(&rectangular),
            Err(LinalgError::NonSquare { rows: 1, cols: 2 })
        );
    }
}
