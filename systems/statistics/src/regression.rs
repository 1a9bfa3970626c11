//! Polynomial least-squares fitting behind a swappable backend trait.

use thiserror::Error;
use zombie_defence_core::SeriesPoint;

const PIVOT_EPSILON: f64 = 1e-12;

/// Failure reported by a regression backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegressionError {
    /// Fewer points than coefficients to estimate.
    #[error("cannot fit degree {degree} polynomial through {points} points")]
    NotEnoughPoints {
        /// Points supplied.
        points: usize,
        /// Degree requested.
        degree: usize,
    },
    /// The normal equations have no unique solution.
    #[error("normal equations are singular")]
    Singular,
    /// An input coordinate was NaN or infinite.
    #[error("series contains a non-finite value")]
    NonFinite,
}

/// Capability that fits polynomials to a series.
///
/// The statistical engine is generic over this trait so the math backend is
/// chosen at compile time. [`LeastSquares`] is the built-in implementation.
pub trait RegressionBackend {
    /// Fits a polynomial of the requested degree through `points`.
    fn fit_polynomial(
        &self,
        points: &[SeriesPoint],
        degree: usize,
    ) -> Result<Polynomial, RegressionError>;
}

/// Polynomial stored as coefficients of increasing power.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Creates a polynomial from coefficients ordered constant term first.
    #[must_use]
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Coefficients ordered constant term first.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Degree of the polynomial. The zero polynomial reports degree zero.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluates the polynomial at `x` using Horner's scheme.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, coefficient| acc * x + coefficient)
    }
}

/// Pure-Rust ordinary least squares via the normal equations.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeastSquares;

impl RegressionBackend for LeastSquares {
    fn fit_polynomial(
        &self,
        points: &[SeriesPoint],
        degree: usize,
    ) -> Result<Polynomial, RegressionError> {
        let size = degree + 1;
        if points.len() < size {
            return Err(RegressionError::NotEnoughPoints {
                points: points.len(),
                degree,
            });
        }

        if points
            .iter()
            .any(|point| !point.x.is_finite() || !point.y.is_finite())
        {
            return Err(RegressionError::NonFinite);
        }

        // Power sums Σxᵏ for k in 0..=2·degree feed the Gram matrix.
        let mut power_sums = vec![0.0; 2 * degree + 1];
        let mut rhs = vec![0.0; size];
        for point in points {
            let mut power = 1.0;
            for (k, sum) in power_sums.iter_mut().enumerate() {
                *sum += power;
                if k < size {
                    rhs[k] += point.y * power;
                }
                power *= point.x;
            }
        }

        let mut matrix = (0..size)
            .map(|row| power_sums[row..row + size].to_vec())
            .collect::<Vec<_>>();

        solve_in_place(&mut matrix, &mut rhs)?;
        Ok(Polynomial::new(rhs))
    }
}

/// Gaussian elimination with partial pivoting. The solution replaces `rhs`.
fn solve_in_place(matrix: &mut [Vec<f64>], rhs: &mut [f64]) -> Result<(), RegressionError> {
    let size = rhs.len();

    for column in 0..size {
        let pivot_row = (column..size)
            .max_by(|a, b| matrix[*a][column].abs().total_cmp(&matrix[*b][column].abs()))
            .unwrap_or(column);

        let scale = matrix
            .iter()
            .skip(column)
            .map(|row| row[column].abs())
            .fold(1.0, f64::max);
        if matrix[pivot_row][column].abs() <= PIVOT_EPSILON * scale {
            return Err(RegressionError::Singular);
        }

        matrix.swap(column, pivot_row);
        rhs.swap(column, pivot_row);

        for row in column + 1..size {
            let factor = matrix[row][column] / matrix[column][column];
            if factor == 0.0 {
                continue;
            }
            for k in column..size {
                let pivot_value = matrix[column][k];
                matrix[row][k] -= factor * pivot_value;
            }
            let pivot_rhs = rhs[column];
            rhs[row] -= factor * pivot_rhs;
        }
    }

    for row in (0..size).rev() {
        let tail = (row + 1..size)
            .map(|k| matrix[row][k] * rhs[k])
            .sum::<f64>();
        rhs[row] = (rhs[row] - tail) / matrix[row][row];
    }

    Ok(())
}
