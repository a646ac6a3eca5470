//! Column moments of a (rows × assets) matrix.

use ndarray::{Array1, Array2, Axis};

use crate::MathError;

/// Standard deviations below this value are treated as zero.
pub const ZERO_VARIANCE_EPS: f64 = 1e-12;

fn check_input(data: &Array2<f64>, min_rows: usize) -> Result<(), MathError> {
    if data.is_empty() {
        return Err(MathError::EmptyData);
    }
    if data.nrows() < min_rows {
        return Err(MathError::TooFewObservations { required: min_rows, actual: data.nrows() });
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(MathError::NumericalInstability("input contains NaN or Inf".to_string()));
    }
    Ok(())
}

/// Full-sample mean of every column.
///
/// # Errors
/// Returns error on empty or non-finite input.
pub fn column_means(data: &Array2<f64>) -> Result<Array1<f64>, MathError> {
    check_input(data, 1)?;
    data.mean_axis(Axis(0)).ok_or(MathError::EmptyData)
}

/// Subtract each column's full-sample mean.
///
/// # Returns
/// The demeaned matrix and the column means that were removed.
///
/// # Errors
/// Returns error on empty or non-finite input.
pub fn demean_columns(data: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>), MathError> {
    let means = column_means(data)?;
    let centered = data - &means;
    Ok((centered, means))
}

/// Sample standard deviation (n - 1 denominator) of every column.
///
/// # Errors
/// Returns error on non-finite input or fewer than two rows.
pub fn column_std(data: &Array2<f64>) -> Result<Array1<f64>, MathError> {
    check_input(data, 2)?;
    Ok(data.std_axis(Axis(0), 1.0))
}

/// Sample covariance matrix of the columns.
///
/// Columns are demeaned internally, so already-centered input is accepted as is.
///
/// # Errors
/// Returns error on non-finite input or fewer than two rows.
pub fn covariance_matrix(data: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    check_input(data, 2)?;
    let (centered, _) = demean_columns(data)?;
    let n = data.nrows() as f64;

    let mut cov = centered.t().dot(&centered) / (n - 1.0);
    symmetrize(&mut cov);
    Ok(cov)
}

/// Pearson correlation matrix of the columns.
///
/// A column whose standard deviation is below [`ZERO_VARIANCE_EPS`] yields a
/// zero row and column, diagonal included.
///
/// # Errors
/// Returns error on non-finite input or fewer than two rows.
pub fn correlation_matrix(data: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let cov = covariance_matrix(data)?;
    let n = cov.nrows();
    let std_devs: Vec<f64> = (0..n).map(|i| cov[[i, i]].max(0.0).sqrt()).collect();

    let mut corr = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            if std_devs[i] > ZERO_VARIANCE_EPS && std_devs[j] > ZERO_VARIANCE_EPS {
                corr[[i, j]] = (cov[[i, j]] / (std_devs[i] * std_devs[j])).clamp(-1.0, 1.0);
            }
        }
    }
    Ok(corr)
}

fn symmetrize(m: &mut Array2<f64>) {
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (m[[i, j]] + m[[j, i]]);
            m[[i, j]] = avg;
            m[[j, i]] = avg;
        }
    }
}
