//! Feature block pooling and concatenation

use crate::error::{ExperimentError, Result};
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};

/// Average a sequence of equal-length vectors into one vector of `dim`
/// entries. An empty sequence pools to zeros.
pub fn mean_pool<'a, I>(vectors: I, dim: usize) -> Result<Array1<f64>>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut sum = Array1::<f64>::zeros(dim);
    let mut count = 0usize;

    for v in vectors {
        if v.len() != dim {
            return Err(ExperimentError::ShapeError {
                expected: format!("vector of length {}", dim),
                actual: format!("vector of length {}", v.len()),
            });
        }
        for (s, x) in sum.iter_mut().zip(v.iter()) {
            *s += x;
        }
        count += 1;
    }

    if count > 0 {
        sum /= count as f64;
    }
    Ok(sum)
}

/// Stack pooled row vectors into an `n × dim` matrix
pub fn stack_rows(rows: &[Array1<f64>], dim: usize) -> Result<Array2<f64>> {
    let mut matrix = Array2::zeros((rows.len(), dim));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != dim {
            return Err(ExperimentError::ShapeError {
                expected: format!("row of length {}", dim),
                actual: format!("row {} of length {}", i, row.len()),
            });
        }
        matrix.row_mut(i).assign(row);
    }
    Ok(matrix)
}

/// Concatenate feature blocks column-wise, in the given order. Every block
/// must have the same number of rows.
pub fn concat_columns(blocks: &[Array2<f64>]) -> Result<Array2<f64>> {
    let first = blocks.first().ok_or_else(|| {
        ExperimentError::InvalidInput("no feature blocks to concatenate".to_string())
    })?;

    let n_rows = first.nrows();
    for block in &blocks[1..] {
        if block.nrows() != n_rows {
            return Err(ExperimentError::row_mismatch("feature block", n_rows, block.nrows()));
        }
    }

    let views: Vec<ArrayView2<f64>> = blocks.iter().map(|b| b.view()).collect();
    Ok(concatenate(Axis(1), &views)?)
}
