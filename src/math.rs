use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{GanError, Result};

static MATRIX_OPS: AtomicUsize = AtomicUsize::new(0);

pub fn reset_matrix_ops() {
    MATRIX_OPS.store(0, Ordering::SeqCst);
}

pub fn matrix_ops_count() -> usize {
    MATRIX_OPS.load(Ordering::SeqCst)
}

pub(crate) fn inc_ops() {
    MATRIX_OPS.fetch_add(1, Ordering::SeqCst);
}

/// Row-major matrix. Batches are stored one sample per row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(r: usize, c: usize) -> Self {
        Matrix {
            rows: r,
            cols: c,
            data: vec![0.0; r * c],
        }
    }

    pub fn filled(r: usize, c: usize, value: f32) -> Self {
        Matrix {
            rows: r,
            cols: c,
            data: vec![value; r * c],
        }
    }

    pub fn from_vec(r: usize, c: usize, v: Vec<f32>) -> Self {
        assert_eq!(v.len(), r * c);
        Matrix {
            rows: r,
            cols: c,
            data: v,
        }
    }

    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f32) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
        inc_ops();
        assert_eq!(a.cols, b.rows);
        let mut out = vec![0.0; a.rows * b.cols];
        for i in 0..a.rows {
            let a_row = &a.data[i * a.cols..(i + 1) * a.cols];
            let out_row = &mut out[i * b.cols..(i + 1) * b.cols];
            for k in 0..a.cols {
                let a_val = a_row[k];
                if a_val == 0.0 {
                    continue;
                }
                let b_row = &b.data[k * b.cols..(k + 1) * b.cols];
                for (o, &bv) in out_row.iter_mut().zip(b_row) {
                    *o += a_val * bv;
                }
            }
        }
        Matrix::from_vec(a.rows, b.cols, out)
    }

    pub fn add(&self, other: &Matrix) -> Matrix {
        inc_ops();
        assert_eq!(self.rows, other.rows);
        assert_eq!(self.cols, other.cols);
        let v = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a + b)
            .collect();
        Matrix::from_vec(self.rows, self.cols, v)
    }

    /// In-place `self += other`.
    pub fn add_assign(&mut self, other: &Matrix) {
        inc_ops();
        assert_eq!(self.data.len(), other.data.len());
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }

    /// Add a `1 x cols` row vector to every row.
    pub fn add_row(&mut self, row: &Matrix) {
        inc_ops();
        assert_eq!(row.rows, 1);
        assert_eq!(row.cols, self.cols);
        for r in 0..self.rows {
            for (v, b) in self.data[r * self.cols..(r + 1) * self.cols]
                .iter_mut()
                .zip(&row.data)
            {
                *v += b;
            }
        }
    }

    /// Column sums as a `1 x cols` matrix.
    pub fn sum_rows(&self) -> Matrix {
        inc_ops();
        let mut out = vec![0.0; self.cols];
        for r in 0..self.rows {
            for (o, v) in out.iter_mut().zip(self.row(r)) {
                *o += v;
            }
        }
        Matrix::from_vec(1, self.cols, out)
    }

    pub fn transpose(&self) -> Matrix {
        inc_ops();
        let mut v = vec![0.0; self.rows * self.cols];
        for i in 0..self.rows {
            for j in 0..self.cols {
                v[j * self.rows + i] = self.get(i, j);
            }
        }
        Matrix::from_vec(self.cols, self.rows, v)
    }

    /// Stack the rows of `bottom` under the rows of `top`.
    pub fn concat_rows(top: &Matrix, bottom: &Matrix) -> Result<Matrix> {
        if top.cols != bottom.cols {
            return Err(GanError::shape(
                "concat_rows",
                format!("{} columns", top.cols),
                format!("{} columns", bottom.cols),
            ));
        }
        let mut data = Vec::with_capacity(top.data.len() + bottom.data.len());
        data.extend_from_slice(&top.data);
        data.extend_from_slice(&bottom.data);
        Ok(Matrix::from_vec(top.rows + bottom.rows, top.cols, data))
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

/// Clipping bound applied to probabilities before taking logarithms.
pub const BCE_EPSILON: f32 = 1e-7;

/// Binary cross-entropy between predicted probabilities and targets.
///
/// Returns the loss averaged over all elements and the gradient with respect
/// to `probs`. Probabilities are clipped to `[eps, 1 - eps]` so the loss stays
/// finite for saturated predictions; targets are used as given, which allows
/// smoothed labels.
pub fn binary_cross_entropy(probs: &Matrix, targets: &Matrix) -> (f32, Matrix) {
    assert_eq!(probs.data.len(), targets.data.len());
    let n = probs.data.len().max(1) as f32;
    let mut grad = Matrix::zeros(probs.rows, probs.cols);
    let mut loss = 0.0f32;
    for i in 0..probs.data.len() {
        let p = probs.data[i].clamp(BCE_EPSILON, 1.0 - BCE_EPSILON);
        let y = targets.data[i];
        loss -= y * (p + BCE_EPSILON).ln() + (1.0 - y) * (1.0 - p + BCE_EPSILON).ln();
        grad.data[i] = (p - y) / (p * (1.0 - p)) / n;
    }
    (loss / n, grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bce_of_confident_correct_prediction_is_small() {
        let p = Matrix::from_vec(2, 1, vec![0.01, 0.99]);
        let y = Matrix::from_vec(2, 1, vec![0.0, 1.0]);
        let (loss, _) = binary_cross_entropy(&p, &y);
        assert_relative_eq!(loss, -(0.99f32 + BCE_EPSILON).ln(), epsilon = 1e-4);
    }

    #[test]
    fn bce_gradient_matches_finite_difference() {
        let p = Matrix::from_vec(3, 1, vec![0.2, 0.5, 0.7]);
        let y = Matrix::from_vec(3, 1, vec![0.1, 1.0, 0.0]);
        let (_, grad) = binary_cross_entropy(&p, &y);
        let h = 1e-3;
        for i in 0..3 {
            let mut up = p.clone();
            up.data[i] += h;
            let mut down = p.clone();
            down.data[i] -= h;
            let numeric =
                (binary_cross_entropy(&up, &y).0 - binary_cross_entropy(&down, &y).0) / (2.0 * h);
            assert_relative_eq!(grad.data[i], numeric, epsilon = 1e-2);
        }
    }

    #[test]
    fn bce_stays_finite_at_saturation() {
        let p = Matrix::from_vec(2, 1, vec![0.0, 1.0]);
        let y = Matrix::from_vec(2, 1, vec![1.0, 0.0]);
        let (loss, grad) = binary_cross_entropy(&p, &y);
        assert!(loss.is_finite());
        assert!(grad.is_finite());
    }

    #[test]
    fn concat_rows_rejects_width_mismatch() {
        let a = Matrix::zeros(1, 2);
        let b = Matrix::zeros(1, 3);
        assert!(Matrix::concat_rows(&a, &b).is_err());
    }
}
