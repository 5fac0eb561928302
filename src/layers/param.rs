use rand::Rng;

use crate::math::Matrix;

/// A trainable tensor together with its accumulated gradient.
///
/// Optimizer state lives in the optimizer, not here, so a parameter can be
/// driven by exactly one optimizer instance.
#[derive(Clone, Debug)]
pub struct Param {
    pub value: Matrix,
    pub grad: Matrix,
}

impl Param {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            value: Matrix::zeros(rows, cols),
            grad: Matrix::zeros(rows, cols),
        }
    }

    /// Glorot/Xavier uniform initialisation: `U(-l, l)` with
    /// `l = sqrt(6 / (fan_in + fan_out))`.
    pub fn glorot(rows: usize, cols: usize, fan_in: usize, fan_out: usize, rng: &mut impl Rng) -> Self {
        let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
        let data = (0..rows * cols)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();
        Self {
            value: Matrix::from_vec(rows, cols, data),
            grad: Matrix::zeros(rows, cols),
        }
    }

    pub fn len(&self) -> usize {
        self.value.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.data.is_empty()
    }

    pub fn zero_grad(&mut self) {
        self.grad.data.iter_mut().for_each(|g| *g = 0.0);
    }

    pub fn accumulate(&mut self, grad: &Matrix) {
        self.grad.add_assign(grad);
    }
}
