use rand::Rng;

use super::layer::{Layer, Mode, ParamGrad, Shape};
use super::param::Param;
use crate::error::{GanError, Result};
use crate::math::Matrix;

// Fully connected layer `y = x W + b`. The last input is cached during the
// forward pass so the backward pass can form the weight gradient `x^T g`.

pub struct Dense {
    pub w: Param,
    pub b: Param,
    last_x: Matrix,
}

impl Dense {
    pub fn new(in_dim: usize, out_dim: usize, rng: &mut impl Rng) -> Self {
        Self {
            w: Param::glorot(in_dim, out_dim, in_dim, out_dim, rng),
            b: Param::zeros(1, out_dim),
            last_x: Matrix::zeros(0, 0),
        }
    }

    pub fn in_dim(&self) -> usize {
        self.w.value.rows
    }

    pub fn out_dim(&self) -> usize {
        self.w.value.cols
    }
}

impl Layer for Dense {
    fn name(&self) -> &'static str {
        "Dense"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape> {
        if input.len() != self.in_dim() {
            return Err(GanError::shape("Dense", self.in_dim(), input.len()));
        }
        Ok(Shape::flat(self.out_dim()))
    }

    fn forward(&mut self, x: &Matrix, _mode: Mode) -> Result<Matrix> {
        if x.cols != self.in_dim() {
            return Err(GanError::shape("Dense", self.in_dim(), x.cols));
        }
        self.last_x = x.clone();
        let mut out = Matrix::matmul(x, &self.w.value);
        out.add_row(&self.b.value);
        Ok(out)
    }

    fn backward(&mut self, grad_out: &Matrix, param_grad: ParamGrad) -> Matrix {
        if param_grad == ParamGrad::Accumulate {
            let grad_w = Matrix::matmul(&self.last_x.transpose(), grad_out);
            self.w.accumulate(&grad_w);
            self.b.accumulate(&grad_out.sum_rows());
        }
        Matrix::matmul(grad_out, &self.w.value.transpose())
    }

    fn parameters(&mut self) -> Vec<&mut Param> {
        vec![&mut self.w, &mut self.b]
    }

    fn param_count(&self) -> usize {
        self.w.len() + self.b.len()
    }
}
