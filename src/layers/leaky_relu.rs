use super::layer::{Layer, Mode, ParamGrad, Shape};
use crate::error::Result;
use crate::math::Matrix;

/// Default negative slope.
pub const SLOPE: f32 = 0.2;

/// Leaky ReLU activation. The derivative mask is recorded on every forward
/// pass.
pub struct LeakyRelu {
    slope: f32,
    mask: Vec<f32>,
}

impl LeakyRelu {
    pub fn new(slope: f32) -> Self {
        Self { slope, mask: Vec::new() }
    }

    pub fn slope(&self) -> f32 {
        self.slope
    }
}

impl Default for LeakyRelu {
    fn default() -> Self {
        Self::new(SLOPE)
    }
}

/// Apply leaky ReLU in place on a matrix and return the derivative mask.
pub fn forward_matrix(m: &mut Matrix, slope: f32) -> Vec<f32> {
    let mut mask = vec![1.0; m.data.len()];
    for (i, v) in m.data.iter_mut().enumerate() {
        if *v < 0.0 {
            *v *= slope;
            mask[i] = slope;
        }
    }
    mask
}

/// Apply derivative mask to gradient matrix.
pub fn backward(grad: &mut Matrix, mask: &[f32]) {
    for (g, &m) in grad.data.iter_mut().zip(mask.iter()) {
        *g *= m;
    }
}

impl Layer for LeakyRelu {
    fn name(&self) -> &'static str {
        "LeakyReLU"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape> {
        Ok(input)
    }

    fn forward(&mut self, x: &Matrix, _mode: Mode) -> Result<Matrix> {
        let mut out = x.clone();
        self.mask = forward_matrix(&mut out, self.slope);
        Ok(out)
    }

    fn backward(&mut self, grad_out: &Matrix, _param_grad: ParamGrad) -> Matrix {
        let mut grad = grad_out.clone();
        backward(&mut grad, &self.mask);
        grad
    }
}
