use super::layer::{Layer, Mode, ParamGrad, Shape};
use crate::error::Result;
use crate::math::Matrix;

/// Apply sigmoid activation in place on a matrix.
pub fn forward_matrix(m: &mut Matrix) {
    for v in m.data.iter_mut() {
        *v = 1.0 / (1.0 + (-*v).exp());
    }
}

/// Multiply gradient with derivative of sigmoid using activated values.
pub fn backward(grad: &mut Matrix, activated: &Matrix) {
    for (g, &h) in grad.data.iter_mut().zip(activated.data.iter()) {
        *g *= h * (1.0 - h);
    }
}

/// Sigmoid output layer, caching its activations for the backward pass.
#[derive(Default)]
pub struct Sigmoid {
    out: Matrix,
}

impl Sigmoid {
    pub fn new() -> Self {
        Self { out: Matrix::zeros(0, 0) }
    }
}

impl Layer for Sigmoid {
    fn name(&self) -> &'static str {
        "Sigmoid"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape> {
        Ok(input)
    }

    fn forward(&mut self, x: &Matrix, _mode: Mode) -> Result<Matrix> {
        let mut out = x.clone();
        forward_matrix(&mut out);
        self.out = out.clone();
        Ok(out)
    }

    fn backward(&mut self, grad_out: &Matrix, _param_grad: ParamGrad) -> Matrix {
        let mut grad = grad_out.clone();
        backward(&mut grad, &self.out);
        grad
    }
}
