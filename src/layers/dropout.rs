use rand::rngs::StdRng;
use rand::Rng;

use super::layer::{Layer, Mode, ParamGrad, Shape};
use crate::error::Result;
use crate::math::Matrix;

/// Dropout layer that randomly zeros elements during training.
///
/// In [`Mode::Train`] each element is kept with probability `1 - rate` and
/// scaled by `1/(1 - rate)` ("inverted" dropout) so that inference needs no
/// rescaling. In [`Mode::Infer`] the input passes through unchanged. The
/// generated mask is stored so that it can be reused during the backward
/// pass.
pub struct Dropout {
    rate: f32,
    mask: Vec<f32>,
    rng: StdRng,
}

impl Dropout {
    pub fn new(rate: f32, rng: StdRng) -> Self {
        Self {
            rate,
            mask: Vec::new(),
            rng,
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl Layer for Dropout {
    fn name(&self) -> &'static str {
        "Dropout"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape> {
        Ok(input)
    }

    fn forward(&mut self, x: &Matrix, mode: Mode) -> Result<Matrix> {
        match mode {
            Mode::Train => {
                let scale = if self.rate < 1.0 { 1.0 / (1.0 - self.rate) } else { 0.0 };
                let rate = self.rate;
                let rng = &mut self.rng;
                self.mask = (0..x.data.len())
                    .map(|_| if rng.gen::<f32>() < rate { 0.0 } else { scale })
                    .collect();
                let data = x.data.iter().zip(&self.mask).map(|(v, m)| v * m).collect();
                Ok(Matrix::from_vec(x.rows, x.cols, data))
            }
            Mode::Infer => {
                self.mask = vec![1.0; x.data.len()];
                Ok(x.clone())
            }
        }
    }

    fn backward(&mut self, grad_out: &Matrix, _param_grad: ParamGrad) -> Matrix {
        let data = grad_out
            .data
            .iter()
            .zip(&self.mask)
            .map(|(g, m)| g * m)
            .collect();
        Matrix::from_vec(grad_out.rows, grad_out.cols, data)
    }
}
