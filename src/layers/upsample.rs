use super::layer::{Layer, Mode, ParamGrad, Shape};
use crate::error::{GanError, Result};
use crate::math::Matrix;

/// Nearest-neighbour 2D upsampling.
///
/// Every input pixel is repeated into a `factor x factor` block. The backward
/// pass sums the gradient over each block, the adjoint of the repetition.
pub struct UpSampling2d {
    channels: usize,
    factor: usize,
    in_side: usize,
}

impl UpSampling2d {
    pub fn new(channels: usize, factor: usize) -> Self {
        Self {
            channels,
            factor,
            in_side: 0,
        }
    }

    fn side_of(&self, features: usize) -> Option<usize> {
        if self.channels == 0 || features % self.channels != 0 {
            return None;
        }
        let plane = features / self.channels;
        let side = (plane as f64).sqrt().round() as usize;
        (side * side == plane).then_some(side)
    }
}

impl Layer for UpSampling2d {
    fn name(&self) -> &'static str {
        "UpSampling2D"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape> {
        if input.channels != self.channels {
            return Err(GanError::shape("UpSampling2D", self.channels, input.channels));
        }
        Ok(Shape::new(
            input.channels,
            input.height * self.factor,
            input.width * self.factor,
        ))
    }

    fn forward(&mut self, x: &Matrix, _mode: Mode) -> Result<Matrix> {
        let side = self.side_of(x.cols).ok_or_else(|| {
            GanError::shape(
                "UpSampling2D",
                format!("{} square channel planes", self.channels),
                format!("{} features", x.cols),
            )
        })?;
        self.in_side = side;
        let f = self.factor;
        let out_side = side * f;
        let out_plane = out_side * out_side;
        let in_plane = side * side;
        let mut out = Matrix::zeros(x.rows, self.channels * out_plane);
        for b in 0..x.rows {
            for c in 0..self.channels {
                let src = b * x.cols + c * in_plane;
                let dst = b * out.cols + c * out_plane;
                for oh in 0..out_side {
                    for ow in 0..out_side {
                        out.data[dst + oh * out_side + ow] = x.data[src + (oh / f) * side + ow / f];
                    }
                }
            }
        }
        Ok(out)
    }

    fn backward(&mut self, grad_out: &Matrix, _param_grad: ParamGrad) -> Matrix {
        let side = self.in_side;
        let f = self.factor;
        let out_side = side * f;
        let out_plane = out_side * out_side;
        let in_plane = side * side;
        let mut grad = Matrix::zeros(grad_out.rows, self.channels * in_plane);
        for b in 0..grad_out.rows {
            for c in 0..self.channels {
                let src = b * grad_out.cols + c * out_plane;
                let dst = b * grad.cols + c * in_plane;
                for oh in 0..out_side {
                    for ow in 0..out_side {
                        grad.data[dst + (oh / f) * side + ow / f] +=
                            grad_out.data[src + oh * out_side + ow];
                    }
                }
            }
        }
        grad
    }
}
