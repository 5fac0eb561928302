use super::layer::{Layer, Mode, ParamGrad, Shape};
use crate::error::{GanError, Result};
use crate::math::Matrix;

// Rows already hold channel-major features, so reshaping and flattening only
// change how the next layer interprets a row. Data is passed through as is.

/// Reinterpret flat features as a `channels x height x width` volume.
pub struct Reshape {
    target: Shape,
}

impl Reshape {
    pub fn new(target: Shape) -> Self {
        Self { target }
    }
}

impl Layer for Reshape {
    fn name(&self) -> &'static str {
        "Reshape"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape> {
        if input.len() != self.target.len() {
            return Err(GanError::shape("Reshape", self.target.len(), input.len()));
        }
        Ok(self.target)
    }

    fn forward(&mut self, x: &Matrix, _mode: Mode) -> Result<Matrix> {
        if x.cols != self.target.len() {
            return Err(GanError::shape("Reshape", self.target.len(), x.cols));
        }
        Ok(x.clone())
    }

    fn backward(&mut self, grad_out: &Matrix, _param_grad: ParamGrad) -> Matrix {
        grad_out.clone()
    }
}

/// Collapse a feature volume into a flat vector.
#[derive(Default)]
pub struct Flatten;

impl Flatten {
    pub fn new() -> Self {
        Self
    }
}

impl Layer for Flatten {
    fn name(&self) -> &'static str {
        "Flatten"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape> {
        Ok(Shape::flat(input.len()))
    }

    fn forward(&mut self, x: &Matrix, _mode: Mode) -> Result<Matrix> {
        Ok(x.clone())
    }

    fn backward(&mut self, grad_out: &Matrix, _param_grad: ParamGrad) -> Matrix {
        grad_out.clone()
    }
}
