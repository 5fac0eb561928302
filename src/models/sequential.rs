use std::fmt::Write;

use crate::error::Result;
use crate::layers::{Layer, Mode, Param, ParamGrad, Shape};
use crate::math::Matrix;

/// One row of a model summary.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSummary {
    pub name: &'static str,
    pub output_shape: Shape,
    pub params: usize,
}

/// A container that applies layers sequentially.
///
/// Shapes are checked as layers are added, so a model that builds will accept
/// any batch of `input_shape` samples.
pub struct Sequential {
    input_shape: Shape,
    layers: Vec<Box<dyn Layer>>,
    shapes: Vec<Shape>,
}

impl Sequential {
    /// Create an empty sequential model for the given per-sample input shape.
    pub fn new(input_shape: Shape) -> Self {
        Self {
            input_shape,
            layers: Vec::new(),
            shapes: Vec::new(),
        }
    }

    /// Append a layer, failing if it cannot accept the current output shape.
    pub fn add(&mut self, layer: impl Layer + 'static) -> Result<&mut Self> {
        let shape = layer.output_shape(self.output_shape())?;
        self.layers.push(Box::new(layer));
        self.shapes.push(shape);
        Ok(self)
    }

    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }

    pub fn output_shape(&self) -> Shape {
        self.shapes.last().copied().unwrap_or(self.input_shape)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn forward(&mut self, x: &Matrix, mode: Mode) -> Result<Matrix> {
        let mut out = x.clone();
        for layer in self.layers.iter_mut() {
            out = layer.forward(&out, mode)?;
        }
        Ok(out)
    }

    /// Backward pass returning gradient with respect to the input.
    pub fn backward(&mut self, grad_out: &Matrix, param_grad: ParamGrad) -> Matrix {
        let mut grad = grad_out.clone();
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad, param_grad);
        }
        grad
    }

    pub fn zero_grad(&mut self) {
        for layer in self.layers.iter_mut() {
            layer.zero_grad();
        }
    }

    pub fn parameters(&mut self) -> Vec<&mut Param> {
        self.layers
            .iter_mut()
            .flat_map(|l| l.parameters())
            .collect()
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(|l| l.param_count()).sum()
    }

    pub fn summary(&self) -> Vec<LayerSummary> {
        self.layers
            .iter()
            .zip(&self.shapes)
            .map(|(l, &output_shape)| LayerSummary {
                name: l.name(),
                output_shape,
                params: l.param_count(),
            })
            .collect()
    }

    /// Render the summary as a table.
    pub fn summary_table(&self, title: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Model: \"{title}\"");
        let _ = writeln!(out, "{:<16}{:<20}{:>10}", "Layer", "Output Shape", "Param #");
        for row in self.summary() {
            let _ = writeln!(
                out,
                "{:<16}{:<20}{:>10}",
                row.name,
                row.output_shape.to_string(),
                row.params
            );
        }
        let _ = write!(out, "Total params: {}", self.param_count());
        out
    }
}
