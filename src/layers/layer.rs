use std::fmt;

use super::param::Param;
use crate::error::Result;
use crate::math::Matrix;

/// Whether a forward pass runs in training or inference mode.
///
/// Only stochastic layers (dropout) behave differently between the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Train,
    Infer,
}

/// Whether a backward pass should accumulate parameter gradients.
///
/// `Frozen` still propagates the gradient to the layer input, which is how
/// the generator is trained through a discriminator that must not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamGrad {
    Accumulate,
    Frozen,
}

/// Per-sample feature layout: `channels x height x width`, channel-major.
///
/// Flat feature vectors use `height == width == 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl Shape {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self { channels, height, width }
    }

    pub fn flat(len: usize) -> Self {
        Self::new(len, 1, 1)
    }

    pub fn len(&self) -> usize {
        self.channels * self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.height == 1 && self.width == 1 {
            write!(f, "({})", self.channels)
        } else {
            write!(f, "({}, {}, {})", self.channels, self.height, self.width)
        }
    }
}

/// Common interface for network layers.
pub trait Layer {
    /// Short layer type name used in model summaries.
    fn name(&self) -> &'static str;

    /// Output shape for a given input shape, or an error if the layer cannot
    /// accept it.
    fn output_shape(&self, input: Shape) -> Result<Shape>;

    /// Forward pass over a batch (one sample per row). Values needed by
    /// [`Layer::backward`] are cached regardless of `mode`.
    fn forward(&mut self, x: &Matrix, mode: Mode) -> Result<Matrix>;

    /// Backward pass returning the gradient with respect to the layer input.
    fn backward(&mut self, grad_out: &Matrix, param_grad: ParamGrad) -> Matrix;

    /// Zero any accumulated gradients.
    fn zero_grad(&mut self) {
        for p in self.parameters() {
            p.zero_grad();
        }
    }

    /// Mutable references to trainable parameters, in a stable order.
    fn parameters(&mut self) -> Vec<&mut Param> {
        Vec::new()
    }

    /// Number of trainable scalars.
    fn param_count(&self) -> usize {
        0
    }
}
