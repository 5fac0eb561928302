use rand::Rng;

use super::sequential::Sequential;
use crate::config::{DiscriminatorConfig, IMAGE_FEATURES, IMAGE_SIDE};
use crate::error::{GanError, Result};
use crate::layers::{
    Conv2d, Dense, Dropout, Flatten, LeakyRelu, Mode, Padding, Param, ParamGrad, Shape, Sigmoid,
};
use crate::math::Matrix;
use crate::rng;

/// Scores `1 x 28 x 28` images with a confidence in `[0, 1]`.
///
/// Stacked valid convolutions, each followed by LeakyReLU and dropout, then a
/// sigmoid dense head. Dropout only fires when called with [`Mode::Train`].
pub struct Discriminator {
    net: Sequential,
}

impl Discriminator {
    pub fn new(config: &DiscriminatorConfig, rng: &mut impl Rng) -> Result<Self> {
        let mut net = Sequential::new(Shape::new(1, IMAGE_SIDE, IMAGE_SIDE));
        let mut in_channels = 1;
        for &out_channels in &config.channels {
            net.add(Conv2d::new(
                in_channels,
                out_channels,
                config.kernel,
                1,
                Padding::Valid,
                rng,
            ))?
            .add(LeakyRelu::new(config.leaky_slope))?
            .add(Dropout::new(config.dropout, rng::fork(rng)))?;
            in_channels = out_channels;
        }
        net.add(Flatten::new())?
            .add(Dropout::new(config.dropout, rng::fork(rng)))?;
        let features = net.output_shape().len();
        net.add(Dense::new(features, 1, rng))?.add(Sigmoid::new())?;
        Ok(Self { net })
    }

    /// Score each row of `images` (`n x 784`), returning an `n x 1` matrix.
    pub fn score(&mut self, images: &Matrix, mode: Mode) -> Result<Matrix> {
        if images.cols != IMAGE_FEATURES {
            return Err(GanError::shape("Discriminator", IMAGE_FEATURES, images.cols));
        }
        self.net.forward(images, mode)
    }

    /// Backpropagate from the scores, returning the gradient with respect to
    /// the scored images.
    pub fn backward(&mut self, grad_scores: &Matrix, param_grad: ParamGrad) -> Matrix {
        self.net.backward(grad_scores, param_grad)
    }

    pub fn zero_grad(&mut self) {
        self.net.zero_grad();
    }

    pub fn parameters(&mut self) -> Vec<&mut Param> {
        self.net.parameters()
    }

    pub fn network(&self) -> &Sequential {
        &self.net
    }
}
