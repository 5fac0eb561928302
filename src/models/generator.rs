use rand::Rng;

use super::sequential::Sequential;
use crate::config::{GeneratorConfig, IMAGE_FEATURES, IMAGE_SIDE};
use crate::error::{GanError, Result};
use crate::layers::{
    Conv2d, Dense, LeakyRelu, Mode, Padding, Param, ParamGrad, Reshape, Shape, Sigmoid,
    UpSampling2d,
};
use crate::math::Matrix;
use crate::rng;

/// Maps latent vectors to `1 x 28 x 28` images with pixel values in `[0, 1]`.
///
/// Dense projection to a `channels x seed x seed` volume, two
/// upsample+convolve stages, two refinement convolutions and a one-channel
/// sigmoid convolution.
pub struct Generator {
    net: Sequential,
    latent_dim: usize,
}

impl Generator {
    pub fn new(config: &GeneratorConfig, rng: &mut impl Rng) -> Result<Self> {
        let c = config.channels;
        let seed = config.seed_side;
        let slope = config.leaky_slope;
        let mut net = Sequential::new(Shape::flat(config.latent_dim));
        net.add(Dense::new(config.latent_dim, c * seed * seed, rng))?
            .add(LeakyRelu::new(slope))?
            .add(Reshape::new(Shape::new(c, seed, seed)))?;
        for _ in 0..2 {
            net.add(UpSampling2d::new(c, 2))?
                .add(Conv2d::new(c, c, config.upsample_kernel, 1, Padding::Same, rng))?
                .add(LeakyRelu::new(slope))?;
        }
        for _ in 0..2 {
            net.add(Conv2d::new(c, c, config.refine_kernel, 1, Padding::Same, rng))?
                .add(LeakyRelu::new(slope))?;
        }
        net.add(Conv2d::new(c, 1, config.refine_kernel, 1, Padding::Same, rng))?
            .add(Sigmoid::new())?;

        let expected = Shape::new(1, IMAGE_SIDE, IMAGE_SIDE);
        if net.output_shape() != expected {
            return Err(GanError::shape("Generator", expected, net.output_shape()));
        }
        Ok(Self {
            net,
            latent_dim: config.latent_dim,
        })
    }

    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    /// Generate one image per row of `z` (`n x latent_dim`), returning an
    /// `n x 784` matrix.
    pub fn generate(&mut self, z: &Matrix, mode: Mode) -> Result<Matrix> {
        if z.cols != self.latent_dim {
            return Err(GanError::shape("Generator", self.latent_dim, z.cols));
        }
        let images = self.net.forward(z, mode)?;
        debug_assert_eq!(images.cols, IMAGE_FEATURES);
        Ok(images)
    }

    /// Draw `n` standard-normal latent vectors and generate from them.
    pub fn sample(&mut self, n: usize, rng: &mut impl Rng, mode: Mode) -> Result<Matrix> {
        let z = rng::normal_matrix(rng, n, self.latent_dim);
        self.generate(&z, mode)
    }

    pub fn backward(&mut self, grad_images: &Matrix, param_grad: ParamGrad) -> Matrix {
        self.net.backward(grad_images, param_grad)
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
