use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::discriminator::Discriminator;
use super::generator::Generator;
use crate::config::Config;
use crate::error::Result;
use crate::layers::{Mode, ParamGrad};
use crate::math::{self, Matrix};
use crate::optim::Optimizer;

/// Label for real images.
pub const REAL: f32 = 0.0;
/// Label for generated images.
pub const FAKE: f32 = 1.0;

/// Losses of one adversarial training step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepLosses {
    pub d_loss: f32,
    pub g_loss: f32,
}

/// Discriminator targets for `real_rows` real rows followed by `fake_rows`
/// fake rows.
///
/// Each label is moved toward the other class by an independent
/// `U[0, noise)` draw: real rows land in `[0, noise)`, fake rows in
/// `(1 - noise, 1]`.
pub fn noisy_labels(real_rows: usize, fake_rows: usize, noise: f32, rng: &mut impl Rng) -> Matrix {
    let mut data = Vec::with_capacity(real_rows + fake_rows);
    for i in 0..real_rows + fake_rows {
        let jitter = if noise > 0.0 { rng.gen_range(0.0..noise) } else { 0.0 };
        data.push(if i < real_rows { REAL + jitter } else { FAKE - jitter });
    }
    Matrix::from_vec(real_rows + fake_rows, 1, data)
}

/// Generator and discriminator trained against each other.
///
/// Each network has its own optimizer; a phase only ever steps the optimizer
/// of the network it trains.
pub struct Gan {
    pub generator: Generator,
    pub discriminator: Discriminator,
    g_opt: Box<dyn Optimizer>,
    d_opt: Box<dyn Optimizer>,
    label_noise: f32,
    rng: StdRng,
}

impl Gan {
    pub fn new(
        generator: Generator,
        discriminator: Discriminator,
        g_opt: Box<dyn Optimizer>,
        d_opt: Box<dyn Optimizer>,
        label_noise: f32,
        rng: StdRng,
    ) -> Self {
        Self {
            generator,
            discriminator,
            g_opt,
            d_opt,
            label_noise,
            rng,
        }
    }

    /// Build both networks and optimizers from a configuration.
    pub fn from_config(config: &Config, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let generator = Generator::new(&config.generator, &mut rng)?;
        let discriminator = Discriminator::new(&config.discriminator, &mut rng)?;
        let t = &config.training;
        Ok(Self::new(
            generator,
            discriminator,
            t.optimizer.build(t.generator_lr),
            t.optimizer.build(t.discriminator_lr),
            t.label_noise,
            crate::rng::fork(&mut rng),
        ))
    }

    pub fn label_noise(&self) -> f32 {
        self.label_noise
    }

    /// One training step: a discriminator update followed by a generator
    /// update, each on fresh latent draws of the real batch's size.
    pub fn train_step(&mut self, real: &Matrix) -> Result<StepLosses> {
        let d_loss = self.discriminator_step(real)?;
        let g_loss = self.generator_step(real.rows)?;
        Ok(StepLosses { d_loss, g_loss })
    }

    /// Update the discriminator on `real` plus an equal number of fakes.
    pub fn discriminator_step(&mut self, real: &Matrix) -> Result<f32> {
        let n = real.rows;
        let fake = self.generator.sample(n, &mut self.rng, Mode::Infer)?;
        let batch = Matrix::concat_rows(real, &fake)?;

        self.discriminator.zero_grad();
        let scores = self.discriminator.score(&batch, Mode::Train)?;
        let targets = noisy_labels(n, n, self.label_noise, &mut self.rng);
        let (loss, grad) = math::binary_cross_entropy(&scores, &targets);
        self.discriminator.backward(&grad, ParamGrad::Accumulate);
        self.d_opt.step(&mut self.discriminator.parameters());
        Ok(loss)
    }

    /// Update the generator to make the discriminator score `n` fresh fakes
    /// as real. Discriminator weights are read but not changed.
    pub fn generator_step(&mut self, n: usize) -> Result<f32> {
        self.generator.zero_grad();
        let fake = self.generator.sample(n, &mut self.rng, Mode::Train)?;
        let scores = self.discriminator.score(&fake, Mode::Infer)?;
        let targets = Matrix::filled(n, 1, REAL);
        let (loss, grad) = math::binary_cross_entropy(&scores, &targets);
        let grad_images = self.discriminator.backward(&grad, ParamGrad::Frozen);
        self.generator.backward(&grad_images, ParamGrad::Accumulate);
        self.g_opt.step(&mut self.generator.parameters());
        Ok(loss)
    }
}
