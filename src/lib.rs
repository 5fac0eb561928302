//! Convolutional GAN for 28x28 grayscale images (Fashion-MNIST), built on
//! hand-written layers with explicit forward and backward passes.

pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod logging;
pub mod math;
pub mod models;
pub mod monitor;
pub mod optim;
pub mod rng;
pub mod train_gan;
pub mod util;

pub use error::{GanError, Result};
