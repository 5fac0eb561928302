use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::Split;
use crate::error::{GanError, Result};
use crate::optim::OptimizerKind;

/// Side length of the square grayscale images the networks work on.
pub const IMAGE_SIDE: usize = 28;
/// Features per image (`1 x 28 x 28`).
pub const IMAGE_FEATURES: usize = IMAGE_SIDE * IMAGE_SIDE;

/// Training configuration loaded from a TOML or JSON file.
///
/// Every field has a default, so a file only needs to list what it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub generator: GeneratorConfig,
    pub discriminator: DiscriminatorConfig,
    pub training: TrainingConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the Fashion-MNIST IDX files.
    pub dir: PathBuf,
    pub split: Split,
    /// Download missing dataset files before loading.
    pub download: bool,
    pub batch_size: usize,
    pub shuffle_buffer: usize,
    /// Number of batches produced ahead of the trainer; 0 disables the
    /// background producer.
    pub prefetch: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/fashion-mnist"),
            split: Split::Train,
            download: false,
            batch_size: 128,
            shuffle_buffer: 6000,
            prefetch: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub latent_dim: usize,
    /// Filters in every hidden convolution.
    pub channels: usize,
    /// Side of the feature map produced by the dense projection; two
    /// upsampling stages multiply it by four.
    pub seed_side: usize,
    pub upsample_kernel: usize,
    pub refine_kernel: usize,
    pub leaky_slope: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            latent_dim: 128,
            channels: 128,
            seed_side: 7,
            upsample_kernel: 6,
            refine_kernel: 4,
            leaky_slope: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscriminatorConfig {
    /// Filters of each valid convolution block, in order.
    pub channels: Vec<usize>,
    pub kernel: usize,
    pub dropout: f32,
    pub leaky_slope: f32,
}

impl Default for DiscriminatorConfig {
    fn default() -> Self {
        Self {
            channels: vec![16, 32, 64, 128, 256],
            kernel: 5,
            dropout: 0.4,
            leaky_slope: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub generator_lr: f32,
    pub discriminator_lr: f32,
    pub optimizer: OptimizerKind,
    /// Maximum magnitude of the uniform noise added to discriminator labels.
    pub label_noise: f32,
    /// Seed for weights, latent draws and shuffling. Falls back to `SEED`.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            generator_lr: 1e-4,
            discriminator_lr: 1e-5,
            optimizer: OptimizerKind::Adam,
            label_noise: 0.15,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub num_img: usize,
    pub output_dir: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            num_img: 3,
            output_dir: PathBuf::from("images"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base directory for metric files, `runs` when unset.
    pub log_dir: Option<String>,
    /// Run name, a timestamp when unset.
    pub experiment: Option<String>,
}

impl Config {
    /// Load configuration from the given path. Supports TOML or JSON based on
    /// the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(GanError::Config(msg.to_string()));
        if self.data.batch_size == 0 {
            return fail("data.batch_size must be positive");
        }
        if self.generator.latent_dim == 0 {
            return fail("generator.latent_dim must be positive");
        }
        if self.generator.channels == 0 || self.discriminator.channels.contains(&0) {
            return fail("layer widths must be positive");
        }
        if self.discriminator.channels.is_empty() {
            return fail("discriminator.channels must list at least one block");
        }
        if !(self.training.generator_lr > 0.0 && self.training.discriminator_lr > 0.0) {
            return fail("learning rates must be positive");
        }
        if !(0.0..1.0).contains(&self.discriminator.dropout) {
            return fail("discriminator.dropout must be in [0, 1)");
        }
        if !(0.0..=0.5).contains(&self.training.label_noise) {
            return fail("training.label_noise must be in [0, 0.5]");
        }
        Ok(())
    }

    /// Seed from the config, else from the `SEED` environment variable.
    pub fn seed(&self) -> u64 {
        self.training.seed.unwrap_or_else(crate::rng::env_seed)
    }
}
