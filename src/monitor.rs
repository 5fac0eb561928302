use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

use crate::config::{MonitorConfig, IMAGE_FEATURES, IMAGE_SIDE};
use crate::error::Result;
use crate::layers::Mode;
use crate::logging::{Callback, CallbackSignal, MetricRecord};
use crate::math::Matrix;
use crate::models::{Gan, Generator};
use crate::rng;

/// File name for sample `index` written after `epoch`.
pub fn sample_file_name(epoch: usize, index: usize) -> String {
    format!("generated_img_{epoch}_{index}.png")
}

/// Convert one generated image row (values in `[0, 1]`) to an 8-bit
/// grayscale image.
pub fn to_gray_image(pixels: &[f32]) -> GrayImage {
    debug_assert_eq!(pixels.len(), IMAGE_FEATURES);
    GrayImage::from_fn(IMAGE_SIDE as u32, IMAGE_SIDE as u32, |x, y| {
        let v = pixels[y as usize * IMAGE_SIDE + x as usize];
        Luma([(v * 255.0).round().clamp(0.0, 255.0) as u8])
    })
}

/// Writes a few generator samples to disk at the end of every epoch.
///
/// Latent vectors are drawn uniformly from `[0, 1)`. The output directory
/// must already exist.
pub struct ModelMonitor {
    num_img: usize,
    output_dir: PathBuf,
    rng: StdRng,
}

impl ModelMonitor {
    pub fn new(num_img: usize, output_dir: impl Into<PathBuf>, rng: StdRng) -> Self {
        Self {
            num_img,
            output_dir: output_dir.into(),
            rng,
        }
    }

    pub fn from_config(config: &MonitorConfig, rng: StdRng) -> Self {
        Self::new(config.num_img, config.output_dir.clone(), rng)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate and save `num_img` samples for `epoch`, returning the paths
    /// written.
    pub fn save_samples(&mut self, epoch: usize, generator: &mut Generator) -> Result<Vec<PathBuf>> {
        let z = rng::uniform_matrix(&mut self.rng, self.num_img, generator.latent_dim(), 0.0, 1.0);
        let images: Matrix = generator.generate(&z, Mode::Infer)?;
        let mut written = Vec::with_capacity(self.num_img);
        for i in 0..images.rows {
            let path = self.output_dir.join(sample_file_name(epoch, i));
            to_gray_image(images.row(i)).save(&path)?;
            written.push(path);
        }
        log::debug!("wrote {} samples for epoch {epoch}", written.len());
        Ok(written)
    }
}

impl Callback for ModelMonitor {
    fn on_epoch_end(&mut self, metrics: &MetricRecord, gan: &mut Gan) -> Result<CallbackSignal> {
        self.save_samples(metrics.epoch, &mut gan.generator)?;
        Ok(CallbackSignal::Continue)
    }
}
