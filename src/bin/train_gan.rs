use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use vanillagan::config::Config;
use vanillagan::train_gan;

/// Train a convolutional GAN on Fashion-MNIST and write sample images after
/// every epoch.
#[derive(Parser, Debug)]
#[command(name = "train_gan", version)]
struct Cli {
    /// TOML or JSON configuration file; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of epochs.
    #[arg(long)]
    epochs: Option<usize>,
    /// Directory with the Fashion-MNIST IDX files.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Download missing dataset files into the data directory.
    #[arg(long)]
    download: bool,
    /// Directory for generated sample images (created if missing).
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Seed for weights, latent draws and shuffling.
    #[arg(long)]
    seed: Option<u64>,
    /// Base directory for metric files.
    #[arg(long)]
    log_dir: Option<String>,
    /// Run name used for the metrics subdirectory.
    #[arg(long)]
    experiment: Option<String>,
}

impl Cli {
    fn into_config(self) -> vanillagan::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_path(path)?,
            None => Config::default(),
        };
        if let Some(epochs) = self.epochs {
            config.training.epochs = epochs;
        }
        if let Some(dir) = self.data_dir {
            config.data.dir = dir;
        }
        if self.download {
            config.data.download = true;
        }
        if let Some(dir) = self.output_dir {
            config.monitor.output_dir = dir;
        }
        if self.seed.is_some() {
            config.training.seed = self.seed;
        }
        if self.log_dir.is_some() {
            config.logging.log_dir = self.log_dir;
        }
        if self.experiment.is_some() {
            config.logging.experiment = self.experiment;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = match Cli::parse().into_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&config.monitor.output_dir) {
        log::error!(
            "cannot create sample directory {}: {e}",
            config.monitor.output_dir.display()
        );
        return ExitCode::FAILURE;
    }
    match train_gan::run(&config) {
        Ok(history) => {
            if let Some(last) = history.epochs.last() {
                log::info!(
                    "final d_loss {:.4} g_loss {:.4}",
                    last.losses.d_loss,
                    last.losses.g_loss
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("training failed: {e}");
            ExitCode::FAILURE
        }
    }
}
