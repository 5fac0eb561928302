use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

use crate::config::Config;
use crate::data::{FashionMnist, ImagePipeline};
use crate::error::Result;
use crate::logging::{Callback, CallbackSignal, Logger, MetricRecord};
use crate::math;
use crate::models::{Gan, StepLosses};
use crate::monitor::ModelMonitor;
use crate::rng;
use crate::util::logging::{format_step_losses, log_epoch_summary, log_total_ops};

/// Mean losses of one completed epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochLosses {
    pub epoch: usize,
    pub losses: StepLosses,
}

/// Per-epoch training history.
#[derive(Clone, Debug, Default)]
pub struct History {
    pub epochs: Vec<EpochLosses>,
    pub steps: usize,
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{prefix} [{bar:30}] {pos}/{len} {msg} ({elapsed})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// Train `gan` for `epochs` passes over `pipeline`.
///
/// Callbacks see every batch and every epoch; any of them may stop training
/// early. Metrics go to `logger` when one is given. Numeric divergence is not
/// treated as an error.
pub fn fit(
    gan: &mut Gan,
    pipeline: &mut ImagePipeline,
    epochs: usize,
    callbacks: &mut [Box<dyn Callback>],
    mut logger: Option<&mut Logger>,
) -> Result<History> {
    let mut history = History::default();
    for cb in callbacks.iter_mut() {
        cb.on_train_begin();
    }

    'epochs: for epoch in 0..epochs {
        for cb in callbacks.iter_mut() {
            cb.on_epoch_begin(epoch);
        }
        let pb = progress_bar(pipeline.num_batches());
        pb.set_prefix(format!("epoch {}/{epochs}", epoch + 1));

        let mut d_sum = 0.0f32;
        let mut g_sum = 0.0f32;
        let mut batches = 0usize;
        let mut stop = false;
        for real in pipeline.epoch() {
            let losses = gan.train_step(&real)?;
            d_sum += losses.d_loss;
            g_sum += losses.g_loss;
            batches += 1;
            history.steps += 1;
            pb.set_message(format_step_losses(&losses));
            pb.inc(1);

            let record = MetricRecord {
                epoch,
                step: history.steps,
                d_loss: losses.d_loss,
                g_loss: losses.g_loss,
                kind: "batch",
            };
            if let Some(l) = logger.as_deref_mut() {
                l.log(&record)?;
            }
            for cb in callbacks.iter_mut() {
                if cb.on_batch_end(&record) == CallbackSignal::Stop {
                    stop = true;
                }
            }
            if stop {
                break;
            }
        }
        pb.finish_and_clear();

        let n = batches.max(1) as f32;
        let mean = StepLosses {
            d_loss: d_sum / n,
            g_loss: g_sum / n,
        };
        log_epoch_summary(epoch, epochs, &mean);
        history.epochs.push(EpochLosses { epoch, losses: mean });

        let record = MetricRecord {
            epoch,
            step: history.steps,
            d_loss: mean.d_loss,
            g_loss: mean.g_loss,
            kind: "epoch",
        };
        if let Some(l) = logger.as_deref_mut() {
            l.log(&record)?;
        }
        for cb in callbacks.iter_mut() {
            if cb.on_epoch_end(&record, gan)? == CallbackSignal::Stop {
                stop = true;
            }
        }
        if stop {
            log::info!("training stopped by callback after epoch {}", epoch + 1);
            break 'epochs;
        }
    }

    for cb in callbacks.iter_mut() {
        cb.on_train_end();
    }
    Ok(history)
}

/// Load the configured dataset, build the GAN and train it with a
/// [`ModelMonitor`] attached.
pub fn run(config: &Config) -> Result<History> {
    config.validate()?;
    let seed = config.seed();
    if config.data.download {
        FashionMnist::download(&config.data.dir)?;
    }
    let pixels = FashionMnist::load(&config.data.dir, config.data.split)?;
    let mut pipeline = ImagePipeline::new(&pixels, &config.data, seed)?;
    drop(pixels);

    let mut gan = Gan::from_config(config, seed)?;
    log::info!("{}", gan.generator.network().summary_table("generator"));
    log::info!("{}", gan.discriminator.network().summary_table("discriminator"));

    let mut callbacks: Vec<Box<dyn Callback>> = vec![Box::new(ModelMonitor::from_config(
        &config.monitor,
        rng::rng_from_seed(seed.wrapping_add(1)),
    ))];
    let mut logger = Logger::new(
        config.logging.log_dir.clone(),
        config.logging.experiment.clone(),
    )?;
    log::info!("writing metrics to {}", logger.dir().display());

    math::reset_matrix_ops();
    let start = Instant::now();
    let history = fit(
        &mut gan,
        &mut pipeline,
        config.training.epochs,
        &mut callbacks,
        Some(&mut logger),
    )?;
    log::info!(
        "trained {} steps in {:.1}s",
        history.steps,
        start.elapsed().as_secs_f32()
    );
    log_total_ops(math::matrix_ops_count());
    Ok(history)
}
