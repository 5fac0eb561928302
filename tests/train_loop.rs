use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use vanillagan::config::{Config, DataConfig, DiscriminatorConfig, GeneratorConfig, IMAGE_FEATURES};
use vanillagan::data::ImagePipeline;
use vanillagan::logging::{Callback, CallbackSignal, Logger, MetricRecord};
use vanillagan::models::Gan;
use vanillagan::monitor::ModelMonitor;
use vanillagan::train_gan::fit;

fn tiny_config() -> Config {
    let mut config = Config::default();
    config.generator = GeneratorConfig {
        latent_dim: 8,
        channels: 2,
        ..GeneratorConfig::default()
    };
    config.discriminator = DiscriminatorConfig {
        channels: vec![2, 2, 2, 2, 2],
        ..DiscriminatorConfig::default()
    };
    config.data = DataConfig {
        batch_size: 4,
        prefetch: 2,
        ..DataConfig::default()
    };
    config
}

fn pipeline(config: &Config, images: usize) -> ImagePipeline {
    let pixels = vec![128u8; images * IMAGE_FEATURES];
    ImagePipeline::new(&pixels, &config.data, 1).unwrap()
}

#[derive(Default)]
struct Events {
    batches: usize,
    epochs: Vec<usize>,
    began: bool,
    ended: bool,
}

struct Recorder {
    events: Rc<RefCell<Events>>,
    stop_after_epoch: Option<usize>,
}

impl Callback for Recorder {
    fn on_train_begin(&mut self) {
        self.events.borrow_mut().began = true;
    }

    fn on_batch_end(&mut self, _metrics: &MetricRecord) -> CallbackSignal {
        self.events.borrow_mut().batches += 1;
        CallbackSignal::Continue
    }

    fn on_epoch_end(&mut self, metrics: &MetricRecord, _gan: &mut Gan) -> vanillagan::Result<CallbackSignal> {
        self.events.borrow_mut().epochs.push(metrics.epoch);
        if self.stop_after_epoch == Some(metrics.epoch) {
            return Ok(CallbackSignal::Stop);
        }
        Ok(CallbackSignal::Continue)
    }

    fn on_train_end(&mut self) {
        self.events.borrow_mut().ended = true;
    }
}

#[test]
fn fit_runs_every_batch_and_reports_epoch_means() {
    let config = tiny_config();
    let mut gan = Gan::from_config(&config, 3).unwrap();
    let mut pipeline = pipeline(&config, 10);
    let events = Rc::new(RefCell::new(Events::default()));
    let mut callbacks: Vec<Box<dyn Callback>> = vec![Box::new(Recorder {
        events: Rc::clone(&events),
        stop_after_epoch: None,
    })];

    let history = fit(&mut gan, &mut pipeline, 2, &mut callbacks, None).unwrap();

    assert_eq!(history.steps, 6);
    assert_eq!(history.epochs.len(), 2);
    assert!(history
        .epochs
        .iter()
        .all(|e| e.losses.d_loss.is_finite() && e.losses.g_loss.is_finite()));
    let ev = events.borrow();
    assert!(ev.began && ev.ended);
    assert_eq!(ev.batches, 6);
    assert_eq!(ev.epochs, vec![0, 1]);
}

#[test]
fn callback_can_stop_training_early() {
    let config = tiny_config();
    let mut gan = Gan::from_config(&config, 3).unwrap();
    let mut pipeline = pipeline(&config, 4);
    let events = Rc::new(RefCell::new(Events::default()));
    let mut callbacks: Vec<Box<dyn Callback>> = vec![Box::new(Recorder {
        events: Rc::clone(&events),
        stop_after_epoch: Some(0),
    })];

    let history = fit(&mut gan, &mut pipeline, 5, &mut callbacks, None).unwrap();
    assert_eq!(history.epochs.len(), 1);
    assert!(events.borrow().ended);
}

#[test]
fn monitor_and_metrics_are_written_during_fit() {
    let config = tiny_config();
    let samples = tempfile::tempdir().unwrap();
    let runs = tempfile::tempdir().unwrap();
    let mut gan = Gan::from_config(&config, 8).unwrap();
    let mut pipeline = pipeline(&config, 8);
    let mut callbacks: Vec<Box<dyn Callback>> = vec![Box::new(ModelMonitor::new(
        3,
        samples.path(),
        StdRng::seed_from_u64(2),
    ))];
    let mut logger = Logger::new(
        Some(runs.path().display().to_string()),
        Some("test".to_string()),
    )
    .unwrap();

    fit(&mut gan, &mut pipeline, 2, &mut callbacks, Some(&mut logger)).unwrap();

    assert_eq!(std::fs::read_dir(samples.path()).unwrap().count(), 6);
    assert!(samples.path().join("generated_img_1_2.png").is_file());

    let jsonl = std::fs::read_to_string(runs.path().join("test/metrics.jsonl")).unwrap();
    let lines: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    // Two batches and one summary per epoch.
    assert_eq!(lines.len(), 6);
    assert_eq!(lines.iter().filter(|l| l["kind"] == "epoch").count(), 2);
    let csv = std::fs::read_to_string(runs.path().join("test/metrics.csv")).unwrap();
    assert_eq!(csv.lines().count(), 6);
}
