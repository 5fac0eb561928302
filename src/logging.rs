use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use csv::Writer;
use serde::Serialize;

use crate::error::Result;
use crate::models::Gan;

/// Appends metric records to `metrics.jsonl` and `metrics.csv` in a run
/// directory.
pub struct Logger {
    dir: PathBuf,
    json: File,
    csv: Writer<File>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MetricRecord {
    pub epoch: usize,
    pub step: usize,
    pub d_loss: f32,
    pub g_loss: f32,
    pub kind: &'static str,
}

impl Logger {
    pub fn new(log_dir: Option<String>, experiment: Option<String>) -> Result<Self> {
        let base = log_dir.unwrap_or_else(|| "runs".to_string());
        let exp = experiment.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_else(|_| Duration::from_secs(0))
                .as_secs()
                .to_string()
        });
        let dir = PathBuf::from(base).join(exp);
        std::fs::create_dir_all(&dir)?;
        let json = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("metrics.jsonl"))?;
        let csv_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("metrics.csv"))?;
        let csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(csv_file);
        Ok(Logger { dir, json, csv })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log<T: Serialize>(&mut self, metrics: &T) -> Result<()> {
        let line = serde_json::to_string(metrics)?;
        writeln!(self.json, "{line}")?;
        self.csv.serialize(metrics)?;
        self.csv.flush()?;
        Ok(())
    }
}

/// Signals returned by callbacks to control training flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackSignal {
    /// Continue training as normal.
    Continue,
    /// Stop training early.
    Stop,
}

/// Trait for hooking into various stages of the training loop.
pub trait Callback {
    /// Called once before training starts.
    fn on_train_begin(&mut self) {}

    /// Called at the beginning of each epoch.
    fn on_epoch_begin(&mut self, _epoch: usize) {}

    /// Called after each batch. Returning `Stop` will end training.
    fn on_batch_end(&mut self, _metrics: &MetricRecord) -> CallbackSignal {
        CallbackSignal::Continue
    }

    /// Called after each epoch with the epoch's mean losses and the model.
    /// Returning `Stop` will end training.
    fn on_epoch_end(&mut self, _metrics: &MetricRecord, _gan: &mut Gan) -> Result<CallbackSignal> {
        Ok(CallbackSignal::Continue)
    }

    /// Called once after training ends.
    fn on_train_end(&mut self) {}
}
