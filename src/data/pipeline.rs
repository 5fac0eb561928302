use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::{DataConfig, IMAGE_FEATURES};
use crate::error::{GanError, Result};
use crate::math::Matrix;

/// Order in which a bounded shuffle buffer of size `buffer` emits `len`
/// items.
///
/// The buffer starts with the first `buffer` items; each step emits a random
/// buffered item and refills its slot with the next unseen one. With
/// `buffer >= len` this is a full uniform shuffle, with `buffer <= 1` the
/// order is unchanged.
pub fn buffered_shuffle(len: usize, buffer: usize, rng: &mut impl Rng) -> Vec<usize> {
    let buffer = buffer.max(1);
    let mut out = Vec::with_capacity(len);
    let mut buf: Vec<usize> = (0..len.min(buffer)).collect();
    let mut next = buf.len();
    while !buf.is_empty() {
        let i = rng.gen_range(0..buf.len());
        if next < len {
            out.push(std::mem::replace(&mut buf[i], next));
            next += 1;
        } else {
            out.push(buf.swap_remove(i));
        }
    }
    out
}

fn gather(images: &[f32], indices: &[usize]) -> Matrix {
    let mut data = Vec::with_capacity(indices.len() * IMAGE_FEATURES);
    for &i in indices {
        data.extend_from_slice(&images[i * IMAGE_FEATURES..(i + 1) * IMAGE_FEATURES]);
    }
    Matrix::from_vec(indices.len(), IMAGE_FEATURES, data)
}

/// In-memory image pipeline: scale once, then shuffle, batch and prefetch
/// every epoch.
pub struct ImagePipeline {
    images: Arc<Vec<f32>>,
    len: usize,
    batch_size: usize,
    shuffle_buffer: usize,
    prefetch: usize,
    rng: StdRng,
}

impl ImagePipeline {
    /// Build a pipeline over raw 8-bit images (`n * 784` bytes), scaling
    /// pixels to `[0, 1]`.
    pub fn new(pixels: &[u8], config: &DataConfig, seed: u64) -> Result<Self> {
        if pixels.is_empty() || pixels.len() % IMAGE_FEATURES != 0 {
            return Err(GanError::Dataset(format!(
                "expected a non-empty multiple of {IMAGE_FEATURES} pixels, got {}",
                pixels.len()
            )));
        }
        if config.batch_size == 0 {
            return Err(GanError::Config("batch size must be positive".into()));
        }
        let images: Vec<f32> = pixels.iter().map(|&p| p as f32 / 255.0).collect();
        Ok(Self {
            len: pixels.len() / IMAGE_FEATURES,
            images: Arc::new(images),
            batch_size: config.batch_size,
            shuffle_buffer: config.shuffle_buffer,
            prefetch: config.prefetch,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Batches per epoch; the last one may be short.
    pub fn num_batches(&self) -> usize {
        self.len.div_ceil(self.batch_size)
    }

    /// Start a new epoch with a fresh shuffle.
    pub fn epoch(&mut self) -> Batches {
        let order = buffered_shuffle(self.len, self.shuffle_buffer, &mut self.rng);
        let images = Arc::clone(&self.images);
        let batch_size = self.batch_size;
        if self.prefetch == 0 {
            return Batches {
                source: Source::Inline {
                    images,
                    order,
                    batch_size,
                    pos: 0,
                },
            };
        }
        let (tx, rx) = mpsc::sync_channel(self.prefetch);
        let producer = thread::spawn(move || {
            for chunk in order.chunks(batch_size) {
                if tx.send(gather(&images, chunk)).is_err() {
                    break;
                }
            }
        });
        Batches {
            source: Source::Prefetched {
                rx: Some(rx),
                producer: Some(producer),
            },
        }
    }
}

/// Iterator over the batches of one epoch.
///
/// Dropping it early stops the prefetch producer.
pub struct Batches {
    source: Source,
}

enum Source {
    Inline {
        images: Arc<Vec<f32>>,
        order: Vec<usize>,
        batch_size: usize,
        pos: usize,
    },
    Prefetched {
        rx: Option<Receiver<Matrix>>,
        producer: Option<JoinHandle<()>>,
    },
}

impl Iterator for Batches {
    type Item = Matrix;

    fn next(&mut self) -> Option<Matrix> {
        match &mut self.source {
            Source::Inline {
                images,
                order,
                batch_size,
                pos,
            } => {
                if *pos >= order.len() {
                    return None;
                }
                let end = (*pos + *batch_size).min(order.len());
                let batch = gather(images, &order[*pos..end]);
                *pos = end;
                Some(batch)
            }
            Source::Prefetched { rx, .. } => rx.as_ref()?.recv().ok(),
        }
    }
}

impl Drop for Batches {
    fn drop(&mut self) {
        if let Source::Prefetched { rx, producer } = &mut self.source {
            drop(rx.take());
            if let Some(handle) = producer.take() {
                if handle.join().is_err() {
                    log::warn!("batch prefetch thread panicked");
                }
            }
        }
    }
}
