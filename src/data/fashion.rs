use mnist::MnistBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use crate::config::{IMAGE_FEATURES, IMAGE_SIDE};
use crate::error::{GanError, Result};

const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";
const FILES: [&str; 4] = [TRAIN_IMAGES, TRAIN_LABELS, TEST_IMAGES, TEST_LABELS];

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;
const TRAIN_LEN: u32 = 60_000;
const TEST_LEN: u32 = 10_000;

/// Dataset split to train on.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// The 60,000 training images.
    #[default]
    Train,
    /// The 10,000 test images.
    Test,
}

impl FromStr for Split {
    type Err = GanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "test" => Ok(Split::Test),
            other => Err(GanError::Config(format!("unknown split {other:?}"))),
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// Loader for the Fashion-MNIST dataset stored as uncompressed IDX files.
///
/// Fashion-MNIST uses the MNIST file layout and names, so the `mnist` crate
/// reads it directly. Class labels are not needed for unconditional
/// generation and are dropped.
pub struct FashionMnist;

impl FashionMnist {
    /// Load every image of `split` as one flat buffer of `n * 784` bytes.
    ///
    /// All four files are checked before parsing: the `mnist` crate panics
    /// on a missing file, a wrong magic number or a short body.
    pub fn load(dir: impl AsRef<Path>, split: Split) -> Result<Vec<u8>> {
        let dir = dir.as_ref();
        if let Some(name) = Self::missing_files(dir).first() {
            return Err(GanError::Dataset(format!(
                "missing {} (enable data.download or gunzip Fashion-MNIST into {})",
                dir.join(name).display(),
                dir.display()
            )));
        }
        Self::validate(dir)?;

        let base = format!("{}/", dir.display());
        let data = MnistBuilder::new()
            .base_path(&base)
            .label_format_digit()
            .training_set_length(50_000)
            .validation_set_length(10_000)
            .test_set_length(10_000)
            .finalize();

        let images = match split {
            Split::Train => {
                let mut images = data.trn_img;
                images.extend_from_slice(&data.val_img);
                images
            }
            Split::Test => data.tst_img,
        };
        log::info!(
            "loaded {} fashion-mnist {split} images from {}",
            images.len() / IMAGE_FEATURES,
            dir.display()
        );
        Ok(images)
    }

    /// Check the IDX headers and sizes of all four files.
    pub fn validate(dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        check_images(&dir.join(TRAIN_IMAGES), TRAIN_LEN)?;
        check_labels(&dir.join(TRAIN_LABELS), TRAIN_LEN)?;
        check_images(&dir.join(TEST_IMAGES), TEST_LEN)?;
        check_labels(&dir.join(TEST_LABELS), TEST_LEN)
    }

    /// Download and extract any missing files into `dir`.
    ///
    /// Does nothing when all four files are present. Needs the `download`
    /// feature.
    pub fn download(dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let missing = Self::missing_files(dir);
        if missing.is_empty() {
            return Ok(());
        }
        log::info!(
            "downloading fashion-mnist into {} (missing {})",
            dir.display(),
            missing.join(", ")
        );
        fetch(dir)
    }

    fn missing_files(dir: &Path) -> Vec<&'static str> {
        FILES
            .into_iter()
            .filter(|name| !dir.join(name).is_file())
            .collect()
    }
}

#[cfg(feature = "download")]
fn fetch(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let base = format!("{}/", dir.display());
    // The downloader reports network failures by panicking.
    std::panic::catch_unwind(|| {
        MnistBuilder::new()
            .base_path(&base)
            .use_fashion_data()
            .download_and_extract()
            .finalize();
    })
    .map_err(|_| {
        GanError::Dataset(format!(
            "downloading fashion-mnist into {} failed",
            dir.display()
        ))
    })
}

#[cfg(not(feature = "download"))]
fn fetch(dir: &Path) -> Result<()> {
    Err(GanError::Dataset(format!(
        "cannot download into {}: built without the `download` feature",
        dir.display()
    )))
}

/// Read the leading big-endian `u32` words of an IDX file.
fn read_header<const N: usize>(path: &Path) -> Result<[u32; N]> {
    let mut file = File::open(path)?;
    let mut words = [0u32; N];
    for w in words.iter_mut() {
        let mut buf = [0u8; 4];
        file.read_exact(&mut buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                GanError::Dataset(format!("{} is too short for an IDX header", path.display()))
            }
            _ => GanError::Io(e),
        })?;
        *w = u32::from_be_bytes(buf);
    }
    Ok(words)
}

fn expect_word(path: &Path, what: &str, expected: u32, actual: u32) -> Result<()> {
    if expected != actual {
        return Err(GanError::Dataset(format!(
            "{}: expected {what} {expected}, found {actual}",
            path.display()
        )));
    }
    Ok(())
}

fn expect_size(path: &Path, expected: u64) -> Result<()> {
    let actual = std::fs::metadata(path)?.len();
    if actual != expected {
        return Err(GanError::Dataset(format!(
            "{}: expected {expected} bytes, found {actual}",
            path.display()
        )));
    }
    Ok(())
}

fn check_images(path: &Path, count: u32) -> Result<()> {
    let [magic, len, rows, cols] = read_header::<4>(path)?;
    expect_word(path, "magic number", IMAGE_MAGIC, magic)?;
    expect_word(path, "image count", count, len)?;
    expect_word(path, "rows", IMAGE_SIDE as u32, rows)?;
    expect_word(path, "columns", IMAGE_SIDE as u32, cols)?;
    expect_size(path, 16 + count as u64 * IMAGE_FEATURES as u64)
}

fn check_labels(path: &Path, count: u32) -> Result<()> {
    let [magic, len] = read_header::<2>(path)?;
    expect_word(path, "magic number", LABEL_MAGIC, magic)?;
    expect_word(path, "label count", count, len)?;
    expect_size(path, 8 + count as u64)
}
