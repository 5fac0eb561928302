use thiserror::Error;

/// Errors produced while building models, loading data or writing artifacts.
#[derive(Error, Debug)]
pub enum GanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("metrics CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("convolution error: {0}")]
    Conv(#[from] crate::layers::ConvError),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("shape mismatch in {layer}: expected {expected}, got {actual}")]
    ShapeMismatch {
        layer: &'static str,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, GanError>;

impl GanError {
    pub(crate) fn shape(layer: &'static str, expected: impl ToString, actual: impl ToString) -> Self {
        GanError::ShapeMismatch {
            layer,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
