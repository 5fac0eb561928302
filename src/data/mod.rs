pub mod fashion;
pub mod pipeline;

pub use fashion::{FashionMnist, Split};
pub use pipeline::{buffered_shuffle, Batches, ImagePipeline};
