pub mod conv;
pub mod dropout;
pub mod layer;
pub mod leaky_relu;
pub mod linear;
pub mod param;
pub mod reshape;
pub mod sigmoid;
pub mod upsample;

pub use conv::{Conv2d, ConvError, Padding};
pub use dropout::Dropout;
pub use layer::{Layer, Mode, ParamGrad, Shape};
pub use leaky_relu::LeakyRelu;
pub use linear::Dense;
pub use param::Param;
pub use reshape::{Flatten, Reshape};
pub use sigmoid::Sigmoid;
pub use upsample::UpSampling2d;
