pub mod discriminator;
pub mod gan;
pub mod generator;
pub mod sequential;

pub use discriminator::Discriminator;
pub use gan::{noisy_labels, Gan, StepLosses};
pub use generator::Generator;
pub use sequential::{LayerSummary, Sequential};
