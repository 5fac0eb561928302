pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::SGD;

use crate::layers::Param;
use serde::{Deserialize, Serialize};

/// Common interface for optimizers operating on layer parameters.
pub trait Optimizer {
    /// Update the provided parameters in-place from their accumulated
    /// gradients.
    fn step(&mut self, params: &mut [&mut Param]);

    fn learning_rate(&self) -> f32;
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut Param]) {
        Adam::step(self, params);
    }

    fn learning_rate(&self) -> f32 {
        self.lr
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [&mut Param]) {
        SGD::step(self, params);
    }

    fn learning_rate(&self) -> f32 {
        self.lr
    }
}

/// Optimizer selection in configuration files. Both networks use the same
/// kind, each with its own instance and learning rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn build(self, lr: f32) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Adam => Box::new(Adam::with_lr(lr)),
            OptimizerKind::Sgd => Box::new(SGD::new(lr)),
        }
    }
}
