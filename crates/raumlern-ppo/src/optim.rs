//! Adam über alle Parameter des Netzes, ein gemeinsamer Schritt pro Aufruf.

use crate::net::{Batch, LossCoefficients, PolicyValueModel, PolicyValueNet, TrainBackend, UpdateStats};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};

pub struct PolicyOptimizer {
    adam: OptimizerAdaptor<Adam, PolicyValueModel<TrainBackend>, TrainBackend>,
    lr: f64,
    steps: usize,
}

impl PolicyOptimizer {
    #[must_use]
    pub fn new(lr: f32) -> Self {
        Self {
            adam: AdamConfig::new().init(),
            lr: f64::from(lr),
            steps: 0,
        }
    }

    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Ein Rückwärtspass über den Batch und ein Adam-Schritt. Die Kennzahlen
    /// beziehen sich auf die Parameter vor dem Schritt.
    pub fn step(&mut self, net: &mut PolicyValueNet, batch: &Batch, coefs: &LossCoefficients) -> UpdateStats {
        if batch.is_empty() {
            return UpdateStats::default();
        }
        let (loss, stats) = net.loss_tensor(batch, coefs);
        let grads = GradientsParams::from_grads(loss.backward(), &net.model);
        net.model = self.adam.step(self.lr, net.model.clone(), grads);
        self.steps += 1;
        stats
    }
}
