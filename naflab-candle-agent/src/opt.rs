//! Adam optimizer fitting the NAF networks.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::Optimizer as _;
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of [`Optimizer`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OptimizerConfig {
    /// Learning rate.
    pub lr: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { lr: 1e-3 }
    }
}

impl OptimizerConfig {
    /// Sets the learning rate.
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    /// Constructs an optimizer of the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        let params = ParamsAdam {
            lr: self.lr,
            ..ParamsAdam::default()
        };
        Ok(Optimizer(Adam::new(vars, params)?))
    }
}

/// Adam with the remaining parameters at their defaults.
pub struct Optimizer(Adam);

impl Optimizer {
    /// Computes the gradients of `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        Ok(self.0.backward_step(loss)?)
    }
}
