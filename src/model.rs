//! Logistic-regression baseline.
//!
//! Deliberately minimal: full-batch gradient descent with L2
//! regularization on a handful of dense features. The point of the model
//! is to give the engineered features a defensible baseline, not to win
//! a leaderboard.

use serde::{Deserialize, Serialize};

use crate::preprocess::DesignMatrix;
use crate::{ApbError, Result};

/// Training hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LrConfig {
    pub learning_rate: f64,
    pub max_epochs: usize,
    pub l2_lambda: f64,
    /// Stop when the max absolute gradient component falls below this.
    pub convergence_eps: f64,
}

impl Default for LrConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_epochs: 1000,
            l2_lambda: 1e-4,
            convergence_eps: 1e-6,
        }
    }
}

/// Binary logistic regression. Weights are in design-matrix column
/// order; the positive class is "quotation".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    bias: f64,
}

/// Numerically stable sigmoid.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    /// Fit on a design matrix with full-batch gradient descent.
    pub fn train(design: &DesignMatrix, config: &LrConfig) -> Result<Self> {
        if design.features.is_empty() {
            return Err(ApbError::Config(
                "cannot train on an empty design matrix".to_string(),
            ));
        }
        if design.features.len() != design.labels.len() {
            return Err(ApbError::Config(format!(
                "feature/label length mismatch: {} vs {}",
                design.features.len(),
                design.labels.len()
            )));
        }

        let n = design.features.len();
        let dim = design.features[0].len();
        let mut model = Self {
            weights: vec![0.0; dim],
            bias: 0.0,
        };

        for _epoch in 0..config.max_epochs {
            let mut grad_w = vec![0.0; dim];
            let mut grad_b = 0.0;

            for (x, &y) in design.features.iter().zip(design.labels.iter()) {
                let err = model.predict(x) - y;
                for (gw, xi) in grad_w.iter_mut().zip(x.iter()) {
                    *gw += err * xi;
                }
                grad_b += err;
            }

            let inv_n = 1.0 / n as f64;
            let mut max_grad: f64 = 0.0;
            for (w, gw) in model.weights.iter_mut().zip(grad_w.iter()) {
                let g = gw * inv_n + config.l2_lambda * *w;
                *w -= config.learning_rate * g;
                max_grad = max_grad.max(g.abs());
            }
            let gb = grad_b * inv_n;
            model.bias -= config.learning_rate * gb;
            max_grad = max_grad.max(gb.abs());

            if max_grad < config.convergence_eps {
                break;
            }
        }

        Ok(model)
    }

    /// Probability that the row is a genuine quotation.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }

    /// Hard class prediction at the 0.5 threshold.
    pub fn predict_class(&self, features: &[f64]) -> bool {
        self.predict(features) >= 0.5
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}
