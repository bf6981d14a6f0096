//! Weight-decay (L2) regularization policy.
//!
//! The caller owns the bookkeeping: before querying the cost it stores the
//! current sum of squared weights and the number of samples the cost is
//! normalised by.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};

/// Regularization methods supported by the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegularizationMethod {
    #[default]
    None,
    WeightDecay,
}

/// Regularization policy plus the per-batch values its cost depends on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Regularization {
    method: RegularizationMethod,
    lambda: f32,
    weight_sum: f32,
    sample_count: usize,
}

impl Regularization {
    pub fn new(method: RegularizationMethod, lambda: f32) -> Self {
        Self {
            method,
            lambda,
            weight_sum: 0.0,
            sample_count: 0,
        }
    }

    /// Weight decay with coefficient `lambda`.
    pub fn weight_decay(lambda: f32) -> Self {
        Self::new(RegularizationMethod::WeightDecay, lambda)
    }

    pub fn method(&self) -> RegularizationMethod {
        self.method
    }

    pub fn lambda(&self) -> f32 {
        self.lambda
    }

    pub fn weight_sum(&self) -> f32 {
        self.weight_sum
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn set_weight_sum(&mut self, weight_sum: f32) {
        self.weight_sum = weight_sum;
    }

    pub fn set_sample_count(&mut self, sample_count: usize) {
        self.sample_count = sample_count;
    }

    /// Store both per-batch values at once.
    pub fn update(&mut self, weight_sum: f32, sample_count: usize) {
        self.weight_sum = weight_sum;
        self.sample_count = sample_count;
    }

    /// Regularization term added to the training cost.
    ///
    /// `0` without regularization, `lambda / (2n) * weight_sum` with weight decay.
    ///
    /// # Errors
    ///
    /// `EmptyBatch` when weight decay is active and the sample count is zero.
    pub fn regularization_cost(&self) -> Result<f32> {
        match self.method {
            RegularizationMethod::None => Ok(0.0),
            RegularizationMethod::WeightDecay => {
                if self.sample_count == 0 {
                    return Err(NetworkError::EmptyBatch);
                }
                Ok(self.lambda / (2.0 * self.sample_count as f32) * self.weight_sum)
            }
        }
    }

    /// Factor `k` such that `k * w` is the regularization gradient of weight `w`.
    ///
    /// The stored sample count normalises the term; `batch_len` is used when it
    /// has not been set.
    pub fn weight_gradient_factor(&self, batch_len: usize) -> f32 {
        match self.method {
            RegularizationMethod::None => 0.0,
            RegularizationMethod::WeightDecay => {
                let n = if self.sample_count > 0 {
                    self.sample_count
                } else {
                    batch_len
                };
                if n == 0 {
                    0.0
                } else {
                    self.lambda / n as f32
                }
            }
        }
    }
}

impl fmt::Display for Regularization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.method {
            RegularizationMethod::None => write!(f, "None"),
            RegularizationMethod::WeightDecay => write!(f, "Weight Decay (lambda = {})", self.lambda),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_none() {
        let reg = Regularization::default();
        assert_eq!(reg.method(), RegularizationMethod::None);
        assert_eq!(reg.lambda(), 0.0);
        assert_eq!(reg.to_string(), "None");
    }

    #[test]
    fn test_weight_gradient_factor() {
        let mut reg = Regularization::weight_decay(5.0);
        assert!((reg.weight_gradient_factor(10) - 0.5).abs() < 1e-6);

        reg.set_sample_count(100);
        assert!((reg.weight_gradient_factor(10) - 0.05).abs() < 1e-6);

        assert_eq!(Regularization::default().weight_gradient_factor(10), 0.0);
    }

    #[test]
    fn test_method_deserialises_snake_case() {
        let method: RegularizationMethod = serde_json::from_str("\"weight_decay\"").unwrap();
        assert_eq!(method, RegularizationMethod::WeightDecay);
    }
}
