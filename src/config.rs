//! Configuration structures for training
//!
//! A training run is described by a JSON file: network shape, gradient
//! descent hyperparameters, regularization and the evaluation threshold.

use serde::Deserialize;
use std::error::Error;
use std::fs;

use crate::regularization::{Regularization, RegularizationMethod};

/// Regularization section of a training configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegularizationConfig {
    /// "none" or "weight_decay"
    #[serde(default)]
    pub method: RegularizationMethod,

    /// Weight decay coefficient
    #[serde(default)]
    pub lambda: f32,
}

/// Configuration for a training run.
///
/// Only `layer_sizes` and `learning_rate` are required.
///
/// # Example
///
/// ```json
/// {
///   "layer_sizes": [784, 30, 10],
///   "learning_rate": 3.0,
///   "batch_size": 10,
///   "epochs": 30,
///   "regularization": { "method": "weight_decay", "lambda": 5.0 },
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainingConfig {
    /// Input size followed by the neuron count of every layer
    pub layer_sizes: Vec<usize>,

    /// Gradient descent step size
    pub learning_rate: f32,

    /// Samples per mini-batch (default 10)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Passes over the training set (default 30)
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    #[serde(default)]
    pub regularization: RegularizationConfig,

    /// Seed for weight initialization and shuffling (default 1)
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum distance to the expected output counted as a success (default 0.5)
    #[serde(default = "default_euclidean_threshold")]
    pub euclidean_threshold: f32,
}

fn default_batch_size() -> usize {
    10
}

fn default_epochs() -> usize {
    30
}

fn default_seed() -> u64 {
    1
}

fn default_euclidean_threshold() -> f32 {
    0.5
}

impl TrainingConfig {
    /// Configuration with defaults for everything but shape and learning rate.
    pub fn new(layer_sizes: Vec<usize>, learning_rate: f32) -> Self {
        Self {
            layer_sizes,
            learning_rate,
            batch_size: default_batch_size(),
            epochs: default_epochs(),
            regularization: RegularizationConfig::default(),
            seed: default_seed(),
            euclidean_threshold: default_euclidean_threshold(),
        }
    }

    /// Fresh regularization policy for this run.
    pub fn regularization(&self) -> Regularization {
        Regularization::new(self.regularization.method, self.regularization.lambda)
    }
}

/// Loads a training configuration from a JSON file.
///
/// # Returns
///
/// `Ok(TrainingConfig)` on success, or an error if the file cannot be read,
/// the JSON is invalid or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use sigmoid_network::config::load_config;
///
/// let cfg = load_config("config/mnist.json").unwrap();
/// assert_eq!(cfg.layer_sizes.first(), Some(&784));
/// ```
pub fn load_config(path: &str) -> Result<TrainingConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> Box<dyn Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message.into(),
    ))
}

/// Checks value ranges of a parsed configuration.
pub fn validate_config(config: &TrainingConfig) -> Result<(), Box<dyn Error>> {
    if config.layer_sizes.len() < 2 {
        return Err(invalid("layer_sizes needs an input size and at least one layer"));
    }

    if let Some(position) = config.layer_sizes.iter().position(|&size| size == 0) {
        return Err(invalid(format!("layer_sizes[{}] must be positive", position)));
    }

    if !(config.learning_rate > 0.0) {
        return Err(invalid("learning_rate must be positive"));
    }

    if config.batch_size == 0 {
        return Err(invalid("batch_size must be positive"));
    }

    if config.epochs == 0 {
        return Err(invalid("epochs must be positive"));
    }

    if config.regularization.lambda < 0.0 {
        return Err(invalid("lambda must be non-negative"));
    }

    if !(config.euclidean_threshold > 0.0) {
        return Err(invalid("euclidean_threshold must be positive"));
    }

    Ok(())
}
