//! Sigmoid Network Library
//!
//! A small feedforward neural network with sigmoid neurons, trained by
//! backpropagation and mini-batch gradient descent with optional weight decay.
//!
//! # Modules
//!
//! - `layers`: Layer trait and the dense sigmoid layer
//! - `network`: Layer composition, training step and evaluation
//! - `regularization`: Weight-decay policy and cost term
//! - `sample`: Labelled samples and one-hot encoding
//! - `training`: Epoch loop with progress events and cancellation
//! - `config`: Training configuration files
//! - `persistence`: JSON snapshots of network parameters
//! - `utils`: Activations, matrix and RNG helpers

pub mod config;
pub mod error;
pub mod layers;
pub mod network;
pub mod persistence;
pub mod regularization;
pub mod sample;
pub mod training;
pub mod utils;

pub use error::{NetworkError, Result};
pub use layers::{DenseLayer, Layer};
pub use network::{Network, TestResult};
pub use regularization::{Regularization, RegularizationMethod};
pub use sample::Sample;
