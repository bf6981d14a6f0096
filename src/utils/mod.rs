//! Shared numeric utilities: activations, matrices and random numbers.

pub mod activations;
pub mod matrix;
pub mod rng;

pub use activations::{d_sigmoid, d_sigmoid_vec, sigmoid, sigmoid_vec};
pub use matrix::Matrix;
pub use rng::SimpleRng;
