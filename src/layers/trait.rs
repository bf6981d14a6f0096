//! Layer trait definition for the sigmoid network.
//!
//! A layer is driven in a fixed order during training: `feed_forward`, then
//! one of the error computations, then `compute_partial_derivatives`, then
//! `update_parameters`. Nothing enforces the order; callers must respect it.

use crate::error::Result;
use crate::utils::Matrix;

/// Core trait for fully connected sigmoid layers.
///
/// # Example
///
/// ```ignore
/// layer.feed_forward(&input)?;
/// layer.compute_output_layer_error(&expected)?;
/// layer.compute_partial_derivatives();
/// layer.update_parameters(0.5)?;
/// ```
pub trait Layer {
    /// Forward propagation: stores the input, computes the weighted input and
    /// the sigmoid activation of every neuron.
    ///
    /// # Errors
    ///
    /// Returns `InputSizeMismatch` and leaves the layer untouched when the input
    /// length differs from `input_size()`.
    fn feed_forward(&mut self, input: &[f32]) -> Result<()>;

    /// Activation produced by the last forward pass (or forced by a setter).
    fn activation_out(&self) -> &[f32];

    /// Backpropagation error of an output layer under the quadratic cost.
    fn compute_output_layer_error(&mut self, expected_output: &[f32]) -> Result<()>;

    /// Backpropagation error of a hidden layer from the following layer's error
    /// and weight matrix.
    fn compute_hidden_layer_error(
        &mut self,
        error_next_layer: &[f32],
        weights_next_layer: &Matrix,
    ) -> Result<()>;

    /// Derives bias and weight gradients from the stored error and input.
    ///
    /// The error and input must come from the same pass.
    fn compute_partial_derivatives(&mut self);

    /// Gradient descent step: `param -= learning_rate * gradient`.
    fn update_parameters(&mut self, learning_rate: f32) -> Result<()>;

    /// Number of inputs per sample.
    fn input_size(&self) -> usize;

    /// Number of neurons (outputs).
    fn output_size(&self) -> usize;

    /// Total count of weights and biases.
    fn parameter_count(&self) -> usize;
}
