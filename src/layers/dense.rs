//! Dense (fully connected) sigmoid layer.
//!
//! Computes `a = sigmoid(W · x + b)` where `W` is `neuron_count × input_count`,
//! and keeps every buffer backpropagation needs between calls.

use std::fmt;

use tracing::warn;

use crate::error::{NetworkError, Result};
use crate::layers::Layer;
use crate::utils::{d_sigmoid_vec, sigmoid, Matrix, SimpleRng};

/// Fully connected layer of sigmoid neurons.
///
/// # Fields
///
/// * `weights` - `neuron_count × input_count`, row `n` holds neuron `n`'s weights
/// * `biases` - one bias per neuron
/// * `activation_in` - input of the last forward pass
/// * `weighted_input` - `W · x + b` of the last forward pass
/// * `activation_out` - sigmoid of the weighted input
/// * `backprop_error` - dC/dz for this layer
/// * `bias_gradient` / `weight_gradient` - partial derivatives of the cost
///
/// # Example
///
/// ```
/// use sigmoid_network::layers::{DenseLayer, Layer};
/// use sigmoid_network::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let mut layer = DenseLayer::new(3, 2, &mut rng);
/// layer.feed_forward(&[0.5, -0.5]).unwrap();
/// assert_eq!(layer.activation_out().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct DenseLayer {
    neuron_count: usize,
    input_count: usize,
    weights: Matrix,
    biases: Vec<f32>,
    activation_in: Vec<f32>,
    activation_out: Vec<f32>,
    weighted_input: Vec<f32>,
    backprop_error: Vec<f32>,
    bias_gradient: Vec<f32>,
    weight_gradient: Matrix,
}

impl DenseLayer {
    /// Create a layer with every weight and bias drawn from N(0, 1).
    ///
    /// The same seed always produces the same parameters.
    pub fn new(neuron_count: usize, input_count: usize, rng: &mut SimpleRng) -> Self {
        let mut layer = Self::zeroed(neuron_count, input_count);
        layer.reset_randomly(rng);
        layer
    }

    /// Create a layer from explicit per-neuron weight rows and biases.
    ///
    /// # Errors
    ///
    /// `ParameterCountMismatch` when `weights.len() != biases.len()`,
    /// `WeightShapeMismatch` when a row does not hold `input_count` weights.
    pub fn with_parameters(input_count: usize, weights: &[Vec<f32>], biases: &[f32]) -> Result<Self> {
        if weights.len() != biases.len() {
            return Err(NetworkError::ParameterCountMismatch {
                weights: weights.len(),
                biases: biases.len(),
            });
        }

        let mut layer = Self::zeroed(weights.len(), input_count);
        layer.set_weight_rows(weights)?;
        layer.set_biases(biases)?;
        Ok(layer)
    }

    fn zeroed(neuron_count: usize, input_count: usize) -> Self {
        Self {
            neuron_count,
            input_count,
            weights: Matrix::zeros(neuron_count, input_count),
            biases: vec![0.0; neuron_count],
            activation_in: vec![0.0; input_count],
            activation_out: vec![0.0; neuron_count],
            weighted_input: vec![0.0; neuron_count],
            backprop_error: vec![0.0; neuron_count],
            bias_gradient: vec![0.0; neuron_count],
            weight_gradient: Matrix::zeros(neuron_count, input_count),
        }
    }

    /// Redraws every weight and bias from N(0, 1).
    pub fn reset_randomly(&mut self, rng: &mut SimpleRng) {
        for n in 0..self.neuron_count {
            self.biases[n] = rng.next_gaussian();
            for weight in self.weights.row_mut(n) {
                *weight = rng.next_gaussian();
            }
        }
    }

    pub fn neuron_count(&self) -> usize {
        self.neuron_count
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    pub fn activation_in(&self) -> &[f32] {
        &self.activation_in
    }

    pub fn weighted_input(&self) -> &[f32] {
        &self.weighted_input
    }

    pub fn backprop_error(&self) -> &[f32] {
        &self.backprop_error
    }

    pub fn bias_gradient(&self) -> &[f32] {
        &self.bias_gradient
    }

    pub fn weight_gradient(&self) -> &Matrix {
        &self.weight_gradient
    }

    /// Replace the weights from one row per neuron.
    pub fn set_weight_rows(&mut self, rows: &[Vec<f32>]) -> Result<()> {
        let mismatch = rows.len() != self.neuron_count
            || rows.iter().any(|row| row.len() != self.input_count);
        if mismatch {
            let cols = rows
                .iter()
                .map(Vec::len)
                .find(|&len| len != self.input_count)
                .unwrap_or(self.input_count);
            return Err(self.weight_shape_error(rows.len(), cols));
        }

        for (n, row) in rows.iter().enumerate() {
            self.weights.row_mut(n).copy_from_slice(row);
        }
        Ok(())
    }

    /// Replace the whole weight matrix.
    pub fn set_weights(&mut self, weights: Matrix) -> Result<()> {
        if weights.shape() != self.weights.shape() {
            return Err(self.weight_shape_error(weights.rows(), weights.cols()));
        }
        self.weights = weights;
        Ok(())
    }

    /// Replace the bias vector.
    pub fn set_biases(&mut self, biases: &[f32]) -> Result<()> {
        if biases.len() != self.neuron_count {
            warn!(
                expected = self.neuron_count,
                actual = biases.len(),
                "bias vector size mismatches number of neurons"
            );
            return Err(NetworkError::BiasSizeMismatch {
                expected: self.neuron_count,
                actual: biases.len(),
            });
        }
        self.biases.copy_from_slice(biases);
        Ok(())
    }

    /// Set every weight to `weight`.
    pub fn set_uniform_weight(&mut self, weight: f32) {
        self.weights.fill(weight);
    }

    /// Set every bias to `bias`.
    pub fn set_uniform_bias(&mut self, bias: f32) {
        self.biases.iter_mut().for_each(|b| *b = bias);
    }

    /// Overwrite the activation output, bypassing `feed_forward`.
    pub fn set_activation_output(&mut self, activation: &[f32]) -> Result<()> {
        if activation.len() != self.neuron_count {
            warn!(
                expected = self.neuron_count,
                actual = activation.len(),
                "layer activation output mismatch"
            );
            return Err(NetworkError::ActivationSizeMismatch {
                expected: self.neuron_count,
                actual: activation.len(),
            });
        }
        self.activation_out.copy_from_slice(activation);
        Ok(())
    }

    /// Install externally computed gradients (e.g. batch averages).
    pub fn set_partial_derivatives(&mut self, weight_gradient: Matrix, bias_gradient: Vec<f32>) -> Result<()> {
        if weight_gradient.shape() != self.weights.shape() {
            return Err(self.weight_shape_error(weight_gradient.rows(), weight_gradient.cols()));
        }
        if bias_gradient.len() != self.neuron_count {
            return Err(NetworkError::BiasSizeMismatch {
                expected: self.neuron_count,
                actual: bias_gradient.len(),
            });
        }
        self.weight_gradient = weight_gradient;
        self.bias_gradient = bias_gradient;
        Ok(())
    }

    /// Dump biases, weights and backpropagation error to stdout.
    pub fn print(&self) {
        println!("{}", self);
    }

    fn weight_shape_error(&self, rows: usize, cols: usize) -> NetworkError {
        warn!(
            expected_rows = self.neuron_count,
            expected_cols = self.input_count,
            rows,
            cols,
            "weight matrix size mismatches"
        );
        NetworkError::WeightShapeMismatch {
            expected_rows: self.neuron_count,
            expected_cols: self.input_count,
            rows,
            cols,
        }
    }
}

impl Layer for DenseLayer {
    fn feed_forward(&mut self, input: &[f32]) -> Result<()> {
        if input.len() != self.input_count {
            warn!(
                expected = self.input_count,
                actual = input.len(),
                "layer input vector size mismatch"
            );
            return Err(NetworkError::InputSizeMismatch {
                expected: self.input_count,
                actual: input.len(),
            });
        }

        self.activation_in.copy_from_slice(input);
        self.weighted_input = self.weights.mul_vec(input);
        for ((z, b), a) in self
            .weighted_input
            .iter_mut()
            .zip(&self.biases)
            .zip(self.activation_out.iter_mut())
        {
            *z += b;
            *a = sigmoid(*z);
        }
        Ok(())
    }

    fn activation_out(&self) -> &[f32] {
        &self.activation_out
    }

    fn compute_output_layer_error(&mut self, expected_output: &[f32]) -> Result<()> {
        if expected_output.len() != self.activation_out.len() {
            warn!(
                expected = self.activation_out.len(),
                actual = expected_output.len(),
                "layer activation output to label mismatch"
            );
            return Err(NetworkError::ExpectedOutputSizeMismatch {
                expected: self.activation_out.len(),
                actual: expected_output.len(),
            });
        }

        let slopes = d_sigmoid_vec(&self.weighted_input);
        self.backprop_error = self
            .activation_out
            .iter()
            .zip(expected_output)
            .zip(&slopes)
            .map(|((a, y), s)| (a - y) * s)
            .collect();
        Ok(())
    }

    fn compute_hidden_layer_error(
        &mut self,
        error_next_layer: &[f32],
        weights_next_layer: &Matrix,
    ) -> Result<()> {
        if self.weighted_input.len() != weights_next_layer.cols()
            || error_next_layer.len() != weights_next_layer.rows()
        {
            warn!(
                weighted_input = self.weighted_input.len(),
                next_error = error_next_layer.len(),
                next_rows = weights_next_layer.rows(),
                next_cols = weights_next_layer.cols(),
                "hidden layer backpropagation dimension mismatch"
            );
            return Err(NetworkError::BackpropShapeMismatch {
                weighted_input: self.weighted_input.len(),
                next_error: error_next_layer.len(),
                next_rows: weights_next_layer.rows(),
                next_cols: weights_next_layer.cols(),
            });
        }

        let propagated = weights_next_layer.transpose_mul_vec(error_next_layer);
        let slopes = d_sigmoid_vec(&self.weighted_input);
        self.backprop_error = propagated.iter().zip(&slopes).map(|(e, s)| e * s).collect();
        Ok(())
    }

    fn compute_partial_derivatives(&mut self) {
        self.bias_gradient.clone_from(&self.backprop_error);
        self.weight_gradient = Matrix::outer(&self.backprop_error, &self.activation_in);
    }

    fn update_parameters(&mut self, learning_rate: f32) -> Result<()> {
        let biases: Vec<f32> = self
            .biases
            .iter()
            .zip(&self.bias_gradient)
            .map(|(b, g)| b - learning_rate * g)
            .collect();
        self.set_biases(&biases)?;

        let mut weights = self.weights.clone();
        weights.add_scaled(&self.weight_gradient, -learning_rate);
        self.set_weights(weights)
    }

    fn input_size(&self) -> usize {
        self.input_count
    }

    fn output_size(&self) -> usize {
        self.neuron_count
    }

    fn parameter_count(&self) -> usize {
        self.weights.as_slice().len() + self.biases.len()
    }
}

impl fmt::Display for DenseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Biases: {:?}", self.biases)?;
        writeln!(f, "Weights:")?;
        for n in 0..self.neuron_count {
            writeln!(f, "  {:?}", self.weights.row(n))?;
        }
        write!(f, "Error: {:?}", self.backprop_error)
    }
}
