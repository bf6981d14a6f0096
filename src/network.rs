//! Feedforward network composed of dense sigmoid layers.
//!
//! The network owns its layers in order and keeps the chain invariant
//! `layers[i].neuron_count() == layers[i + 1].input_count()`. Training is plain
//! mini-batch gradient descent on the quadratic cost, with optional weight decay.

use tracing::debug;

use crate::error::{NetworkError, Result};
use crate::layers::{DenseLayer, Layer};
use crate::regularization::Regularization;
use crate::sample::Sample;
use crate::utils::{Matrix, SimpleRng};

/// Outcome of [`Network::test`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestResult {
    /// Fraction of samples whose output lies within the Euclidean threshold of
    /// the expected vector.
    pub success_rate_euclidean: f64,
    /// Fraction of samples whose predicted class equals the label.
    pub success_rate_max_index: f64,
    /// Indices of samples misclassified by the predicted-class check.
    pub failed_samples: Vec<usize>,
}

/// Class predicted from an output activation.
///
/// Index of the largest component; a single-neuron output is read as a binary
/// decision (`1` when the activation is at least 0.5).
pub fn predicted_class(output: &[f32]) -> usize {
    if output.len() == 1 {
        return usize::from(output[0] >= 0.5);
    }
    output
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, best_value), (i, &value)| {
            if value > best_value {
                (i, value)
            } else {
                (best, best_value)
            }
        })
        .0
}

/// Per-sample result of [`Network::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleOutcome {
    pub within_threshold: bool,
    pub class_matches: bool,
}

impl TestResult {
    /// Aggregate per-sample outcomes, indexed in iteration order.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = SampleOutcome>,
    {
        let mut total = 0usize;
        let mut euclidean_hits = 0usize;
        let mut max_index_hits = 0usize;
        let mut failed_samples = Vec::new();

        for (index, outcome) in outcomes.into_iter().enumerate() {
            total += 1;
            if outcome.within_threshold {
                euclidean_hits += 1;
            }
            if outcome.class_matches {
                max_index_hits += 1;
            } else {
                failed_samples.push(index);
            }
        }

        if total == 0 {
            return Self::default();
        }
        Self {
            success_rate_euclidean: euclidean_hits as f64 / total as f64,
            success_rate_max_index: max_index_hits as f64 / total as f64,
            failed_samples,
        }
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Ordered stack of dense layers.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<DenseLayer>,
}

impl Network {
    /// Build a randomly initialised network.
    ///
    /// `layer_sizes[0]` is the input size, each following entry the neuron
    /// count of one layer: `[2, 3, 1]` is a 2-input network with a hidden layer
    /// of 3 neurons and one output neuron.
    ///
    /// # Errors
    ///
    /// `EmptyNetwork` when fewer than two sizes are given.
    pub fn new(layer_sizes: &[usize], rng: &mut SimpleRng) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(NetworkError::EmptyNetwork);
        }
        let layers = layer_sizes
            .windows(2)
            .map(|pair| DenseLayer::new(pair[1], pair[0], rng))
            .collect();
        Ok(Self { layers })
    }

    /// Assemble a network from existing layers, checking the chain invariant.
    pub fn from_layers(layers: Vec<DenseLayer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(NetworkError::EmptyNetwork);
        }
        for (index, pair) in layers.windows(2).enumerate() {
            if pair[0].neuron_count() != pair[1].input_count() {
                return Err(NetworkError::LayerChainMismatch {
                    index: index + 1,
                    expected: pair[0].neuron_count(),
                    actual: pair[1].input_count(),
                });
            }
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&DenseLayer> {
        self.layers.get(index)
    }

    /// Mutable access to a layer. Its dimensions are fixed, so the chain
    /// invariant cannot be broken through it.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut DenseLayer> {
        self.layers.get_mut(index)
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_count()
    }

    pub fn output_size(&self) -> usize {
        self.output_layer().neuron_count()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Activation of the output layer from the last forward pass.
    pub fn output(&self) -> &[f32] {
        self.output_layer().activation_out()
    }

    fn output_layer(&self) -> &DenseLayer {
        &self.layers[self.layers.len() - 1]
    }

    /// Sum of squared weights over all layers (biases excluded).
    pub fn weight_sum(&self) -> f32 {
        self.layers.iter().map(|l| l.weights().sum_of_squares()).sum()
    }

    /// Forward pass through every layer; returns the output activation.
    ///
    /// # Errors
    ///
    /// `InputSizeMismatch` when `input` does not match the first layer; the
    /// network is left untouched in that case.
    pub fn feed_forward(&mut self, input: &[f32]) -> Result<&[f32]> {
        self.layers[0].feed_forward(input)?;
        for i in 1..self.layers.len() {
            let (done, pending) = self.layers.split_at_mut(i);
            pending[0].feed_forward(done[i - 1].activation_out())?;
        }
        Ok(self.output())
    }

    /// Backward pass for the last forward pass.
    ///
    /// Computes the output error against `expected_output`, propagates it
    /// through the hidden layers in reverse and derives every layer's partial
    /// derivatives.
    pub fn backpropagate(&mut self, expected_output: &[f32]) -> Result<()> {
        let last = self.layers.len() - 1;
        self.layers[last].compute_output_layer_error(expected_output)?;

        for i in (0..last).rev() {
            let (head, tail) = self.layers.split_at_mut(i + 1);
            let next = &tail[0];
            head[i].compute_hidden_layer_error(next.backprop_error(), next.weights())?;
        }

        for layer in &mut self.layers {
            layer.compute_partial_derivatives();
        }
        Ok(())
    }

    /// One step of mini-batch gradient descent.
    ///
    /// Gradients are averaged over the batch. With weight decay the term
    /// `lambda / n * w` is added to every weight gradient before the update.
    ///
    /// # Errors
    ///
    /// `EmptyBatch`, `BatchSizeMismatch`, or any shape error of a sample. Layer
    /// parameters are only updated once every sample has been processed.
    pub fn train_batch<I, O>(
        &mut self,
        inputs: &[I],
        outputs: &[O],
        learning_rate: f32,
        regularization: &Regularization,
    ) -> Result<()>
    where
        I: AsRef<[f32]>,
        O: AsRef<[f32]>,
    {
        if inputs.is_empty() {
            return Err(NetworkError::EmptyBatch);
        }
        if inputs.len() != outputs.len() {
            return Err(NetworkError::BatchSizeMismatch {
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }

        let mut accumulated: Vec<(Matrix, Vec<f32>)> = self
            .layers
            .iter()
            .map(|l| {
                (
                    Matrix::zeros(l.neuron_count(), l.input_count()),
                    vec![0.0; l.neuron_count()],
                )
            })
            .collect();

        for (input, expected) in inputs.iter().zip(outputs) {
            self.feed_forward(input.as_ref())?;
            self.backpropagate(expected.as_ref())?;

            for (layer, (weight_sum, bias_sum)) in self.layers.iter().zip(accumulated.iter_mut()) {
                weight_sum.add_scaled(layer.weight_gradient(), 1.0);
                for (acc, g) in bias_sum.iter_mut().zip(layer.bias_gradient()) {
                    *acc += g;
                }
            }
        }

        let batch_len = inputs.len();
        let inv_batch = 1.0 / batch_len as f32;
        let decay = regularization.weight_gradient_factor(batch_len);

        for (layer, (mut weight_gradient, mut bias_gradient)) in
            self.layers.iter_mut().zip(accumulated)
        {
            weight_gradient.scale(inv_batch);
            bias_gradient.iter_mut().for_each(|g| *g *= inv_batch);
            if decay != 0.0 {
                weight_gradient.add_scaled(layer.weights(), decay);
            }
            layer.set_partial_derivatives(weight_gradient, bias_gradient)?;
            layer.update_parameters(learning_rate)?;
        }

        debug!(batch_len, learning_rate, %regularization, "applied batch update");
        Ok(())
    }

    /// Classify one sample.
    ///
    /// The sample is within threshold when the distance between output and
    /// expected vector is below `euclidean_threshold`; its class matches when
    /// [`predicted_class`] equals the label.
    pub fn evaluate(&mut self, sample: &Sample, euclidean_threshold: f32) -> Result<SampleOutcome> {
        let output = self.feed_forward(&sample.normalized_input)?;
        if output.len() != sample.expected_output.len() {
            return Err(NetworkError::ExpectedOutputSizeMismatch {
                expected: output.len(),
                actual: sample.expected_output.len(),
            });
        }

        Ok(SampleOutcome {
            within_threshold: euclidean_distance(output, &sample.expected_output) < euclidean_threshold,
            class_matches: predicted_class(output) == sample.label as usize,
        })
    }

    /// Evaluate the network on `samples`.
    ///
    /// `failed_samples` lists the indices whose predicted class is wrong.
    pub fn test(&mut self, samples: &[Sample], euclidean_threshold: f32) -> Result<TestResult> {
        if samples.is_empty() {
            return Err(NetworkError::EmptyBatch);
        }

        let outcomes = samples
            .iter()
            .map(|sample| self.evaluate(sample, euclidean_threshold))
            .collect::<Result<Vec<_>>>()?;
        Ok(TestResult::from_outcomes(outcomes))
    }

    /// Mean quadratic cost `0.5 * |a - y|^2` over `samples` plus the
    /// regularization term for the current weights.
    ///
    /// The regularization is normalised by its stored sample count, or by
    /// `samples.len()` when none is set.
    pub fn cost(&mut self, samples: &[Sample], regularization: &Regularization) -> Result<f32> {
        if samples.is_empty() {
            return Err(NetworkError::EmptyBatch);
        }

        let mut total = 0.0f32;
        for sample in samples {
            let output = self.feed_forward(&sample.normalized_input)?;
            if output.len() != sample.expected_output.len() {
                return Err(NetworkError::ExpectedOutputSizeMismatch {
                    expected: output.len(),
                    actual: sample.expected_output.len(),
                });
            }
            total += 0.5 * euclidean_distance(output, &sample.expected_output).powi(2);
        }

        let mut regularization = regularization.clone();
        regularization.set_weight_sum(self.weight_sum());
        if regularization.sample_count() == 0 {
            regularization.set_sample_count(samples.len());
        }

        Ok(total / samples.len() as f32 + regularization.regularization_cost()?)
    }
}
