//! Tests for backpropagation error, partial derivatives and parameter updates
//! of a single dense layer.

use approx::assert_relative_eq;
use sigmoid_network::layers::{DenseLayer, Layer};
use sigmoid_network::utils::{d_sigmoid, Matrix, SimpleRng};
use sigmoid_network::NetworkError;

fn small_layer() -> DenseLayer {
    DenseLayer::with_parameters(2, &[vec![0.2, -0.4], vec![0.7, 0.1], vec![-0.3, 0.5]], &[0.1, 0.0, -0.2])
        .unwrap()
}

// ============================================================================
// Output Layer Error Tests
// ============================================================================

mod output_error_tests {
    use super::*;

    #[test]
    fn test_output_error_is_hadamard_product() {
        let mut layer = small_layer();
        layer.feed_forward(&[1.0, 0.5]).unwrap();
        let expected = [0.0, 1.0, 0.0];

        layer.compute_output_layer_error(&expected).unwrap();

        for n in 0..3 {
            let delta = (layer.activation_out()[n] - expected[n]) * d_sigmoid(layer.weighted_input()[n]);
            assert_relative_eq!(layer.backprop_error()[n], delta, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_output_error_zero_on_perfect_prediction() {
        let mut layer = small_layer();
        layer.feed_forward(&[0.3, 0.3]).unwrap();
        let target = layer.activation_out().to_vec();

        layer.compute_output_layer_error(&target).unwrap();
        assert!(layer.backprop_error().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_output_error_size_mismatch() {
        let mut layer = small_layer();
        layer.feed_forward(&[1.0, 0.5]).unwrap();
        layer.compute_output_layer_error(&[0.0, 1.0, 0.0]).unwrap();
        let before = layer.backprop_error().to_vec();

        let result = layer.compute_output_layer_error(&[0.0, 1.0]);
        assert!(matches!(
            result,
            Err(NetworkError::ExpectedOutputSizeMismatch { expected: 3, actual: 2 })
        ));
        assert_eq!(layer.backprop_error(), before.as_slice());
    }
}

// ============================================================================
// Hidden Layer Error Tests
// ============================================================================

mod hidden_error_tests {
    use super::*;

    #[test]
    fn test_hidden_error_recurrence() {
        let mut layer = small_layer();
        layer.feed_forward(&[0.4, -0.6]).unwrap();

        // Next layer: 2 neurons, 3 inputs.
        let next_weights = Matrix::from_rows(&[vec![1.0, -2.0, 0.5], vec![0.3, 0.3, -1.0]]).unwrap();
        let next_error = [0.2, -0.1];

        layer.compute_hidden_layer_error(&next_error, &next_weights).unwrap();

        for j in 0..3 {
            let propagated = next_weights.get(0, j) * next_error[0] + next_weights.get(1, j) * next_error[1];
            let expected = propagated * d_sigmoid(layer.weighted_input()[j]);
            assert_relative_eq!(layer.backprop_error()[j], expected, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_hidden_error_column_mismatch() {
        let mut layer = small_layer();
        layer.feed_forward(&[0.4, -0.6]).unwrap();

        let result = layer.compute_hidden_layer_error(&[0.2, -0.1], &Matrix::zeros(2, 4));
        assert!(matches!(
            result,
            Err(NetworkError::BackpropShapeMismatch {
                weighted_input: 3,
                next_error: 2,
                next_rows: 2,
                next_cols: 4
            })
        ));
    }

    #[test]
    fn test_hidden_error_row_mismatch() {
        let mut layer = small_layer();
        layer.feed_forward(&[0.4, -0.6]).unwrap();

        let result = layer.compute_hidden_layer_error(&[0.2], &Matrix::zeros(2, 3));
        assert!(matches!(result, Err(NetworkError::BackpropShapeMismatch { .. })));
    }
}

// ============================================================================
// Partial Derivative and Update Tests
// ============================================================================

mod update_tests {
    use super::*;

    #[test]
    fn test_partial_derivatives_shapes_and_values() {
        let mut layer = small_layer();
        layer.feed_forward(&[1.0, -2.0]).unwrap();
        layer.compute_output_layer_error(&[1.0, 0.0, 1.0]).unwrap();
        layer.compute_partial_derivatives();

        assert_eq!(layer.bias_gradient(), layer.backprop_error());
        assert_eq!(layer.weight_gradient().shape(), (3, 2));
        for n in 0..3 {
            for i in 0..2 {
                let expected = layer.backprop_error()[n] * layer.activation_in()[i];
                assert_relative_eq!(layer.weight_gradient().get(n, i), expected, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn test_zero_learning_rate_keeps_parameters() {
        let mut rng = SimpleRng::new(8);
        let mut layer = DenseLayer::new(4, 3, &mut rng);
        layer.feed_forward(&[0.5, 0.1, -0.3]).unwrap();
        layer.compute_output_layer_error(&[1.0, 0.0, 0.0, 1.0]).unwrap();
        layer.compute_partial_derivatives();
        let weights = layer.weights().clone();
        let biases = layer.biases().to_vec();

        layer.update_parameters(0.0).unwrap();

        assert_eq!(layer.weights(), &weights);
        assert_eq!(layer.biases(), biases.as_slice());
    }

    #[test]
    fn test_update_moves_against_gradient() {
        let mut layer = small_layer();
        layer.feed_forward(&[1.0, 0.5]).unwrap();
        layer.compute_output_layer_error(&[0.0, 1.0, 0.0]).unwrap();
        layer.compute_partial_derivatives();
        let weights = layer.weights().clone();
        let biases = layer.biases().to_vec();
        let weight_gradient = layer.weight_gradient().clone();
        let bias_gradient = layer.bias_gradient().to_vec();

        layer.update_parameters(0.5).unwrap();

        for n in 0..3 {
            assert_relative_eq!(layer.biases()[n], biases[n] - 0.5 * bias_gradient[n], epsilon = 1e-7);
            for i in 0..2 {
                assert_relative_eq!(
                    layer.weights().get(n, i),
                    weights.get(n, i) - 0.5 * weight_gradient.get(n, i),
                    epsilon = 1e-7
                );
            }
        }
    }

    #[test]
    fn test_single_step_reduces_cost() {
        let mut layer = small_layer();
        let input = [0.8, -0.2];
        let target = [1.0, 0.0, 1.0];
        let cost = |layer: &DenseLayer| -> f32 {
            layer
                .activation_out()
                .iter()
                .zip(&target)
                .map(|(a, y)| 0.5 * (a - y) * (a - y))
                .sum()
        };

        layer.feed_forward(&input).unwrap();
        let before = cost(&layer);
        layer.compute_output_layer_error(&target).unwrap();
        layer.compute_partial_derivatives();
        layer.update_parameters(0.5).unwrap();
        layer.feed_forward(&input).unwrap();

        assert!(cost(&layer) < before);
    }

    #[test]
    fn test_set_partial_derivatives_checks_shapes() {
        let mut layer = small_layer();
        assert!(layer.set_partial_derivatives(Matrix::zeros(2, 3), vec![0.0; 3]).is_err());
        assert!(layer.set_partial_derivatives(Matrix::zeros(3, 2), vec![0.0; 2]).is_err());

        layer.set_partial_derivatives(Matrix::filled(3, 2, 1.0), vec![2.0; 3]).unwrap();
        layer.update_parameters(0.1).unwrap();
        assert_relative_eq!(layer.biases()[0], 0.1 - 0.2, epsilon = 1e-6);
        assert_relative_eq!(layer.weights().get(0, 0), 0.2 - 0.1, epsilon = 1e-6);
    }
}
