//! Sigmoid neuron activation functions.
//!
//! Neurons carry no state: a layer applies these element-wise to its
//! weighted input vector.

/// Sigmoid activation: 1 / (1 + exp(-z)).
///
/// Saturates towards 0 and 1 for large |z|; defined for every finite input.
pub fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// Derivative of the sigmoid with respect to the weighted input `z`.
///
/// Returns sigmoid(z) * (1 - sigmoid(z)).
pub fn d_sigmoid(z: f32) -> f32 {
    let s = sigmoid(z);
    s * (1.0 - s)
}

/// Applies [`sigmoid`] to every component.
pub fn sigmoid_vec(z: &[f32]) -> Vec<f32> {
    z.iter().map(|&value| sigmoid(value)).collect()
}

/// Applies [`d_sigmoid`] to every component.
pub fn d_sigmoid_vec(z: &[f32]) -> Vec<f32> {
    z.iter().map(|&value| d_sigmoid(value)).collect()
}
