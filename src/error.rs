//! Error type shared by the layer, network and training modules.

use thiserror::Error;

/// Contract violations reported by the engine.
///
/// Shape mismatches never mutate the receiver: an operation that returns one
/// of these leaves the layer or network exactly as it was.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("layer input has {actual} elements, expected {expected}")]
    InputSizeMismatch { expected: usize, actual: usize },

    #[error("weight matrix is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    WeightShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("bias vector has {actual} elements, expected {expected}")]
    BiasSizeMismatch { expected: usize, actual: usize },

    #[error("activation output has {actual} elements, expected {expected}")]
    ActivationSizeMismatch { expected: usize, actual: usize },

    #[error("expected output has {actual} elements, layer produces {expected}")]
    ExpectedOutputSizeMismatch { expected: usize, actual: usize },

    #[error(
        "backpropagation shape mismatch: weighted input {weighted_input}, \
         next layer error {next_error}, next layer weights {next_rows}x{next_cols}"
    )]
    BackpropShapeMismatch {
        weighted_input: usize,
        next_error: usize,
        next_rows: usize,
        next_cols: usize,
    },

    #[error("{weights} weight rows given for {biases} biases")]
    ParameterCountMismatch { weights: usize, biases: usize },

    #[error("layer {index} expects {actual} inputs but the previous layer has {expected} neurons")]
    LayerChainMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("a network needs at least one layer")]
    EmptyNetwork,

    #[error("operation needs at least one sample")]
    EmptyBatch,

    #[error("{inputs} inputs given with {outputs} expected outputs")]
    BatchSizeMismatch { inputs: usize, outputs: usize },

    #[error("label {label} is out of range for {classes} classes")]
    InvalidLabel { label: u8, classes: usize },

    #[error("training worker panicked")]
    WorkerPanicked,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
