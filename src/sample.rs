//! Labelled samples handed to the network by a data loader.
//!
//! The loader and the engine agree on one rule: a label `k` out of `c` classes
//! becomes a length-`c` vector with a single `1.0` at index `k`.

use crate::error::{NetworkError, Result};

/// One-hot encoding of `label` over `classes` outputs.
pub fn one_hot(label: u8, classes: usize) -> Result<Vec<f32>> {
    let index = label as usize;
    if index >= classes {
        return Err(NetworkError::InvalidLabel { label, classes });
    }
    let mut encoded = vec![0.0f32; classes];
    encoded[index] = 1.0;
    Ok(encoded)
}

/// Training or test sample.
///
/// The network consumes `normalized_input`; `input` keeps the raw values for
/// display.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub input: Vec<f32>,
    pub normalized_input: Vec<f32>,
    pub expected_output: Vec<f32>,
    pub label: u8,
}

impl Sample {
    /// Sample with an explicit expected output vector.
    ///
    /// The input is normalised by its largest absolute component.
    pub fn new(input: Vec<f32>, expected_output: Vec<f32>, label: u8) -> Self {
        let peak = input.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        let normalized_input = if peak > 0.0 {
            input.iter().map(|v| v / peak).collect()
        } else {
            input.clone()
        };

        Self {
            input,
            normalized_input,
            expected_output,
            label,
        }
    }

    /// Sample whose expected output is the one-hot encoding of `label`.
    pub fn one_hot(input: Vec<f32>, label: u8, classes: usize) -> Result<Self> {
        let expected_output = one_hot(label, classes)?;
        Ok(Self::new(input, expected_output, label))
    }

    /// Sample built from 8-bit pixels; the normalised input is `pixel / 255`.
    pub fn from_pixels(pixels: &[u8], label: u8, classes: usize) -> Result<Self> {
        let expected_output = one_hot(label, classes)?;
        Ok(Self {
            input: pixels.iter().map(|&p| p as f32).collect(),
            normalized_input: pixels.iter().map(|&p| p as f32 / 255.0).collect(),
            expected_output,
            label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot() {
        assert_eq!(one_hot(2, 4).unwrap(), vec![0.0, 0.0, 1.0, 0.0]);
        assert!(matches!(
            one_hot(4, 4),
            Err(NetworkError::InvalidLabel { label: 4, classes: 4 })
        ));
    }

    #[test]
    fn test_normalisation_by_peak() {
        let sample = Sample::new(vec![2.0, -4.0, 1.0], vec![1.0], 1);
        assert_eq!(sample.normalized_input, vec![0.5, -1.0, 0.25]);
        assert_eq!(sample.input, vec![2.0, -4.0, 1.0]);
    }

    #[test]
    fn test_zero_input_left_unchanged() {
        let sample = Sample::new(vec![0.0, 0.0], vec![0.0], 0);
        assert_eq!(sample.normalized_input, vec![0.0, 0.0]);
    }

    #[test]
    fn test_from_pixels() {
        let sample = Sample::from_pixels(&[0, 255, 51], 3, 10).unwrap();
        assert_eq!(sample.input, vec![0.0, 255.0, 51.0]);
        assert_eq!(sample.normalized_input, vec![0.0, 1.0, 0.2]);
        assert_eq!(sample.expected_output[3], 1.0);
        assert_eq!(sample.expected_output.iter().sum::<f32>(), 1.0);
    }
}
