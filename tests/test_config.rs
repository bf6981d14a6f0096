//! Tests for configuration parsing
//!
//! This file tests the config module including:
//! - Loading the bundled config files
//! - Defaults for optional fields
//! - Handling invalid JSON and missing files
//! - Range validation

use sigmoid_network::config::{load_config, validate_config, TrainingConfig};
use sigmoid_network::RegularizationMethod;
use std::fs;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), contents).unwrap();
    file
}

fn load_str(contents: &str) -> Result<TrainingConfig, Box<dyn std::error::Error>> {
    let file = write_temp(contents);
    load_config(file.path().to_str().unwrap())
}

// ============================================================================
// Bundled Config Tests
// ============================================================================

mod bundled_config_tests {
    use super::*;

    #[test]
    fn test_load_mnist_config() {
        let config = load_config("config/mnist.json").expect("Failed to load mnist config");

        assert_eq!(config.layer_sizes, vec![784, 30, 10]);
        assert_eq!(config.learning_rate, 3.0);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.epochs, 30);
        assert_eq!(config.regularization.method, RegularizationMethod::None);
    }

    #[test]
    fn test_load_weight_decay_config() {
        let config = load_config("config/mnist_weight_decay.json")
            .expect("Failed to load weight decay config");

        assert_eq!(config.regularization.method, RegularizationMethod::WeightDecay);
        assert_eq!(config.regularization.lambda, 5.0);
        assert_eq!(config.seed, 42);
        assert_eq!(config.euclidean_threshold, 0.5);

        let regularization = config.regularization();
        assert_eq!(regularization.lambda(), 5.0);
        assert_eq!(regularization.sample_count(), 0);
    }
}

// ============================================================================
// Defaults Tests
// ============================================================================

mod defaults_tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_str(r#"{ "layer_sizes": [2, 3, 1], "learning_rate": 4.0 }"#).unwrap();

        assert_eq!(config, TrainingConfig::new(vec![2, 3, 1], 4.0));
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.epochs, 30);
        assert_eq!(config.seed, 1);
        assert_eq!(config.regularization.method, RegularizationMethod::None);
    }

    #[test]
    fn test_regularization_lambda_defaults_to_zero() {
        let config = load_str(
            r#"{
  "layer_sizes": [4, 2],
  "learning_rate": 1.0,
  "regularization": { "method": "weight_decay" }
}"#,
        )
        .unwrap();

        assert_eq!(config.regularization.method, RegularizationMethod::WeightDecay);
        assert_eq!(config.regularization.lambda, 0.0);
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

mod error_handling_tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = load_config("nonexistent_config.json");
        assert!(result.is_err(), "Should fail on missing file");
    }

    #[test]
    fn test_invalid_json_syntax() {
        let result = load_str(
            r#"{
  "layer_sizes": [2, 3, 1],
  "learning_rate": 4.0
  // Missing closing brace
"#,
        );
        assert!(result.is_err(), "Should fail on invalid JSON");
    }

    #[test]
    fn test_missing_required_field() {
        assert!(load_str(r#"{ "layer_sizes": [2, 1] }"#).is_err());
        assert!(load_str("{}").is_err());
    }

    #[test]
    fn test_unknown_regularization_method() {
        let result = load_str(
            r#"{
  "layer_sizes": [2, 1],
  "learning_rate": 1.0,
  "regularization": { "method": "dropout", "lambda": 0.5 }
}"#,
        );
        assert!(result.is_err());
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&TrainingConfig::new(vec![784, 30, 10], 3.0)).is_ok());
    }

    #[test]
    fn test_needs_two_layer_sizes() {
        assert!(validate_config(&TrainingConfig::new(vec![784], 3.0)).is_err());
    }

    #[test]
    fn test_rejects_zero_layer_size() {
        let err = validate_config(&TrainingConfig::new(vec![4, 0, 2], 1.0)).unwrap_err();
        assert!(err.to_string().contains("layer_sizes[1]"));
    }

    #[test]
    fn test_rejects_non_positive_values() {
        assert!(validate_config(&TrainingConfig::new(vec![2, 1], 0.0)).is_err());

        let mut config = TrainingConfig::new(vec![2, 1], 1.0);
        config.batch_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = TrainingConfig::new(vec![2, 1], 1.0);
        config.epochs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = TrainingConfig::new(vec![2, 1], 1.0);
        config.regularization.lambda = -1.0;
        assert!(validate_config(&config).is_err());

        let mut config = TrainingConfig::new(vec![2, 1], 1.0);
        config.euclidean_threshold = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_rejects_out_of_range_values() {
        let result = load_str(r#"{ "layer_sizes": [2, 1], "learning_rate": -0.5 }"#);
        assert!(result.is_err());
    }
}
