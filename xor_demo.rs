use sigmoid_network::utils::SimpleRng;
use sigmoid_network::{Network, Regularization, Result, Sample};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Small sigmoid network learning XOR (educational example).
const LAYER_SIZES: [usize; 3] = [2, 3, 1];
// Training hyperparameters. Every epoch is one full batch of the four samples.
const LEARNING_RATE: f32 = 4.0;
const EPOCHS: usize = 3000;
const SEED: u64 = 7;
const EUCLIDEAN_THRESHOLD: f32 = 0.5;

fn xor_samples() -> Vec<Sample> {
    vec![
        Sample::new(vec![0.0, 0.0], vec![0.0], 0),
        Sample::new(vec![0.0, 1.0], vec![1.0], 1),
        Sample::new(vec![1.0, 0.0], vec![1.0], 1),
        Sample::new(vec![1.0, 1.0], vec![0.0], 0),
    ]
}

fn train(network: &mut Network, samples: &[Sample]) -> Result<()> {
    let inputs: Vec<&[f32]> = samples.iter().map(|s| s.normalized_input.as_slice()).collect();
    let outputs: Vec<&[f32]> = samples.iter().map(|s| s.expected_output.as_slice()).collect();
    let regularization = Regularization::default();

    for epoch in 0..EPOCHS {
        network.train_batch(&inputs, &outputs, LEARNING_RATE, &regularization)?;

        // Cost printed every 500 epochs.
        if (epoch + 1) % 500 == 0 {
            let cost = network.cost(samples, &regularization)?;
            println!("Epoch {}, Cost: {:.6}", epoch + 1, cost);
        }
    }
    Ok(())
}

fn test(network: &mut Network, samples: &[Sample]) -> Result<()> {
    println!("\nTesting the trained network:");
    for sample in samples {
        let output = network.feed_forward(&sample.normalized_input)?;
        println!(
            "Input: {:.1}, {:.1}, Expected Output: {:.1}, Predicted Output: {:.3}",
            sample.input[0], sample.input[1], sample.expected_output[0], output[0]
        );
    }

    let result = network.test(samples, EUCLIDEAN_THRESHOLD)?;
    println!(
        "Accuracy: {:.2}% (within threshold: {:.2}%)",
        result.success_rate_max_index * 100.0,
        result.success_rate_euclidean * 100.0
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Fixed seed for reproducibility.
    let mut rng = SimpleRng::new(SEED);
    let mut network = Network::new(&LAYER_SIZES, &mut rng)?;
    info!(layers = ?LAYER_SIZES, parameters = network.parameter_count(), "network initialised");

    let samples = xor_samples();
    train(&mut network, &samples)?;
    test(&mut network, &samples)
}
