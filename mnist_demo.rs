use clap::Parser;
use sigmoid_network::config::{load_config, validate_config, TrainingConfig};
use sigmoid_network::training::{self, Operation, OperationStatus, Trainer, TrainingEvent};
use sigmoid_network::{RegularizationMethod, Sample};
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// MNIST dimensions.
const NUM_INPUTS: usize = 784;
const NUM_CLASSES: usize = 10;
const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;

/// Train a sigmoid network on MNIST
#[derive(Parser, Debug)]
#[command(name = "mnist_demo", about = "Train and test a sigmoid network on MNIST")]
struct Args {
    /// Directory holding the four IDX files
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// JSON training configuration; command line values override it
    #[arg(long)]
    config: Option<String>,

    /// Hidden layer sizes, e.g. --hidden 30 or --hidden 100,30
    #[arg(long, value_delimiter = ',')]
    hidden: Option<Vec<usize>>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f32>,

    #[arg(long)]
    batch_size: Option<usize>,

    /// Weight decay coefficient; enables weight decay when positive
    #[arg(long)]
    lambda: Option<f32>,

    #[arg(long)]
    seed: Option<u64>,

    /// Use at most this many training samples
    #[arg(long, default_value_t = 60_000)]
    train_samples: usize,

    /// Use at most this many test samples
    #[arg(long, default_value_t = 10_000)]
    test_samples: usize,

    /// Where the trained parameters are written
    #[arg(long, default_value = "mnist_model.json")]
    output: PathBuf,
}

fn build_config(args: &Args) -> Result<TrainingConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TrainingConfig::new(vec![NUM_INPUTS, 30, NUM_CLASSES], 3.0),
    };

    if let Some(hidden) = &args.hidden {
        let mut sizes = vec![NUM_INPUTS];
        sizes.extend(hidden);
        sizes.push(NUM_CLASSES);
        config.layer_sizes = sizes;
    }
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(lambda) = args.lambda {
        config.regularization.lambda = lambda;
        config.regularization.method = if lambda > 0.0 {
            RegularizationMethod::WeightDecay
        } else {
            RegularizationMethod::None
        };
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    validate_config(&config)?;
    if config.layer_sizes.first() != Some(&NUM_INPUTS) || config.layer_sizes.last() != Some(&NUM_CLASSES) {
        return Err(format!("layer_sizes must start with {} and end with {}", NUM_INPUTS, NUM_CLASSES).into());
    }
    Ok(config)
}

fn truncated(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, format!("{} file is truncated", what))
}

fn read_be_u32(data: &[u8], offset: &mut usize) -> io::Result<u32> {
    let bytes = data
        .get(*offset..*offset + 4)
        .ok_or_else(|| truncated("IDX"))?;
    *offset += 4;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn check_magic(found: u32, expected: u32) -> io::Result<()> {
    if found != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("bad IDX magic number {} (expected {})", found, expected),
        ));
    }
    Ok(())
}

// Read IDX images as one row of raw pixels per image.
fn parse_idx_images(data: &[u8], max_images: usize) -> io::Result<Vec<Vec<u8>>> {
    let mut offset = 0usize;
    check_magic(read_be_u32(data, &mut offset)?, IMAGE_MAGIC)?;
    let total_images = read_be_u32(data, &mut offset)? as usize;
    let rows = read_be_u32(data, &mut offset)? as usize;
    let cols = read_be_u32(data, &mut offset)? as usize;
    let image_size = rows * cols;
    let count = max_images.min(total_images);

    let pixels = data
        .get(offset..offset + count * image_size)
        .ok_or_else(|| truncated("MNIST image"))?;
    Ok(pixels.chunks(image_size.max(1)).map(<[u8]>::to_vec).collect())
}

// Read IDX labels (0-9).
fn parse_idx_labels(data: &[u8], max_labels: usize) -> io::Result<Vec<u8>> {
    let mut offset = 0usize;
    check_magic(read_be_u32(data, &mut offset)?, LABEL_MAGIC)?;
    let total_labels = read_be_u32(data, &mut offset)? as usize;
    let count = max_labels.min(total_labels);

    data.get(offset..offset + count)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| truncated("MNIST label"))
}

fn load_samples(images: &Path, labels: &Path, max: usize) -> Result<Vec<Sample>, Box<dyn Error>> {
    let images = parse_idx_images(&std::fs::read(images)?, max)?;
    let labels = parse_idx_labels(&std::fs::read(labels)?, max)?;
    if images.len() != labels.len() {
        return Err(format!("{} images but {} labels", images.len(), labels.len()).into());
    }

    let samples = images
        .iter()
        .zip(&labels)
        .map(|(pixels, &label)| Sample::from_pixels(pixels, label, NUM_CLASSES))
        .collect::<sigmoid_network::Result<Vec<_>>>()?;
    Ok(samples)
}

// Print progress in 10% steps plus every epoch cost.
fn report(event: &TrainingEvent, last_decile: &mut Option<(Operation, u32)>) {
    match event {
        TrainingEvent::Progress {
            operation,
            status: OperationStatus::Running,
            progress,
        } => {
            let decile = (progress * 10.0).floor() as u32;
            if *last_decile != Some((*operation, decile)) {
                *last_decile = Some((*operation, decile));
                println!("{:?}: {:>3}%", operation, decile * 10);
            }
        }
        TrainingEvent::Progress {
            operation, status, ..
        } => println!("{:?} {:?}", operation, status),
        TrainingEvent::EpochFinished { epoch, cost } => {
            println!("Epoch {}, Cost: {:.6}", epoch, cost);
        }
        TrainingEvent::TestResults(result) => {
            println!(
                "Test Accuracy: {:.2}% (within threshold: {:.2}%), {} misclassified",
                result.success_rate_max_index * 100.0,
                result.success_rate_euclidean * 100.0,
                result.failed_samples.len()
            );
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let program_start = Instant::now();

    println!("Loading training data...");
    let load_start = Instant::now();
    let training_samples = load_samples(
        &args.data_dir.join("train-images.idx3-ubyte"),
        &args.data_dir.join("train-labels.idx1-ubyte"),
        args.train_samples,
    )?;
    println!("Loading test data...");
    let test_samples = load_samples(
        &args.data_dir.join("t10k-images.idx3-ubyte"),
        &args.data_dir.join("t10k-labels.idx1-ubyte"),
        args.test_samples,
    )?;
    let load_time = load_start.elapsed().as_secs_f64();
    info!(
        training = training_samples.len(),
        testing = test_samples.len(),
        "data loaded"
    );

    println!("Initializing neural network...");
    let network = Trainer::new(config.clone()).build_network()?;
    info!(layers = ?config.layer_sizes, parameters = network.parameter_count(), "network initialised");

    println!("Training neural network...");
    let run_start = Instant::now();
    let handle = training::spawn(network, training_samples, test_samples, config);
    let mut last_decile = None;
    for event in handle.events().iter() {
        report(&event, &mut last_decile);
    }
    let network = handle.join()?;
    let run_time = run_start.elapsed().as_secs_f64();

    println!("Saving model...");
    if let Err(err) = network.save_json(&args.output) {
        warn!(error = %err, "could not save model");
    }

    let total_time = program_start.elapsed().as_secs_f64();
    println!("\n=== Performance Summary ===");
    println!("Data loading time: {:.2} seconds", load_time);
    println!("Training and testing time: {:.2} seconds", run_time);
    println!("Total program time: {:.2} seconds", total_time);
    println!("========================");
    Ok(())
}
