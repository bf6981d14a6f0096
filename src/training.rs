//! Training driver: epochs, mini-batches, progress events and cancellation.
//!
//! The driver reports through a channel of [`TrainingEvent`]s instead of shared
//! progress state. A receiver that hangs up never stops a run; only the
//! [`CancellationToken`] does, and it is checked between batches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::info;

use crate::config::TrainingConfig;
use crate::error::{NetworkError, Result};
use crate::network::{Network, TestResult};
use crate::regularization::Regularization;
use crate::sample::Sample;
use crate::utils::SimpleRng;

/// Number of progress events emitted while testing.
const TEST_PROGRESS_STEPS: usize = 100;

/// Long-running operations of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Training,
    Testing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Running,
    Finished,
    Cancelled,
}

/// Messages sent from a training run to whoever displays it.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    /// `progress` is the completed fraction of the operation, in [0, 1].
    Progress {
        operation: Operation,
        status: OperationStatus,
        progress: f64,
    },
    /// Cost over the training set after an epoch (1-based).
    EpochFinished { epoch: usize, cost: f32 },
    TestResults(TestResult),
}

/// Shared flag asking a run to stop at the next batch boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs mini-batch gradient descent and evaluation for one configuration.
pub struct Trainer {
    config: TrainingConfig,
    regularization: Regularization,
    rng: SimpleRng,
    events: Option<Sender<TrainingEvent>>,
    cancel: CancellationToken,
}

impl Trainer {
    /// Trainer whose shuffling RNG is seeded from `config.seed`.
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            regularization: config.regularization(),
            rng: SimpleRng::new(config.seed),
            config,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Send progress and results to `sender`.
    pub fn with_events(mut self, sender: Sender<TrainingEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn regularization(&self) -> &Regularization {
        &self.regularization
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fresh network shaped by the configuration, initialised from its seed.
    pub fn build_network(&self) -> Result<Network> {
        Network::new(&self.config.layer_sizes, &mut SimpleRng::new(self.config.seed))
    }

    fn emit(&self, event: TrainingEvent) {
        if let Some(sender) = &self.events {
            // A closed display must not abort training.
            let _ = sender.send(event);
        }
    }

    fn progress(&self, operation: Operation, status: OperationStatus, progress: f64) {
        self.emit(TrainingEvent::Progress {
            operation,
            status,
            progress,
        });
    }

    /// Train `network` for the configured number of epochs.
    ///
    /// Sample order is reshuffled every epoch. Returns `Cancelled` when the
    /// token was set before a batch started; parameters then hold the state
    /// after the last completed batch.
    pub fn train(&mut self, network: &mut Network, samples: &[Sample]) -> Result<OperationStatus> {
        if samples.is_empty() {
            return Err(NetworkError::EmptyBatch);
        }

        let batch_size = self.config.batch_size.max(1);
        let batches_per_epoch = samples.len().div_ceil(batch_size);
        let total_batches = (batches_per_epoch * self.config.epochs).max(1);
        let mut completed = 0usize;
        let mut order: Vec<usize> = (0..samples.len()).collect();

        self.regularization.set_sample_count(samples.len());
        info!(
            samples = samples.len(),
            batch_size,
            epochs = self.config.epochs,
            learning_rate = self.config.learning_rate,
            regularization = %self.regularization,
            "training started"
        );

        for epoch in 1..=self.config.epochs {
            self.rng.shuffle_usize(&mut order);

            for batch in order.chunks(batch_size) {
                if self.cancel.is_cancelled() {
                    let progress = completed as f64 / total_batches as f64;
                    info!(epoch, progress, "training cancelled");
                    self.progress(Operation::Training, OperationStatus::Cancelled, progress);
                    return Ok(OperationStatus::Cancelled);
                }

                let inputs: Vec<&[f32]> = batch
                    .iter()
                    .map(|&i| samples[i].normalized_input.as_slice())
                    .collect();
                let outputs: Vec<&[f32]> = batch
                    .iter()
                    .map(|&i| samples[i].expected_output.as_slice())
                    .collect();

                network.train_batch(&inputs, &outputs, self.config.learning_rate, &self.regularization)?;
                self.regularization.set_weight_sum(network.weight_sum());

                completed += 1;
                self.progress(
                    Operation::Training,
                    OperationStatus::Running,
                    completed as f64 / total_batches as f64,
                );
            }

            let cost = network.cost(samples, &self.regularization)?;
            info!(epoch, cost, "epoch finished");
            self.emit(TrainingEvent::EpochFinished { epoch, cost });
        }

        self.progress(Operation::Training, OperationStatus::Finished, 1.0);
        Ok(OperationStatus::Finished)
    }

    /// Evaluate `network` on `samples`, reporting progress and the result.
    pub fn test(&self, network: &mut Network, samples: &[Sample]) -> Result<TestResult> {
        if samples.is_empty() {
            return Err(NetworkError::EmptyBatch);
        }

        let step = (samples.len() / TEST_PROGRESS_STEPS).max(1);
        let mut outcomes = Vec::with_capacity(samples.len());

        for (index, sample) in samples.iter().enumerate() {
            outcomes.push(network.evaluate(sample, self.config.euclidean_threshold)?);
            if (index + 1) % step == 0 {
                self.progress(
                    Operation::Testing,
                    OperationStatus::Running,
                    (index + 1) as f64 / samples.len() as f64,
                );
            }
        }

        let result = TestResult::from_outcomes(outcomes);
        info!(
            success_rate_euclidean = result.success_rate_euclidean,
            success_rate_max_index = result.success_rate_max_index,
            failed = result.failed_samples.len(),
            "testing finished"
        );
        self.progress(Operation::Testing, OperationStatus::Finished, 1.0);
        self.emit(TrainingEvent::TestResults(result.clone()));
        Ok(result)
    }
}

/// Background training run started by [`spawn`].
pub struct TrainingHandle {
    events: Receiver<TrainingEvent>,
    cancel: CancellationToken,
    worker: JoinHandle<Result<Network>>,
}

impl TrainingHandle {
    /// Events in the order the worker produced them.
    pub fn events(&self) -> &Receiver<TrainingEvent> {
        &self.events
    }

    /// Ask the worker to stop before its next batch.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the worker and take back the trained network.
    pub fn join(self) -> Result<Network> {
        self.worker.join().map_err(|_| NetworkError::WorkerPanicked)?
    }
}

/// Train on `training` then test on `testing` in a background thread.
///
/// Testing is skipped when training was cancelled or `testing` is empty.
pub fn spawn(
    mut network: Network,
    training: Vec<Sample>,
    testing: Vec<Sample>,
    config: TrainingConfig,
) -> TrainingHandle {
    let (sender, receiver) = mpsc::channel();
    let cancel = CancellationToken::new();
    let mut trainer = Trainer::new(config)
        .with_events(sender)
        .with_cancellation(cancel.clone());

    let worker = thread::spawn(move || {
        let status = trainer.train(&mut network, &training)?;
        if status == OperationStatus::Finished && !testing.is_empty() {
            trainer.test(&mut network, &testing)?;
        }
        Ok(network)
    });

    TrainingHandle {
        events: receiver,
        cancel,
        worker,
    }
}
