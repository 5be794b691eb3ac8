use ndarray::Array2;

use crate::dataset::{array_to_pairs, indices_to_array, samples_to_arrays, Sample, TemperaturePair};
use crate::error::ModelError;
use crate::loss::{LossFunction, MSELoss};
use crate::models::temperature_lstm::TemperatureLSTM;
use crate::models::SequenceModel;
use crate::optimizers::{Adam, Optimizer};

/// Configuration for training hyperparameters
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub epochs: usize,
    /// Log the loss every `log_every` epochs
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 1000,
            log_every: 100,
        }
    }
}

/// Training metrics tracked during training
#[derive(Debug, Clone)]
pub struct TrainingMetrics {
    pub epoch: usize,
    pub train_loss: f64,
}

/// Full-batch trainer: every epoch is one forward pass over the whole
/// training sequence followed by one optimizer step.
pub struct LSTMTrainer<L: LossFunction, O: Optimizer> {
    pub network: TemperatureLSTM,
    pub loss_function: L,
    pub optimizer: O,
    pub config: TrainingConfig,
    pub metrics_history: Vec<TrainingMetrics>,
}

impl<L: LossFunction, O: Optimizer> LSTMTrainer<L, O> {
    pub fn new(network: TemperatureLSTM, loss_function: L, optimizer: O) -> Self {
        LSTMTrainer {
            network,
            loss_function,
            optimizer,
            config: TrainingConfig::default(),
            metrics_history: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// One epoch: forward over all inputs, loss, BPTT, one parameter update.
    /// Returns the loss before the update.
    pub fn train_epoch(&mut self, inputs: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        let (outputs, cache) = self.network.forward_with_cache(inputs);
        let loss = self.loss_function.compute_loss(&outputs, targets);

        let grad_outputs = self.loss_function.compute_gradient(&outputs, targets);
        let gradients = self.network.backward(&grad_outputs, &cache);
        self.network.update_parameters(&gradients, &mut self.optimizer);

        loss
    }

    /// Runs the configured number of epochs; the only early exit is a loss
    /// that is no longer finite
    pub fn train(&mut self, inputs: &Array2<f64>, targets: &Array2<f64>) -> Result<f64, ModelError> {
        let epochs = self.config.epochs;
        tracing::info!(
            "Training for {} epochs on {} samples ({} parameters)",
            epochs,
            inputs.ncols(),
            self.network.num_parameters()
        );

        let mut loss = f64::NAN;
        for epoch in 0..epochs {
            loss = self.train_epoch(inputs, targets);

            if !loss.is_finite() {
                return Err(ModelError::NonFiniteLoss { loss });
            }

            self.metrics_history.push(TrainingMetrics {
                epoch,
                train_loss: loss,
            });

            if (epoch + 1) % self.config.log_every.max(1) == 0 {
                tracing::info!("Epoch [{}/{}], Loss: {:.4}", epoch + 1, epochs, loss);
            }
        }

        Ok(loss)
    }

    pub fn get_latest_metrics(&self) -> Option<&TrainingMetrics> {
        self.metrics_history.last()
    }

    pub fn get_metrics_history(&self) -> &[TrainingMetrics] {
        &self.metrics_history
    }

    fn check_output_width(&self) -> Result<(), ModelError> {
        match self.network.output_size {
            2 => Ok(()),
            actual => Err(ModelError::OutputWidth { actual }),
        }
    }
}

impl<L: LossFunction, O: Optimizer> SequenceModel for LSTMTrainer<L, O> {
    fn fit(&mut self, samples: &[Sample]) -> Result<f64, ModelError> {
        if samples.is_empty() {
            return Err(ModelError::EmptyInput);
        }
        self.check_output_width()?;

        // Converted once; every epoch reuses the same buffers
        let (inputs, targets) = samples_to_arrays(samples);
        self.train(&inputs, &targets)
    }

    fn predict(&self, indices: &[usize]) -> Result<Vec<TemperaturePair>, ModelError> {
        if indices.is_empty() {
            return Err(ModelError::EmptyInput);
        }
        self.check_output_width()?;

        let outputs = self.network.forward(&indices_to_array(indices));
        Ok(array_to_pairs(&outputs))
    }
}

/// Create a trainer with Adam optimizer and MSE loss
pub fn create_adam_trainer(network: TemperatureLSTM, learning_rate: f64) -> LSTMTrainer<MSELoss, Adam> {
    LSTMTrainer::new(network, MSELoss, Adam::new(learning_rate))
}
