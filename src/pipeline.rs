//! End-to-end forecasting run for one city.
//!
//! [`Pipeline::run`] chains every stage: code lookup, page fetch, table
//! extraction, persistence, reload, split, training and evaluation. Each
//! stage returns its own error, which bubbles up as a [`ForecastError`];
//! nothing here terminates the process.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::dataset::{read_training_set, write_training_set};
use crate::error::ForecastError;
use crate::evaluation::{evaluate, EvaluationReport};
use crate::loss::MSELoss;
use crate::models::temperature_lstm::TemperatureLSTM;
use crate::models::SequenceModel;
use crate::optimizers::Adam;
use crate::scrape::{CityCodeTable, HistorySource, TableExtractor};
use crate::training::{create_adam_trainer, LSTMTrainer, TrainingConfig};

/// Summary of one completed forecasting run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub city: String,
    pub train_samples: usize,
    pub test_samples: usize,
    /// Loss of the last training epoch
    pub train_loss: f64,
    pub test_loss: f64,
    pub evaluation: EvaluationReport,
    pub elapsed_secs: f64,
}

/// Orchestrates the stages with an injected page source and extractor
pub struct Pipeline<S: HistorySource, E: TableExtractor> {
    config: PipelineConfig,
    source: S,
    extractor: E,
}

impl<S: HistorySource, E: TableExtractor> Pipeline<S, E> {
    pub fn new(config: PipelineConfig, source: S, extractor: E) -> Self {
        Self {
            config,
            source,
            extractor,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolves, fetches, extracts and persists the history of `city`.
    ///
    /// Returns the path of the written training set. Nothing is written when
    /// any earlier stage fails.
    pub fn acquire(&self, city: &str) -> Result<PathBuf, ForecastError> {
        let table = CityCodeTable::load(&self.config.city_code_file)?;
        let code = table.lookup(city)?;
        tracing::info!("City {} resolved to code {}", city, code);

        let markup = self.source.fetch(code)?;
        let rows = self.extractor.extract(&markup)?;
        tracing::info!("Extracted {} rows for {}", rows.len(), city);

        let path = self.config.training_set_path(city);
        write_training_set(&rows, &path)?;
        Ok(path)
    }

    /// Trains and evaluates on the already persisted training set of `city`
    pub fn forecast(&self, city: &str) -> Result<PipelineReport, ForecastError> {
        self.forecast_since(city, Instant::now())
    }

    /// Full run: [`acquire`](Self::acquire) followed by [`forecast`](Self::forecast)
    pub fn run(&self, city: &str) -> Result<PipelineReport, ForecastError> {
        let start = Instant::now();
        self.acquire(city)?;
        self.forecast_since(city, start)
    }

    /// Fresh, untrained model built from the configured hyperparameters
    pub fn build_model(&self) -> LSTMTrainer<MSELoss, Adam> {
        let model = &self.config.model;
        let network = TemperatureLSTM::new(model.input_size, model.hidden_size, model.output_size, model.init_seed);
        create_adam_trainer(network, model.learning_rate).with_config(TrainingConfig {
            epochs: model.epochs,
            log_every: model.log_every,
        })
    }

    fn forecast_since(&self, city: &str, start: Instant) -> Result<PipelineReport, ForecastError> {
        let path = self.config.training_set_path(city);
        let dataset = read_training_set(&path)?;

        let split = &self.config.split;
        let (train, test) = dataset.train_test_split(split.test_ratio, split.seed)?;
        tracing::info!(
            "Split {} samples into {} train / {} test",
            dataset.len(),
            train.len(),
            test.len()
        );

        let mut model = self.build_model();
        let train_loss = model.fit(&train)?;
        let evaluation = evaluate(&model, &test)?;

        Ok(PipelineReport {
            city: city.to_string(),
            train_samples: train.len(),
            test_samples: test.len(),
            train_loss,
            test_loss: evaluation.test_loss,
            evaluation,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }
}
