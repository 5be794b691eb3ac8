//! # Weather LSTM
//!
//! Scrapes a city's daily temperature history, stores it as a training set
//! and fits a small recurrent network mapping a day index to the day's
//! high/low temperature pair.
//!
//! ## Core Components
//!
//! - **Acquisition**: city code lookup, history page fetch and table extraction ([`scrape`])
//! - **Dataset**: training-set file writer/reader and a seeded train/test split
//! - **Model**: a single-layer LSTM with a linear head and full backpropagation through time
//! - **Training**: full-batch Adam on mean squared error, plus held-out evaluation
//! - **Pipeline**: every stage chained behind typed errors, driven by [`PipelineConfig`]
//! - **Wind load**: segment-wise wind load on a lattice tower, with a text/JSON report ([`wind_load`])
//!
//! ## Quick Start
//!
//! ```rust
//! use weather_lstm::dataset::{Dataset, TemperaturePair};
//! use weather_lstm::models::{temperature_lstm::TemperatureLSTM, SequenceModel};
//! use weather_lstm::training::{create_adam_trainer, TrainingConfig};
//!
//! let dataset = Dataset::from_pairs((1..=10).map(|i| TemperaturePair::new(20.0 + i as f64, 10.0 + i as f64)));
//! let (train, test) = dataset.train_test_split(0.4, 0).unwrap();
//!
//! let mut trainer = create_adam_trainer(TemperatureLSTM::new(1, 8, 2, 0), 0.01)
//!     .with_config(TrainingConfig { epochs: 20, log_every: 10 });
//! trainer.fit(&train).unwrap();
//!
//! let indices: Vec<usize> = test.iter().map(|s| s.index).collect();
//! let predictions = trainer.predict(&indices).unwrap();
//! assert_eq!(predictions.len(), test.len());
//! ```

pub mod utils;
pub mod error;
pub mod config;
pub mod scrape;
pub mod dataset;
pub mod layers;
pub mod models;
pub mod loss;
pub mod optimizers;
pub mod training;
pub mod evaluation;
pub mod pipeline;
pub mod synthetic;
pub mod wind_load;

// Re-export commonly used items
pub use config::PipelineConfig;
pub use dataset::{Dataset, Sample, TemperaturePair};
pub use error::ForecastError;
pub use evaluation::{evaluate, EvaluationReport};
pub use models::temperature_lstm::TemperatureLSTM;
pub use models::SequenceModel;
pub use pipeline::{Pipeline, PipelineReport};
pub use training::{LSTMTrainer, TrainingConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_library_integration() {
        let network = TemperatureLSTM::new(1, 3, 2, 0);
        let input = arr2(&[[1.0, 2.0, 3.0, 4.0]]);

        let output = network.forward(&input);

        assert_eq!(output.shape(), &[2, 4]);
        assert!(output.iter().all(|v| v.is_finite()));
    }
}
