use crate::dataset::{Sample, TemperaturePair};
use crate::error::ModelError;

/// Module for the LSTM temperature network.
pub mod temperature_lstm;

/// Minimal interface the pipeline needs from a forecasting model.
///
/// Implementations decide how they represent and train their parameters;
/// callers only hand over samples and day indices.
pub trait SequenceModel {
    /// Fits the model on `samples` in the given order and returns the final
    /// training loss.
    fn fit(&mut self, samples: &[Sample]) -> Result<f64, ModelError>;

    /// Predicts one temperature pair per day index, presented as a single
    /// sequence in the given order.
    fn predict(&self, indices: &[usize]) -> Result<Vec<TemperaturePair>, ModelError>;
}
