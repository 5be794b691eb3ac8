use ndarray::Array2;
use serde::Serialize;

use crate::dataset::{samples_to_arrays, Sample, TemperaturePair};
use crate::error::ModelError;
use crate::loss::{LossFunction, MSELoss};
use crate::models::SequenceModel;

/// Outcome of one held-out evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub test_loss: f64,
    pub indices: Vec<usize>,
    pub predictions: Vec<TemperaturePair>,
}

impl EvaluationReport {
    /// Predictions as a `(samples, 2)` array, one row per test index
    pub fn predictions_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.predictions.len(), 2), |(i, j)| {
            let pair = self.predictions[i];
            if j == 0 {
                pair.high
            } else {
                pair.low
            }
        })
    }
}

/// Runs a single forward pass over the test samples and scores it with MSE.
///
/// The model is only read, never updated.
pub fn evaluate<M: SequenceModel + ?Sized>(model: &M, test: &[Sample]) -> Result<EvaluationReport, ModelError> {
    let indices: Vec<usize> = test.iter().map(|s| s.index).collect();
    let predictions = model.predict(&indices)?;
    if predictions.len() != indices.len() {
        return Err(ModelError::PredictionCount {
            expected: indices.len(),
            actual: predictions.len(),
        });
    }

    let (_, targets) = samples_to_arrays(test);
    let predicted = Array2::from_shape_fn(targets.raw_dim(), |(row, t)| {
        let pair = predictions[t];
        if row == 0 {
            pair.high
        } else {
            pair.low
        }
    });
    let test_loss = MSELoss.compute_loss(&predicted, &targets);
    tracing::info!("Test Loss: {:.4}", test_loss);

    Ok(EvaluationReport {
        test_loss,
        indices,
        predictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts a fixed pair for every index
    struct Constant(TemperaturePair);

    impl SequenceModel for Constant {
        fn fit(&mut self, _samples: &[Sample]) -> Result<f64, ModelError> {
            Ok(0.0)
        }

        fn predict(&self, indices: &[usize]) -> Result<Vec<TemperaturePair>, ModelError> {
            Ok(vec![self.0; indices.len()])
        }
    }

    #[test]
    fn test_mse_over_both_temperatures() {
        let model = Constant(TemperaturePair::new(20.0, 10.0));
        let test = vec![
            Sample { index: 2, temperatures: TemperaturePair::new(22.0, 10.0) },
            Sample { index: 7, temperatures: TemperaturePair::new(20.0, 14.0) },
        ];

        let report = evaluate(&model, &test).unwrap();

        // (4 + 0 + 0 + 16) / 4
        assert!((report.test_loss - 5.0).abs() < 1e-12);
        assert_eq!(report.indices, vec![2, 7]);
        assert_eq!(report.predictions_array().shape(), &[2, 2]);
        assert_eq!(report.predictions_array()[[1, 1]], 10.0);
    }

    #[test]
    fn test_empty_test_set() {
        let model = Constant(TemperaturePair::new(0.0, 0.0));
        // The constant model accepts empty input, so the MSE is defined as 0
        let report = evaluate(&model, &[]).unwrap();
        assert_eq!(report.test_loss, 0.0);
    }
}
