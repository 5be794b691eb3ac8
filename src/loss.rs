use ndarray::Array2;

/// Loss function trait for training neural networks
pub trait LossFunction {
    /// Compute the loss between predictions and targets
    fn compute_loss(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> f64;

    /// Compute the gradient of the loss with respect to predictions
    fn compute_gradient(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64>;
}

/// Mean Squared Error averaged over every element
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl LossFunction for MSELoss {
    fn compute_loss(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        if predictions.is_empty() {
            return 0.0;
        }
        let diff = predictions - targets;
        diff.mapv(|d| d * d).sum() / predictions.len() as f64
    }

    fn compute_gradient(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64> {
        let n = predictions.len().max(1) as f64;
        (predictions - targets) * (2.0 / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_mse_loss() {
        let predictions = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let targets = arr2(&[[1.5, 2.5], [2.5, 3.5]]);

        let loss = MSELoss.compute_loss(&predictions, &targets);
        assert!((loss - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_mse_gradient_scales_with_element_count() {
        let predictions = arr2(&[[2.0, 0.0]]);
        let targets = arr2(&[[0.0, 0.0]]);

        let gradient = MSELoss.compute_gradient(&predictions, &targets);
        assert_eq!(gradient, arr2(&[[2.0, 0.0]]));
    }

    #[test]
    fn test_empty_input_has_zero_loss() {
        let empty = Array2::<f64>::zeros((2, 0));
        assert_eq!(MSELoss.compute_loss(&empty, &empty), 0.0);
    }
}
