use ndarray::{Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

use crate::optimizers::Optimizer;

/// Holds gradients for linear layer parameters during backpropagation
#[derive(Clone, Debug)]
pub struct LinearGradients {
    pub weight: Array2<f64>,
    pub bias: Array2<f64>,
}

/// Fully connected projection from the hidden state to the forecast values
///
/// Performs `output = weight · input + bias` where each column of `input` is
/// one time step.
#[derive(Clone, Debug)]
pub struct LinearLayer {
    pub weight: Array2<f64>, // (output_size, input_size)
    pub bias: Array2<f64>,   // (output_size, 1)
    pub input_size: usize,
    pub output_size: usize,
}

impl LinearLayer {
    /// Creates a layer with weights and bias drawn from U(-1/√input, 1/√input)
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (input_size as f64).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);

        Self {
            weight: Array2::random_using((output_size, input_size), dist, rng),
            bias: Array2::random_using((output_size, 1), dist, rng),
            input_size,
            output_size,
        }
    }

    /// Builds a layer from explicit parameters
    pub fn from_weights(weight: Array2<f64>, bias: Array2<f64>) -> Self {
        let (output_size, input_size) = weight.dim();
        debug_assert_eq!(bias.shape(), &[output_size, 1], "Bias shape must be (output_size, 1)");

        Self {
            weight,
            bias,
            input_size,
            output_size,
        }
    }

    /// Maps `(input_size, steps)` to `(output_size, steps)`
    pub fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        self.weight.dot(input) + &self.bias
    }

    /// Returns parameter gradients and the gradient w.r.t. `input`
    pub fn backward(&self, input: &Array2<f64>, grad_output: &Array2<f64>) -> (LinearGradients, Array2<f64>) {
        let gradients = LinearGradients {
            weight: grad_output.dot(&input.t()),
            // Bias is shared by every step, so its gradient sums over columns
            bias: grad_output.sum_axis(Axis(1)).insert_axis(Axis(1)),
        };
        let input_grad = self.weight.t().dot(grad_output);

        (gradients, input_grad)
    }

    pub fn update_parameters<O: Optimizer>(&mut self, gradients: &LinearGradients, optimizer: &mut O, prefix: &str) {
        optimizer.update(&format!("{}_weight", prefix), &mut self.weight, &gradients.weight);
        optimizer.update(&format!("{}_bias", prefix), &mut self.bias, &gradients.bias);
    }

    pub fn num_parameters(&self) -> usize {
        self.weight.len() + self.bias.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::seeded_rng;
    use ndarray::arr2;

    #[test]
    fn test_linear_layer_creation() {
        let layer = LinearLayer::new(256, 2, &mut seeded_rng(0));
        assert_eq!(layer.weight.shape(), &[2, 256]);
        assert_eq!(layer.bias.shape(), &[2, 1]);
        assert_eq!(layer.num_parameters(), 256 * 2 + 2);
    }

    #[test]
    fn test_forward_broadcasts_bias_over_steps() {
        let layer = LinearLayer::from_weights(arr2(&[[1.0, 2.0], [0.0, -1.0]]), arr2(&[[0.5], [1.0]]));
        let input = arr2(&[[1.0, 0.0, 2.0], [1.0, 1.0, 0.0]]);

        let output = layer.forward(&input);
        assert_eq!(output, arr2(&[[3.5, 2.5, 2.5], [0.0, 0.0, 1.0]]));
    }

    #[test]
    fn test_backward_sums_bias_gradient() {
        let layer = LinearLayer::from_weights(arr2(&[[1.0, 2.0]]), arr2(&[[0.0]]));
        let input = arr2(&[[1.0, 3.0], [2.0, 4.0]]);
        let grad_output = arr2(&[[1.0, 0.5]]);

        let (gradients, input_grad) = layer.backward(&input, &grad_output);

        assert_eq!(gradients.bias, arr2(&[[1.5]]));
        assert_eq!(gradients.weight, arr2(&[[2.5, 4.0]]));
        assert_eq!(input_grad, arr2(&[[1.0, 0.5], [2.0, 1.0]]));
    }
}
