use ndarray::{s, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

use crate::optimizers::Optimizer;
use crate::utils::sigmoid;

/// Holds gradients for all LSTM cell parameters during backpropagation
#[derive(Clone, Debug)]
pub struct LSTMCellGradients {
    pub w_ih: Array2<f64>,
    pub w_hh: Array2<f64>,
    pub b_ih: Array2<f64>,
    pub b_hh: Array2<f64>,
}

impl LSTMCellGradients {
    /// Adds another step's gradients into this accumulator
    pub fn accumulate(&mut self, other: &LSTMCellGradients) {
        self.w_ih += &other.w_ih;
        self.w_hh += &other.w_hh;
        self.b_ih += &other.b_ih;
        self.b_hh += &other.b_hh;
    }
}

/// Values from one forward step needed by the backward step
#[derive(Clone, Debug)]
pub struct LSTMCellCache {
    pub input: Array2<f64>,
    pub hx: Array2<f64>,
    pub cx: Array2<f64>,
    pub input_gate: Array2<f64>,
    pub forget_gate: Array2<f64>,
    pub cell_gate: Array2<f64>,
    pub output_gate: Array2<f64>,
    pub cy: Array2<f64>,
}

/// LSTM cell with trainable parameters
///
/// Implements the standard LSTM equations:
/// - i_t = σ(W_xi * x_t + W_hi * h_t-1 + b_i)
/// - f_t = σ(W_xf * x_t + W_hf * h_t-1 + b_f)
/// - g_t = tanh(W_xg * x_t + W_hg * h_t-1 + b_g)
/// - o_t = σ(W_xo * x_t + W_ho * h_t-1 + b_o)
/// - c_t = f_t ⊙ c_t-1 + i_t ⊙ g_t
/// - h_t = o_t ⊙ tanh(c_t)
#[derive(Clone, Debug)]
pub struct LSTMCell {
    pub w_ih: Array2<f64>, // (4*hidden_size, input_size)
    pub w_hh: Array2<f64>, // (4*hidden_size, hidden_size)
    pub b_ih: Array2<f64>, // (4*hidden_size, 1)
    pub b_hh: Array2<f64>, // (4*hidden_size, 1)
    pub input_size: usize,
    pub hidden_size: usize,
}

impl LSTMCell {
    /// Creates a cell with every parameter drawn from U(-1/√hidden, 1/√hidden)
    pub fn new<R: Rng + ?Sized>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (hidden_size as f64).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);
        let gates = 4 * hidden_size;

        LSTMCell {
            w_ih: Array2::random_using((gates, input_size), dist, rng),
            w_hh: Array2::random_using((gates, hidden_size), dist, rng),
            b_ih: Array2::random_using((gates, 1), dist, rng),
            b_hh: Array2::random_using((gates, 1), dist, rng),
            input_size,
            hidden_size,
        }
    }

    /// One time step; all arguments are column vectors
    pub fn forward_step(&self, input: &Array2<f64>, hx: &Array2<f64>, cx: &Array2<f64>) -> (Array2<f64>, Array2<f64>, LSTMCellCache) {
        let h = self.hidden_size;

        // Gate pre-activations stacked as [input, forget, cell, output]
        let gates = self.w_ih.dot(input) + &self.b_ih + self.w_hh.dot(hx) + &self.b_hh;

        let input_gate = gates.slice(s![0..h, ..]).mapv(sigmoid);
        let forget_gate = gates.slice(s![h..2 * h, ..]).mapv(sigmoid);
        let cell_gate = gates.slice(s![2 * h..3 * h, ..]).mapv(f64::tanh);
        let output_gate = gates.slice(s![3 * h..4 * h, ..]).mapv(sigmoid);

        let cy = &forget_gate * cx + &input_gate * &cell_gate;
        let hy = &output_gate * &cy.mapv(f64::tanh);

        let cache = LSTMCellCache {
            input: input.clone(),
            hx: hx.clone(),
            cx: cx.clone(),
            input_gate,
            forget_gate,
            cell_gate,
            output_gate,
            cy: cy.clone(),
        };

        (hy, cy, cache)
    }

    /// Backward pass for one time step
    ///
    /// `dhy` and `dcy` are the total gradients reaching this step's hidden and
    /// cell outputs. Returns (parameter_gradients, input_gradient,
    /// previous_hidden_gradient, previous_cell_gradient).
    pub fn backward_step(&self, dhy: &Array2<f64>, dcy: &Array2<f64>, cache: &LSTMCellCache) -> (LSTMCellGradients, Array2<f64>, Array2<f64>, Array2<f64>) {
        let h = self.hidden_size;
        let tanh_cy = cache.cy.mapv(f64::tanh);

        // ∂L/∂o_t = ∂L/∂h_t ⊙ tanh(c_t)
        let do_raw = dhy * &tanh_cy * &cache.output_gate * &cache.output_gate.mapv(|o| 1.0 - o);

        // Cell gradient gets the carried term plus the path through h_t
        let dc_total = dcy + &(dhy * &cache.output_gate * &tanh_cy.mapv(|t| 1.0 - t * t));

        let df_raw = &dc_total * &cache.cx * &cache.forget_gate * &cache.forget_gate.mapv(|f| 1.0 - f);
        let di_raw = &dc_total * &cache.cell_gate * &cache.input_gate * &cache.input_gate.mapv(|i| 1.0 - i);
        let dg_raw = &dc_total * &cache.input_gate * &cache.cell_gate.mapv(|g| 1.0 - g * g);

        let mut dgates = Array2::<f64>::zeros((4 * h, dhy.ncols()));
        dgates.slice_mut(s![0..h, ..]).assign(&di_raw);
        dgates.slice_mut(s![h..2 * h, ..]).assign(&df_raw);
        dgates.slice_mut(s![2 * h..3 * h, ..]).assign(&dg_raw);
        dgates.slice_mut(s![3 * h..4 * h, ..]).assign(&do_raw);

        let db = dgates.sum_axis(Axis(1)).insert_axis(Axis(1));
        let gradients = LSTMCellGradients {
            w_ih: dgates.dot(&cache.input.t()),
            w_hh: dgates.dot(&cache.hx.t()),
            b_ih: db.clone(),
            b_hh: db,
        };

        let dx = self.w_ih.t().dot(&dgates);
        let dhx = self.w_hh.t().dot(&dgates);
        let dcx = &dc_total * &cache.forget_gate;

        (gradients, dx, dhx, dcx)
    }

    /// Initialize zero gradients for accumulation
    pub fn zero_gradients(&self) -> LSTMCellGradients {
        LSTMCellGradients {
            w_ih: Array2::zeros(self.w_ih.raw_dim()),
            w_hh: Array2::zeros(self.w_hh.raw_dim()),
            b_ih: Array2::zeros(self.b_ih.raw_dim()),
            b_hh: Array2::zeros(self.b_hh.raw_dim()),
        }
    }

    pub fn num_parameters(&self) -> usize {
        self.w_ih.len() + self.w_hh.len() + self.b_ih.len() + self.b_hh.len()
    }

    /// Apply gradients using the provided optimizer
    pub fn update_parameters<O: Optimizer>(&mut self, gradients: &LSTMCellGradients, optimizer: &mut O, prefix: &str) {
        optimizer.update(&format!("{}_w_ih", prefix), &mut self.w_ih, &gradients.w_ih);
        optimizer.update(&format!("{}_w_hh", prefix), &mut self.w_hh, &gradients.w_hh);
        optimizer.update(&format!("{}_b_ih", prefix), &mut self.b_ih, &gradients.b_ih);
        optimizer.update(&format!("{}_b_hh", prefix), &mut self.b_hh, &gradients.b_hh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::seeded_rng;
    use ndarray::arr2;

    #[test]
    fn test_lstm_cell_forward_shapes() {
        let cell = LSTMCell::new(3, 2, &mut seeded_rng(1));

        let input = arr2(&[[0.5], [0.1], [-0.3]]);
        let hx = arr2(&[[0.0], [0.0]]);
        let cx = arr2(&[[0.0], [0.0]]);

        let (hy, cy, _) = cell.forward_step(&input, &hx, &cx);

        assert_eq!(hy.shape(), &[2, 1]);
        assert_eq!(cy.shape(), &[2, 1]);
        assert!(hy.iter().all(|v| v.abs() < 1.0));
    }

    #[test]
    fn test_initialisation_is_seeded() {
        let a = LSTMCell::new(1, 4, &mut seeded_rng(42));
        let b = LSTMCell::new(1, 4, &mut seeded_rng(42));
        assert_eq!(a.w_hh, b.w_hh);
        assert_eq!(a.num_parameters(), 4 * 4 * (1 + 4) + 2 * 4 * 4);

        let bound = 1.0 / 2.0;
        assert!(a.w_ih.iter().all(|w| w.abs() <= bound));
    }

    #[test]
    fn test_backward_shapes() {
        let (input_size, hidden_size) = (2, 3);
        let cell = LSTMCell::new(input_size, hidden_size, &mut seeded_rng(3));

        let input = arr2(&[[1.0], [0.5]]);
        let hx = arr2(&[[0.1], [0.2], [0.3]]);
        let cx = arr2(&[[0.0], [0.0], [0.0]]);
        let (_, _, cache) = cell.forward_step(&input, &hx, &cx);

        let dhy = arr2(&[[1.0], [1.0], [1.0]]);
        let dcy = arr2(&[[0.0], [0.0], [0.0]]);
        let (gradients, dx, dhx, dcx) = cell.backward_step(&dhy, &dcy, &cache);

        assert_eq!(gradients.w_ih.shape(), &[4 * hidden_size, input_size]);
        assert_eq!(gradients.w_hh.shape(), &[4 * hidden_size, hidden_size]);
        assert_eq!(gradients.b_ih.shape(), &[4 * hidden_size, 1]);
        assert_eq!(dx.shape(), &[input_size, 1]);
        assert_eq!(dhx.shape(), &[hidden_size, 1]);
        assert_eq!(dcx.shape(), &[hidden_size, 1]);
    }

    #[test]
    fn test_input_gradient_matches_finite_difference() {
        let cell = LSTMCell::new(1, 3, &mut seeded_rng(9));
        let hx = arr2(&[[0.2], [-0.1], [0.05]]);
        let cx = arr2(&[[0.3], [0.0], [-0.2]]);
        let x = 0.7;

        // L = sum(h_t)
        let loss = |x: f64| -> f64 {
            let (hy, _, _) = cell.forward_step(&arr2(&[[x]]), &hx, &cx);
            hy.sum()
        };

        let (_, _, cache) = cell.forward_step(&arr2(&[[x]]), &hx, &cx);
        let (_, dx, _, _) = cell.backward_step(&Array2::ones((3, 1)), &Array2::zeros((3, 1)), &cache);

        let eps = 1e-6;
        let numeric = (loss(x + eps) - loss(x - eps)) / (2.0 * eps);
        assert!((dx[[0, 0]] - numeric).abs() < 1e-6);
    }
}
