use ndarray::{Array2, Axis};

use crate::layers::linear::{LinearGradients, LinearLayer};
use crate::layers::lstm_cell::{LSTMCell, LSTMCellCache, LSTMCellGradients};
use crate::optimizers::Optimizer;
use crate::utils::seeded_rng;

/// Cached values of a whole-sequence forward pass
#[derive(Clone, Debug)]
pub struct SequenceCache {
    pub steps: Vec<LSTMCellCache>,
    /// Hidden state of every step, one column per step
    pub hidden: Array2<f64>,
}

#[derive(Clone, Debug)]
pub struct TemperatureLSTMGradients {
    pub cell: LSTMCellGradients,
    pub head: LinearGradients,
}

/// Single-layer LSTM followed by a linear head
///
/// The whole input sequence is presented as one continuous recurrent pass:
/// the state starts at zero and is carried from each column to the next,
/// never reset between samples.
#[derive(Clone, Debug)]
pub struct TemperatureLSTM {
    cell: LSTMCell,
    head: LinearLayer,
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

impl TemperatureLSTM {
    /// Creates a network whose initial weights depend only on `seed`
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let cell = LSTMCell::new(input_size, hidden_size, &mut rng);
        let head = LinearLayer::new(hidden_size, output_size, &mut rng);

        TemperatureLSTM {
            cell,
            head,
            input_size,
            hidden_size,
            output_size,
        }
    }

    pub fn num_parameters(&self) -> usize {
        self.cell.num_parameters() + self.head.num_parameters()
    }

    /// Forward pass for inference, `(input_size, steps)` to `(output_size, steps)`
    pub fn forward(&self, inputs: &Array2<f64>) -> Array2<f64> {
        let (outputs, _) = self.forward_with_cache(inputs);
        outputs
    }

    /// Forward pass keeping everything backpropagation through time needs
    pub fn forward_with_cache(&self, inputs: &Array2<f64>) -> (Array2<f64>, SequenceCache) {
        let steps = inputs.ncols();
        let mut hx = Array2::zeros((self.hidden_size, 1));
        let mut cx = Array2::zeros((self.hidden_size, 1));
        let mut hidden = Array2::zeros((self.hidden_size, steps));
        let mut caches = Vec::with_capacity(steps);

        for (t, column) in inputs.axis_iter(Axis(1)).enumerate() {
            let x = column.to_owned().insert_axis(Axis(1));
            let (hy, cy, cache) = self.cell.forward_step(&x, &hx, &cx);
            hidden.column_mut(t).assign(&hy.column(0));
            caches.push(cache);
            hx = hy;
            cx = cy;
        }

        let outputs = self.head.forward(&hidden);
        (outputs, SequenceCache { steps: caches, hidden })
    }

    /// Backpropagation through time
    ///
    /// `grad_outputs` is the loss gradient w.r.t. every output column. Hidden
    /// and cell gradients flow backwards from the last step to the first.
    pub fn backward(&self, grad_outputs: &Array2<f64>, cache: &SequenceCache) -> TemperatureLSTMGradients {
        let (head, d_hidden) = self.head.backward(&cache.hidden, grad_outputs);

        let mut cell = self.cell.zero_gradients();
        let mut dh_next = Array2::zeros((self.hidden_size, 1));
        let mut dc_next = Array2::zeros((self.hidden_size, 1));

        for (t, step) in cache.steps.iter().enumerate().rev() {
            let dhy = &d_hidden.column(t).insert_axis(Axis(1)) + &dh_next;
            let (step_grads, _dx, dhx, dcx) = self.cell.backward_step(&dhy, &dc_next, step);
            cell.accumulate(&step_grads);
            dh_next = dhx;
            dc_next = dcx;
        }

        TemperatureLSTMGradients { cell, head }
    }

    pub fn update_parameters<O: Optimizer>(&mut self, gradients: &TemperatureLSTMGradients, optimizer: &mut O) {
        self.cell.update_parameters(&gradients.cell, optimizer, "lstm");
        self.head.update_parameters(&gradients.head, optimizer, "head");
    }
}
