use ndarray::{Array2, Ix2};
use std::collections::HashMap;

/// Optimizer trait for parameter updates during training
pub trait Optimizer {
    fn update(&mut self, param_id: &str, param: &mut Array2<f64>, gradient: &Array2<f64>);
    fn reset(&mut self);
}

/// Moment estimates kept for one parameter tensor
struct AdamState {
    step: i32,
    m: Array2<f64>, // first moment
    v: Array2<f64>, // second moment
}

impl AdamState {
    fn new(dim: Ix2) -> Self {
        AdamState {
            step: 0,
            m: Array2::zeros(dim),
            v: Array2::zeros(dim),
        }
    }
}

/// Adam optimizer with a fixed learning rate
///
/// Implements: m_t = β₁m_{t-1} + (1-β₁)g_t
///             v_t = β₂v_{t-1} + (1-β₂)g_t²
///             θ_t = θ_{t-1} - η * m̂_t / (√v̂_t + ε)
/// where m̂_t and v̂_t are bias-corrected with each parameter's own step count
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    states: HashMap<String, AdamState>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Adam::with_params(learning_rate, 0.9, 0.999, 1e-8)
    }

    pub fn with_params(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            states: HashMap::new(),
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of updates applied to `param_id` so far
    pub fn steps(&self, param_id: &str) -> i32 {
        self.states.get(param_id).map_or(0, |state| state.step)
    }
}

impl Optimizer for Adam {
    fn update(&mut self, param_id: &str, param: &mut Array2<f64>, gradient: &Array2<f64>) {
        let (lr, beta1, beta2, epsilon) = (self.learning_rate, self.beta1, self.beta2, self.epsilon);
        let state = self
            .states
            .entry(param_id.to_string())
            .or_insert_with(|| AdamState::new(param.raw_dim()));

        state.step += 1;
        state.m = beta1 * &state.m + (1.0 - beta1) * gradient;
        state.v = beta2 * &state.v + (1.0 - beta2) * &gradient.mapv(|g| g * g);

        let m_hat = &state.m / (1.0 - beta1.powi(state.step));
        let v_hat = &state.v / (1.0 - beta2.powi(state.step));

        let update = lr * m_hat / (v_hat.mapv(f64::sqrt) + epsilon);
        *param -= &update;
    }

    fn reset(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        let mut optimizer = Adam::new(0.001);
        let mut param = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let gradient = arr2(&[[0.1, -0.2], [0.3, 0.4]]);

        let original = param.clone();
        optimizer.update("w", &mut param, &gradient);

        // After bias correction the first step is ±lr per element
        let delta = &original - &param;
        for (d, g) in delta.iter().zip(gradient.iter()) {
            assert!((d - 0.001 * g.signum()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_adam_tracks_steps_per_parameter() {
        let mut optimizer = Adam::new(0.01);
        let mut a = arr2(&[[1.0]]);
        let mut b = arr2(&[[1.0]]);
        let g = arr2(&[[0.5]]);

        optimizer.update("a", &mut a, &g);
        optimizer.update("a", &mut a, &g);
        optimizer.update("b", &mut b, &g);

        assert_eq!(optimizer.steps("a"), 2);
        assert_eq!(optimizer.steps("b"), 1);

        optimizer.reset();
        assert_eq!(optimizer.steps("a"), 0);
    }
}
