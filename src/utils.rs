/// Utility functions shared by the numeric and demo modules.
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Sigmoid activation function: σ(x) = 1 / (1 + e^(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Deterministic generator for weight initialisation and dataset shuffling
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Rounds to one decimal place, the precision temperatures are reported at.
pub fn round_tenths(value: f64) -> f64 {
    round_to(value, 1)
}

/// Rounds half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
