/// Recurrent LSTM cell with per-step backpropagation.
pub mod lstm_cell;

/// Dense output projection.
pub mod linear;
