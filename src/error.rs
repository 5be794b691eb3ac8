//! Typed error hierarchy for the forecasting pipeline.
//!
//! Each stage has its own error enum; all of them convert into
//! [`ForecastError`], which the binary reports once before exiting.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error returned by the pipeline.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("City lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Table extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// City name to provider code resolution.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("cannot read city code table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("city not found: {city}")]
    CityNotFound { city: String },

    #[error("line {line} of the city code table has no code for {city}")]
    MissingCode { line: usize, city: String },
}

/// History page retrieval.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build HTTP client: {0}")]
    Client(String),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned an empty page")]
    EmptyBody { url: String },
}

impl FetchError {
    /// Classifies a reqwest error for the given URL.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Markup to rows extraction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unterminated <{tag}> tag at byte {offset}")]
    UnterminatedTag { tag: &'static str, offset: usize },

    #[error("no table rows with cells found")]
    NoRows,
}

/// Training-set persistence, reconstruction and splitting.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot write training set {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read training set {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: missing field {position}")]
    MissingField { line: usize, position: usize },

    #[error("line {line}: field {position} is not a number: {value:?}")]
    InvalidNumber {
        line: usize,
        position: usize,
        value: String,
    },

    #[error("training set {path} is empty")]
    Empty { path: PathBuf },

    #[error("cannot split {samples} samples with test ratio {test_ratio}: no training samples left")]
    InsufficientSamples { samples: usize, test_ratio: f64 },
}

/// Sequence model fitting and inference.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("no samples given")]
    EmptyInput,

    #[error("model produces {actual} outputs, a temperature pair needs 2")]
    OutputWidth { actual: usize },

    #[error("expected {expected} predictions, got {actual}")]
    PredictionCount { expected: usize, actual: usize },

    #[error("training diverged: loss became {loss}")]
    NonFiniteLoss { loss: f64 },
}

/// Tower wind-load calculation input.
#[derive(Debug, Error, PartialEq)]
pub enum WindLoadError {
    #[error("unknown terrain class {0:?}, expected one of A, B, C, D")]
    UnknownTerrain(String),

    #[error("invalid tower parameter {field}: {message}")]
    InvalidParameter { field: &'static str, message: String },
}

/// Configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file is malformed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_errors_convert_to_forecast_error() {
        let err: ForecastError = LookupError::CityNotFound {
            city: "Atlantis".into(),
        }
        .into();
        assert!(matches!(
            err,
            ForecastError::Lookup(LookupError::CityNotFound { .. })
        ));

        let err: ForecastError = ModelError::EmptyInput.into();
        assert!(matches!(err, ForecastError::Model(ModelError::EmptyInput)));
    }

    #[test]
    fn test_messages_name_the_offending_input() {
        let err = DatasetError::InvalidNumber {
            line: 3,
            position: 2,
            value: "N/A".into(),
        };
        assert_eq!(err.to_string(), "line 3: field 2 is not a number: \"N/A\"");

        let err: ForecastError = LookupError::CityNotFound {
            city: "Atlantis".into(),
        }
        .into();
        assert_eq!(err.to_string(), "City lookup failed: city not found: Atlantis");
    }
}
