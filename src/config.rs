//! Pipeline configuration.
//!
//! Every path and hyperparameter the pipeline uses lives here so repeated or
//! multi-city runs can share one process. Values can be loaded from a TOML
//! file; missing keys fall back to the defaults below.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_URL_TEMPLATE: &str = "https://tianqi.2345.com/wea_history/{}.htm";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Lookup table with one `<cityName> <cityCode>` entry per line
    pub city_code_file: PathBuf,

    /// Directory holding `trainingSet<City>.txt` files
    pub data_dir: PathBuf,

    pub fetch: FetchConfig,
    pub model: ModelConfig,
    pub split: SplitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// History page URL, `{}` is replaced by the city code
    pub url_template: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// Loss is logged every `log_every` epochs
    pub log_every: usize,
    /// Seed for weight initialisation
    pub init_seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            city_code_file: PathBuf::from("cityCode.txt"),
            data_dir: PathBuf::from("set"),
            fetch: FetchConfig::default(),
            model: ModelConfig::default(),
            split: SplitConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: 1,
            hidden_size: 256,
            output_size: 2,
            epochs: 1000,
            learning_rate: 0.001,
            log_every: 100,
            init_seed: 0,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.4,
            seed: 0,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds the history page URL for a city code
    pub fn history_url(&self, city_code: &str) -> String {
        self.url_template.replacen("{}", city_code, 1)
    }
}

impl PipelineConfig {
    /// Loads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig = toml::from_str(&contents)?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Path of the persisted training set for a city
    pub fn training_set_path(&self, city: &str) -> PathBuf {
        self.data_dir.join(format!("trainingSet{}.txt", city))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, message: &str| ConfigError::Invalid {
            field,
            message: message.to_string(),
        };

        if !self.fetch.url_template.contains("{}") {
            return Err(invalid("fetch.url_template", "must contain a {} placeholder"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(invalid("fetch.timeout_secs", "must be positive"));
        }

        let model = &self.model;
        if model.input_size != 1 {
            return Err(invalid("model.input_size", "the day index is a single feature"));
        }
        if model.hidden_size == 0 {
            return Err(invalid("model.hidden_size", "must be positive"));
        }
        if model.output_size != 2 {
            return Err(invalid("model.output_size", "a temperature pair has 2 values"));
        }
        if model.epochs == 0 {
            return Err(invalid("model.epochs", "must be positive"));
        }
        if !(model.learning_rate.is_finite() && model.learning_rate > 0.0) {
            return Err(invalid("model.learning_rate", "must be a positive number"));
        }
        if model.log_every == 0 {
            return Err(invalid("model.log_every", "must be positive"));
        }

        let ratio = self.split.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(invalid("split.test_ratio", "must lie strictly between 0 and 1"));
        }

        Ok(())
    }
}
