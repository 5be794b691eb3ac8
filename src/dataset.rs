//! Training-set persistence and reconstruction.
//!
//! The scraped table is stored as one tab-joined line per historical day.
//! Reading it back yields a [`Dataset`] of samples indexed `1..=N` in file
//! order, each carrying the pair of temperatures found at fixed positions.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::scrape::table::RawRow;
use crate::utils::seeded_rng;

/// Positions of the two temperatures after a line is split
const HIGH_FIELD: usize = 2;
const LOW_FIELD: usize = 4;

/// Daily maximum/minimum (or day/night) temperature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePair {
    pub high: f64,
    pub low: f64,
}

impl TemperaturePair {
    pub fn new(high: f64, low: f64) -> Self {
        Self { high, low }
    }
}

/// One historical day: its 1-based position in the file and its temperatures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub index: usize,
    pub temperatures: TemperaturePair,
}

/// All samples reconstructed from one city's training set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Builds a dataset whose indices follow the order of `pairs`, starting at 1
    pub fn from_pairs(pairs: impl IntoIterator<Item = TemperaturePair>) -> Self {
        let samples = pairs
            .into_iter()
            .enumerate()
            .map(|(i, temperatures)| Sample {
                index: i + 1,
                temperatures,
            })
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.index).collect()
    }

    /// Random train/test partition, reproducible for a given seed.
    ///
    /// The samples are shuffled; the first `ceil(test_ratio * n)` go to the
    /// test set and the remainder, still shuffled, to the training set.
    /// Returns `(train, test)`.
    pub fn train_test_split(&self, test_ratio: f64, seed: u64) -> Result<(Vec<Sample>, Vec<Sample>), DatasetError> {
        let n = self.samples.len();
        let n_test = ((test_ratio * n as f64).ceil() as usize).min(n);
        if n_test >= n {
            return Err(DatasetError::InsufficientSamples {
                samples: n,
                test_ratio,
            });
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut seeded_rng(seed));

        let test = order[..n_test].iter().map(|&i| self.samples[i]).collect();
        let train = order[n_test..].iter().map(|&i| self.samples[i]).collect();
        Ok((train, test))
    }
}

/// Writes scraped rows as tab-joined lines, replacing any existing file.
///
/// The parent directory is created when missing. Returns the number of lines.
pub fn write_training_set(rows: &[RawRow], path: &Path) -> Result<usize, DatasetError> {
    let write_err = |source| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut contents = String::new();
    for row in rows {
        contents.push_str(&row.join("\t"));
        contents.push('\n');
    }
    fs::write(path, contents).map_err(write_err)?;

    tracing::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

/// Re-parses a training set written by [`write_training_set`].
///
/// Any malformed line fails the whole read; no record is skipped.
pub fn read_training_set(path: &Path) -> Result<Dataset, DatasetError> {
    let contents = fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let pairs = contents
        .lines()
        .enumerate()
        .map(|(i, line)| parse_training_line(line, i + 1))
        .collect::<Result<Vec<_>, _>>()?;

    if pairs.is_empty() {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!("Read {} samples from {}", pairs.len(), path.display());
    Ok(Dataset::from_pairs(pairs))
}

/// Extracts the temperature pair from one stored line.
///
/// Tabs and degree signs become spaces and the line is split on single
/// spaces with empty fields kept, so `"2023-10-01 Sun\t25°\t15°\tCloudy"`
/// puts 25 at field 2 and 15 at field 4.
pub fn parse_training_line(line: &str, line_no: usize) -> Result<TemperaturePair, DatasetError> {
    let normalized = line.trim().replace(['\t', '°'], " ");
    let fields: Vec<&str> = normalized.split(' ').collect();

    let field = |position: usize| -> Result<f64, DatasetError> {
        let value = fields.get(position).ok_or(DatasetError::MissingField {
            line: line_no,
            position,
        })?;
        value.parse::<f64>().map_err(|_| DatasetError::InvalidNumber {
            line: line_no,
            position,
            value: value.to_string(),
        })
    };

    Ok(TemperaturePair::new(field(HIGH_FIELD)?, field(LOW_FIELD)?))
}

/// Day indices as a `(1, steps)` input row
pub fn indices_to_array(indices: &[usize]) -> Array2<f64> {
    Array2::from_shape_fn((1, indices.len()), |(_, t)| indices[t] as f64)
}

/// Samples as `(1, steps)` inputs and `(2, steps)` targets
pub fn samples_to_arrays(samples: &[Sample]) -> (Array2<f64>, Array2<f64>) {
    let indices: Vec<usize> = samples.iter().map(|s| s.index).collect();
    let targets = Array2::from_shape_fn((2, samples.len()), |(row, t)| {
        let pair = samples[t].temperatures;
        if row == 0 {
            pair.high
        } else {
            pair.low
        }
    });
    (indices_to_array(&indices), targets)
}

/// Columns of a `(2, steps)` output as temperature pairs
pub fn array_to_pairs(outputs: &Array2<f64>) -> Vec<TemperaturePair> {
    outputs
        .columns()
        .into_iter()
        .map(|column| TemperaturePair::new(column[0], column[1]))
        .collect()
}
