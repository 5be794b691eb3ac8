use std::fs;
use std::path::Path;

use crate::error::LookupError;

/// City name to provider code table, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityCodeTable {
    entries: Vec<(String, Option<String>, usize)>, // (name, code, line)
}

impl CityCodeTable {
    /// Reads a table with one `<cityName> <cityCode>` entry per line
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LookupError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| LookupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&contents))
    }

    /// Parses table contents. Each trimmed line is split on a single space;
    /// blank lines are ignored.
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let line = line.trim();
                if line.is_empty() {
                    return None;
                }
                let mut parts = line.split(' ');
                let name = parts.next()?.to_string();
                let code = parts.next().filter(|c| !c.is_empty()).map(str::to_string);
                Some((name, code, i + 1))
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Code of the first entry whose name matches `city` exactly
    pub fn lookup(&self, city: &str) -> Result<&str, LookupError> {
        let (_, code, line) = self
            .entries
            .iter()
            .find(|(name, _, _)| name == city)
            .ok_or_else(|| LookupError::CityNotFound {
                city: city.to_string(),
            })?;

        code.as_deref().ok_or_else(|| LookupError::MissingCode {
            line: *line,
            city: city.to_string(),
        })
    }
}
