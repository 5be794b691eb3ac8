//! Training data acquisition: city code lookup, history page retrieval and
//! table extraction.

/// City name to provider code table.
pub mod city_code;

/// History page retrieval.
pub mod fetcher;

/// Markup to rows of cell text.
pub mod table;

pub use city_code::CityCodeTable;
pub use fetcher::{HistorySource, HttpHistoryFetcher};
pub use table::{RawRow, TableExtractor, TagScanExtractor};
