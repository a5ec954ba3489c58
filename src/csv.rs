//! CSV input reader.
//!
//! Reads a publisher spreadsheet export into [`CsvRow`]s keyed by header.
//! Repeated headers are renamed `"{header} 1"`, `"{header} 2"` and so on, and
//! empty cells are treated as absent.
//!
//! # Example
//!
//! ```
//! use bibingest::csv::{CsvConfig, CsvReader};
//!
//! let input = "Title;ORCID ID;ORCID ID\nA Book;0000-0001;0000-0002";
//! let mut config = CsvConfig::new();
//! config.set_delimiter(b';');
//!
//! let rows = CsvReader::new().with_config(config).parse(input).unwrap();
//! assert_eq!(rows[0].get("ORCID ID 1"), Some("0000-0002"));
//! ```

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::Result;

mod structure;

pub use structure::CsvRow;
use structure::HeaderDeduper;

/// Dialect options for a CSV input.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    delimiter: u8,
    /// Accept rows with fewer or more cells than the header.
    flexible: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            flexible: true,
        }
    }

    /// Sets the delimiter character
    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    pub fn set_flexible(&mut self, flexible: bool) -> &mut Self {
        self.flexible = flexible;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    config: CsvConfig,
}

impl CsvReader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CsvConfig::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    pub fn read_path(&self, path: &Path) -> Result<Vec<CsvRow>> {
        let file = std::fs::File::open(path)?;
        self.read(file)
    }

    pub fn parse(&self, input: &str) -> Result<Vec<CsvRow>> {
        self.read(input.as_bytes())
    }

    fn read<R: Read>(&self, input: R) -> Result<Vec<CsvRow>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .flexible(self.config.flexible)
            .has_headers(true)
            .from_reader(input);

        let mut deduper = HeaderDeduper::default();
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| deduper.rename(h.trim()))
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            // line 1 is the header
            rows.push(CsvRow::from_record(&headers, &record, index + 2));
        }
        log::debug!("read {} CSV rows with {} columns", rows.len(), headers.len());
        Ok(rows)
    }
}
