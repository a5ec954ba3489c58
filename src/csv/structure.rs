//! CSV row and header data structures.

use std::collections::HashMap;

use csv::StringRecord;

use crate::error::ValueError;
use crate::normalize;

/// Renames repeated headers by appending an increasing counter.
#[derive(Debug, Default)]
pub(crate) struct HeaderDeduper {
    seen: HashMap<String, usize>,
}

impl HeaderDeduper {
    pub(crate) fn rename(&mut self, header: &str) -> String {
        match self.seen.get_mut(header) {
            Some(count) => {
                *count += 1;
                format!("{header} {count}")
            }
            None => {
                self.seen.insert(header.to_string(), 0);
                header.to_string()
            }
        }
    }
}

/// One data row, keyed by (deduplicated) header.
///
/// Only non-empty cells are stored, so a missing column and an empty cell read
/// the same.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsvRow {
    cells: HashMap<String, String>,
    line: usize,
}

impl CsvRow {
    pub(crate) fn from_record(headers: &[String], record: &StringRecord, line: usize) -> Self {
        let cells = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(header, value)| (header.clone(), value.trim().to_string()))
            .collect();
        CsvRow { cells, line }
    }

    /// Builds a row directly from header/value pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let headers: Vec<(&str, &str)> = pairs.into_iter().collect();
        let names: Vec<String> = headers.iter().map(|(h, _)| h.to_string()).collect();
        let record = StringRecord::from(headers.iter().map(|(_, v)| *v).collect::<Vec<_>>());
        Self::from_record(&names, &record, 0)
    }

    /// Source line, for error messages.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn require(&self, column: &str) -> Result<&str, ValueError> {
        self.get(column)
            .ok_or_else(|| ValueError::MissingField(column.to_string()))
    }

    pub fn int(&self, column: &str) -> Result<Option<i32>, ValueError> {
        normalize::int_cell(column, self.get(column))
    }

    pub fn float(&self, column: &str) -> Result<Option<f64>, ValueError> {
        self.get(column)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| ValueError::invalid_number(column, v))
            })
            .transpose()
    }

    /// Splits a multi-valued cell on any of the separators.
    pub fn list(&self, column: &str, separators: &[char]) -> Vec<String> {
        self.get(column)
            .map(|v| normalize::split_list(v, separators))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deduper_counts_per_header() {
        let mut deduper = HeaderDeduper::default();
        let renamed: Vec<String> = ["a", "b", "a", "a", "b"]
            .iter()
            .map(|h| deduper.rename(h))
            .collect();
        assert_eq!(renamed, vec!["a", "b", "a 1", "a 2", "b 1"]);
    }

    #[test]
    fn test_typed_accessors() {
        let row = CsvRow::from_pairs([
            ("pages", "204.0"),
            ("width", "5.5"),
            ("keywords", "history; economics,law"),
            ("bad", "many"),
        ]);
        assert_eq!(row.int("pages").unwrap(), Some(204));
        assert_eq!(row.float("width").unwrap(), Some(5.5));
        assert_eq!(row.list("keywords", &[';', ',']), vec!["history", "economics", "law"]);
        assert!(row.int("bad").is_err());
        assert_eq!(row.int("missing").unwrap(), None);
        assert_eq!(
            row.require("missing"),
            Err(ValueError::MissingField("missing".into()))
        );
    }
}
