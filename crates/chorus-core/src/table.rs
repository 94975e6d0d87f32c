//! Row-oriented tabular data parsed from uploaded files.
//!
//! Uploads arrive as raw text: `.json` files must contain an array of row
//! objects, everything else is treated as comma-separated values with a
//! header line. Numeric columns are auto-detected cell by cell — a value
//! that parses as a number becomes one, anything else stays text.

use serde_json::Value;
use thiserror::Error;

use crate::viz::Row;

/// Errors from tabular parsing.
#[derive(Debug, Error)]
pub enum TableError {
    /// The JSON body was not valid JSON.
    #[error("invalid JSON upload: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON body was valid but not an array of objects.
    #[error("JSON upload is not an array of row objects")]
    NotRows,

    /// The CSV body had no header line.
    #[error("CSV upload is empty")]
    Empty,
}

/// Parsed tabular data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    /// Row objects in file order.
    pub rows: Vec<Row>,
}

impl DataTable {
    /// Parse an upload by file name: `.json` as a row array, anything else
    /// as CSV.
    pub fn parse(file_name: &str, text: &str) -> Result<Self, TableError> {
        if file_name.to_ascii_lowercase().ends_with(".json") {
            Self::parse_json(text)
        } else {
            Self::parse_csv(text)
        }
    }

    /// Parse a JSON array of row objects.
    pub fn parse_json(text: &str) -> Result<Self, TableError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Array(items) = value else {
            return Err(TableError::NotRows);
        };
        let rows = items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(TableError::NotRows),
            })
            .collect::<Result<Vec<Row>, TableError>>()?;
        Ok(Self { rows })
    }

    /// Parse comma-separated values with a header line.
    ///
    /// Cells that parse as numbers become JSON numbers; everything else is
    /// kept as text. Quoting is not interpreted; commas always split.
    pub fn parse_csv(text: &str) -> Result<Self, TableError> {
        let mut lines = text.trim().lines();
        let header = lines.next().ok_or(TableError::Empty)?;
        let headers: Vec<String> = header.split(',').map(|h| h.trim().to_owned()).collect();
        if headers.iter().all(String::is_empty) {
            return Err(TableError::Empty);
        }

        let rows = lines
            .map(|line| {
                let mut row = Row::new();
                let values = line.split(',').map(str::trim);
                for (header, value) in headers.iter().zip(values) {
                    let _ = row.insert(header.clone(), parse_cell(value));
                }
                row
            })
            .collect();
        Ok(Self { rows })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// JSON rendering of the first `n` rows, for prompt embedding.
    #[must_use]
    pub fn sample_json(&self, n: usize) -> String {
        let head: Vec<&Row> = self.rows.iter().take(n).collect();
        serde_json::to_string(&head).unwrap_or_else(|_| "[]".to_owned())
    }
}

/// Numeric auto-detection: parse as f64, keep as text on failure.
fn parse_cell(value: &str) -> Value {
    match value.parse::<f64>() {
        Ok(n) => serde_json::Number::from_f64(n).map_or_else(|| Value::String(value.to_owned()), Value::Number),
        Err(_) => Value::String(value.to_owned()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
