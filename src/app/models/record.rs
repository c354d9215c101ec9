//! Raw fetched tables and transient long-format records.

use crate::app::models::value::Value;
use std::collections::BTreeMap;

/// A raw sub-dataset extract exactly as the fetch port yields it: a header
/// row plus string-typed data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Convenience constructor for fixtures and tests
    pub fn from_str_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.has_column(n))
    }

    /// Rename a header in place; absent names are ignored
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.headers[idx] = to.to_string();
        }
    }

    /// Remove columns (headers and cells) by name
    pub fn drop_columns(&mut self, names: &[&str]) {
        let mut indices: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        for idx in indices.iter().rev() {
            self.headers.remove(*idx);
            for row in &mut self.rows {
                if *idx < row.len() {
                    row.remove(*idx);
                }
            }
        }
    }

    /// Cell of `row` under the named header; short rows read as `None`
    pub fn get<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        let idx = self.column_index(name)?;
        row.get(idx).map(|s| s.as_str())
    }

    /// Trimmed non-empty cell of `row` under the named header
    pub fn get_present<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.get(row, name)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One long-format record: named key fields, a category combination, and a
/// single value.
///
/// Long records are transient; they exist between a sub-dataset fetch and the
/// pivot that consumes them.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    /// Key-axis fields (geographic segments and period fields)
    pub keys: BTreeMap<String, Value>,
    /// Category-axis labels, post-translation
    pub categories: BTreeMap<String, String>,
    /// The observed value; non-numeric tokens have already coerced to `None`
    pub value: Option<f64>,
}

impl LongRecord {
    pub fn new() -> Self {
        Self {
            keys: BTreeMap::new(),
            categories: BTreeMap::new(),
            value: None,
        }
    }

    pub fn with_key(mut self, axis: impl Into<String>, value: Value) -> Self {
        self.keys.insert(axis.into(), value);
        self
    }

    pub fn with_category(mut self, axis: impl Into<String>, label: impl Into<String>) -> Self {
        self.categories.insert(axis.into(), label.into());
        self
    }

    pub fn with_value(mut self, value: Option<f64>) -> Self {
        self.value = value;
        self
    }
}

impl Default for LongRecord {
    fn default() -> Self {
        Self::new()
    }
}
