//! Wide-format fragments.
//!
//! A [`Frame`] is an explicit typed representation of a wide table: an ordered
//! list of named columns plus the ordered list of key-column names. Row
//! identity is the key tuple (geographic segments and period fields); every
//! non-key column is one flattened category combination.

use crate::app::models::value::Value;
use crate::error::{HarmonizerError, Result};

static MISSING: Value = Value::Missing;

/// A single named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// True when every cell is the missing marker
    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Value::is_missing)
    }
}

/// A wide-format table keyed by its declared key columns.
///
/// Column order is insertion order of first appearance; key columns are
/// created first so they lead the persisted layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    key_columns: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Frame {
    /// Create an empty frame carrying only its key columns
    pub fn new(key_columns: Vec<String>) -> Self {
        let columns = key_columns
            .iter()
            .map(|name| Column::new(name.clone(), Vec::new()))
            .collect();
        Self {
            key_columns,
            columns,
            n_rows: 0,
        }
    }

    /// Assemble a frame from prebuilt columns, preserving their order.
    ///
    /// Every key column must exist and every column must share one height.
    pub fn from_columns(key_columns: Vec<String>, columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for column in &columns {
            if column.values.len() != n_rows {
                return Err(HarmonizerError::ColumnLength {
                    column: column.name.clone(),
                    len: column.values.len(),
                    height: n_rows,
                });
            }
        }
        let mut seen: Vec<&str> = Vec::with_capacity(columns.len());
        for column in &columns {
            if seen.contains(&column.name.as_str()) {
                return Err(HarmonizerError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
            seen.push(column.name.as_str());
        }
        for key in &key_columns {
            if !columns.iter().any(|c| &c.name == key) {
                return Err(HarmonizerError::missing_key_column(
                    key.clone(),
                    "assembling a frame from columns",
                ));
            }
        }
        Ok(Self {
            key_columns,
            columns,
            n_rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// A frame with no rows is empty regardless of its column set
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn is_key_column(&self, name: &str) -> bool {
        self.key_columns.iter().any(|k| k == name)
    }

    /// Redeclare the key-column list; every name must exist in the frame
    pub fn set_key_columns(&mut self, keys: Vec<String>) -> Result<()> {
        for key in &keys {
            if !self.has_column(key) {
                return Err(HarmonizerError::missing_key_column(
                    key.clone(),
                    "redeclaring frame keys",
                ));
            }
        }
        self.key_columns = keys;
        Ok(())
    }

    /// Append a new column; its length must match the frame height
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(HarmonizerError::DuplicateColumn { column: name });
        }
        if values.len() != self.n_rows {
            return Err(HarmonizerError::ColumnLength {
                column: name,
                len: values.len(),
                height: self.n_rows,
            });
        }
        self.columns.push(Column::new(name, values));
        Ok(())
    }

    /// Index of the named column, creating an all-missing one if absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns
            .push(Column::new(name, vec![Value::Missing; self.n_rows]));
        self.columns.len() - 1
    }

    /// Add or overwrite a full column; its length must match the frame height
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if values.len() != self.n_rows {
            return Err(HarmonizerError::ColumnLength {
                column: name.to_string(),
                len: values.len(),
                height: self.n_rows,
            });
        }
        let idx = self.ensure_column(name);
        self.columns[idx].values = values;
        Ok(())
    }

    /// Add or overwrite a column holding one constant value
    pub fn set_constant_column(&mut self, name: &str, value: Value) {
        let n = self.n_rows;
        let idx = self.ensure_column(name);
        self.columns[idx].values = vec![value; n];
    }

    /// Derive a new column from an existing one, row by row.
    ///
    /// Rows where the source column is absent derive from `Missing`.
    pub fn add_derived_column<F>(&mut self, name: &str, from: &str, f: F)
    where
        F: Fn(&Value) -> Value,
    {
        let derived: Vec<Value> = match self.column(from) {
            Some(col) => col.values.iter().map(f).collect(),
            None => (0..self.n_rows).map(|_| f(&Value::Missing)).collect(),
        };
        let idx = self.ensure_column(name);
        self.columns[idx].values = derived;
    }

    /// Rewrite a column in place, row by row
    pub fn map_column<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Value) -> Value,
    {
        if let Some(idx) = self.column_index(name) {
            let mapped: Vec<Value> = self.columns[idx].values.iter().map(&f).collect();
            self.columns[idx].values = mapped;
        }
    }

    /// Remove a column entirely (and from the key list if declared there)
    pub fn drop_column(&mut self, name: &str) {
        self.columns.retain(|c| c.name != name);
        self.key_columns.retain(|k| k != name);
    }

    /// Append a full-width row; cell order must match the column order
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(HarmonizerError::ColumnLength {
                column: "<row>".to_string(),
                len: row.len(),
                height: self.columns.len(),
            });
        }
        for (column, cell) in self.columns.iter_mut().zip(row) {
            column.values.push(cell);
        }
        self.n_rows += 1;
        Ok(())
    }

    pub fn value(&self, column: usize, row: usize) -> &Value {
        &self.columns[column].values[row]
    }

    pub fn set_value(&mut self, column: usize, row: usize, value: Value) {
        self.columns[column].values[row] = value;
    }

    /// The named cell of one row, `Missing` when the column is absent
    pub fn cell(&self, name: &str, row: usize) -> &Value {
        self.column(name)
            .map(|c| &c.values[row])
            .unwrap_or(&MISSING)
    }

    /// Key tuple of a row as values
    pub fn key_values(&self, row: usize) -> Vec<Value> {
        self.key_columns
            .iter()
            .map(|k| self.cell(k, row).clone())
            .collect()
    }

    /// Keep only the rows the predicate accepts
    pub fn retain_rows<F>(&mut self, predicate: F)
    where
        F: Fn(usize) -> bool,
    {
        let keep: Vec<bool> = (0..self.n_rows).map(&predicate).collect();
        for column in &mut self.columns {
            let mut row = 0;
            column.values.retain(|_| {
                let keep_this = keep[row];
                row += 1;
                keep_this
            });
        }
        self.n_rows = keep.iter().filter(|k| **k).count();
    }

    /// Keep only the rows whose cell in `column` satisfies the predicate.
    ///
    /// A missing column keeps nothing, matching the "absent degrades to
    /// empty" rule rather than erroring.
    pub fn retain_rows_where<F>(&mut self, column: &str, f: F)
    where
        F: Fn(&Value) -> bool,
    {
        let keep: Vec<bool> = match self.column(column) {
            Some(col) => col.values.iter().map(&f).collect(),
            None => vec![false; self.n_rows],
        };
        self.retain_rows(|row| keep[row]);
    }

    /// Drop every all-missing column, key columns included.
    ///
    /// A column relevant only to a different granularity is all-missing in a
    /// level subset and carries no information there.
    pub fn drop_all_missing_columns(&mut self) {
        let dropped: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.is_all_missing())
            .map(|c| c.name.clone())
            .collect();
        self.columns.retain(|c| !c.is_all_missing());
        self.key_columns.retain(|k| !dropped.contains(k));
    }

    /// Reorder columns so the declared key columns lead, in key order.
    ///
    /// The persisted layout expects key columns first; fragments that grow
    /// their geographic columns late call this before being cached.
    pub fn promote_key_columns(&mut self) {
        let mut reordered: Vec<Column> = Vec::with_capacity(self.columns.len());
        for key in &self.key_columns {
            if let Some(idx) = self.columns.iter().position(|c| &c.name == key) {
                reordered.push(self.columns.remove(idx));
            }
        }
        reordered.append(&mut self.columns);
        self.columns = reordered;
    }

    /// Sort rows by the key tuple so repeated runs emit identical tables
    pub fn sort_rows_by_key(&mut self) {
        let mut order: Vec<usize> = (0..self.n_rows).collect();
        order.sort_by(|&a, &b| {
            let ka = self.key_values(a);
            let kb = self.key_values(b);
            ka.iter()
                .zip(kb.iter())
                .map(|(x, y)| x.compare(y))
                .find(|o| !o.is_eq())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for column in &mut self.columns {
            column.values = order.iter().map(|&i| column.values[i].clone()).collect();
        }
    }

    /// Concatenate frames row-wise with an outer column union.
    ///
    /// Column order follows the first frame, extended by later frames'
    /// new columns in appearance order; absent cells become `Missing`.
    /// Key columns are taken from the first frame.
    pub fn concat(frames: Vec<Frame>) -> Frame {
        let mut iter = frames.into_iter();
        let Some(mut combined) = iter.next() else {
            return Frame::new(Vec::new());
        };
        for frame in iter {
            let added = frame.n_rows;
            for column in &combined.columns {
                debug_assert!(column.values.len() == combined.n_rows);
            }
            // Extend existing columns with the incoming rows
            for column in &mut combined.columns {
                match frame.column(&column.name) {
                    Some(other) => column.values.extend(other.values.iter().cloned()),
                    None => column
                        .values
                        .extend(std::iter::repeat(Value::Missing).take(added)),
                }
            }
            // Adopt columns seen for the first time
            for other in &frame.columns {
                if !combined.has_column(&other.name) {
                    let mut values = vec![Value::Missing; combined.n_rows];
                    values.extend(other.values.iter().cloned());
                    combined.columns.push(Column::new(other.name.clone(), values));
                }
            }
            combined.n_rows += added;
        }
        combined
    }

    /// Structural equality modulo numeric dtype, for the round-trip contract
    pub fn equivalent(&self, other: &Frame) -> bool {
        if self.n_rows != other.n_rows
            || self.column_names() != other.column_names()
            || self.key_columns != other.key_columns
        {
            return false;
        }
        self.columns.iter().zip(other.columns.iter()).all(|(a, b)| {
            a.values
                .iter()
                .zip(b.values.iter())
                .all(|(x, y)| x.equivalent(y))
        })
    }
}
