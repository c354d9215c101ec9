//! Hierarchy aggregation.
//!
//! Rolls a fragment up to the next coarser level by eliminating its finest
//! key segment and reducing the value columns per group. Derived rows carry
//! the missing marker in the eliminated segment and coexist with the original
//! rows until the level splitter separates the granularities.

use crate::app::models::frame::Frame;
use crate::app::models::value::{KeyToken, Value};
use crate::error::{HarmonizerError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Reducer applied to a value column when rolling up.
///
/// The choice is explicit per dataset: extensive quantities (population
/// counts) sum, intensive quantities (price indices) average. It is domain
/// knowledge, never inferred from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Mean,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulation {
    total: f64,
    count: usize,
}

impl Accumulation {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.total += v;
            self.count += 1;
        }
    }

    /// Missing cells are excluded; a group with no numeric contribution
    /// reduces to missing, not zero.
    fn reduce(&self, reducer: Reducer) -> Value {
        if self.count == 0 {
            return Value::Missing;
        }
        match reducer {
            Reducer::Sum => Value::Number(self.total),
            Reducer::Mean => Value::Number(self.total / self.count as f64),
        }
    }
}

/// Derive the next coarser level and append it to the fragment.
///
/// Rows are grouped on every key column except `eliminated_key`; only rows
/// where the eliminated segment is present contribute (coarser rows already
/// in the fragment pass through untouched). Value columns are numeric-coerced
/// first; non-numeric tokens coerce to missing and drop out of the reduction.
pub fn roll_up(frame: &Frame, eliminated_key: &str, reducer: Reducer) -> Result<Frame> {
    if !frame.is_key_column(eliminated_key) {
        return Err(HarmonizerError::missing_key_column(
            eliminated_key,
            "rolling up the hierarchy",
        ));
    }

    let group_keys: Vec<String> = frame
        .key_columns()
        .iter()
        .filter(|k| k.as_str() != eliminated_key)
        .cloned()
        .collect();
    let value_columns: Vec<String> = frame
        .column_names()
        .iter()
        .filter(|name| !frame.is_key_column(name))
        .map(|name| name.to_string())
        .collect();

    // Group participating rows, remembering first-appearance group key values
    let mut groups: HashMap<Vec<KeyToken>, usize> = HashMap::new();
    let mut group_values: Vec<Vec<Value>> = Vec::new();
    let mut states: Vec<Vec<Accumulation>> = Vec::new();

    for row in 0..frame.n_rows() {
        if frame.cell(eliminated_key, row).is_missing() {
            continue;
        }
        let key_values: Vec<Value> = group_keys
            .iter()
            .map(|k| frame.cell(k, row).clone())
            .collect();
        let tokens: Vec<KeyToken> = key_values.iter().map(Value::key_token).collect();
        let group = *groups.entry(tokens).or_insert_with(|| {
            group_values.push(key_values);
            states.push(vec![Accumulation::default(); value_columns.len()]);
            states.len() - 1
        });
        for (i, column) in value_columns.iter().enumerate() {
            states[group][i].add(frame.cell(column, row).as_f64());
        }
    }

    // Deterministic derived-row order
    let mut order: Vec<usize> = (0..group_values.len()).collect();
    order.sort_by(|&a, &b| {
        group_values[a]
            .iter()
            .zip(group_values[b].iter())
            .map(|(x, y)| x.compare(y))
            .find(|o| !o.is_eq())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut combined = frame.clone();
    for group in order {
        let row: Vec<Value> = combined
            .column_names()
            .iter()
            .map(|name| {
                if *name == eliminated_key {
                    Value::Missing
                } else if let Some(i) = group_keys.iter().position(|k| k == name) {
                    group_values[group][i].clone()
                } else if let Some(i) = value_columns.iter().position(|c| c == name) {
                    states[group][i].reduce(reducer)
                } else {
                    Value::Missing
                }
            })
            .collect();
        combined.push_row(row)?;
    }

    debug!(
        "rolled up {} groups by eliminating '{}' ({:?})",
        group_values.len(),
        eliminated_key,
        reducer
    );

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_frame() -> Frame {
        let mut frame = Frame::new(vec![
            "Municipality code".into(),
            "District code".into(),
            "Section code".into(),
            "Year".into(),
        ]);
        frame.add_column("Population", Vec::new()).unwrap();
        let rows = [
            ("01001", "01", "001", 5.0),
            ("01001", "01", "002", 7.0),
            ("01001", "02", "001", 11.0),
        ];
        for (muni, district, section, value) in rows {
            frame
                .push_row(vec![
                    Value::text(muni),
                    Value::text(district),
                    Value::text(section),
                    Value::Int(2021),
                    Value::Number(value),
                ])
                .unwrap();
        }
        frame
    }

    #[test]
    fn test_sum_roll_up_conserves_totals() {
        let combined = roll_up(&section_frame(), "Section code", Reducer::Sum).unwrap();
        // Original rows untouched, two derived district rows appended
        assert_eq!(combined.n_rows(), 5);
        assert_eq!(combined.cell("Section code", 3), &Value::Missing);
        assert_eq!(combined.cell("District code", 3), &Value::text("01"));
        assert_eq!(combined.cell("Population", 3), &Value::Number(12.0));
        assert_eq!(combined.cell("Population", 4), &Value::Number(11.0));

        // Conservation: derived totals equal the finer rows that rolled in
        let finer: f64 = (0..3)
            .map(|r| combined.cell("Population", r).as_f64().unwrap())
            .sum();
        let derived: f64 = (3..5)
            .map(|r| combined.cell("Population", r).as_f64().unwrap())
            .sum();
        assert_eq!(finer, derived);
    }

    #[test]
    fn test_mean_roll_up() {
        let mut frame = Frame::new(vec![
            "Municipality code".into(),
            "District code".into(),
            "Year".into(),
        ]);
        frame.add_column("Household rental index", Vec::new()).unwrap();
        for (district, value) in [("01", 8.0), ("02", 10.0)] {
            frame
                .push_row(vec![
                    Value::text("01001"),
                    Value::text(district),
                    Value::Int(2021),
                    Value::Number(value),
                ])
                .unwrap();
        }
        let combined = roll_up(&frame, "District code", Reducer::Mean).unwrap();
        assert_eq!(combined.n_rows(), 3);
        assert_eq!(
            combined.cell("Household rental index", 2),
            &Value::Number(9.0)
        );
    }

    #[test]
    fn test_missing_values_excluded_not_zeroed() {
        let mut frame = section_frame();
        let column = frame.column_index("Population").unwrap();
        frame.set_value(column, 1, Value::Missing);
        let combined = roll_up(&frame, "Section code", Reducer::Mean).unwrap();
        // District 01 mean uses the single present value, not (5 + 0) / 2
        assert_eq!(combined.cell("Population", 3), &Value::Number(5.0));
    }

    #[test]
    fn test_all_missing_group_reduces_to_missing() {
        let mut frame = section_frame();
        let column = frame.column_index("Population").unwrap();
        frame.set_value(column, 0, Value::Missing);
        frame.set_value(column, 1, Value::Missing);
        let combined = roll_up(&frame, "Section code", Reducer::Sum).unwrap();
        assert_eq!(combined.cell("Population", 3), &Value::Missing);
    }

    #[test]
    fn test_coarser_rows_pass_through() {
        let mut frame = section_frame();
        frame
            .push_row(vec![
                Value::text("01001"),
                Value::text("03"),
                Value::Missing,
                Value::Int(2021),
                Value::Number(99.0),
            ])
            .unwrap();
        let combined = roll_up(&frame, "Section code", Reducer::Sum).unwrap();
        // The already-coarse row neither contributes nor duplicates
        assert_eq!(combined.n_rows(), 4 + 2);
    }

    #[test]
    fn test_unknown_key_errors() {
        let result = roll_up(&section_frame(), "Block code", Reducer::Sum);
        assert!(matches!(
            result,
            Err(HarmonizerError::MissingKeyColumn { .. })
        ));
    }

    #[test]
    fn test_empty_frame_rolls_up_to_itself() {
        let frame = Frame::new(vec!["Municipality code".into(), "Section code".into()]);
        let combined = roll_up(&frame, "Section code", Reducer::Sum).unwrap();
        assert!(combined.is_empty());
    }
}
