//! Category pivot engine.
//!
//! Converts a long-format record set (one row per key + category combination
//! + value) into a wide fragment with one row per key tuple and one column
//! per flattened category combination.

use crate::app::models::frame::Frame;
use crate::app::models::record::LongRecord;
use crate::app::models::value::{KeyToken, Value};
use crate::app::services::naming::compose_column_name;
use std::collections::HashMap;
use tracing::debug;

/// Axis designation for one pivot: which axes key the output rows, which
/// field carried the value, and which category axes are subgroup axes.
#[derive(Debug, Clone)]
pub struct PivotSpec {
    /// Key axes in output column order (geographic fields, then period)
    pub key_axes: Vec<String>,
    /// Name of the value field, used as the column name for a record with no
    /// category axes at all
    pub value_axis: String,
    /// Subgroup axes in qualification order
    pub subgroup_axes: Vec<String>,
}

impl PivotSpec {
    pub fn new(
        key_axes: &[&str],
        value_axis: &str,
        subgroup_axes: &[&str],
    ) -> Self {
        Self {
            key_axes: key_axes.iter().map(|s| s.to_string()).collect(),
            value_axis: value_axis.to_string(),
            subgroup_axes: subgroup_axes.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Pivot long records into a wide fragment.
///
/// Duplicate (key, category-combination) groups are a caller contract
/// violation; they resolve deterministically to the first record after
/// sorting by key, categories, then value with missing last — the record
/// with the smallest value wins, reproducing the source system's
/// sort-then-deduplicate behavior.
pub fn pivot(mut records: Vec<LongRecord>, spec: &PivotSpec) -> Frame {
    let mut frame = Frame::new(spec.key_axes.clone());
    if records.is_empty() {
        return frame;
    }

    records.sort_by(|a, b| {
        let key_order = spec
            .key_axes
            .iter()
            .map(|axis| {
                let x = a.keys.get(axis).unwrap_or(&Value::Missing);
                let y = b.keys.get(axis).unwrap_or(&Value::Missing);
                x.compare(y)
            })
            .find(|o| !o.is_eq());
        if let Some(order) = key_order {
            return order;
        }
        match a.categories.cmp(&b.categories) {
            std::cmp::Ordering::Equal => {
                Value::from(a.value).compare(&Value::from(b.value))
            }
            other => other,
        }
    });

    let mut row_of: HashMap<Vec<KeyToken>, usize> = HashMap::new();
    let mut duplicates = 0usize;
    let mut collisions = 0usize;

    for record in &records {
        let key_values: Vec<Value> = spec
            .key_axes
            .iter()
            .map(|axis| record.keys.get(axis).cloned().unwrap_or(Value::Missing))
            .collect();
        let tokens: Vec<KeyToken> = key_values.iter().map(Value::key_token).collect();

        let row = match row_of.get(&tokens) {
            Some(row) => *row,
            None => {
                let row = frame.n_rows();
                let mut cells = key_values.clone();
                cells.extend(vec![
                    Value::Missing;
                    frame.n_columns() - spec.key_axes.len()
                ]);
                frame
                    .push_row(cells)
                    .expect("pivot rows match frame width by construction");
                row_of.insert(tokens, row);
                row
            }
        };

        let column_name = column_name_for(record, spec);
        let column = frame.ensure_column(&column_name);
        if frame.value(column, row).is_present() {
            // First record after the deterministic sort wins
            if record.value.is_some() {
                collisions += 1;
            }
            duplicates += 1;
            continue;
        }
        frame.set_value(column, row, Value::from(record.value));
    }

    if duplicates > 0 {
        debug!(
            "pivot resolved {} duplicate combinations ({} with competing values)",
            duplicates, collisions
        );
    }

    frame
}

/// Flattened column name for one record's category combination
fn column_name_for(record: &LongRecord, spec: &PivotSpec) -> String {
    let main_parts: Vec<String> = record
        .categories
        .iter()
        .filter(|(axis, _)| !spec.subgroup_axes.contains(axis))
        .map(|(_, label)| label.clone())
        .collect();
    let subgroup_parts: Vec<(String, String)> = spec
        .subgroup_axes
        .iter()
        .filter_map(|axis| {
            record
                .categories
                .get(axis)
                .map(|label| (axis.clone(), label.clone()))
        })
        .collect();
    if main_parts.is_empty() && subgroup_parts.is_empty() {
        return spec.value_axis.clone();
    }
    compose_column_name(&main_parts, &subgroup_parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        municipality: &str,
        year: i64,
        categories: &[(&str, &str)],
        value: Option<f64>,
    ) -> LongRecord {
        let mut rec = LongRecord::new()
            .with_key("Municipality code", Value::text(municipality))
            .with_key("Year", Value::Int(year))
            .with_value(value);
        for (axis, label) in categories {
            rec = rec.with_category(*axis, *label);
        }
        rec
    }

    fn spec() -> PivotSpec {
        PivotSpec::new(
            &["Municipality code", "Year"],
            "Value",
            &["Nationality", "Age", "Sex"],
        )
    }

    #[test]
    fn test_subgroup_labels_become_qualified_columns() {
        // Neither label is "Total", so no bare collapsed column may appear
        let records = vec![
            record("01001", 2021, &[("Sex", "Males")], Some(100.0)),
            record("01001", 2021, &[("Sex", "Females")], Some(110.0)),
        ];
        let frame = pivot(records, &spec());
        assert_eq!(frame.n_rows(), 1);
        assert_eq!(
            frame.column_names(),
            vec!["Municipality code", "Year", "Sex:Females", "Sex:Males"]
        );
        assert_eq!(frame.cell("Sex:Males", 0), &Value::Number(100.0));
        assert_eq!(frame.cell("Sex:Females", 0), &Value::Number(110.0));
    }

    #[test]
    fn test_total_collapses_onto_metric_column() {
        let records = vec![
            record(
                "01001",
                2021,
                &[("Value name", "Population"), ("Sex", "Total")],
                Some(210.0),
            ),
            record(
                "01001",
                2021,
                &[("Value name", "Population"), ("Sex", "Males")],
                Some(100.0),
            ),
        ];
        let frame = pivot(records, &spec());
        assert_eq!(frame.cell("Population", 0), &Value::Number(210.0));
        assert_eq!(frame.cell("Population ~ Sex:Males", 0), &Value::Number(100.0));
    }

    #[test]
    fn test_one_row_per_key() {
        let records = vec![
            record("01001", 2021, &[("Sex", "Males")], Some(1.0)),
            record("01002", 2021, &[("Sex", "Males")], Some(2.0)),
            record("01001", 2022, &[("Sex", "Males")], Some(3.0)),
        ];
        let frame = pivot(records, &spec());
        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.n_columns(), 3);
    }

    #[test]
    fn test_duplicate_combination_resolves_to_smallest_value() {
        let records = vec![
            record("01001", 2021, &[("Sex", "Males")], Some(9.0)),
            record("01001", 2021, &[("Sex", "Males")], Some(4.0)),
            record("01001", 2021, &[("Sex", "Males")], None),
        ];
        let frame = pivot(records, &spec());
        assert_eq!(frame.n_rows(), 1);
        assert_eq!(frame.cell("Sex:Males", 0), &Value::Number(4.0));
    }

    #[test]
    fn test_empty_input_keeps_key_columns() {
        let frame = pivot(Vec::new(), &spec());
        assert!(frame.is_empty());
        assert_eq!(frame.column_names(), vec!["Municipality code", "Year"]);
    }

    #[test]
    fn test_no_category_axes_uses_value_axis_name() {
        let records = vec![record("01001", 2021, &[], Some(12.5))];
        let frame = pivot(records, &spec());
        assert_eq!(frame.cell("Value", 0), &Value::Number(12.5));
    }

    #[test]
    fn test_missing_value_cell_stays_missing() {
        let records = vec![record("01001", 2021, &[("Sex", "Males")], None)];
        let frame = pivot(records, &spec());
        assert_eq!(frame.cell("Sex:Males", 0), &Value::Missing);
    }

    #[test]
    fn test_pivot_idempotence_on_column_set() {
        // Re-flattening an already-wide fragment's columns reproduces them
        let records = vec![
            record("01001", 2021, &[("Sex", "Males")], Some(1.0)),
            record("01001", 2021, &[("Sex", "Females")], Some(2.0)),
        ];
        let wide = pivot(records, &spec());
        let names: Vec<String> = wide
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        // Feed each non-key column back through as a pre-flattened label
        let mut again = Vec::new();
        for name in names.iter().skip(2) {
            again.push(
                LongRecord::new()
                    .with_key("Municipality code", Value::text("01001"))
                    .with_key("Year", Value::Int(2021))
                    .with_category("Value name", name.clone())
                    .with_value(Some(1.0)),
            );
        }
        let rewide = pivot(again, &spec());
        let renames: Vec<String> = rewide
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, renames);
    }
}
