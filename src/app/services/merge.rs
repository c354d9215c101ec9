//! Fragment merging.
//!
//! Per-sub-dataset fragments accumulate left to right into one table per
//! logical dataset. Only columns the accumulator has not seen yet are
//! appended; the join is left-style on the full key tuple.

use crate::app::models::frame::Frame;
use crate::app::models::value::{KeyToken, Value};
use crate::error::{HarmonizerError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Merge `other` into the accumulator on the declared join keys.
///
/// An empty accumulator adopts `other` wholesale. Otherwise each `other`
/// column not already present is aligned to the accumulator's rows by key
/// tuple; accumulator rows without a match read `Missing`.
///
/// Known asymmetry, preserved deliberately: rows present only in `other` are
/// silently dropped. Callers needing full outer-join semantics must
/// pre-validate key coverage (flagged for product-owner review in DESIGN.md).
pub fn merge(accumulator: Frame, other: Frame, join_keys: &[String]) -> Result<Frame> {
    if accumulator.is_empty() && accumulator.n_columns() <= accumulator.key_columns().len() {
        return Ok(other);
    }

    for key in join_keys {
        if !accumulator.has_column(key) {
            return Err(HarmonizerError::missing_key_column(
                key.clone(),
                "merging fragments (accumulator)",
            ));
        }
        if !other.has_column(key) {
            return Err(HarmonizerError::missing_key_column(
                key.clone(),
                "merging fragments (incoming fragment)",
            ));
        }
    }

    let mut accumulator = accumulator;

    // Index the incoming fragment by key tuple; a repeated key keeps its
    // first row, consistent with the pivot's first-wins policy.
    let mut other_row: HashMap<Vec<KeyToken>, usize> = HashMap::new();
    for row in 0..other.n_rows() {
        let tokens: Vec<KeyToken> = join_keys
            .iter()
            .map(|k| other.cell(k, row).key_token())
            .collect();
        other_row.entry(tokens).or_insert(row);
    }

    let acc_tokens: Vec<Vec<KeyToken>> = (0..accumulator.n_rows())
        .map(|row| {
            join_keys
                .iter()
                .map(|k| accumulator.cell(k, row).key_token())
                .collect()
        })
        .collect();

    let mut matched: usize = 0;
    let matches: Vec<Option<usize>> = acc_tokens
        .iter()
        .map(|tokens| {
            let hit = other_row.get(tokens).copied();
            if hit.is_some() {
                matched += 1;
            }
            hit
        })
        .collect();

    let incoming: Vec<String> = other
        .column_names()
        .iter()
        .filter(|name| !join_keys.iter().any(|k| k == *name))
        .filter(|name| !accumulator.has_column(name))
        .map(|name| name.to_string())
        .collect();

    for name in incoming {
        let source = other.column(&name).expect("column listed from frame");
        let values: Vec<Value> = matches
            .iter()
            .map(|hit| match hit {
                Some(row) => source.values[*row].clone(),
                None => Value::Missing,
            })
            .collect();
        accumulator.add_column(name, values)?;
    }

    let dropped = other.n_rows().saturating_sub(matched);
    if dropped > 0 {
        debug!(
            "merge dropped {} incoming-only rows out of {}",
            dropped,
            other.n_rows()
        );
    }

    Ok(accumulator)
}

/// Merge an ordered list of fragments left to right
pub fn merge_all(fragments: Vec<Frame>, join_keys: &[String]) -> Result<Frame> {
    let mut accumulator = Frame::new(join_keys.to_vec());
    for fragment in fragments {
        accumulator = merge(accumulator, fragment, join_keys)?;
    }
    Ok(accumulator)
}
