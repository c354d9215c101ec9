//! Housing price index, quarterly by autonomous community, spread over
//! provinces.
//!
//! The source series is only published per autonomous community. After
//! pivoting, the community ↔ province relation is outer-joined in so every
//! province row carries its community's index values.

use crate::app::adapters::cache::FragmentCache;
use crate::app::adapters::source::TableSource;
use crate::app::datasets::provinces::{self, community_province_relation};
use crate::app::datasets::registry::{fetch_or_empty, BuildOptions, Dataset};
use crate::app::models::frame::Frame;
use crate::app::models::record::{LongRecord, RawTable};
use crate::app::models::value::{KeyToken, Value};
use crate::app::services::codes::slice_chars;
use crate::app::services::numeric::parse_decimal_comma;
use crate::app::services::pivot::{pivot, PivotSpec};
use crate::app::services::tsv::KeySpec;
use crate::app::translate::LabelTranslator;
use crate::constants::{level_names, period_columns};
use crate::error::Result;
use std::collections::HashMap;
use tracing::info;

const DATASET: &str = "household-price-index";
const SOURCE_TABLE: &str = "household-price-index/25171";
const MARKET_AXIS: &str = "Housing market";

/// Key layout of the cached fragment
pub fn key_spec() -> KeySpec {
    KeySpec::new(
        &[
            provinces::columns::COMMUNITY_CODE,
            provinces::columns::PROVINCE_CODE,
            period_columns::YEAR,
            period_columns::QUARTER,
        ],
        &[
            provinces::columns::COMMUNITY_CODE,
            provinces::columns::PROVINCE_CODE,
        ],
    )
}

/// Build the housing price index dataset: one province-level table
pub fn build(
    source: &dyn TableSource,
    cache: &dyn FragmentCache,
    translator: &dyn LabelTranslator,
    opts: &BuildOptions,
) -> Result<Dataset> {
    let frame = if !opts.force_rebuild && cache.exists(DATASET) {
        cache.load(DATASET, &key_spec())?
    } else {
        let raw = fetch_or_empty(source, SOURCE_TABLE);
        let index = reshape(&raw, translator);
        let frame = spread_over_provinces(&community_province_relation(), &index)?;
        cache.store(DATASET, &frame)?;
        frame
    };

    info!(
        "housing price index: {} province rows, {} columns",
        frame.n_rows(),
        frame.n_columns()
    );
    let mut dataset = Dataset::new();
    dataset.insert(level_names::PROVINCE, frame);
    Ok(dataset)
}

fn reshape(raw: &RawTable, translator: &dyn LabelTranslator) -> Frame {
    let mut records = Vec::new();
    for row in &raw.rows {
        if raw.get(row, "Indices and rates").map(str::trim) != Some("Index") {
            continue;
        }
        // Period tokens look like "2021QIII": year then quarter numeral
        let periodo = raw.get_present(row, "Periodo").unwrap_or_default();
        let year = slice_chars(periodo, 0, 4).and_then(|y| y.parse::<i64>().ok());
        let quarter = match periodo.get(4..) {
            Some("QI") => Some(1),
            Some("QII") => Some(2),
            Some("QIII") => Some(3),
            Some("QIV") => Some(4),
            _ => None,
        };
        let community = raw
            .get_present(row, "Autonomous Communities and Cities")
            .and_then(|c| slice_chars(c, 0, 2));
        let market = raw
            .get_present(row, "Index type")
            .map(|label| translator.translate_label(MARKET_AXIS, label))
            .unwrap_or_default();
        let value = raw.get_present(row, "Total").and_then(parse_decimal_comma);

        records.push(
            LongRecord::new()
                .with_key(
                    period_columns::YEAR,
                    year.map(Value::Int).unwrap_or(Value::Missing),
                )
                .with_key(
                    period_columns::QUARTER,
                    quarter.map(Value::Int).unwrap_or(Value::Missing),
                )
                .with_key(
                    provinces::columns::COMMUNITY_CODE,
                    community.map(Value::Text).unwrap_or(Value::Missing),
                )
                .with_category(MARKET_AXIS, market)
                .with_value(value),
        );
    }

    let spec = PivotSpec::new(
        &[
            period_columns::YEAR,
            period_columns::QUARTER,
            provinces::columns::COMMUNITY_CODE,
        ],
        "Value",
        &[MARKET_AXIS],
    );
    pivot(records, &spec)
}

/// Outer join of the province relation with the community-level index.
///
/// Every province row repeats per (year, quarter) of its community; provinces
/// whose community has no index rows survive with missing values, and index
/// rows for an unknown community survive without province fields.
fn spread_over_provinces(relation: &Frame, index: &Frame) -> Result<Frame> {
    let mut combined = Frame::new(vec![
        provinces::columns::COMMUNITY_CODE.to_string(),
        provinces::columns::PROVINCE_CODE.to_string(),
        period_columns::YEAR.to_string(),
        period_columns::QUARTER.to_string(),
    ]);
    combined.ensure_column(provinces::columns::COMMUNITY_NAME);
    combined.ensure_column(provinces::columns::PROVINCE_NAME);
    let value_columns: Vec<String> = index
        .column_names()
        .iter()
        .filter(|name| !index.is_key_column(name))
        .map(|name| name.to_string())
        .collect();
    for name in &value_columns {
        combined.ensure_column(name);
    }

    let mut index_rows: HashMap<KeyToken, Vec<usize>> = HashMap::new();
    for row in 0..index.n_rows() {
        let token = index.cell(provinces::columns::COMMUNITY_CODE, row).key_token();
        index_rows.entry(token).or_default().push(row);
    }

    let mut matched_communities: Vec<KeyToken> = Vec::new();
    for province_row in 0..relation.n_rows() {
        let community = relation.cell(provinces::columns::COMMUNITY_CODE, province_row);
        let token = community.key_token();
        let hits = index_rows.get(&token);
        if hits.is_some() && !matched_communities.contains(&token) {
            matched_communities.push(token.clone());
        }
        let base = vec![
            community.clone(),
            relation.cell(provinces::columns::PROVINCE_CODE, province_row).clone(),
        ];
        match hits {
            Some(rows) => {
                for &index_row in rows {
                    let mut cells = base.clone();
                    cells.push(index.cell(period_columns::YEAR, index_row).clone());
                    cells.push(index.cell(period_columns::QUARTER, index_row).clone());
                    cells.push(
                        relation
                            .cell(provinces::columns::COMMUNITY_NAME, province_row)
                            .clone(),
                    );
                    cells.push(
                        relation
                            .cell(provinces::columns::PROVINCE_NAME, province_row)
                            .clone(),
                    );
                    for name in &value_columns {
                        cells.push(index.cell(name, index_row).clone());
                    }
                    combined.push_row(cells)?;
                }
            }
            None => {
                let mut cells = base.clone();
                cells.push(Value::Missing);
                cells.push(Value::Missing);
                cells.push(
                    relation
                        .cell(provinces::columns::COMMUNITY_NAME, province_row)
                        .clone(),
                );
                cells.push(
                    relation
                        .cell(provinces::columns::PROVINCE_NAME, province_row)
                        .clone(),
                );
                for _ in &value_columns {
                    cells.push(Value::Missing);
                }
                combined.push_row(cells)?;
            }
        }
    }

    // Outer half: index rows whose community is not in the relation
    for row in 0..index.n_rows() {
        let token = index.cell(provinces::columns::COMMUNITY_CODE, row).key_token();
        if matched_communities.contains(&token) {
            continue;
        }
        let mut cells = vec![
            index.cell(provinces::columns::COMMUNITY_CODE, row).clone(),
            Value::Missing,
            index.cell(period_columns::YEAR, row).clone(),
            index.cell(period_columns::QUARTER, row).clone(),
            Value::Missing,
            Value::Missing,
        ];
        for name in &value_columns {
            cells.push(index.cell(name, row).clone());
        }
        combined.push_row(cells)?;
    }

    Ok(combined)
}
