//! Consumer price index, monthly by consumption class, national only.
//!
//! Class labels are translated through whatever vocabulary the caller
//! supplies; untranslated classes pass through unchanged.

use crate::app::adapters::cache::FragmentCache;
use crate::app::adapters::source::TableSource;
use crate::app::datasets::registry::{fetch_or_empty, BuildOptions, Dataset};
use crate::app::models::frame::Frame;
use crate::app::models::record::{LongRecord, RawTable};
use crate::app::models::value::Value;
use crate::app::services::codes::slice_chars;
use crate::app::services::numeric::parse_decimal_comma;
use crate::app::services::pivot::{pivot, PivotSpec};
use crate::app::services::tsv::KeySpec;
use crate::app::translate::LabelTranslator;
use crate::constants::{geo_columns, level_names, period_columns, COUNTRY_ES};
use crate::error::Result;
use tracing::info;

const DATASET: &str = "consumer-price-index";
const SOURCE_TABLE: &str = "consumer-price-index/23708";
const METRIC: &str = "CPI 2015 base";
const CLASS_AXIS: &str = "Class";

/// Key layout of the cached fragment
pub fn key_spec() -> KeySpec {
    KeySpec::new(
        &[
            geo_columns::COUNTRY_CODE,
            period_columns::YEAR,
            period_columns::MONTH,
        ],
        &[geo_columns::COUNTRY_CODE],
    )
}

/// Build the consumer price index dataset: one national-level table
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
        let frame = reshape(&raw, translator);
        cache.store(DATASET, &frame)?;
        frame
    };

    info!(
        "consumer price index: {} monthly rows, {} columns",
        frame.n_rows(),
        frame.n_columns()
    );
    let mut dataset = Dataset::new();
    dataset.insert(level_names::NATIONAL, frame);
    Ok(dataset)
}

fn reshape(raw: &RawTable, translator: &dyn LabelTranslator) -> Frame {
    let mut records = Vec::new();
    for row in &raw.rows {
        if raw.get(row, "Tipo de dato").map(str::trim) != Some("Índice") {
            continue;
        }
        // Period tokens look like "2021M05": year, month marker, month digits
        let periodo = raw.get_present(row, "Periodo").unwrap_or_default();
        let year = slice_chars(periodo, 0, 4).and_then(|y| y.parse::<i64>().ok());
        let month = slice_chars(periodo, 5, 8).and_then(|m| m.parse::<i64>().ok());
        let class = raw
            .get_present(row, "Clases")
            .map(|label| translator.translate_label(CLASS_AXIS, label))
            .unwrap_or_default();
        let value = raw.get_present(row, "Total").and_then(parse_decimal_comma);

        records.push(
            LongRecord::new()
                .with_key(geo_columns::COUNTRY_CODE, Value::text(COUNTRY_ES))
                .with_key(
                    period_columns::YEAR,
                    year.map(Value::Int).unwrap_or(Value::Missing),
                )
                .with_key(
                    period_columns::MONTH,
                    month.map(Value::Int).unwrap_or(Value::Missing),
                )
                .with_category("Value name", METRIC)
                .with_category(CLASS_AXIS, class)
                .with_value(value),
        );
    }

    let spec = PivotSpec::new(
        &[
            geo_columns::COUNTRY_CODE,
            period_columns::YEAR,
            period_columns::MONTH,
        ],
        "Value",
        &[CLASS_AXIS],
    );
    pivot(records, &spec)
}
