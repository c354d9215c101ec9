//! Household rental price index, yearly by census district.
//!
//! The source table keys rows by a 8-character district composite
//! (municipality `[0..5]` + district `[5..8]`). Municipality-level figures do
//! not exist upstream; they are derived as the mean of the municipality's
//! district indices.

use crate::app::adapters::cache::FragmentCache;
use crate::app::adapters::source::TableSource;
use crate::app::datasets::registry::{fetch_or_empty, BuildOptions, Dataset};
use crate::app::models::frame::Frame;
use crate::app::models::record::{LongRecord, RawTable};
use crate::app::models::value::Value;
use crate::app::services::aggregate::{roll_up, Reducer};
use crate::app::services::codes::probe_segment;
use crate::app::services::levels::{split_levels, LevelScheme};
use crate::app::services::numeric::parse_decimal_comma;
use crate::app::services::pivot::{pivot, PivotSpec};
use crate::app::services::tsv::KeySpec;
use crate::constants::{geo_columns, level_names, period_columns, COUNTRY_ES};
use crate::error::Result;
use crate::GeoLevel;
use tracing::info;

const DATASET: &str = "household-rental-price-index";
const SOURCE_TABLE: &str = "household-rental-price-index/59061";
const METRIC: &str = "Household rental index";

/// Key layout of the cached fragment
pub fn key_spec() -> KeySpec {
    KeySpec::new(
        &[
            geo_columns::MUNICIPALITY_CODE,
            geo_columns::DISTRICT_CODE,
            period_columns::YEAR,
        ],
        &[geo_columns::MUNICIPALITY_CODE, geo_columns::DISTRICT_CODE],
    )
}

/// Build the rental price index dataset: Municipality and Districts levels
pub fn build(
    source: &dyn TableSource,
    cache: &dyn FragmentCache,
    opts: &BuildOptions,
) -> Result<Dataset> {
    let combined = if !opts.force_rebuild && cache.exists(DATASET) {
        cache.load(DATASET, &key_spec())?
    } else {
        let raw = fetch_or_empty(source, SOURCE_TABLE);
        let combined = reshape(&raw)?;
        cache.store(DATASET, &combined)?;
        combined
    };

    let mut combined = combined;
    combined.set_constant_column(geo_columns::COUNTRY_CODE, Value::text(COUNTRY_ES));
    combined.add_derived_column(
        geo_columns::PROVINCE_CODE,
        geo_columns::MUNICIPALITY_CODE,
        |municipality| match municipality.as_str() {
            Some(code) => probe_segment(code, 0, 0, 2)
                .map(Value::Text)
                .unwrap_or(Value::Missing),
            None => Value::Missing,
        },
    );
    combined.set_key_columns(vec![
        geo_columns::COUNTRY_CODE.to_string(),
        geo_columns::PROVINCE_CODE.to_string(),
        geo_columns::MUNICIPALITY_CODE.to_string(),
        geo_columns::DISTRICT_CODE.to_string(),
        period_columns::YEAR.to_string(),
    ])?;

    let outcome = split_levels(&combined, &LevelScheme::geographic_until(GeoLevel::District))
        .retain_levels(&[level_names::MUNICIPALITY, level_names::DISTRICTS]);
    info!(
        "rental price index: {} level tables, {} orphan rows dropped",
        outcome.levels.len(),
        outcome.dropped_rows
    );
    Ok(Dataset::from_levels(outcome.levels))
}

/// Reshape the raw extract and derive municipality means
fn reshape(raw: &RawTable) -> Result<Frame> {
    let mut records = Vec::new();
    for row in &raw.rows {
        if raw.get(row, "Tipo de dato").map(str::trim) != Some("Índice") {
            continue;
        }
        let composite = raw.get_present(row, "Distritos").unwrap_or_default();
        let municipality = probe_segment(composite, 0, 0, 5);
        let district = probe_segment(composite, 5, 5, 8);
        let year = raw
            .get_present(row, "Periodo")
            .and_then(|p| p.parse::<i64>().ok());
        let value = raw
            .get_present(row, "Total")
            .and_then(parse_decimal_comma);

        records.push(
            LongRecord::new()
                .with_key(
                    geo_columns::MUNICIPALITY_CODE,
                    municipality.map(Value::Text).unwrap_or(Value::Missing),
                )
                .with_key(
                    geo_columns::DISTRICT_CODE,
                    district.map(Value::Text).unwrap_or(Value::Missing),
                )
                .with_key(
                    period_columns::YEAR,
                    year.map(Value::Int).unwrap_or(Value::Missing),
                )
                .with_category("Value name", METRIC)
                .with_value(value),
        );
    }

    let spec = PivotSpec::new(
        &[
            geo_columns::MUNICIPALITY_CODE,
            geo_columns::DISTRICT_CODE,
            period_columns::YEAR,
        ],
        "Value",
        &[],
    );
    let frame = pivot(records, &spec);

    // Municipality level is the mean of the district indices
    roll_up(&frame, geo_columns::DISTRICT_CODE, Reducer::Mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adapters::cache::MemoryCache;
    use crate::app::adapters::source::FixtureSource;

    fn sample_source() -> FixtureSource {
        let table = RawTable::from_str_rows(
            &["Total Nacional", "Distritos", "Tipo de dato", "Periodo", "Total"],
            &[
                &["Total Nacional", "0100101", "Índice", "2021", "7,5"],
                &["Total Nacional", "0100102", "Índice", "2021", "8,5"],
                &["Total Nacional", "0100101", "Variación", "2021", "1,0"],
            ],
        );
        FixtureSource::new().with_table(SOURCE_TABLE, table)
    }

    #[test]
    fn test_build_derives_municipality_mean() {
        let cache = MemoryCache::new();
        let dataset = build(&sample_source(), &cache, &BuildOptions::new()).unwrap();

        let municipality = dataset.level(level_names::MUNICIPALITY).unwrap();
        assert_eq!(municipality.n_rows(), 1);
        assert_eq!(
            municipality.cell(METRIC, 0),
            &Value::Number(8.0)
        );
        assert!(!municipality.has_column(geo_columns::DISTRICT_CODE));

        let districts = dataset.level(level_names::DISTRICTS).unwrap();
        assert_eq!(districts.n_rows(), 2);
        assert_eq!(districts.cell(geo_columns::PROVINCE_CODE, 0), &Value::text("01"));
    }

    #[test]
    fn test_non_index_rows_filtered() {
        let cache = MemoryCache::new();
        let dataset = build(&sample_source(), &cache, &BuildOptions::new()).unwrap();
        let districts = dataset.level(level_names::DISTRICTS).unwrap();
        // The Variación row must not overwrite the index value
        assert_eq!(districts.cell(METRIC, 0), &Value::Number(7.5));
    }

    #[test]
    fn test_cache_hit_short_circuits_source() {
        let cache = MemoryCache::new();
        build(&sample_source(), &cache, &BuildOptions::new()).unwrap();
        // Second run: an empty source must not matter
        let dataset = build(&FixtureSource::new(), &cache, &BuildOptions::new()).unwrap();
        assert_eq!(dataset.level(level_names::DISTRICTS).unwrap().n_rows(), 2);
    }

    #[test]
    fn test_missing_source_yields_empty_levels() {
        let cache = MemoryCache::new();
        let dataset = build(&FixtureSource::new(), &cache, &BuildOptions::new()).unwrap();
        assert!(dataset.level(level_names::MUNICIPALITY).unwrap().is_empty());
    }
}
