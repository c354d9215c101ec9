//! Population annual census, yearly by census section.
//!
//! Census extracts arrive one group of sub-tables per year. Each sub-table
//! spreads the location over nation/province/municipality/section columns;
//! after the coarser-code fallback fill, the section column carries the
//! effective location of every row and is parsed progressively into the
//! hierarchy. District totals do not exist upstream and are derived by
//! summing section rows.

use crate::app::adapters::cache::FragmentCache;
use crate::app::adapters::source::TableSource;
use crate::app::datasets::registry::{
    fetch_or_empty, group_progress, BuildOptions, Dataset, SubTableGroup,
};
use crate::app::models::frame::Frame;
use crate::app::models::record::{LongRecord, RawTable};
use crate::app::models::value::Value;
use crate::app::services::aggregate::{roll_up, Reducer};
use crate::app::services::codes::{
    apply_fallback_rules, parse_location_code, segment_value, FallbackRule,
};
use crate::app::services::levels::{split_levels, LevelScheme};
use crate::app::services::merge::merge;
use crate::app::services::numeric::parse_grouped_int;
use crate::app::services::pivot::{pivot, PivotSpec};
use crate::app::services::tsv::KeySpec;
use crate::app::translate::LabelTranslator;
use crate::constants::{
    geo_columns, level_names, period_columns, COUNTRY_ES, SUBGROUP_AXES,
};
use crate::error::Result;
use tracing::{info, warn};

const DATASET: &str = "population-annual-census";
const LOCATION: &str = "Location";
const METRIC: &str = "Population";

/// First census campaign; group labels that are not years fall back to this
/// origin plus their position.
const FIRST_CENSUS_YEAR: i64 = 2021;

/// Source-language axis names and their harmonized counterparts
const AXIS_RENAMES: &[(&str, &str)] = &[
    ("Sección censal", "Location"),
    ("Secciones", "Location"),
    ("Sexo", "Sex"),
    ("Lugar de nacimiento (España/extranjero)", "Place of birth"),
    ("Nacionalidad (española/extranjera)", "Nationality"),
    (
        "Relación entre lugar de nacimiento y lugar de residencia",
        "Detailed place of birth",
    ),
    ("Total", "Value"),
    ("Edad (grupos quinquenales)", "Age"),
];

/// Ordered coarser-code fallback rules for the spread location columns
const LOCATION_FALLBACKS: &[FallbackRule<'static>] = &[
    FallbackRule {
        finer: "Provincias",
        coarser: "Total Nacional",
    },
    FallbackRule {
        finer: "Municipios",
        coarser: "Provincias",
    },
    FallbackRule {
        finer: "Secciones",
        coarser: "Municipios",
    },
];

/// Key layout of the cached fragment
pub fn key_spec() -> KeySpec {
    KeySpec::new(
        &[
            geo_columns::COUNTRY_CODE,
            geo_columns::PROVINCE_CODE,
            geo_columns::MUNICIPALITY_CODE,
            geo_columns::DISTRICT_CODE,
            geo_columns::SECTION_CODE,
            period_columns::YEAR,
        ],
        &[
            geo_columns::COUNTRY_CODE,
            geo_columns::PROVINCE_CODE,
            geo_columns::MUNICIPALITY_CODE,
            geo_columns::DISTRICT_CODE,
            geo_columns::SECTION_CODE,
        ],
    )
}

/// Build the census dataset: Municipality, Districts, and Sections levels
pub fn build(
    source: &dyn TableSource,
    cache: &dyn FragmentCache,
    translator: &dyn LabelTranslator,
    groups: &[SubTableGroup],
    opts: &BuildOptions,
) -> Result<Dataset> {
    let combined = if !opts.force_rebuild && cache.exists(DATASET) {
        cache.load(DATASET, &key_spec())?
    } else {
        let combined = assemble(source, translator, groups, opts)?;
        cache.store(DATASET, &combined)?;
        combined
    };

    let outcome = split_levels(&combined, &LevelScheme::geographic()).retain_levels(&[
        level_names::MUNICIPALITY,
        level_names::DISTRICTS,
        level_names::SECTIONS,
    ]);
    info!(
        "population census: {} level tables, {} orphan rows dropped",
        outcome.levels.len(),
        outcome.dropped_rows
    );
    Ok(Dataset::from_levels(outcome.levels))
}

/// Fetch, pivot, and merge every yearly group, then resolve the hierarchy
fn assemble(
    source: &dyn TableSource,
    translator: &dyn LabelTranslator,
    groups: &[SubTableGroup],
    opts: &BuildOptions,
) -> Result<Frame> {
    let bar = group_progress(groups.len(), "census years", opts.show_progress);

    let mut yearly = Vec::new();
    for (position, group) in groups.iter().enumerate() {
        let year = group
            .label
            .parse::<i64>()
            .unwrap_or(FIRST_CENSUS_YEAR + position as i64);

        let mut accumulator = Frame::new(vec![LOCATION.to_string(), period_columns::YEAR.to_string()]);
        for id in &group.table_ids {
            let raw = fetch_or_empty(source, id);
            if raw.is_empty() {
                warn!("census sub-table '{}' contributed no rows", id);
                continue;
            }
            let fragment = year_fragment(raw, translator, year);
            accumulator = merge(
                accumulator,
                fragment,
                &[LOCATION.to_string(), period_columns::YEAR.to_string()],
            )?;
        }
        yearly.push(accumulator);
        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let mut combined = Frame::concat(yearly);
    if combined.n_columns() == 0 {
        combined = Frame::new(vec![LOCATION.to_string(), period_columns::YEAR.to_string()]);
    }
    resolve_hierarchy(&mut combined)?;

    // Derive district totals from the section rows
    let mut combined = roll_up(&combined, geo_columns::SECTION_CODE, Reducer::Sum)?;
    combined.promote_key_columns();
    Ok(combined)
}

/// Pivot one sub-table of one census year into a wide fragment
fn year_fragment(mut raw: RawTable, translator: &dyn LabelTranslator, year: i64) -> Frame {
    if raw.has_columns(&["Total Nacional", "Provincias", "Municipios", "Secciones"]) {
        apply_fallback_rules(&mut raw, LOCATION_FALLBACKS);
        raw.drop_columns(&["Total Nacional", "Provincias", "Municipios"]);
    }
    for (from, to) in AXIS_RENAMES {
        raw.rename_column(from, to);
    }

    let category_axes: Vec<String> = raw
        .headers
        .iter()
        .filter(|h| h.as_str() != LOCATION && h.as_str() != "Value")
        .cloned()
        .collect();

    let mut records = Vec::new();
    for row in &raw.rows {
        let location = raw
            .get_present(row, LOCATION)
            .map(Value::text)
            .unwrap_or(Value::Missing);
        let value = raw.get_present(row, "Value").and_then(parse_grouped_int);

        let mut record = LongRecord::new()
            .with_key(LOCATION, location)
            .with_key(period_columns::YEAR, Value::Int(year))
            .with_category("Value name", METRIC)
            .with_value(value);
        for axis in &category_axes {
            let label = raw.get(row, axis).unwrap_or("").trim();
            let mut label = translator.translate_label(axis, label);
            if axis == "Age" {
                label = age_label(&label);
            }
            record = record.with_category(axis.clone(), label);
        }
        records.push(record);
    }

    let spec = PivotSpec::new(
        &[LOCATION, period_columns::YEAR],
        "Value",
        SUBGROUP_AXES,
    );
    pivot(records, &spec)
}

/// Parse the effective location of every row into the geographic hierarchy
/// and drop the composite column
fn resolve_hierarchy(combined: &mut Frame) -> Result<()> {
    let locations: Vec<Value> = combined
        .column(LOCATION)
        .map(|c| c.values.clone())
        .unwrap_or_else(|| vec![Value::Missing; combined.n_rows()]);

    let mut province = Vec::with_capacity(locations.len());
    let mut municipality = Vec::with_capacity(locations.len());
    let mut district = Vec::with_capacity(locations.len());
    let mut section = Vec::with_capacity(locations.len());
    for location in &locations {
        let key = parse_location_code(COUNTRY_ES, location.as_str().unwrap_or(""));
        province.push(segment_value(key.province));
        municipality.push(segment_value(key.municipality));
        district.push(segment_value(key.district));
        section.push(segment_value(key.section));
    }

    combined.set_constant_column(geo_columns::COUNTRY_CODE, Value::text(COUNTRY_ES));
    combined.set_column(geo_columns::PROVINCE_CODE, province)?;
    combined.set_column(geo_columns::MUNICIPALITY_CODE, municipality)?;
    combined.set_column(geo_columns::DISTRICT_CODE, district)?;
    combined.set_column(geo_columns::SECTION_CODE, section)?;
    combined.drop_column(LOCATION);
    combined.set_key_columns(vec![
        geo_columns::COUNTRY_CODE.to_string(),
        geo_columns::PROVINCE_CODE.to_string(),
        geo_columns::MUNICIPALITY_CODE.to_string(),
        geo_columns::DISTRICT_CODE.to_string(),
        geo_columns::SECTION_CODE.to_string(),
        period_columns::YEAR.to_string(),
    ])
}

/// Normalize an age-band label: `"De 5 a 9 años"` → `"5-9"`,
/// `"De 100 y más años"` → `">99"`
fn age_label(label: &str) -> String {
    label
        .replace("De ", "")
        .replace(" años", "")
        .replace(" a ", "-")
        .replace(" y más", "")
        .replace("100", ">99")
}
