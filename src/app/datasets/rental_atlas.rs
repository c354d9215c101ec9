//! Rental distribution atlas: income and household indicators, yearly down
//! to census section.
//!
//! The atlas arrives as one group of sub-tables per province. Sub-tables
//! share the municipality/district/section key columns and contribute
//! disjoint indicator columns, so each province's fragments merge on the key
//! and the provinces concatenate afterwards.

use crate::app::adapters::cache::FragmentCache;
use crate::app::adapters::source::TableSource;
use crate::app::datasets::registry::{
    fetch_or_empty, group_progress, BuildOptions, Dataset, SubTableGroup,
};
use crate::app::models::frame::Frame;
use crate::app::models::record::{LongRecord, RawTable};
use crate::app::models::value::Value;
use crate::app::services::codes::{probe_segment, slice_chars};
use crate::app::services::levels::{split_levels, LevelScheme};
use crate::app::services::merge::merge;
use crate::app::services::numeric::parse_decimal_comma;
use crate::app::services::pivot::{pivot, PivotSpec};
use crate::app::services::tsv::KeySpec;
use crate::app::translate::LabelTranslator;
use crate::constants::{geo_columns, level_names, period_columns, COUNTRY_ES};
use crate::error::Result;
use tracing::{info, warn};

const DATASET: &str = "rental-distribution-atlas";

/// Key axes of every atlas sub-table pivot
const KEY_AXES: &[&str] = &[
    geo_columns::MUNICIPALITY_NAME,
    geo_columns::MUNICIPALITY_CODE,
    geo_columns::DISTRICT_CODE,
    geo_columns::SECTION_CODE,
    period_columns::YEAR,
];

/// Subgroup axes the atlas breaks its indicators down by
const ATLAS_SUBGROUPS: &[&str] = &["Nationality", "Age", "Sex"];

/// Indicator labels the source serves in Spanish regardless of the export
/// language; income-source labels pre-compose their qualified column name.
const INDICATOR_FIXUPS: &[(&str, &str)] = &[
    ("Tamaño medio del hogar", "Average size of households"),
    (
        "Fuente de ingreso: otras prestaciones",
        "Source:Other benefits ~ Average per person gross income",
    ),
    (
        "Fuente de ingreso: otros ingresos",
        "Source:Other incomes ~ Average per person gross income",
    ),
    (
        "Fuente de ingreso: pensiones",
        "Source:Pension ~ Average per person gross income",
    ),
    (
        "Fuente de ingreso: prestaciones por desempleo",
        "Source:Unemployment benefits ~ Average per person gross income",
    ),
    (
        "Fuente de ingreso: salario",
        "Source:Salary ~ Average per person gross income",
    ),
    (
        "Porcentaje de hogares unipersonales",
        "Percentage of single-person households",
    ),
];

/// Age-range labels as the atlas export spells them
const AGE_RANGE_FIXUPS: &[(&str, &str)] = &[
    ("From 18 to 64 years old", "18-64"),
    ("65 and over", ">64"),
    ("Less than 18 years", "<18"),
];

/// Key layout of the cached fragment
pub fn key_spec() -> KeySpec {
    KeySpec::new(
        KEY_AXES,
        &[
            geo_columns::MUNICIPALITY_NAME,
            geo_columns::MUNICIPALITY_CODE,
            geo_columns::DISTRICT_CODE,
            geo_columns::SECTION_CODE,
        ],
    )
}

/// Build the atlas dataset: Municipality, Districts, and Sections levels
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

    let mut combined = combined;
    if let Some(filter) = &opts.municipality_filter {
        combined.retain_rows_where(geo_columns::MUNICIPALITY_CODE, |code| {
            code.as_str()
                .map(|c| filter.iter().any(|f| f == c))
                .unwrap_or(false)
        });
    }

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
        geo_columns::MUNICIPALITY_NAME.to_string(),
        geo_columns::MUNICIPALITY_CODE.to_string(),
        geo_columns::DISTRICT_CODE.to_string(),
        geo_columns::SECTION_CODE.to_string(),
        period_columns::YEAR.to_string(),
    ])?;

    let outcome = split_levels(&combined, &LevelScheme::geographic()).retain_levels(&[
        level_names::MUNICIPALITY,
        level_names::DISTRICTS,
        level_names::SECTIONS,
    ]);
    info!(
        "rental atlas: {} level tables, {} orphan rows dropped",
        outcome.levels.len(),
        outcome.dropped_rows
    );
    Ok(Dataset::from_levels(outcome.levels))
}

/// Fetch and pivot every sub-table, merging per province and concatenating
/// the provinces
fn assemble(
    source: &dyn TableSource,
    translator: &dyn LabelTranslator,
    groups: &[SubTableGroup],
    opts: &BuildOptions,
) -> Result<Frame> {
    let bar = group_progress(groups.len(), "atlas provinces", opts.show_progress);

    let key_axes: Vec<String> = KEY_AXES.iter().map(|s| s.to_string()).collect();
    let mut provinces = Vec::new();
    for group in groups {
        let mut accumulator = Frame::new(key_axes.clone());
        for id in &group.table_ids {
            let raw = fetch_or_empty(source, id);
            if raw.is_empty() {
                warn!("atlas sub-table '{}' contributed no rows", id);
                continue;
            }
            let fragment = atlas_fragment(raw, translator);
            accumulator = merge(accumulator, fragment, &key_axes)?;
        }
        provinces.push(accumulator);
        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let mut combined = Frame::concat(provinces);
    if combined.n_columns() == 0 {
        combined = Frame::new(key_axes);
    }
    Ok(combined)
}

/// Pivot one atlas sub-table into a wide fragment
fn atlas_fragment(mut raw: RawTable, translator: &dyn LabelTranslator) -> Frame {
    raw.rename_column("Age ranges", "Age");

    let reserved = ["Municipalities", "Distritos", "Secciones", "Periodo", "Total"];
    let category_axes: Vec<String> = raw
        .headers
        .iter()
        .filter(|h| !reserved.contains(&h.as_str()))
        .cloned()
        .collect();

    let mut records = Vec::new();
    for row in &raw.rows {
        let municipalities = raw.get_present(row, "Municipalities").unwrap_or_default();
        let districts = raw.get_present(row, "Distritos").unwrap_or_default();
        let sections = raw.get_present(row, "Secciones").unwrap_or_default();
        let year = raw
            .get_present(row, "Periodo")
            .and_then(|p| p.parse::<i64>().ok());
        let value = raw.get_present(row, "Total").and_then(parse_decimal_comma);

        let mut record = LongRecord::new()
            .with_key(
                geo_columns::MUNICIPALITY_NAME,
                slice_chars(municipalities, 6, usize::MAX)
                    .map(Value::Text)
                    .unwrap_or(Value::Missing),
            )
            .with_key(
                geo_columns::MUNICIPALITY_CODE,
                probe_segment(municipalities, 0, 0, 5)
                    .map(Value::Text)
                    .unwrap_or(Value::Missing),
            )
            .with_key(
                geo_columns::DISTRICT_CODE,
                probe_segment(districts, 5, 5, 7)
                    .map(Value::Text)
                    .unwrap_or(Value::Missing),
            )
            .with_key(
                geo_columns::SECTION_CODE,
                probe_segment(sections, 7, 7, 10)
                    .map(Value::Text)
                    .unwrap_or(Value::Missing),
            )
            .with_key(
                period_columns::YEAR,
                year.map(Value::Int).unwrap_or(Value::Missing),
            )
            .with_value(value);

        for axis in &category_axes {
            let label = raw.get(row, axis).unwrap_or("").trim();
            let label = translator.translate_label(axis, label);
            let label = fixup(&label, INDICATOR_FIXUPS);
            let label = if axis == "Age" {
                fixup(&label, AGE_RANGE_FIXUPS)
            } else {
                label
            };
            record = record.with_category(axis.clone(), label);
        }
        records.push(record);
    }

    let spec = PivotSpec::new(KEY_AXES, "Value", ATLAS_SUBGROUPS);
    pivot(records, &spec)
}

fn fixup(label: &str, table: &[(&str, &str)]) -> String {
    table
        .iter()
        .find(|(from, _)| *from == label)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adapters::cache::MemoryCache;
    use crate::app::adapters::source::FixtureSource;
    use crate::app::translate::default_translator;

    fn income_table() -> RawTable {
        RawTable::from_str_rows(
            &[
                "Municipalities",
                "Distritos",
                "Secciones",
                "Indicadores de renta media",
                "Periodo",
                "Total",
            ],
            &[
                &[
                    "01001 Alegría-Dulantzi",
                    "",
                    "",
                    "Fuente de ingreso: salario",
                    "2020",
                    "12.339,5",
                ],
                &[
                    "01001 Alegría-Dulantzi",
                    "0100101",
                    "",
                    "Fuente de ingreso: salario",
                    "2020",
                    "12.100",
                ],
                &[
                    "01001 Alegría-Dulantzi",
                    "0100101",
                    "0100101001",
                    "Fuente de ingreso: salario",
                    "2020",
                    "11.900,25",
                ],
            ],
        )
    }

    fn demographic_table() -> RawTable {
        RawTable::from_str_rows(
            &[
                "Municipalities",
                "Distritos",
                "Secciones",
                "Indicadores demográficos",
                "Age ranges",
                "Periodo",
                "Total",
            ],
            &[
                &[
                    "01001 Alegría-Dulantzi",
                    "",
                    "",
                    "Población",
                    "From 18 to 64 years old",
                    "2020",
                    "1.800",
                ],
                &[
                    "01001 Alegría-Dulantzi",
                    "",
                    "",
                    "Población",
                    "Total",
                    "2020",
                    "2.900",
                ],
            ],
        )
    }

    fn atlas_groups() -> Vec<SubTableGroup> {
        vec![SubTableGroup {
            label: "01".into(),
            table_ids: vec![
                "rental-distribution-atlas/01/30896".into(),
                "rental-distribution-atlas/01/30897".into(),
            ],
        }]
    }

    fn atlas_source() -> FixtureSource {
        FixtureSource::new()
            .with_table("rental-distribution-atlas/01/30896", income_table())
            .with_table("rental-distribution-atlas/01/30897", demographic_table())
    }

    #[test]
    fn test_levels_and_composite_columns() {
        let cache = MemoryCache::new();
        let dataset = build(
            &atlas_source(),
            &cache,
            &default_translator(),
            &atlas_groups(),
            &BuildOptions::new(),
        )
        .unwrap();

        let municipality = dataset.level(level_names::MUNICIPALITY).unwrap();
        assert_eq!(municipality.n_rows(), 1);
        assert_eq!(
            municipality.cell("Source:Salary ~ Average per person gross income", 0),
            &Value::Number(12339.5)
        );
        // The demographic fragment merged onto the same municipality row
        assert_eq!(municipality.cell("Población", 0), &Value::Number(2900.0));
        assert_eq!(
            municipality.cell("Población ~ Age:18-64", 0),
            &Value::Number(1800.0)
        );

        let districts = dataset.level(level_names::DISTRICTS).unwrap();
        assert_eq!(districts.n_rows(), 1);
        assert_eq!(districts.cell(geo_columns::DISTRICT_CODE, 0), &Value::text("01"));

        let sections = dataset.level(level_names::SECTIONS).unwrap();
        assert_eq!(sections.n_rows(), 1);
        assert_eq!(sections.cell(geo_columns::SECTION_CODE, 0), &Value::text("001"));
        assert_eq!(
            sections.cell("Source:Salary ~ Average per person gross income", 0),
            &Value::Number(11900.25)
        );
    }

    #[test]
    fn test_municipality_filter() {
        let cache = MemoryCache::new();
        let opts = BuildOptions::new().with_municipalities(vec!["99999".into()]);
        let dataset = build(
            &atlas_source(),
            &cache,
            &default_translator(),
            &atlas_groups(),
            &opts,
        )
        .unwrap();
        assert!(dataset.level(level_names::MUNICIPALITY).unwrap().is_empty());
    }

    #[test]
    fn test_country_and_province_derived() {
        let cache = MemoryCache::new();
        let dataset = build(
            &atlas_source(),
            &cache,
            &default_translator(),
            &atlas_groups(),
            &BuildOptions::new(),
        )
        .unwrap();
        let municipality = dataset.level(level_names::MUNICIPALITY).unwrap();
        assert_eq!(
            municipality.cell(geo_columns::COUNTRY_CODE, 0),
            &Value::text("ES")
        );
        assert_eq!(
            municipality.cell(geo_columns::PROVINCE_CODE, 0),
            &Value::text("01")
        );
    }

    #[test]
    fn test_failed_sub_table_degrades_to_absent_columns() {
        // Only the income table exists; the demographic columns never appear
        let source =
            FixtureSource::new().with_table("rental-distribution-atlas/01/30896", income_table());
        let cache = MemoryCache::new();
        let dataset = build(
            &source,
            &cache,
            &default_translator(),
            &atlas_groups(),
            &BuildOptions::new(),
        )
        .unwrap();
        let municipality = dataset.level(level_names::MUNICIPALITY).unwrap();
        assert_eq!(municipality.n_rows(), 1);
        assert!(!municipality.has_column("Población"));
    }
}
