//! Hierarchy code parsing.
//!
//! Composite location identifiers are sliced under fixed-width layouts. The
//! census format packs every segment into one string and segments are
//! discovered progressively by probing whether the character at each declared
//! offset is a digit. Malformed input degrades to a coarser key; parse
//! failures never raise.

use crate::app::models::geo::GeoKey;
use crate::app::models::record::RawTable;
use crate::app::models::value::Value;
use crate::app::services::numeric::probe_digit;

/// Slice a segment out of a composite code by character offsets.
///
/// Out-of-range access yields `None` rather than an error; a partially
/// covered range yields whatever characters exist, consistent with slicing
/// a short district composite down to its municipality prefix.
pub fn slice_chars(s: &str, start: usize, end: usize) -> Option<String> {
    if start >= end {
        return None;
    }
    let sliced: String = s.chars().skip(start).take(end - start).collect();
    if sliced.is_empty() {
        None
    } else {
        Some(sliced)
    }
}

/// Slice a segment only when the probe character at `probe_at` is a digit
pub fn probe_segment(s: &str, probe_at: usize, start: usize, end: usize) -> Option<String> {
    if !probe_digit(s, probe_at) {
        return None;
    }
    slice_chars(s, start, end)
}

/// Segment slice as a cell value, `Missing` on any degradation
pub fn segment_value(segment: Option<String>) -> Value {
    match segment {
        Some(code) => Value::Text(code),
        None => Value::Missing,
    }
}

/// Parse a census composite location string progressively.
///
/// Offsets: province probes position 0 (`[0..2]`), municipality position 2
/// (`[0..5]`), district position 5 (`[5..7]`), section position 7 (`[7..10]`).
/// An empty or non-numeric string yields the national key.
pub fn parse_location_code(country: &str, location: &str) -> GeoKey {
    let location = location.trim();
    GeoKey {
        country: Some(country.to_string()),
        province: probe_segment(location, 0, 0, 2),
        municipality: probe_segment(location, 2, 0, 5),
        district: probe_segment(location, 5, 5, 7),
        section: probe_segment(location, 7, 7, 10),
    }
}

/// One coarser-code fallback rule: fill `finer` from `coarser` when absent
#[derive(Debug, Clone, Copy)]
pub struct FallbackRule<'a> {
    pub finer: &'a str,
    pub coarser: &'a str,
}

/// Apply an ordered list of coarser-code fallback rules to a raw table, once.
///
/// Census extracts spread the location over nation/province/municipality/
/// section columns and leave finer cells empty on coarser rows; each rule
/// back-fills a finer column from its coarser neighbour so the finest column
/// ends up carrying the effective location of every row.
pub fn apply_fallback_rules(table: &mut RawTable, rules: &[FallbackRule<'_>]) {
    for rule in rules {
        let Some(finer_idx) = table.column_index(rule.finer) else {
            continue;
        };
        let Some(coarser_idx) = table.column_index(rule.coarser) else {
            continue;
        };
        for row in &mut table.rows {
            let finer_empty = row
                .get(finer_idx)
                .map(|s| s.trim().is_empty())
                .unwrap_or(true);
            if finer_empty {
                let fallback = row.get(coarser_idx).cloned().unwrap_or_default();
                if row.len() <= finer_idx {
                    row.resize(finer_idx + 1, String::new());
                }
                row[finer_idx] = fallback;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_chars() {
        assert_eq!(slice_chars("0100101001", 0, 5), Some("01001".to_string()));
        assert_eq!(slice_chars("0100101001", 5, 7), Some("01".to_string()));
        assert_eq!(slice_chars("01", 5, 7), None);
        assert_eq!(
            slice_chars("01001 Alegría-Dulantzi", 6, usize::MAX),
            Some("Alegría-Dulantzi".to_string())
        );
    }

    #[test]
    fn test_full_section_location() {
        let key = parse_location_code("ES", "0100101001");
        assert_eq!(key.province.as_deref(), Some("01"));
        assert_eq!(key.municipality.as_deref(), Some("01001"));
        assert_eq!(key.district.as_deref(), Some("01"));
        assert_eq!(key.section.as_deref(), Some("001"));
        assert!(key.is_hierarchical());
    }

    #[test]
    fn test_municipality_location_degrades() {
        let key = parse_location_code("ES", "01001");
        assert_eq!(key.municipality.as_deref(), Some("01001"));
        assert_eq!(key.district, None);
        assert_eq!(key.section, None);
    }

    #[test]
    fn test_national_location_is_empty() {
        let key = parse_location_code("ES", "");
        assert_eq!(key.province, None);
        assert_eq!(key.municipality, None);
        let key = parse_location_code("ES", "Total Nacional");
        assert_eq!(key.province, None);
    }

    #[test]
    fn test_non_digit_probe_degrades_without_error() {
        // Digit probe fails at the district offset, coarser segments survive
        let key = parse_location_code("ES", "01001 x");
        assert_eq!(key.municipality.as_deref(), Some("01001"));
        assert_eq!(key.district, None);
    }

    #[test]
    fn test_fallback_rules_fill_in_order() {
        let mut table = RawTable::new(
            vec![
                "Total Nacional".into(),
                "Provincias".into(),
                "Municipios".into(),
                "Secciones".into(),
            ],
            vec![
                vec!["Total Nacional".into(), "".into(), "".into(), "".into()],
                vec![
                    "Total Nacional".into(),
                    "01 Araba/Álava".into(),
                    "".into(),
                    "".into(),
                ],
                vec![
                    "Total Nacional".into(),
                    "01 Araba/Álava".into(),
                    "01001".into(),
                    "0100101001".into(),
                ],
            ],
        );
        let rules = [
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
        apply_fallback_rules(&mut table, &rules);
        // The national row cascades all the way down to the section column
        assert_eq!(table.rows[0][3], "Total Nacional");
        // The province row stops at the province label
        assert_eq!(table.rows[1][3], "01 Araba/Álava");
        // Fully coded rows stay untouched
        assert_eq!(table.rows[2][3], "0100101001");
    }
}
