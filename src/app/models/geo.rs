//! The normalized geographic hierarchy.
//!
//! INE publishes extracts keyed by composite location codes at five
//! granularities. A [`GeoKey`] holds the typed segments; presence respects the
//! hierarchy prefix rule: a segment can only be present when every coarser
//! segment is present too.

use crate::app::models::value::Value;
use crate::constants::{geo_columns, level_names};
use serde::{Deserialize, Serialize};

/// A granularity tier of the geographic hierarchy, coarse to fine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoLevel {
    National,
    Province,
    Municipality,
    District,
    Section,
}

impl GeoLevel {
    /// All levels ordered coarse to fine
    pub fn all() -> &'static [GeoLevel] {
        &[
            GeoLevel::National,
            GeoLevel::Province,
            GeoLevel::Municipality,
            GeoLevel::District,
            GeoLevel::Section,
        ]
    }

    /// Name of this level in returned dataset maps
    pub fn name(&self) -> &'static str {
        match self {
            GeoLevel::National => level_names::NATIONAL,
            GeoLevel::Province => level_names::PROVINCE,
            GeoLevel::Municipality => level_names::MUNICIPALITY,
            GeoLevel::District => level_names::DISTRICTS,
            GeoLevel::Section => level_names::SECTIONS,
        }
    }

    /// Column marking this level in a combined fragment
    pub fn marker_column(&self) -> &'static str {
        match self {
            GeoLevel::National => geo_columns::COUNTRY_CODE,
            GeoLevel::Province => geo_columns::PROVINCE_CODE,
            GeoLevel::Municipality => geo_columns::MUNICIPALITY_CODE,
            GeoLevel::District => geo_columns::DISTRICT_CODE,
            GeoLevel::Section => geo_columns::SECTION_CODE,
        }
    }
}

/// An ordered tuple of optional administrative-code segments.
///
/// Absence is the missing marker, never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoKey {
    pub country: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub district: Option<String>,
    pub section: Option<String>,
}

impl GeoKey {
    /// Segments ordered coarse to fine
    fn segments(&self) -> [&Option<String>; 5] {
        [
            &self.country,
            &self.province,
            &self.municipality,
            &self.district,
            &self.section,
        ]
    }

    /// True when present segments form a prefix of the hierarchy
    pub fn is_hierarchical(&self) -> bool {
        let mut seen_absent = false;
        for segment in self.segments() {
            match segment {
                Some(_) if seen_absent => return false,
                Some(_) => {}
                None => seen_absent = true,
            }
        }
        true
    }

    /// Deepest level this key addresses, `None` for an orphaned key
    pub fn level(&self) -> Option<GeoLevel> {
        if !self.is_hierarchical() {
            return None;
        }
        let depth = self.segments().iter().filter(|s| s.is_some()).count();
        match depth {
            0 => None,
            n => Some(GeoLevel::all()[n - 1]),
        }
    }

    /// The key as (column name, cell value) pairs, coarse to fine
    pub fn fields(&self) -> Vec<(&'static str, Value)> {
        fn cell(segment: &Option<String>) -> Value {
            match segment {
                Some(code) => Value::Text(code.clone()),
                None => Value::Missing,
            }
        }
        vec![
            (geo_columns::COUNTRY_CODE, cell(&self.country)),
            (geo_columns::PROVINCE_CODE, cell(&self.province)),
            (geo_columns::MUNICIPALITY_CODE, cell(&self.municipality)),
            (geo_columns::DISTRICT_CODE, cell(&self.district)),
            (geo_columns::SECTION_CODE, cell(&self.section)),
        ]
    }
}
