//! INE Harmonizer Library
//!
//! A Rust library for harmonizing heterogeneous statistical extracts published
//! by the Spanish National Statistics Institute (INE) into consistent
//! wide-format tables keyed by the geographic hierarchy and a time period.
//!
//! This library provides tools for:
//! - Parsing composite location codes into the country/province/municipality/
//!   district/section hierarchy with graceful degradation
//! - Pivoting long-format extracts into wide format with category-qualified
//!   column names
//! - Merging per-sub-dataset fragments on the geographic+period key
//! - Rolling values up the hierarchy with per-dataset sum/mean reducers
//! - Splitting combined tables into per-granularity level subsets
//! - Round-tripping fragments through a tab-separated on-disk format

pub mod config;
pub mod constants;
pub mod error;

// Core application modules
pub mod app {
    pub mod models {
        pub mod frame;
        pub mod geo;
        pub mod record;
        pub mod value;
    }
    pub mod services {
        pub mod aggregate;
        pub mod codes;
        pub mod levels;
        pub mod merge;
        pub mod naming;
        pub mod numeric;
        pub mod pivot;
        pub mod tsv;
    }
    pub mod adapters {
        pub mod cache;
        pub mod scrape;
        pub mod source;
    }
    pub mod translate;
    pub mod datasets {
        pub mod consumer_price_index;
        pub mod household_price_index;
        pub mod population_census;
        pub mod provinces;
        pub mod rental_atlas;
        pub mod rental_price_index;

        mod registry;
        pub use registry::{BuildOptions, Dataset, DatasetKind, SubTableGroup};
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::frame::{Column, Frame};
pub use app::models::geo::{GeoKey, GeoLevel};
pub use app::models::record::{LongRecord, RawTable};
pub use app::models::value::Value;
pub use error::{HarmonizerError, Result};
