//! Label translation.
//!
//! Source extracts carry es-ES axis names and category labels. Translation is
//! a port the core calls before pivoting, so every label that ends up in a
//! composed column name is post-translation. A label with no mapping falls
//! back to itself; translation is never fatal.

use std::collections::HashMap;

/// Maps a source-language label to a target label, identity fallback
pub trait LabelTranslator {
    /// Translate a column (axis) name
    fn translate_axis(&self, axis: &str) -> String {
        axis.to_string()
    }

    /// Translate a cell label within an axis
    fn translate_label(&self, axis: &str, label: &str) -> String {
        let _ = axis;
        label.to_string()
    }
}

/// The identity translation
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl LabelTranslator for IdentityTranslator {}

/// Table-driven translator built from (source, target) pairs
#[derive(Debug, Clone, Default)]
pub struct MapTranslator {
    axes: HashMap<String, String>,
    labels: HashMap<String, HashMap<String, String>>,
}

impl MapTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_axis(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.axes.insert(from.into(), to.into());
        self
    }

    pub fn with_labels(mut self, axis: &str, pairs: &[(&str, &str)]) -> Self {
        let entry = self.labels.entry(axis.to_string()).or_default();
        for (from, to) in pairs {
            entry.insert((*from).to_string(), (*to).to_string());
        }
        self
    }
}

impl LabelTranslator for MapTranslator {
    fn translate_axis(&self, axis: &str) -> String {
        self.axes
            .get(axis)
            .cloned()
            .unwrap_or_else(|| axis.to_string())
    }

    fn translate_label(&self, axis: &str, label: &str) -> String {
        self.labels
            .get(axis)
            .and_then(|m| m.get(label))
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }
}

/// Default vocabulary for the demographic and housing axes.
///
/// Wider vocabularies (the consumer-price class catalogue) stay with the
/// caller; builders work with whatever translator they are given.
pub fn default_translator() -> MapTranslator {
    MapTranslator::new()
        .with_labels(
            "Sex",
            &[
                ("Hombre", "Males"),
                ("Mujer", "Females"),
                ("Ambos sexos", "Total"),
            ],
        )
        .with_labels(
            "Place of birth",
            &[("España", "Spain"), ("Extranjero", "Foreign country")],
        )
        .with_labels(
            "Nationality",
            &[("Española", "Spanish"), ("Extranjera", "Foreign")],
        )
        .with_labels(
            "Detailed place of birth",
            &[
                ("Mismo municipio", "Born in the same municipality"),
                (
                    "Distinto municipio de la misma provincia",
                    "Born in a municipality of the same province",
                ),
                (
                    "Distinta provincia de la misma comunidad",
                    "Born in a municipality of the same autonomous community",
                ),
                (
                    "Distinta comunidad",
                    "Born in a municipality of another autonomous community",
                ),
                ("Nacido en el extranjero", "Born in another country"),
            ],
        )
        .with_labels(
            "Housing market",
            &[
                ("General", "Whole housing market"),
                ("New dwelling", "First-hand housing market"),
                ("Second-hand dwelling", "Second-hand housing market"),
            ],
        )
}
