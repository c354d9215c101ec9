//! Column-name composition for flattened category combinations.
//!
//! Naming is a pure function from (axis, label) pairs to a string, kept apart
//! from the pivot control flow so it can be tested on its own. Non-subgroup
//! labels are emitted bare, subgroup axes as `Axis:Label` pairs after them,
//! everything joined with the `" ~ "` separator. Each subgroup axis at the
//! `Total` sentinel collapses out of the name independently of the others.

use crate::constants::{NAME_SEPARATOR, TOTAL_LABEL};

/// Compose a column name from the parts of one category combination.
///
/// `main_parts` are the labels of non-subgroup axes (the metric name among
/// them); `subgroup_parts` are (axis, label) pairs in subgroup declaration
/// order.
pub fn compose_column_name(main_parts: &[String], subgroup_parts: &[(String, String)]) -> String {
    let mut parts: Vec<String> = main_parts.iter().map(|p| p.trim().to_string()).collect();
    parts.extend(
        subgroup_parts
            .iter()
            .map(|(axis, label)| format!("{}:{}", axis.trim(), label.trim())),
    );
    let name = parts.join(NAME_SEPARATOR);
    collapse_total_suffixes(&name, subgroup_parts.iter().map(|(axis, _)| axis.as_str()))
}

/// Strip whitespace and remove every `" ~ <axis>:Total"` fragment for the
/// given subgroup axes.
///
/// Applied as an independent normalization pass: a combination can carry
/// several subgroup axes and each one reduces to `Total` on its own.
pub fn collapse_total_suffixes<'a>(
    name: &str,
    subgroup_axes: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut collapsed = name.trim().to_string();
    for axis in subgroup_axes {
        let suffix = format!("{}{}:{}", NAME_SEPARATOR, axis, TOTAL_LABEL);
        collapsed = collapsed.replace(&suffix, "");
    }
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(a, l)| (a.to_string(), l.to_string()))
            .collect()
    }

    #[test]
    fn test_bare_metric_name() {
        let name = compose_column_name(&["Population".to_string()], &[]);
        assert_eq!(name, "Population");
    }

    #[test]
    fn test_subgroup_qualification() {
        let name = compose_column_name(
            &["Population".to_string()],
            &pairs(&[("Sex", "Males")]),
        );
        assert_eq!(name, "Population ~ Sex:Males");
    }

    #[test]
    fn test_total_collapses_to_metric() {
        let name = compose_column_name(
            &["Population".to_string()],
            &pairs(&[("Sex", "Total")]),
        );
        assert_eq!(name, "Population");
    }

    #[test]
    fn test_each_subgroup_collapses_independently() {
        let name = compose_column_name(
            &["Population".to_string()],
            &pairs(&[("Nationality", "Total"), ("Age", "18-64"), ("Sex", "Total")]),
        );
        assert_eq!(name, "Population ~ Age:18-64");
    }

    #[test]
    fn test_subgroup_only_combination_stays_qualified() {
        let name = compose_column_name(&[], &pairs(&[("Sex", "Males")]));
        assert_eq!(name, "Sex:Males");
    }

    #[test]
    fn test_metric_label_with_embedded_separator() {
        // Labels translated upstream may already carry a composite name
        let name = compose_column_name(
            &["Source:Salary ~ Average per person gross income".to_string()],
            &[],
        );
        assert_eq!(name, "Source:Salary ~ Average per person gross income");
    }

    #[test]
    fn test_whitespace_stripped_before_collapse() {
        let collapsed = collapse_total_suffixes("  Population ~ Sex:Total  ", ["Sex"]);
        assert_eq!(collapsed, "Population");
    }
}
