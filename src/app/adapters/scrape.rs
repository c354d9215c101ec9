//! Link discovery for the ingestion layer.
//!
//! The INE catalogue pages link each exportable sub-table; the ingestion
//! layer walks those pages to enumerate table identifiers. The reshaping core
//! never calls this module.

use crate::error::{HarmonizerError, Result};
use regex::Regex;

/// Extract, in document order, every anchor `href` whose value matches the
/// given pattern.
pub fn links_matching(pattern: &str, html: &str) -> Result<Vec<String>> {
    let wanted = compile(pattern)?;
    let anchor = Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["']"#)
        .expect("static anchor pattern");
    Ok(anchor
        .captures_iter(html)
        .map(|caps| caps[1].to_string())
        .filter(|href| wanted.is_match(href))
        .collect())
}

/// First capture group of the pattern in `text`, if any.
///
/// Used to pull the table identifier out of an export link.
pub fn capture_first(pattern: &str, text: &str) -> Result<Option<String>> {
    let regex = compile(pattern)?;
    Ok(regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string()))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| HarmonizerError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r##"
        <html><body>
        <a href="/dynt3/inebase/en/index.htm?padre=7132&capsel=7133">Province A</a>
        <a class="export" href="/jaxiT3/Tabla.htm?t=30896&L=1">Export</a>
        <a href="#top">Top</a>
        <A HREF='/jaxiT3/Tabla.htm?t=30831&L=1'>Export</A>
        </body></html>
    "##;

    #[test]
    fn test_links_matching_preserves_document_order() {
        let links = links_matching("t=", HTML).unwrap();
        assert_eq!(
            links,
            vec![
                "/jaxiT3/Tabla.htm?t=30896&L=1",
                "/jaxiT3/Tabla.htm?t=30831&L=1"
            ]
        );
    }

    #[test]
    fn test_links_matching_no_hits() {
        let links = links_matching("missing-pattern", HTML).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_capture_first_table_id() {
        let id = capture_first(r"t=(\w+)&L", "/jaxiT3/Tabla.htm?t=30896&L=1").unwrap();
        assert_eq!(id.as_deref(), Some("30896"));
    }

    #[test]
    fn test_invalid_pattern_errors() {
        assert!(matches!(
            links_matching("(", HTML),
            Err(HarmonizerError::InvalidPattern { .. })
        ));
    }
}
