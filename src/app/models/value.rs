//! Cell values for harmonized tables.
//!
//! A cell is either missing, text, or numeric. Absence is always the
//! distinguished [`Value::Missing`] marker, never an empty string, so that
//! "not applicable" can be told apart from a zero-valued code.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single cell of a harmonized table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Distinguished missing marker
    Missing,
    /// String-typed cell (codes, names, labels)
    Text(String),
    /// Integer-typed cell (years, quarters, counts)
    Int(i64),
    /// Float-typed cell (indices, averages)
    Number(f64),
}

/// Hashable token for grouping and joining on key tuples.
///
/// Floats are keyed by their bit pattern; two keys group together only if
/// they are bitwise identical, which is what deterministic re-runs produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Missing,
    Text(String),
    Int(i64),
    Bits(u64),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_present(&self) -> bool {
        !self.is_missing()
    }

    /// Numeric view of the cell; text is parsed, non-numeric text is `None`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Missing => None,
            Value::Int(i) => Some(*i as f64),
            Value::Number(n) => {
                if n.is_nan() {
                    None
                } else {
                    Some(*n)
                }
            }
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Token used to group and join rows on this cell
    pub fn key_token(&self) -> KeyToken {
        match self {
            Value::Missing => KeyToken::Missing,
            Value::Text(s) => KeyToken::Text(s.clone()),
            Value::Int(i) => KeyToken::Int(*i),
            Value::Number(n) => KeyToken::Bits(n.to_bits()),
        }
    }

    /// Total ordering for deterministic sorts: present values first (text
    /// before numbers), missing last.
    pub fn compare(&self, other: &Value) -> Ordering {
        use Value::*;
        match (self, other) {
            (Missing, Missing) => Ordering::Equal,
            (Missing, _) => Ordering::Greater,
            (_, Missing) => Ordering::Less,
            (Text(a), Text(b)) => a.cmp(b),
            (Text(_), _) => Ordering::Less,
            (_, Text(_)) => Ordering::Greater,
            (a, b) => {
                let x = a.as_f64().unwrap_or(f64::NEG_INFINITY);
                let y = b.as_f64().unwrap_or(f64::NEG_INFINITY);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        }
    }

    /// Equality modulo numeric dtype: `Int(5)` and `Number(5.0)` compare equal
    pub fn equivalent(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => self == other,
            },
        }
    }

    /// Render the cell for the persisted tab-separated format.
    ///
    /// Missing serializes as the empty field.
    pub fn render(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Text(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Option<f64>> for Value {
    fn from(n: Option<f64>) -> Self {
        match n {
            Some(n) => Value::Number(n),
            None => Value::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sorts_last() {
        let mut values = vec![Value::Missing, Value::Int(3), Value::Int(1)];
        values.sort_by(|a, b| a.compare(b));
        assert_eq!(values, vec![Value::Int(1), Value::Int(3), Value::Missing]);
    }

    #[test]
    fn test_numeric_equivalence() {
        assert!(Value::Int(2021).equivalent(&Value::Number(2021.0)));
        assert!(!Value::Int(2021).equivalent(&Value::Missing));
        assert!(Value::Missing.equivalent(&Value::Missing));
        assert!(Value::text("01001").equivalent(&Value::text("01001")));
    }

    #[test]
    fn test_render_round_trip_shapes() {
        assert_eq!(Value::Missing.render(), "");
        assert_eq!(Value::Int(2021).render(), "2021");
        assert_eq!(Value::Number(104.25).render(), "104.25");
        assert_eq!(Value::text("01001").render(), "01001");
    }

    #[test]
    fn test_as_f64_coercion() {
        assert_eq!(Value::text("12.5").as_f64(), Some(12.5));
        assert_eq!(Value::text("n/a").as_f64(), None);
        assert_eq!(Value::Missing.as_f64(), None);
    }
}
