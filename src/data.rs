use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

/// Placeholder literals the source datasets use for "no real value".
pub const DEFAULT_SENTINELS: &[&str] = &["INDEFINIDO", "INDEFINIDA", "SIN DEFINIR", "NC"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// A table cell. `None` is a missing value.
pub type Cell = Option<Value>;

/// Runtime category of a [`Value`], used by type-homogeneity analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Boolean,
    Integer,
    Float,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueKind::Boolean => "bool",
            ValueKind::Integer => "int",
            ValueKind::Float => "float",
            ValueKind::String => "str",
        };
        f.write_str(label)
    }
}

// Floats never hold NaN inside a table (see `normalize_cell`), so bitwise
// equality is a total equivalence.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Boolean(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => canonical_float_bits(*f).hash(state),
            Value::String(s) => s.hash(state),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Equality used when comparing analogous columns of different sources:
    /// strings ignore case, numbers compare by value across integer/float.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => {
                a == b || a.to_lowercase() == b.to_lowercase()
            }
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (left, right) => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Hash key consistent with [`Value::loosely_equals`].
    pub fn match_key(&self) -> MatchKey {
        match self {
            Value::String(s) => MatchKey::Text(s.to_lowercase()),
            Value::Boolean(b) => MatchKey::Boolean(*b),
            Value::Integer(i) => MatchKey::Number(canonical_float_bits(*i as f64)),
            Value::Float(f) => MatchKey::Number(canonical_float_bits(*f)),
        }
    }

    /// Hash key that ignores the integer/float distinction but keeps strings
    /// case-sensitive. Used to look identifiers up across sources.
    pub fn identity_key(&self) -> MatchKey {
        match self {
            Value::String(s) => MatchKey::Text(s.clone()),
            other => other.match_key(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchKey {
    Boolean(bool),
    Number(u64),
    Text(String),
}

fn canonical_float_bits(value: f64) -> u64 {
    if value == 0.0 { 0.0f64.to_bits() } else { value.to_bits() }
}

/// Floating-point NaN is how numeric sources spell "missing"; fold it into `None`.
pub fn normalize_cell(cell: Cell) -> Cell {
    match cell {
        Some(Value::Float(f)) if f.is_nan() => None,
        other => other,
    }
}

/// Caller-supplied literals that are present but carry no usable content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentinelSet {
    values: HashSet<String>,
}

impl SentinelSet {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self::new(DEFAULT_SENTINELS.iter().copied())
    }

    /// Only string cells can be sentinels; the match is exact.
    pub fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.values.contains(s))
    }
}

/// The three mutually exclusive states of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    Missing,
    Sentinel,
    Ordinary,
}

pub fn classify_cell(cell: &Cell, sentinels: &SentinelSet) -> CellClass {
    match cell {
        None => CellClass::Missing,
        Some(value) if sentinels.matches(value) => CellClass::Sentinel,
        Some(_) => CellClass::Ordinary,
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `100 * part / total`, rounded. Callers guarantee `total > 0`.
pub fn percent(part: usize, total: usize, places: i32) -> f64 {
    round_to(100.0 * part as f64 / total as f64, places)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loosely_equals_ignores_case_and_numeric_kind() {
        assert!(Value::from("Capital").loosely_equals(&Value::from("CAPITAL")));
        assert!(Value::Integer(3).loosely_equals(&Value::Float(3.0)));
        assert!(!Value::Integer(3).loosely_equals(&Value::from("3")));
        assert!(!Value::Boolean(true).loosely_equals(&Value::Integer(1)));
    }

    #[test]
    fn match_key_agrees_with_loose_equality() {
        assert_eq!(
            Value::from("Rosario").match_key(),
            Value::from("ROSARIO").match_key()
        );
        assert_eq!(Value::Integer(7).match_key(), Value::Float(7.0).match_key());
        assert_ne!(
            Value::from("Rosario").identity_key(),
            Value::from("ROSARIO").identity_key()
        );
    }

    #[test]
    fn normalize_cell_turns_nan_into_missing() {
        assert_eq!(normalize_cell(Some(Value::Float(f64::NAN))), None);
        assert_eq!(
            normalize_cell(Some(Value::Float(1.5))),
            Some(Value::Float(1.5))
        );
    }

    #[test]
    fn sentinels_only_match_strings_exactly() {
        let sentinels = SentinelSet::standard();
        assert!(sentinels.matches(&Value::from("NC")));
        assert!(!sentinels.matches(&Value::from("nc")));
        assert_eq!(
            classify_cell(&Some(Value::from("SIN DEFINIR")), &sentinels),
            CellClass::Sentinel
        );
        assert_eq!(classify_cell(&None, &sentinels), CellClass::Missing);
        assert_eq!(
            classify_cell(&Some(Value::Integer(0)), &sentinels),
            CellClass::Ordinary
        );
    }

    #[test]
    fn percent_rounds_to_requested_places() {
        assert_eq!(percent(1, 3, 2), 33.33);
        assert_eq!(percent(1, 6, 4), 16.6667);
    }

    #[test]
    fn value_kind_labels_match_runtime_names() {
        assert_eq!(ValueKind::Integer.to_string(), "int");
        assert_eq!(ValueKind::String.to_string(), "str");
    }
}
