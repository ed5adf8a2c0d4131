//! Column type inference for ingested CSV data.
//!
//! Every column gets a single [`ColumnType`] decided from all of its non-NA
//! fields: a column whose fields all parse as integers is an integer column,
//! one whose fields parse as numbers is a float column, `true`/`false`
//! columns are boolean and anything else is kept as text. NA tokens (empty
//! fields, `NA`, `NaN`, `null`, ...) become missing cells. Dataset-specific
//! placeholders such as `NC` are *not* NA tokens; they survive as strings so
//! sentinel analysis can see them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{Cell, Value};

const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Integer,
    Float,
    String,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::Boolean => "Boolean",
            ColumnType::Integer => "Integer",
            ColumnType::Float => "Float",
            ColumnType::String => "String",
        };
        f.write_str(label)
    }
}

pub fn is_na_token(raw: &str) -> bool {
    NA_TOKENS.contains(&raw.trim())
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    possible_boolean: bool,
    possible_integer: bool,
    possible_float: bool,
    observed: usize,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            possible_boolean: true,
            possible_integer: true,
            possible_float: true,
            observed: 0,
        }
    }

    fn observe(&mut self, raw: &str) {
        let trimmed = raw.trim();
        self.observed += 1;
        if self.possible_boolean && parse_boolean(trimmed).is_none() {
            self.possible_boolean = false;
        }
        if self.possible_integer && trimmed.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && trimmed.parse::<f64>().is_err() {
            self.possible_float = false;
        }
    }

    fn decide(&self) -> ColumnType {
        if self.observed == 0 {
            ColumnType::String
        } else if self.possible_boolean {
            ColumnType::Boolean
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_float {
            ColumnType::Float
        } else {
            ColumnType::String
        }
    }
}

fn parse_boolean(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Decides one type per column from raw decoded records.
pub fn infer_column_types(column_count: usize, records: &[Vec<String>]) -> Vec<ColumnType> {
    let mut candidates = vec![TypeCandidate::new(); column_count];
    for record in records {
        for (idx, field) in record.iter().enumerate().take(column_count) {
            if is_na_token(field) {
                continue;
            }
            candidates[idx].observe(field);
        }
    }
    candidates.iter().map(TypeCandidate::decide).collect()
}

/// Parses a raw field under an inferred type. Fields that do not fit the type
/// (possible when the type was given rather than inferred) are kept as text.
pub fn parse_cell(raw: &str, ty: ColumnType) -> Cell {
    if is_na_token(raw) {
        return None;
    }
    let trimmed = raw.trim();
    let parsed = match ty {
        ColumnType::Boolean => parse_boolean(trimmed).map(Value::Boolean),
        ColumnType::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
        ColumnType::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| !f.is_nan())
            .map(Value::Float),
        ColumnType::String => None,
    };
    Some(parsed.unwrap_or_else(|| Value::String(raw.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn infers_narrowest_type_ignoring_na_tokens() {
        let rows = records(&[
            &["1", "1.5", "true", "NC", ""],
            &["", "2", "False", "x", "NA"],
            &["3", "NaN", "true", "7", "null"],
        ]);
        let types = infer_column_types(5, &rows);
        assert_eq!(
            types,
            vec![
                ColumnType::Integer,
                ColumnType::Float,
                ColumnType::Boolean,
                ColumnType::String,
                ColumnType::String,
            ]
        );
    }

    #[test]
    fn parse_cell_maps_na_tokens_to_missing() {
        assert_eq!(parse_cell("", ColumnType::Integer), None);
        assert_eq!(parse_cell("NaN", ColumnType::Float), None);
        assert_eq!(parse_cell("null", ColumnType::String), None);
        assert_eq!(
            parse_cell("NC", ColumnType::String),
            Some(Value::String("NC".to_string()))
        );
    }

    #[test]
    fn parse_cell_keeps_unparseable_fields_as_text() {
        assert_eq!(parse_cell("42", ColumnType::Integer), Some(Value::Integer(42)));
        assert_eq!(
            parse_cell("forty", ColumnType::Integer),
            Some(Value::String("forty".to_string()))
        );
    }
}
