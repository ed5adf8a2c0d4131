use log::{debug, warn};

use crate::{
    data::percent,
    dataset::TableHandle,
    error::AuditError,
};

/// Closed interval a numeric column is expected to stay in. No upper bound
/// when `max` is `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: Option<f64>,
}

impl Default for Bounds {
    fn default() -> Self {
        Self { min: 0.0, max: None }
    }
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.is_none_or(|max| value <= max)
    }
}

/// Percentage of numeric cells of `column` outside `[min, max]`, rounded to two
/// decimals.
///
/// Both the count and the denominator cover numeric cells only: text cells
/// (for example sentinels such as `NC` in a numeric column) and missing cells
/// are left out of the denominator, so they neither pass nor fail the check.
///
/// Returns `None`, after logging, when the column is absent or holds no number.
pub fn out_of_range_ratio(
    handle: &TableHandle,
    column: &str,
    min: f64,
    max: Option<f64>,
) -> Option<f64> {
    let Some(idx) = handle.table.column_index(column) else {
        warn!(
            "{}",
            AuditError::InvalidColumn {
                table: handle.name.clone(),
                column: column.to_string(),
            }
        );
        return None;
    };
    let bounds = Bounds { min, max };
    let numbers = handle
        .table
        .column(idx)
        .flatten()
        .filter_map(|value| value.as_f64())
        .collect::<Vec<_>>();
    if numbers.is_empty() {
        warn!(
            "Column '{}' of '{}' has no numeric value to check",
            column, handle.name
        );
        return None;
    }
    let outside = numbers.iter().filter(|v| !bounds.contains(**v)).count();
    let ratio = percent(outside, numbers.len(), 2);
    debug!(
        "{} of {} value(s) of '{}' outside [{}, {}]",
        outside,
        numbers.len(),
        column,
        min,
        max.map_or_else(|| "inf".to_string(), |m| m.to_string())
    );
    Some(ratio)
}
