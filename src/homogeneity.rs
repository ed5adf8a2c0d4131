//! Type-homogeneity analysis.
//!
//! For a column, tallies the runtime kind of each non-missing cell and reports
//! the most frequent kind with its share of *all* rows. Ties go to the kind
//! seen first in row order.

use serde::Serialize;

use crate::{
    data::{ValueKind, percent},
    dataset::TableHandle,
    error::AuditResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TypeShare {
    pub percent: f64,
    pub kind: ValueKind,
}

/// Dominant kind of `column`. `None` when the table has no rows or the column
/// holds no value at all.
pub fn dominant_type(handle: &TableHandle, column: &str) -> AuditResult<Option<TypeShare>> {
    let idx = handle.require_column(column)?;
    let total = handle.table.row_count();
    if total == 0 {
        return Ok(None);
    }
    let mut tally: Vec<(ValueKind, usize)> = Vec::new();
    for value in handle.table.column(idx).flatten() {
        let kind = value.kind();
        match tally.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, count)) => *count += 1,
            None => tally.push((kind, 1)),
        }
    }
    let mut best: Option<(ValueKind, usize)> = None;
    for (kind, count) in tally {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((kind, count));
        }
    }
    Ok(best.map(|(kind, count)| TypeShare {
        percent: percent(count, total, 2),
        kind,
    }))
}

/// [`dominant_type`] for each of `columns` (all when empty), in column order.
pub fn evaluate_types(
    handle: &TableHandle,
    columns: &[String],
) -> AuditResult<Vec<(String, Option<TypeShare>)>> {
    let indices = handle.resolve(columns)?;
    indices
        .into_iter()
        .map(|idx| {
            let name = handle.table.headers()[idx].clone();
            let share = dominant_type(handle, &name)?;
            Ok((name, share))
        })
        .collect()
}
