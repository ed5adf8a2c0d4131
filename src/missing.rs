use log::debug;

use crate::{
    data::{CellClass, SentinelSet, classify_cell, percent},
    dataset::TableHandle,
    error::AuditResult,
};

/// Percentage of rows with at least one missing cell among `columns` (all when
/// empty).
pub fn null_ratio_any(handle: &TableHandle, columns: &[String]) -> AuditResult<f64> {
    let total = handle.require_rows()?;
    let indices = handle.resolve(columns)?;
    let count = handle
        .table
        .rows()
        .iter()
        .filter(|row| indices.iter().any(|idx| row[*idx].is_none()))
        .count();
    Ok(percent(count, total, 2))
}

/// Percentage of rows where every cell among `columns` (all when empty) is
/// missing.
pub fn null_ratio_all(handle: &TableHandle, columns: &[String]) -> AuditResult<f64> {
    let total = handle.require_rows()?;
    let indices = handle.resolve(columns)?;
    let count = handle
        .table
        .rows()
        .iter()
        .filter(|row| indices.iter().all(|idx| row[*idx].is_none()))
        .count();
    Ok(percent(count, total, 2))
}

/// Percentage of all rows whose `column` holds a sentinel. Missing cells count
/// in the denominator only.
pub fn undefined_ratio(
    handle: &TableHandle,
    column: &str,
    sentinels: &SentinelSet,
) -> AuditResult<f64> {
    let total = handle.require_rows()?;
    let idx = handle.require_column(column)?;
    let count = handle
        .table
        .column(idx)
        .filter(|cell| classify_cell(cell, sentinels) == CellClass::Sentinel)
        .count();
    let ratio = percent(count, total, 2);
    debug!(
        "Column '{}' of '{}': {} sentinel value(s), {}%",
        column, handle.name, count, ratio
    );
    Ok(ratio)
}
