//! Functional-dependency exploration.
//!
//! Column `c` is a candidate dependent of a column set `X` when adding `c` to
//! `X` does not increase the number of distinct tuples, i.e. every `X` value in
//! the data determines a single `c` value.

use log::{debug, info};

use crate::{
    dataset::TableHandle,
    error::{AuditError, AuditResult},
    select,
};

/// Whether `column` adds no distinct tuple to `columns`.
pub fn column_preserves_uniqueness(
    handle: &TableHandle,
    columns: &[String],
    column: &str,
) -> AuditResult<bool> {
    if columns.is_empty() {
        return Err(AuditError::InputContractViolation {
            operation: "column_preserves_uniqueness",
            reason: "the determining column set is empty".to_string(),
        });
    }
    handle.require_column(column)?;
    let base = select::unique_count(handle, columns)?;
    let mut extended = columns.to_vec();
    extended.push(column.to_string());
    let widened = select::unique_count(handle, &extended)?;
    debug!(
        "{:?} -> {} distinct, with '{}' -> {}",
        columns, base, column, widened
    );
    Ok(widened == base)
}

/// Every column outside `columns` that the data shows as determined by them.
pub fn candidate_dependencies(handle: &TableHandle, columns: &[String]) -> AuditResult<Vec<String>> {
    handle.resolve(columns)?;
    let mut dependents = Vec::new();
    for header in handle.table.headers() {
        if columns.contains(header) {
            continue;
        }
        if column_preserves_uniqueness(handle, columns, header)? {
            info!(
                "'{}' of '{}' depends functionally on {:?}",
                header, handle.name, columns
            );
            dependents.push(header.clone());
        }
    }
    Ok(dependents)
}
