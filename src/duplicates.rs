//! Duplicate row analysis and removal.
//!
//! A row is *surplus* when it equals an earlier row under the chosen columns;
//! the first occurrence is always kept. Missing cells compare equal to each
//! other for this purpose.

use log::{debug, info, warn};

use crate::{
    data::percent,
    dataset::TableHandle,
    error::AuditResult,
};

/// Percentage of surplus rows under `columns` (all when empty), rounded to two
/// decimals.
pub fn duplicate_ratio(handle: &TableHandle, columns: &[String]) -> AuditResult<f64> {
    let total = handle.require_rows()?;
    let indices = handle.resolve(columns)?;
    let surplus = handle.table.surplus_positions(&indices).len();
    let ratio = percent(surplus, total, 2);
    debug!(
        "{} surplus row(s) out of {} in '{}' ({}%)",
        surplus, total, handle.name, ratio
    );
    Ok(ratio)
}

/// Keeps only first occurrences under `columns` (all when empty). Returns the
/// number of rows removed.
pub fn remove_duplicates(handle: &mut TableHandle, columns: &[String]) -> AuditResult<usize> {
    let indices = handle.resolve(columns)?;
    let surplus = handle.table.surplus_positions(&indices);
    if surplus.is_empty() {
        return Ok(0);
    }
    let mut next = surplus.iter().peekable();
    handle.table.retain_rows(|pos, _| {
        if next.peek() == Some(&&pos) {
            next.next();
            false
        } else {
            true
        }
    });
    info!("Removed {} duplicate row(s) from '{}'", surplus.len(), handle.name);
    Ok(surplus.len())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DedupeOutcome {
    pub table: String,
    pub ratio_before: f64,
    pub removed: usize,
}

/// Removes full-row duplicates from every handle that has any, then checks
/// that none remain. Empty tables are skipped.
pub fn dedupe_all(handles: &mut [TableHandle]) -> AuditResult<Vec<DedupeOutcome>> {
    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles.iter_mut() {
        if handle.table.is_empty() {
            warn!("Skipping empty table '{}'", handle.name);
            continue;
        }
        let ratio_before = duplicate_ratio(handle, &[])?;
        let removed = if ratio_before > 0.0 {
            remove_duplicates(handle, &[])?
        } else {
            0
        };
        outcomes.push(DedupeOutcome {
            table: handle.name.clone(),
            ratio_before,
            removed,
        });
    }
    let clean = handles
        .iter()
        .filter(|h| !h.table.is_empty())
        .all(|h| h.table.surplus_positions(&all_columns(h)).is_empty());
    if clean {
        info!("No table has duplicate rows");
    } else {
        warn!("Duplicate rows remain after correction");
    }
    Ok(outcomes)
}

fn all_columns(handle: &TableHandle) -> Vec<usize> {
    (0..handle.table.column_count()).collect()
}
