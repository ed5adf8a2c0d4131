//! Surrogate identifiers.
//!
//! [`assign_ids`] derives an integer key from a set of columns. Rows fall in
//! one of four [`IdBand`]s depending on whether their key tuple holds missing
//! cells, sentinel cells, both or neither; each band numbers from its own
//! base so the bands never overlap in practice.
//!
//! [`reassign_ids`] repairs an existing id column using a label column as the
//! source of truth.

use std::collections::HashMap;

use log::{info, warn};
use serde::Serialize;

use crate::{
    data::{Cell, CellClass, SentinelSet, Value, classify_cell},
    dataset::{Table, TableHandle},
    error::{AuditError, AuditResult},
};

/// Distance between the highest existing id and the first minted one.
pub const REASSIGN_GAP: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdBand {
    /// Missing and sentinel cells in the same tuple. Content addressed.
    Both,
    /// At least one missing cell. One id per row.
    MissingOnly,
    /// At least one sentinel cell. One id per row.
    SentinelOnly,
    /// Content addressed.
    Ordinary,
}

impl IdBand {
    pub fn base(self) -> i64 {
        match self {
            IdBand::Both => 100_000,
            IdBand::MissingOnly => 80_000,
            IdBand::SentinelOnly => 90_000,
            IdBand::Ordinary => 0,
        }
    }

    pub fn classify(tuple: &[Cell], sentinels: &SentinelSet) -> Self {
        let mut missing = false;
        let mut sentinel = false;
        for cell in tuple {
            match classify_cell(cell, sentinels) {
                CellClass::Missing => missing = true,
                CellClass::Sentinel => sentinel = true,
                CellClass::Ordinary => {}
            }
        }
        match (missing, sentinel) {
            (true, true) => IdBand::Both,
            (true, false) => IdBand::MissingOnly,
            (false, true) => IdBand::SentinelOnly,
            (false, false) => IdBand::Ordinary,
        }
    }

    fn content_addressed(self) -> bool {
        matches!(self, IdBand::Both | IdBand::Ordinary)
    }
}

/// Name of the id column [`assign_ids`] writes for `columns`.
pub fn id_column_name(columns: &[String]) -> String {
    format!("id_{}", columns.join("_"))
}

/// Adds (or overwrites) the integer column `id_<columns joined by _>` and
/// returns its name. An empty `columns` list means every column.
pub fn assign_ids(
    handle: &mut TableHandle,
    columns: &[String],
    sentinels: &SentinelSet,
) -> AuditResult<String> {
    let indices = handle.resolve(columns)?;
    let names = indices
        .iter()
        .map(|idx| handle.table.headers()[*idx].clone())
        .collect::<Vec<_>>();
    let target = id_column_name(&names);

    let mut counters: HashMap<IdBand, i64> = HashMap::new();
    let mut by_content: HashMap<Vec<Cell>, i64> = HashMap::new();
    let mut ids = Vec::with_capacity(handle.table.row_count());
    for row in handle.table.rows() {
        let tuple = Table::key_of(row, &indices);
        let band = IdBand::classify(&tuple, sentinels);
        let id = if band.content_addressed() {
            match by_content.get(&tuple) {
                Some(id) => *id,
                None => {
                    let id = next_id(&mut counters, band);
                    by_content.insert(tuple, id);
                    id
                }
            }
        } else {
            next_id(&mut counters, band)
        };
        ids.push(Some(Value::Integer(id)));
    }
    handle.table.set_column(&target, ids);
    info!(
        "Assigned '{}' on '{}' ({} distinct content key(s))",
        target,
        handle.name,
        by_content.len()
    );
    Ok(target)
}

fn next_id(counters: &mut HashMap<IdBand, i64>, band: IdBand) -> i64 {
    let counter = counters.entry(band).or_insert(0);
    let id = band.base() + *counter;
    *counter += 1;
    id
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReassignSummary {
    /// Lowest id minted for labels that had none.
    pub floor: i64,
    /// Labels that received a new id.
    pub minted: usize,
    /// Rows whose id cell was written.
    pub rows_updated: usize,
}

/// Canonicalizes `id_column` against `label_column`.
///
/// Every ordinary string label takes the last numeric id it was seen with;
/// labels never seen with a numeric id get a new one above every id in use.
/// Rows with a missing or sentinel label are left alone.
///
/// Ids that cannot be represented as `i64` (infinities, huge floats) or leave
/// no room above them are contract violations. Contract violations are logged
/// and leave the table untouched.
pub fn reassign_ids(
    handle: &mut TableHandle,
    id_column: &str,
    label_column: &str,
    sentinels: &SentinelSet,
) -> Option<ReassignSummary> {
    match try_reassign_ids(handle, id_column, label_column, sentinels) {
        Ok(summary) => Some(summary),
        Err(err) => {
            warn!("{err}");
            None
        }
    }
}

pub fn try_reassign_ids(
    handle: &mut TableHandle,
    id_column: &str,
    label_column: &str,
    sentinels: &SentinelSet,
) -> AuditResult<ReassignSummary> {
    let violation = |reason: String| AuditError::InputContractViolation {
        operation: "reassign_ids",
        reason,
    };
    if id_column == label_column {
        return Err(violation(format!(
            "id and label column are both '{id_column}'"
        )));
    }
    let id_idx = handle.table.column_index(id_column).ok_or_else(|| {
        violation(format!("'{}' has no column '{}'", handle.name, id_column))
    })?;
    let label_idx = handle.table.column_index(label_column).ok_or_else(|| {
        violation(format!("'{}' has no column '{}'", handle.name, label_column))
    })?;

    let mut known: HashMap<String, Value> = HashMap::new();
    let mut reserved: Vec<&Value> = Vec::new();
    for row in handle.table.rows() {
        let numeric_id = row[id_idx].as_ref().filter(|v| v.is_numeric());
        match classify_cell(&row[label_idx], sentinels) {
            CellClass::Missing | CellClass::Sentinel => reserved.extend(numeric_id),
            CellClass::Ordinary => {
                if let (Some(label), Some(id)) = (label_of(&row[label_idx]), numeric_id) {
                    // Later rows override earlier ones for the same label.
                    known.insert(label.to_string(), id.clone());
                }
            }
        }
    }

    let mut highest = 0i64;
    for id in known.values().chain(reserved) {
        let ceiling = id_ceiling(id).ok_or_else(|| {
            violation(format!("id {id} in '{id_column}' is not a representable integer"))
        })?;
        highest = highest.max(ceiling);
    }
    let floor = highest
        .checked_add(REASSIGN_GAP)
        .ok_or_else(|| violation(format!("no id fits above {highest} in '{id_column}'")))?;

    let mut minted = 0usize;
    let mut updates = Vec::new();
    for (pos, row) in handle.table.rows().iter().enumerate() {
        if classify_cell(&row[label_idx], sentinels) != CellClass::Ordinary {
            continue;
        }
        let Some(label) = label_of(&row[label_idx]) else {
            continue;
        };
        let id = match known.get(label) {
            Some(id) => id.clone(),
            None => {
                let next = i64::try_from(minted)
                    .ok()
                    .and_then(|offset| floor.checked_add(offset))
                    .ok_or_else(|| violation(format!("ran out of ids above {floor}")))?;
                minted += 1;
                let id = Value::Integer(next);
                known.insert(label.to_string(), id.clone());
                id
            }
        };
        updates.push((pos, id));
    }
    let rows_updated = updates.len();
    for (pos, id) in updates {
        handle.table.set_cell(pos, id_idx, Some(id));
    }
    info!(
        "Reassigned '{}' from '{}' on '{}': {} new id(s) from {}",
        id_column, label_column, handle.name, minted, floor
    );
    Ok(ReassignSummary {
        floor,
        minted,
        rows_updated,
    })
}

/// Smallest integer at or above a numeric id. `None` for infinities and
/// magnitudes outside `i64`.
fn id_ceiling(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) => {
            let ceiling = f.ceil();
            let fits = ceiling >= i64::MIN as f64 && ceiling < i64::MAX as f64;
            (ceiling.is_finite() && fits).then_some(ceiling as i64)
        }
        _ => None,
    }
}

fn label_of(cell: &Cell) -> Option<&str> {
    cell.as_ref().and_then(Value::as_str)
}
