//! Projection and selection helpers.
//!
//! These are the relational building blocks the metrics use instead of query
//! strings: projecting a column subset, selecting rows through a boolean mask,
//! and splitting a table into first occurrences ("unique" rows) and later
//! repeats ("surplus" rows). Every helper accepts either a [`Table`] or a
//! [`TableHandle`] through [`AsTable`].

use std::collections::HashSet;

use crate::{
    data::Cell,
    dataset::{AsTable, Table, TableHandle},
    error::{AuditError, AuditResult},
};

const UNNAMED_TABLE: &str = "<table>";

fn name_of<T: AsTable + ?Sized>(source: &T) -> &str {
    source.table_name().unwrap_or(UNNAMED_TABLE)
}

pub(crate) fn project_indices(table: &Table, indices: &[usize]) -> Table {
    let headers = indices
        .iter()
        .map(|idx| table.headers()[*idx].clone())
        .collect();
    let rows = table
        .rows()
        .iter()
        .map(|row| Table::key_of(row, indices))
        .collect();
    Table::from_parts(headers, rows)
}

/// Projects `columns` (all when empty) of the rows whose mask entry is `true`
/// (all rows when no mask is given).
pub fn tuples<T: AsTable + ?Sized>(
    source: &T,
    columns: &[String],
    mask: Option<&[bool]>,
) -> AuditResult<Table> {
    let table = source.as_table();
    let indices = table.resolve(name_of(source), columns)?;
    if let Some(mask) = mask
        && mask.len() != table.row_count()
    {
        return Err(AuditError::InputContractViolation {
            operation: "tuples",
            reason: format!(
                "selection mask has {} entries for {} rows",
                mask.len(),
                table.row_count()
            ),
        });
    }
    let rows = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(pos, _)| mask.is_none_or(|m| m[*pos]))
        .map(|(_, row)| Table::key_of(row, &indices))
        .collect();
    let headers = indices
        .iter()
        .map(|idx| table.headers()[*idx].clone())
        .collect();
    Ok(Table::from_parts(headers, rows))
}

/// Builds a selection mask from a predicate over one column.
pub fn mask_where<T, P>(source: &T, column: &str, predicate: P) -> AuditResult<Vec<bool>>
where
    T: AsTable + ?Sized,
    P: Fn(&Cell) -> bool,
{
    let table = source.as_table();
    let idx = table
        .column_index(column)
        .ok_or_else(|| AuditError::SchemaMismatch {
            table: name_of(source).to_string(),
            column: column.to_string(),
        })?;
    Ok(table.column(idx).map(predicate).collect())
}

/// First occurrences under `columns` (all when empty), with every column kept.
pub fn unique_rows(
    handle: &TableHandle,
    columns: &[String],
    mask: Option<&[bool]>,
) -> AuditResult<Table> {
    let selected = tuples(handle, &[], mask)?;
    let indices = selected.resolve(&handle.name, columns)?;
    let surplus = selected.surplus_positions(&indices);
    Ok(drop_positions(selected, &surplus))
}

/// Rows that repeat an earlier row under `columns` (all when empty).
pub fn surplus_rows(handle: &TableHandle, columns: &[String]) -> AuditResult<Table> {
    let indices = handle.resolve(columns)?;
    let surplus = handle.table.surplus_positions(&indices);
    let keep: HashSet<usize> = surplus.into_iter().collect();
    let rows = handle
        .table
        .rows()
        .iter()
        .enumerate()
        .filter(|(pos, _)| keep.contains(pos))
        .map(|(_, row)| row.clone())
        .collect();
    Ok(Table::from_parts(handle.table.headers().to_vec(), rows))
}

/// Number of distinct tuples under `columns`; missing counts as a value.
pub fn unique_count(handle: &TableHandle, columns: &[String]) -> AuditResult<usize> {
    let indices = handle.resolve(columns)?;
    let distinct: HashSet<Vec<Cell>> = handle
        .table
        .rows()
        .iter()
        .map(|row| Table::key_of(row, &indices))
        .collect();
    Ok(distinct.len())
}

/// Distinct cells of one column in first-seen order.
pub fn distinct_values(handle: &TableHandle, column: &str) -> AuditResult<Vec<Cell>> {
    let idx = handle.require_column(column)?;
    let mut seen = HashSet::new();
    Ok(handle
        .table
        .column(idx)
        .filter(|cell| seen.insert((*cell).clone()))
        .cloned()
        .collect())
}

/// `SELECT DISTINCT columns FROM handle`, keeping first-seen order.
pub fn distinct_projection(handle: &TableHandle, columns: &[String]) -> AuditResult<Table> {
    let indices = handle.resolve(columns)?;
    let projected = project_indices(&handle.table, &indices);
    let all = (0..projected.column_count()).collect::<Vec<_>>();
    let surplus = projected.surplus_positions(&all);
    Ok(drop_positions(projected, &surplus))
}

fn drop_positions(mut table: Table, positions: &[usize]) -> Table {
    if positions.is_empty() {
        return table;
    }
    let dropped: HashSet<usize> = positions.iter().copied().collect();
    table.retain_rows(|pos, _| !dropped.contains(&pos));
    table
}
