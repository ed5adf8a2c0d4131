//! In-memory tables and the named handles the analyses operate on.
//!
//! A [`Table`] is a list of header names plus rows of [`Cell`]s; every row has
//! exactly one cell per header. A [`TableHandle`] pairs a table with the name
//! used in diagnostics. Correction routines take `&mut TableHandle` and replace
//! the table content in place.

use std::collections::HashSet;

use crate::{
    data::{Cell, normalize_cell},
    error::{AuditError, AuditResult},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from named columns of equal length.
    ///
    /// # Panics
    ///
    /// Panics when the columns differ in length.
    pub fn from_columns<S>(columns: Vec<(S, Vec<Cell>)>) -> Self
    where
        S: Into<String>,
    {
        let row_count = columns.first().map_or(0, |(_, values)| values.len());
        assert!(
            columns.iter().all(|(_, values)| values.len() == row_count),
            "all columns must have the same length"
        );
        let mut headers = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            headers.push(name.into());
            data.push(values.into_iter());
        }
        let rows = (0..row_count)
            .map(|_| {
                data.iter_mut()
                    .map(|column| normalize_cell(column.next().flatten()))
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        let mut row = row.into_iter().map(normalize_cell).collect::<Vec<_>>();
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: Cell) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = normalize_cell(value);
        }
    }

    /// Replaces the values of `name`, appending the column when it is new.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(None);
                }
                self.headers.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = normalize_cell(value);
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.headers[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Keeps the rows whose position satisfies `keep`.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, &[Cell]) -> bool,
    {
        let mut position = 0usize;
        self.rows.retain(|row| {
            let kept = keep(position, row);
            position += 1;
            kept
        });
    }

    pub(crate) fn from_parts(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    pub(crate) fn key_of(row: &[Cell], indices: &[usize]) -> Vec<Cell> {
        indices.iter().map(|idx| row[*idx].clone()).collect()
    }

    /// Resolves column names to indices, reporting the first unknown name.
    /// An empty list means every column.
    pub fn resolve(&self, table_name: &str, columns: &[String]) -> AuditResult<Vec<usize>> {
        if columns.is_empty() {
            return Ok((0..self.headers.len()).collect());
        }
        columns
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| AuditError::SchemaMismatch {
                        table: table_name.to_string(),
                        column: name.clone(),
                    })
            })
            .collect()
    }

    /// Row positions that repeat an earlier row under `indices`.
    pub(crate) fn surplus_positions(&self, indices: &[usize]) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.rows.len());
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !seen.insert(Self::key_of(row, indices)))
            .map(|(pos, _)| pos)
            .collect()
    }
}

/// A table together with the name it is reported under.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHandle {
    pub name: String,
    pub table: Table,
}

impl TableHandle {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    /// Builds a handle that keeps only `columns` of `table` (all when empty).
    pub fn with_columns(
        name: impl Into<String>,
        table: &Table,
        columns: &[String],
    ) -> AuditResult<Self> {
        let name = name.into();
        let indices = table.resolve(&name, columns)?;
        let projected = crate::select::project_indices(table, &indices);
        Ok(Self::new(name, projected))
    }

    pub fn resolve(&self, columns: &[String]) -> AuditResult<Vec<usize>> {
        self.table.resolve(&self.name, columns)
    }

    pub fn require_column(&self, column: &str) -> AuditResult<usize> {
        self.table
            .column_index(column)
            .ok_or_else(|| AuditError::SchemaMismatch {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Fails with [`AuditError::EmptyInput`] for zero-row tables.
    pub fn require_rows(&self) -> AuditResult<usize> {
        match self.table.row_count() {
            0 => Err(AuditError::EmptyInput {
                table: self.name.clone(),
            }),
            count => Ok(count),
        }
    }
}

/// Anything a projection or selection can read from.
pub trait AsTable {
    fn as_table(&self) -> &Table;

    fn table_name(&self) -> Option<&str> {
        None
    }
}

impl AsTable for Table {
    fn as_table(&self) -> &Table {
        self
    }
}

impl AsTable for TableHandle {
    fn as_table(&self) -> &Table {
        &self.table
    }

    fn table_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
