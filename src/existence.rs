//! Inexistent-value analysis.
//!
//! Measures how many key tuples of a base table have no counterpart in a
//! comparison table. A [`JoinSpec`] lists keys of the base table, each paired
//! with the comparison columns it may appear in. A key is satisfied by a row of
//! the comparison table when any of its columns equals any of its alternatives;
//! every key has to be satisfied by the same row.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::{Cell, CellClass, MatchKey, SentinelSet, classify_cell, percent},
    dataset::{Table, TableHandle},
    error::{AuditError, AuditResult},
};

/// One column, or several columns that may each carry the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinKey {
    Single(String),
    Composite(Vec<String>),
}

impl JoinKey {
    pub fn columns(&self) -> Vec<String> {
        match self {
            JoinKey::Single(column) => vec![column.clone()],
            JoinKey::Composite(columns) => columns.clone(),
        }
    }
}

impl From<&str> for JoinKey {
    fn from(column: &str) -> Self {
        JoinKey::Single(column.to_string())
    }
}

impl From<&[&str]> for JoinKey {
    fn from(columns: &[&str]) -> Self {
        JoinKey::Composite(columns.iter().map(|c| c.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    pub key: JoinKey,
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinSpec {
    clauses: Vec<JoinClause>,
}

impl JoinSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clause<K: Into<JoinKey>>(mut self, key: K, alternatives: &[&str]) -> Self {
        self.clauses.push(JoinClause {
            key: key.into(),
            alternatives: alternatives.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn from_clauses(clauses: Vec<JoinClause>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[JoinClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Key columns of the base table in clause order, without repeats.
    fn key_columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.clauses
            .iter()
            .flat_map(|clause| clause.key.columns())
            .filter(|column| seen.insert(column.clone()))
            .collect()
    }
}

/// Resolved clause: positions inside the key tuple plus a lookup over the
/// alternatives of the comparison table.
struct ClauseIndex {
    positions: Vec<usize>,
    rows_by_value: HashMap<MatchKey, BTreeSet<usize>>,
}

impl ClauseIndex {
    fn build(
        clause: &JoinClause,
        key_columns: &[String],
        other: &TableHandle,
    ) -> AuditResult<Self> {
        let positions = clause
            .key
            .columns()
            .iter()
            .filter_map(|column| key_columns.iter().position(|k| k == column))
            .collect();
        let alternatives = other.resolve(&clause.alternatives)?;
        let mut rows_by_value: HashMap<MatchKey, BTreeSet<usize>> = HashMap::new();
        for (row_idx, row) in other.table.rows().iter().enumerate() {
            for idx in &alternatives {
                if let Some(value) = &row[*idx] {
                    rows_by_value
                        .entry(value.match_key())
                        .or_default()
                        .insert(row_idx);
                }
            }
        }
        Ok(Self {
            positions,
            rows_by_value,
        })
    }

    /// Comparison rows satisfying this clause for `tuple`.
    fn candidates(&self, tuple: &[Cell]) -> BTreeSet<usize> {
        self.positions
            .iter()
            .filter_map(|pos| tuple[*pos].as_ref())
            .filter_map(|value| self.rows_by_value.get(&value.match_key()))
            .flatten()
            .copied()
            .collect()
    }
}

/// Percentage of eligible key tuples of `base` with no matching row in `other`,
/// rounded to four decimals.
///
/// Eligible tuples are the distinct tuples over all key columns that contain
/// neither a missing cell nor a sentinel.
pub fn nonexistent_ratio(
    base: &TableHandle,
    other: &TableHandle,
    spec: &JoinSpec,
    sentinels: &SentinelSet,
) -> AuditResult<f64> {
    if spec.is_empty() {
        return Err(AuditError::InputContractViolation {
            operation: "nonexistent_ratio",
            reason: "join has no clause".to_string(),
        });
    }
    let key_columns = spec.key_columns();
    let indices = base.resolve(&key_columns)?;
    let clauses = spec
        .clauses()
        .iter()
        .map(|clause| ClauseIndex::build(clause, &key_columns, other))
        .collect::<AuditResult<Vec<_>>>()?;

    let eligible = eligible_tuples(&base.table, &indices, sentinels);
    if eligible.is_empty() {
        return Err(AuditError::EmptyInput {
            table: base.name.clone(),
        });
    }
    let matched = eligible
        .iter()
        .filter(|tuple| has_counterpart(&clauses, tuple))
        .count();
    let ratio = percent(eligible.len() - matched, eligible.len(), 4);
    debug!(
        "{} of {} key tuple(s) of '{}' found in '{}'",
        matched,
        eligible.len(),
        base.name,
        other.name
    );
    Ok(ratio)
}

fn has_counterpart(clauses: &[ClauseIndex], tuple: &[Cell]) -> bool {
    let mut remaining: Option<BTreeSet<usize>> = None;
    for clause in clauses {
        let candidates = clause.candidates(tuple);
        let narrowed = match remaining {
            None => candidates,
            Some(rows) => rows.intersection(&candidates).copied().collect(),
        };
        if narrowed.is_empty() {
            return false;
        }
        remaining = Some(narrowed);
    }
    remaining.is_some()
}

fn eligible_tuples(table: &Table, indices: &[usize], sentinels: &SentinelSet) -> Vec<Vec<Cell>> {
    let mut seen = HashSet::new();
    table
        .rows()
        .iter()
        .map(|row| Table::key_of(row, indices))
        .filter(|tuple| {
            tuple
                .iter()
                .all(|cell| classify_cell(cell, sentinels) == CellClass::Ordinary)
        })
        .filter(|tuple| seen.insert(tuple.clone()))
        .collect()
}
