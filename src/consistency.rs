//! Cross-table consistency of analogous columns.
//!
//! Two tables describe the same entities through an identifier column each
//! (`id_a`, `id_b`) and carry "dependent" columns that are expected to agree
//! pairwise once rows are matched on the identifier. For every dependent pair
//! the check counts matched rows where the two cells differ under the discrete
//! distance: equal cells (or two missing cells) are at distance 0, anything
//! else at distance 1. Strings compare case-insensitively and numbers by value.
//!
//! When an identifier maps to several dependent tuples in `a`, the first one
//! seen is used as the representative. Disagreement with the other tuples is
//! not reported.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    data::{Cell, MatchKey, percent},
    dataset::{Table, TableHandle},
    error::{AuditError, AuditResult},
};

pub const DEFAULT_NULL_THRESHOLD: f64 = 0.05;

/// Identifier and dependent columns of one side of a consistency check.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencySpec {
    pub id_a: String,
    pub id_b: String,
    pub deps_a: Vec<String>,
    pub deps_b: Vec<String>,
    pub null_threshold: f64,
}

impl ConsistencySpec {
    pub fn new(id_a: &str, id_b: &str, deps_a: &[&str], deps_b: &[&str]) -> Self {
        Self {
            id_a: id_a.to_string(),
            id_b: id_b.to_string(),
            deps_a: deps_a.iter().map(|s| s.to_string()).collect(),
            deps_b: deps_b.iter().map(|s| s.to_string()).collect(),
            null_threshold: DEFAULT_NULL_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.null_threshold = threshold;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    /// Dependent column of `b` and its mismatch count.
    pub mismatches: Vec<(String, usize)>,
    /// Deduplicated rows of `b` whose identifier was found in `a`.
    pub matched_rows: usize,
    /// Deduplicated rows of `b`.
    pub compared_rows: usize,
}

impl ConsistencyReport {
    /// Mismatch percentage per dependent column over the matched rows, rounded
    /// to two decimals. Rows of `b` with no counterpart in `a` are not part of
    /// the denominator; with no matched row every share is 0.
    pub fn percentages(&self) -> Vec<(String, f64)> {
        self.mismatches
            .iter()
            .map(|(column, count)| {
                let share = if self.matched_rows == 0 {
                    0.0
                } else {
                    percent(*count, self.matched_rows, 2)
                };
                (column.clone(), share)
            })
            .collect()
    }
}

/// Per-dependent-column mismatch counts between `a` and `b`.
pub fn consistency_check(
    a: &TableHandle,
    b: &TableHandle,
    spec: &ConsistencySpec,
) -> AuditResult<Vec<usize>> {
    consistency_report(a, b, spec).map(|report| {
        report
            .mismatches
            .into_iter()
            .map(|(_, count)| count)
            .collect()
    })
}

/// Same check as [`consistency_check`] with matched-row bookkeeping.
pub fn consistency_report(
    a: &TableHandle,
    b: &TableHandle,
    spec: &ConsistencySpec,
) -> AuditResult<ConsistencyReport> {
    if spec.deps_a.len() != spec.deps_b.len() {
        // Report the first dependent column left without a partner.
        let paired = spec.deps_a.len().min(spec.deps_b.len());
        let (table, column) = if spec.deps_a.len() > paired {
            (&a.name, &spec.deps_a[paired])
        } else {
            (&b.name, &spec.deps_b[paired])
        };
        return Err(AuditError::SchemaMismatch {
            table: table.clone(),
            column: column.clone(),
        });
    }
    let columns_a = with_id(&spec.id_a, &spec.deps_a);
    let columns_b = with_id(&spec.id_b, &spec.deps_b);
    let indices_a = a.resolve(&columns_a)?;
    let indices_b = b.resolve(&columns_b)?;

    let null_a = null_fraction(a, indices_a[0])?;
    let null_b = null_fraction(b, indices_b[0])?;
    if null_a >= spec.null_threshold || null_b >= spec.null_threshold {
        let err = AuditError::InsufficientKeyCoverage {
            left_table: a.name.clone(),
            left_column: spec.id_a.clone(),
            left_null_percent: 100.0 * null_a,
            right_table: b.name.clone(),
            right_column: spec.id_b.clone(),
            right_null_percent: 100.0 * null_b,
            threshold_percent: 100.0 * spec.null_threshold,
        };
        warn!("{err}");
        return Err(err);
    }

    let mut representatives: HashMap<MatchKey, Vec<Cell>> = HashMap::new();
    for tuple in distinct_tuples(&a.table, &indices_a) {
        let Some(id) = &tuple[0] else {
            continue;
        };
        representatives
            .entry(id.identity_key())
            .or_insert_with(|| tuple[1..].to_vec());
    }

    let dependents = spec.deps_a.len();
    let mut counts = vec![0usize; dependents];
    let mut matched_rows = 0usize;
    let compared = distinct_tuples(&b.table, &indices_b);
    for tuple in &compared {
        let Some(id) = &tuple[0] else {
            continue;
        };
        let Some(expected) = representatives.get(&id.identity_key()) else {
            continue;
        };
        matched_rows += 1;
        for (pos, count) in counts.iter_mut().enumerate() {
            *count += discrete_distance(&expected[pos], &tuple[pos + 1]);
        }
    }
    debug!(
        "Consistency '{}' -> '{}': {} of {} row(s) matched on '{}'",
        a.name,
        b.name,
        matched_rows,
        compared.len(),
        spec.id_b
    );

    Ok(ConsistencyReport {
        mismatches: spec.deps_b.iter().cloned().zip(counts).collect(),
        matched_rows,
        compared_rows: compared.len(),
    })
}

/// 0 for equal cells or two missing cells, 1 otherwise.
pub fn discrete_distance(left: &Cell, right: &Cell) -> usize {
    match (left, right) {
        (None, None) => 0,
        (Some(l), Some(r)) if l.loosely_equals(r) => 0,
        _ => 1,
    }
}

fn with_id(id: &str, deps: &[String]) -> Vec<String> {
    std::iter::once(id.to_string())
        .chain(deps.iter().cloned())
        .collect()
}

fn null_fraction(handle: &TableHandle, idx: usize) -> AuditResult<f64> {
    let total = handle.require_rows()?;
    let nulls = handle.table.column(idx).filter(|c| c.is_none()).count();
    Ok(nulls as f64 / total as f64)
}

fn distinct_tuples(table: &Table, indices: &[usize]) -> Vec<Vec<Cell>> {
    let mut seen = std::collections::HashSet::new();
    table
        .rows()
        .iter()
        .map(|row| Table::key_of(row, indices))
        .filter(|tuple| seen.insert(tuple.clone()))
        .collect()
}
