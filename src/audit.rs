//! Plan execution: load tables, measure, correct, write back.

use std::fs;

use anyhow::{Context, Result, anyhow};
use heck::ToSnakeCase;
use log::{info, warn};

use crate::{
    cardinality,
    consistency::{self, ConsistencySpec},
    data::SentinelSet,
    dataset::{Table, TableHandle},
    dependency, duplicates, existence, homogeneity, ids,
    io_utils::{self, ReadOptions},
    missing,
    plan::{AuditPlan, Check, Correction, TableSource},
    range,
    report::Report,
};

/// Tables loaded for one plan, addressed by name.
#[derive(Debug, Default)]
pub struct Workspace {
    handles: Vec<TableHandle>,
}

impl Workspace {
    pub fn load(plan: &AuditPlan) -> Result<Self> {
        let handles = plan
            .tables
            .iter()
            .map(load_source)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { handles })
    }

    pub fn handles(&self) -> &[TableHandle] {
        &self.handles
    }

    pub fn get(&self, name: &str) -> Result<&TableHandle> {
        self.handles
            .iter()
            .find(|h| h.name == name)
            .ok_or_else(|| anyhow!("Unknown table '{name}'"))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut TableHandle> {
        self.handles
            .iter_mut()
            .find(|h| h.name == name)
            .ok_or_else(|| anyhow!("Unknown table '{name}'"))
    }
}

pub fn load_source(source: &TableSource) -> Result<TableHandle> {
    let options = ReadOptions::new(source.delimiter_byte()?, source.encoding.as_deref())?;
    let mut table = io_utils::read_table(&source.path, &options)
        .with_context(|| format!("Loading table '{}'", source.name))?;
    normalize_headers(&mut table, source);
    info!(
        "Loaded '{}': {} row(s), {} column(s)",
        source.name,
        table.row_count(),
        table.column_count()
    );
    Ok(TableHandle::new(source.name.clone(), table))
}

/// Applies explicit renames, then snake_case when requested.
fn normalize_headers(table: &mut Table, source: &TableSource) {
    for (from, to) in &source.renames {
        if !table.rename_column(from, to) {
            warn!("Table '{}' has no column '{}' to rename", source.name, from);
        }
    }
    if source.snake_case_headers {
        let headers = table.headers().to_vec();
        for header in headers {
            let snake = header.to_snake_case();
            if snake != header {
                table.rename_column(&header, &snake);
            }
        }
    }
}

/// Runs one check and renders its outcome.
pub fn run_check(workspace: &Workspace, check: &Check, sentinels: &SentinelSet) -> Result<Report> {
    let report = match check {
        Check::Duplicates { table, columns } => {
            let handle = workspace.get(table)?;
            let ratio = duplicates::duplicate_ratio(handle, columns)?;
            let mut report = Report::new(
                format!("Duplicate rows in '{table}'"),
                vec!["columns", "percent"],
            );
            report.push([describe_columns(columns), ratio.to_string()]);
            report
        }
        Check::Nulls { table, columns } => {
            let handle = workspace.get(table)?;
            let mut report = Report::new(
                format!("Missing values in '{table}'"),
                vec!["columns", "any_percent", "all_percent"],
            );
            report.push([
                describe_columns(columns),
                missing::null_ratio_any(handle, columns)?.to_string(),
                missing::null_ratio_all(handle, columns)?.to_string(),
            ]);
            for idx in handle.resolve(columns)? {
                let column = vec![handle.table.headers()[idx].clone()];
                report.push([
                    column[0].clone(),
                    missing::null_ratio_any(handle, &column)?.to_string(),
                    missing::null_ratio_all(handle, &column)?.to_string(),
                ]);
            }
            report
        }
        Check::Undefined { table, columns } => {
            let handle = workspace.get(table)?;
            let mut report = Report::new(
                format!("Undefined values in '{table}'"),
                vec!["column", "percent"],
            );
            for idx in handle.resolve(columns)? {
                let column = &handle.table.headers()[idx];
                let ratio = missing::undefined_ratio(handle, column, sentinels)?;
                report.push([column.clone(), ratio.to_string()]);
            }
            report
        }
        Check::Types { table, columns } => {
            let handle = workspace.get(table)?;
            let mut report = Report::new(
                format!("Dominant types in '{table}'"),
                vec!["column", "type", "percent"],
            );
            for (column, share) in homogeneity::evaluate_types(handle, columns)? {
                let (kind, percent) = match share {
                    Some(share) => (share.kind.to_string(), share.percent.to_string()),
                    None => ("-".to_string(), "-".to_string()),
                };
                report.push([column, kind, percent]);
            }
            report
        }
        Check::Cardinality { table, left, right } => {
            let handle = workspace.get(table)?;
            let delta = cardinality::unique_count_delta(handle, left, right)?;
            let mut report = Report::new(
                format!("Distinct count difference in '{table}'"),
                vec!["left", "right", "delta"],
            );
            report.push([left.clone(), right.clone(), delta.to_string()]);
            report
        }
        Check::Consistency {
            left,
            right,
            threshold,
        } => {
            let spec = ConsistencySpec {
                id_a: left.id.clone(),
                id_b: right.id.clone(),
                deps_a: left.columns.clone(),
                deps_b: right.columns.clone(),
                null_threshold: *threshold,
            };
            let outcome = consistency::consistency_report(
                workspace.get(&left.table)?,
                workspace.get(&right.table)?,
                &spec,
            )?;
            let mut report = Report::new(
                format!(
                    "Consistency of '{}' against '{}' on {} = {} ({} of {} row(s) matched)",
                    right.table,
                    left.table,
                    left.id,
                    right.id,
                    outcome.matched_rows,
                    outcome.compared_rows
                ),
                vec!["column", "mismatches", "percent"],
            );
            for ((column, count), (_, share)) in
                outcome.mismatches.iter().zip(outcome.percentages())
            {
                report.push([column.clone(), count.to_string(), share.to_string()]);
            }
            report
        }
        Check::Coverage { base, other, join } => {
            let ratio = existence::nonexistent_ratio(
                workspace.get(base)?,
                workspace.get(other)?,
                join,
                sentinels,
            )?;
            let mut report = Report::new(
                format!("Key tuples of '{base}' missing from '{other}'"),
                vec!["percent"],
            );
            report.push([ratio.to_string()]);
            report
        }
        Check::Range {
            table,
            column,
            min,
            max,
        } => {
            let handle = workspace.get(table)?;
            let ratio = range::out_of_range_ratio(handle, column, *min, *max);
            let mut report = Report::new(
                format!("Out-of-range values in '{table}'"),
                vec!["column", "min", "max", "percent"],
            );
            report.push([
                column.clone(),
                min.to_string(),
                max.map_or_else(|| "-".to_string(), |m| m.to_string()),
                ratio.map_or_else(|| "-".to_string(), |r| r.to_string()),
            ]);
            report
        }
        Check::Dependencies { table, columns } => {
            let handle = workspace.get(table)?;
            let dependents = dependency::candidate_dependencies(handle, columns)?;
            let mut report = Report::new(
                format!(
                    "Columns of '{table}' determined by {}",
                    describe_columns(columns)
                ),
                vec!["column"],
            );
            for column in dependents {
                report.push([column]);
            }
            report
        }
    };
    Ok(report)
}

/// Applies one correction, returning a one-line summary per affected table.
pub fn apply_correction(
    workspace: &mut Workspace,
    correction: &Correction,
    sentinels: &SentinelSet,
) -> Result<Report> {
    let mut report = Report::new("Corrections", vec!["table", "action", "detail"]);
    match correction {
        Correction::Dedupe { tables } => {
            let outcomes = if tables.is_empty() {
                duplicates::dedupe_all(&mut workspace.handles)?
            } else {
                let mut selected = Vec::with_capacity(tables.len());
                for name in tables {
                    selected.push(workspace.get(name)?.clone());
                }
                let outcomes = duplicates::dedupe_all(&mut selected)?;
                for handle in selected {
                    let slot = workspace.get_mut(&handle.name)?;
                    *slot = handle;
                }
                outcomes
            };
            for outcome in outcomes {
                report.push([
                    outcome.table,
                    "dedupe".to_string(),
                    format!(
                        "{} row(s) removed ({}% duplicated)",
                        outcome.removed, outcome.ratio_before
                    ),
                ]);
            }
        }
        Correction::AssignIds { table, columns } => {
            let handle = workspace.get_mut(table)?;
            let column = ids::assign_ids(handle, columns, sentinels)?;
            report.push([table.clone(), "assign_ids".to_string(), column]);
        }
        Correction::ReassignIds {
            table,
            id_column,
            label_column,
        } => {
            let handle = workspace.get_mut(table)?;
            let detail = match ids::reassign_ids(handle, id_column, label_column, sentinels) {
                Some(summary) => format!(
                    "{} row(s) updated, {} new id(s) from {}",
                    summary.rows_updated, summary.minted, summary.floor
                ),
                None => "skipped".to_string(),
            };
            report.push([table.clone(), "reassign_ids".to_string(), detail]);
        }
    }
    Ok(report)
}

/// Executes every check, then every correction, then writes corrected tables
/// when the plan names an output directory. Each table is written with the
/// delimiter and encoding it was read with.
pub fn execute(plan: &AuditPlan) -> Result<Vec<Report>> {
    let sentinels = plan.sentinel_set();
    let mut workspace = Workspace::load(plan)?;
    let mut reports = Vec::new();
    for check in &plan.checks {
        match run_check(&workspace, check, &sentinels) {
            Ok(report) => reports.push(report),
            Err(err) => {
                warn!("{} failed: {err:#}", check_label(check));
                let mut report = Report::new(check_label(check), vec!["error"]);
                report.push([format!("{err:#}")]);
                reports.push(report);
            }
        }
    }
    for correction in &plan.corrections {
        reports.push(apply_correction(&mut workspace, correction, &sentinels)?);
    }
    if let Some(dir) = &plan.output_dir {
        fs::create_dir_all(dir).with_context(|| format!("Creating output directory {dir:?}"))?;
        for (source, handle) in plan.tables.iter().zip(workspace.handles()) {
            let path = dir.join(format!("{}.csv", handle.name));
            let options = ReadOptions::new(None, source.encoding.as_deref())?;
            let delimiter = io_utils::resolve_delimiter(&source.path, source.delimiter_byte()?);
            io_utils::write_table(&path, &handle.table, Some(delimiter), options.encoding)
                .with_context(|| format!("Writing corrected table '{}'", handle.name))?;
            info!("Wrote {:?}", path);
        }
    }
    Ok(reports)
}

fn check_label(check: &Check) -> String {
    let kind = match check {
        Check::Duplicates { .. } => "duplicates",
        Check::Nulls { .. } => "nulls",
        Check::Undefined { .. } => "undefined",
        Check::Types { .. } => "types",
        Check::Cardinality { .. } => "cardinality",
        Check::Consistency { .. } => "consistency",
        Check::Coverage { .. } => "coverage",
        Check::Range { .. } => "range",
        Check::Dependencies { .. } => "dependencies",
    };
    format!("{kind} check on {}", check.tables().join(", "))
}

fn describe_columns(columns: &[String]) -> String {
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    }
}
