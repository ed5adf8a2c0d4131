pub mod audit;
pub mod cardinality;
pub mod cli;
pub mod consistency;
pub mod data;
pub mod dataset;
pub mod dependency;
pub mod duplicates;
pub mod error;
pub mod existence;
pub mod homogeneity;
pub mod ids;
pub mod io_utils;
pub mod missing;
pub mod plan;
pub mod range;
pub mod report;
pub mod schema;
pub mod select;
pub mod yaml_provider;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InputArgs, SentinelArgs},
    consistency::ConsistencySpec,
    data::SentinelSet,
    dataset::TableHandle,
    existence::JoinSpec,
    io_utils::ReadOptions,
    plan::AuditPlan,
    report::Report,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_audit", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => handle_profile(&args),
        Commands::Dedupe(args) => handle_dedupe(&args),
        Commands::Cardinality(args) => handle_cardinality(&args),
        Commands::Consistency(args) => handle_consistency(&args),
        Commands::Coverage(args) => handle_coverage(&args),
        Commands::Range(args) => handle_range(&args),
        Commands::AssignIds(args) => handle_assign_ids(&args),
        Commands::ReassignIds(args) => handle_reassign_ids(&args),
        Commands::Dependencies(args) => handle_dependencies(&args),
        Commands::Audit(args) => handle_audit(&args),
    }
}

fn load(path: &Path, delimiter: Option<u8>, encoding: Option<&str>) -> Result<TableHandle> {
    let options = ReadOptions::new(delimiter, encoding)?;
    let table = io_utils::read_table(path, &options)
        .with_context(|| format!("Reading {path:?}"))?;
    let name = match path.file_stem() {
        Some(stem) if !io_utils::is_dash(path) => stem.to_string_lossy().into_owned(),
        _ => "stdin".to_string(),
    };
    info!(
        "Loaded '{}' with {} row(s) and {} column(s)",
        name,
        table.row_count(),
        table.column_count()
    );
    Ok(TableHandle::new(name, table))
}

fn load_input(args: &InputArgs) -> Result<TableHandle> {
    load(&args.input, args.delimiter, args.input_encoding.as_deref())
}

fn sentinel_set(args: &SentinelArgs) -> SentinelSet {
    if args.undefined.is_empty() {
        SentinelSet::standard()
    } else {
        SentinelSet::new(args.undefined.iter().cloned())
    }
}

fn handle_profile(args: &cli::ProfileArgs) -> Result<()> {
    let handle = load_input(&args.source)?;
    let sentinels = sentinel_set(&args.sentinels);
    let indices = handle.resolve(&args.columns)?;

    let mut summary = Report::new(
        format!("Profile of '{}'", handle.name),
        vec!["rows", "duplicate_percent", "any_null_percent", "all_null_percent"],
    );
    summary.push([
        handle.table.row_count().to_string(),
        duplicates::duplicate_ratio(&handle, &args.columns)?.to_string(),
        missing::null_ratio_any(&handle, &args.columns)?.to_string(),
        missing::null_ratio_all(&handle, &args.columns)?.to_string(),
    ]);

    let mut columns = Report::new(
        "Columns",
        vec![
            "column",
            "null_percent",
            "undefined_percent",
            "distinct",
            "type",
            "type_percent",
        ],
    );
    for idx in indices {
        let name = handle.table.headers()[idx].clone();
        let single = [name.clone()];
        let share = homogeneity::dominant_type(&handle, &name)?;
        columns.push([
            name.clone(),
            missing::null_ratio_any(&handle, &single)?.to_string(),
            missing::undefined_ratio(&handle, &name, &sentinels)?.to_string(),
            select::unique_count(&handle, &single)?.to_string(),
            share.map_or_else(|| "-".to_string(), |s| s.kind.to_string()),
            share.map_or_else(|| "-".to_string(), |s| s.percent.to_string()),
        ]);
    }
    report::emit(&[summary, columns], args.json)
}

fn handle_dedupe(args: &cli::DedupeArgs) -> Result<()> {
    let mut handle = load_input(&args.source)?;
    let removed = duplicates::remove_duplicates(&mut handle, &args.columns)?;
    let encoding = io_utils::resolve_encoding(
        args.output_encoding
            .as_deref()
            .or(args.source.input_encoding.as_deref()),
    )?;
    io_utils::write_table(&args.output, &handle.table, args.source.delimiter, encoding)?;
    info!("Removed {} duplicate row(s)", removed);
    Ok(())
}

fn handle_cardinality(args: &cli::CardinalityArgs) -> Result<()> {
    let handle = load_input(&args.source)?;
    let delta = cardinality::unique_count_delta(&handle, &args.left, &args.right)?;
    let mut report = Report::new(
        format!("Distinct count difference in '{}'", handle.name),
        vec!["left", "right", "delta"],
    );
    report.push([args.left.clone(), args.right.clone(), delta.to_string()]);
    report::emit(&[report], args.json)
}

fn handle_consistency(args: &cli::ConsistencyArgs) -> Result<()> {
    let encoding = args.input_encoding.as_deref();
    let left = load(&args.left, args.delimiter, encoding)?;
    let right = load(&args.right, args.delimiter, encoding)?;
    let right_columns = if args.right_columns.is_empty() {
        args.left_columns.clone()
    } else {
        args.right_columns.clone()
    };
    let spec = ConsistencySpec {
        id_a: args.left_id.clone(),
        id_b: args.right_id.clone().unwrap_or_else(|| args.left_id.clone()),
        deps_a: args.left_columns.clone(),
        deps_b: right_columns,
        null_threshold: args.threshold,
    };
    let outcome = consistency::consistency_report(&left, &right, &spec)?;
    let mut report = Report::new(
        format!(
            "Consistency of '{}' against '{}' ({} of {} row(s) matched)",
            right.name, left.name, outcome.matched_rows, outcome.compared_rows
        ),
        vec!["column", "mismatches", "percent"],
    );
    for ((column, count), (_, share)) in outcome.mismatches.iter().zip(outcome.percentages()) {
        report.push([column.clone(), count.to_string(), share.to_string()]);
    }
    report::emit(&[report], args.json)
}

fn handle_coverage(args: &cli::CoverageArgs) -> Result<()> {
    let encoding = args.input_encoding.as_deref();
    let base = load(&args.base, args.delimiter, encoding)?;
    let other = load(&args.other, args.delimiter, encoding)?;
    let spec = JoinSpec::from_clauses(args.keys.clone());
    let ratio = existence::nonexistent_ratio(&base, &other, &spec, &sentinel_set(&args.sentinels))?;
    let mut report = Report::new(
        format!("Key tuples of '{}' missing from '{}'", base.name, other.name),
        vec!["percent"],
    );
    report.push([ratio.to_string()]);
    report::emit(&[report], args.json)
}

fn handle_range(args: &cli::RangeArgs) -> Result<()> {
    let handle = load_input(&args.source)?;
    let ratio = range::out_of_range_ratio(&handle, &args.column, args.min, args.max);
    let mut report = Report::new(
        format!("Out-of-range values in '{}'", handle.name),
        vec!["column", "percent"],
    );
    report.push([
        args.column.clone(),
        ratio.map_or_else(|| "-".to_string(), |r| r.to_string()),
    ]);
    report::emit(&[report], args.json)
}

fn handle_assign_ids(args: &cli::AssignIdsArgs) -> Result<()> {
    let mut handle = load_input(&args.source)?;
    let column = ids::assign_ids(&mut handle, &args.columns, &sentinel_set(&args.sentinels))?;
    let encoding = io_utils::resolve_encoding(args.source.input_encoding.as_deref())?;
    io_utils::write_table(&args.output, &handle.table, args.source.delimiter, encoding)?;
    info!("Wrote '{}' to {:?}", column, args.output);
    Ok(())
}

fn handle_reassign_ids(args: &cli::ReassignIdsArgs) -> Result<()> {
    let mut handle = load_input(&args.source)?;
    ids::try_reassign_ids(
        &mut handle,
        &args.id_column,
        &args.label_column,
        &sentinel_set(&args.sentinels),
    )?;
    let encoding = io_utils::resolve_encoding(args.source.input_encoding.as_deref())?;
    io_utils::write_table(&args.output, &handle.table, args.source.delimiter, encoding)
}

fn handle_dependencies(args: &cli::DependenciesArgs) -> Result<()> {
    let handle = load_input(&args.source)?;
    let dependents = dependency::candidate_dependencies(&handle, &args.columns)?;
    let mut report = Report::new(
        format!(
            "Columns of '{}' determined by {}",
            handle.name,
            args.columns.join(", ")
        ),
        vec!["column"],
    );
    for column in dependents {
        report.push([column]);
    }
    report::emit(&[report], args.json)
}

fn handle_audit(args: &cli::AuditArgs) -> Result<()> {
    if let Some(path) = &args.init {
        AuditPlan::example()
            .save(path)
            .with_context(|| format!("Writing starter plan to {path:?}"))?;
        info!("Starter plan written to {:?}", path);
        return Ok(());
    }
    let Some(path) = &args.plan else {
        anyhow::bail!("--plan is required");
    };
    let plan = AuditPlan::load(path).with_context(|| format!("Loading plan {path:?}"))?;
    info!(
        "Running {} check(s) and {} correction(s) over {} table(s)",
        plan.checks.len(),
        plan.corrections.len(),
        plan.tables.len()
    );
    let reports = audit::execute(&plan)?;
    report::emit(&reports, args.json)
}
