use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::existence::{JoinClause, JoinKey};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Measure data quality and cross-source consistency of CSV tables",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report duplicate, missing, undefined and type statistics for one table
    Profile(ProfileArgs),
    /// Remove duplicate rows, keeping first occurrences
    Dedupe(DedupeArgs),
    /// Compare the distinct counts of two columns expected to be 1:1
    Cardinality(CardinalityArgs),
    /// Count disagreements between analogous columns of two tables
    Consistency(ConsistencyArgs),
    /// Percentage of key tuples of one table that are absent from another
    Coverage(CoverageArgs),
    /// Percentage of numeric values outside an interval
    Range(RangeArgs),
    /// Add a surrogate id column derived from a set of columns
    AssignIds(AssignIdsArgs),
    /// Repair an id column using a label column as reference
    ReassignIds(ReassignIdsArgs),
    /// List columns functionally determined by a column set
    Dependencies(DependenciesArgs),
    /// Run every check and correction of a YAML audit plan
    Audit(AuditArgs),
}

/// How to read one CSV input.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input CSV file ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct SentinelArgs {
    /// Placeholder literals counted as undefined (defaults to INDEFINIDO, INDEFINIDA, SIN DEFINIR, NC)
    #[arg(long = "undefined", value_delimiter = ',')]
    pub undefined: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub sentinels: SentinelArgs,
    /// Columns to profile (defaults to all)
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Emit JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DedupeArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Columns that define a duplicate (defaults to all)
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Output CSV file ('-' for stdout)
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
    /// Character encoding of the output file (defaults to the input encoding)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CardinalityArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[arg(long)]
    pub left: String,
    #[arg(long)]
    pub right: String,
    /// Emit JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ConsistencyArgs {
    /// Reference table
    #[arg(long = "left")]
    pub left: PathBuf,
    /// Table compared against the reference
    #[arg(long = "right")]
    pub right: PathBuf,
    /// Identifier column of the reference table
    #[arg(long = "left-id")]
    pub left_id: String,
    /// Identifier column of the compared table (defaults to --left-id)
    #[arg(long = "right-id")]
    pub right_id: Option<String>,
    /// Dependent columns of the reference table
    #[arg(long = "left-columns", value_delimiter = ',', required = true)]
    pub left_columns: Vec<String>,
    /// Dependent columns of the compared table (defaults to --left-columns)
    #[arg(long = "right-columns", value_delimiter = ',')]
    pub right_columns: Vec<String>,
    /// Highest tolerated fraction of missing identifiers
    #[arg(long, default_value_t = crate::consistency::DEFAULT_NULL_THRESHOLD)]
    pub threshold: f64,
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CoverageArgs {
    /// Table whose key tuples are looked up
    #[arg(long = "base")]
    pub base: PathBuf,
    /// Table searched for the key tuples
    #[arg(long = "other")]
    pub other: PathBuf,
    /// Join clause `KEYS=ALTERNATIVES`, e.g. `B,C=B,C,D`; repeat for more keys
    #[arg(long = "key", value_parser = parse_join_clause, required = true)]
    pub keys: Vec<JoinClause>,
    #[command(flatten)]
    pub sentinels: SentinelArgs,
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[arg(long)]
    pub column: String,
    /// Lowest valid value
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub min: f64,
    /// Highest valid value (unbounded when omitted)
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,
    /// Emit JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AssignIdsArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub sentinels: SentinelArgs,
    /// Columns the id is derived from (defaults to all)
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Output CSV file ('-' for stdout)
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct ReassignIdsArgs {
    #[command(flatten)]
    pub source: InputArgs,
    #[command(flatten)]
    pub sentinels: SentinelArgs,
    #[arg(long = "id-column")]
    pub id_column: String,
    #[arg(long = "label-column")]
    pub label_column: String,
    /// Output CSV file ('-' for stdout)
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct DependenciesArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Determining column set
    #[arg(short = 'C', long = "columns", value_delimiter = ',', required = true)]
    pub columns: Vec<String>,
    /// Emit JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// YAML audit plan
    #[arg(short = 'p', long = "plan", required_unless_present = "init")]
    pub plan: Option<PathBuf>,
    /// Write a starter plan to this path instead of running one
    #[arg(long, conflicts_with = "plan")]
    pub init: Option<PathBuf>,
    /// Emit JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

/// Parses `B,C=B,C,D` into a composite key over `B` and `C` searched in the
/// alternatives `B`, `C` and `D`.
pub fn parse_join_clause(value: &str) -> Result<JoinClause, String> {
    let (keys, alternatives) = value
        .split_once('=')
        .ok_or_else(|| format!("Join clause '{value}' must look like KEYS=ALTERNATIVES"))?;
    let split = |list: &str| {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    let mut keys = split(keys);
    let alternatives = split(alternatives);
    if keys.is_empty() || alternatives.is_empty() {
        return Err(format!("Join clause '{value}' names no column on one side"));
    }
    let key = if keys.len() == 1 {
        JoinKey::Single(keys.remove(0))
    } else {
        JoinKey::Composite(keys)
    };
    Ok(JoinClause { key, alternatives })
}
