//! Audit plans.
//!
//! A plan is a YAML document naming the input tables, the quality checks to
//! run over them and the corrections to apply afterwards:
//!
//! ```yaml
//! sentinels: [INDEFINIDO, INDEFINIDA, SIN DEFINIR, NC]
//! output_dir: corrected
//! tables:
//!   - name: operadores
//!     path: padron-operadores.csv
//!     encoding: windows-1252
//!     snake_case_headers: true
//! checks:
//!   - kind: duplicates
//!     table: operadores
//!   - kind: range
//!     table: operadores
//!     column: anio
//!     min: 2000
//! corrections:
//!   - kind: dedupe
//! ```
//!
//! Relative table paths and `output_dir` resolve against the plan's directory.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::{
    cli::parse_delimiter,
    consistency::DEFAULT_NULL_THRESHOLD,
    data::{DEFAULT_SENTINELS, SentinelSet},
    existence::JoinSpec,
    yaml_provider,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPlan {
    #[serde(default = "default_sentinels")]
    pub sentinels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    pub tables: Vec<TableSource>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub corrections: Vec<Correction>,
}

fn default_sentinels() -> Vec<String> {
    DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSource {
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub renames: BTreeMap<String, String>,
    #[serde(default)]
    pub snake_case_headers: bool,
}

impl TableSource {
    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        self.delimiter
            .as_deref()
            .map(parse_delimiter)
            .transpose()
            .map_err(|err| anyhow!("Table '{}': {err}", self.name))
    }
}

/// One side of a consistency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedColumns {
    pub table: String,
    pub id: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    Duplicates {
        table: String,
        #[serde(default)]
        columns: Vec<String>,
    },
    Nulls {
        table: String,
        #[serde(default)]
        columns: Vec<String>,
    },
    Undefined {
        table: String,
        #[serde(default)]
        columns: Vec<String>,
    },
    Types {
        table: String,
        #[serde(default)]
        columns: Vec<String>,
    },
    Cardinality {
        table: String,
        left: String,
        right: String,
    },
    Consistency {
        left: KeyedColumns,
        right: KeyedColumns,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    Coverage {
        base: String,
        other: String,
        join: JoinSpec,
    },
    Range {
        table: String,
        column: String,
        #[serde(default)]
        min: f64,
        #[serde(default)]
        max: Option<f64>,
    },
    Dependencies {
        table: String,
        columns: Vec<String>,
    },
}

fn default_threshold() -> f64 {
    DEFAULT_NULL_THRESHOLD
}

impl Check {
    pub fn tables(&self) -> Vec<&str> {
        match self {
            Check::Duplicates { table, .. }
            | Check::Nulls { table, .. }
            | Check::Undefined { table, .. }
            | Check::Types { table, .. }
            | Check::Cardinality { table, .. }
            | Check::Range { table, .. }
            | Check::Dependencies { table, .. } => vec![table.as_str()],
            Check::Consistency { left, right, .. } => {
                vec![left.table.as_str(), right.table.as_str()]
            }
            Check::Coverage { base, other, .. } => vec![base.as_str(), other.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    /// Full-row deduplication of `tables` (every table when empty).
    Dedupe {
        #[serde(default)]
        tables: Vec<String>,
    },
    AssignIds {
        table: String,
        #[serde(default)]
        columns: Vec<String>,
    },
    ReassignIds {
        table: String,
        id_column: String,
        label_column: String,
    },
}

impl Correction {
    pub fn tables(&self) -> Vec<&str> {
        match self {
            Correction::Dedupe { tables } => tables.iter().map(String::as_str).collect(),
            Correction::AssignIds { table, .. } | Correction::ReassignIds { table, .. } => {
                vec![table.as_str()]
            }
        }
    }
}

impl AuditPlan {
    /// Loads and validates a plan, resolving relative paths against its
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let mut plan: AuditPlan = yaml_provider::load_from_path(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        plan.resolve_paths(base);
        plan.validate()?;
        Ok(plan)
    }

    pub fn from_yaml(input: &str) -> Result<Self> {
        let plan: AuditPlan = yaml_provider::from_str(input)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        yaml_provider::save_to_path(path, self)
    }

    pub fn sentinel_set(&self) -> SentinelSet {
        SentinelSet::new(self.sentinels.iter().cloned())
    }

    fn resolve_paths(&mut self, base: &Path) {
        for table in &mut self.tables {
            if table.path.is_relative() && table.path != Path::new("-") {
                table.path = base.join(&table.path);
            }
        }
        if let Some(dir) = &mut self.output_dir
            && dir.is_relative()
        {
            *dir = base.join(&*dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for table in &self.tables {
            if !names.insert(table.name.as_str()) {
                bail!("Table '{}' is declared more than once", table.name);
            }
            table.delimiter_byte()?;
        }
        let referenced = self
            .checks
            .iter()
            .flat_map(Check::tables)
            .chain(self.corrections.iter().flat_map(Correction::tables));
        for name in referenced {
            if !names.contains(name) {
                bail!("Plan refers to undeclared table '{name}'");
            }
        }
        for check in &self.checks {
            if let Check::Consistency { threshold, .. } = check
                && !(0.0..=1.0).contains(threshold)
            {
                bail!("Consistency threshold {threshold} is outside [0, 1]");
            }
        }
        Ok(())
    }

    /// Starter plan written by `audit --init`.
    pub fn example() -> Self {
        AuditPlan {
            sentinels: default_sentinels(),
            output_dir: Some(PathBuf::from("corrected")),
            tables: vec![TableSource {
                name: "operators".to_string(),
                path: PathBuf::from("operators.csv"),
                encoding: Some("windows-1252".to_string()),
                delimiter: None,
                renames: BTreeMap::new(),
                snake_case_headers: true,
            }],
            checks: vec![
                Check::Duplicates {
                    table: "operators".to_string(),
                    columns: Vec::new(),
                },
                Check::Nulls {
                    table: "operators".to_string(),
                    columns: Vec::new(),
                },
                Check::Types {
                    table: "operators".to_string(),
                    columns: Vec::new(),
                },
            ],
            corrections: vec![Correction::Dedupe { tables: Vec::new() }],
        }
    }
}
