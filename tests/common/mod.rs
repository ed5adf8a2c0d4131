#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_audit::data::{Cell, Value};
use csv_audit::dataset::{Table, TableHandle};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("write temp file bytes");
        path
    }
}

/// Missing cell.
pub const NAN: Cell = None;

pub fn s(value: &str) -> Cell {
    Some(Value::from(value))
}

pub fn i(value: i64) -> Cell {
    Some(Value::Integer(value))
}

pub fn f(value: f64) -> Cell {
    Some(Value::Float(value))
}

pub fn ints(values: &[i64]) -> Vec<Cell> {
    values.iter().map(|v| i(*v)).collect()
}

pub fn texts(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|v| s(v)).collect()
}

pub fn handle(name: &str, columns: Vec<(&str, Vec<Cell>)>) -> TableHandle {
    TableHandle::new(name, Table::from_columns(columns))
}

pub fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn column_values(handle: &TableHandle, column: &str) -> Vec<Cell> {
    let idx = handle.table.column_index(column).expect("column exists");
    handle.table.column(idx).cloned().collect()
}

/// Two text columns mixing empty strings, repeats and missing cells.
pub fn df_test_r() -> TableHandle {
    handle(
        "df_test_r",
        vec![
            (
                "columna1",
                vec![
                    s("x"),
                    NAN,
                    NAN,
                    s(""),
                    s(""),
                    s("0"),
                    s("a"),
                    s("b"),
                    s("c"),
                    s("a"),
                    s("b"),
                    s("c"),
                    s("a"),
                    s("b"),
                    s("c"),
                    s("c"),
                ],
            ),
            (
                "columna2",
                vec![
                    s("0"),
                    NAN,
                    NAN,
                    s(""),
                    s(""),
                    s("x"),
                    s("1"),
                    s("2"),
                    s("3"),
                    s("1"),
                    s("2"),
                    s("3"),
                    s("1"),
                    s("2"),
                    NAN,
                    NAN,
                ],
            ),
        ],
    )
}

/// Table exercising every surrogate id band.
pub fn id_band_fixture() -> TableHandle {
    handle(
        "ids",
        vec![
            ("A", ints(&[1, 2, 3, 1, 4, 5, 6, 7])),
            (
                "B",
                texts(&["NC", "b", "c", "NC", "d", "e", "INDEFINIDA", "SIN DEFINIR"]),
            ),
            (
                "C",
                vec![s("X"), s("Y"), s("Z"), s("X"), s("V"), s("W"), NAN, s("U")],
            ),
            (
                "D",
                texts(&["alfa", "beta", "gamma", "alfa", "delta", "epsilon", "iota", "sigma"]),
            ),
            ("E", ints(&[11, 22, 33, 11, 44, 55, 66, 77])),
            (
                "F",
                vec![
                    NAN,
                    NAN,
                    s("cala"),
                    s("INDEFINIDO"),
                    s("rosa"),
                    s("lilium"),
                    s("NC"),
                    NAN,
                ],
            ),
        ],
    )
}
