//! Text and JSON rendering of audit results.

use std::fmt::Write as _;

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;

/// One result table: a title, column headers and stringified rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    pub fn new<S: Into<String>>(title: impl Into<String>, headers: Vec<S>) -> Self {
        Self {
            title: title.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.rows.push(row.into_iter().map(|v| v.to_string()).collect());
    }

    pub fn render(&self) -> String {
        let mut output = String::new();
        if !self.title.is_empty() {
            let _ = writeln!(output, "{}", self.title);
        }
        output.push_str(&render_table(&self.headers, &self.rows));
        output
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(flatten(cell).chars().count());
        }
    }
    let widths = widths.into_iter().map(|w| w.max(3)).collect::<Vec<_>>();

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{:<width$}", flatten(value), width = *width))
        .join("  ");
    line.trim_end().to_string()
}

fn flatten(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

/// Prints reports as aligned text, or as one JSON array when `json` is set.
pub fn emit(reports: &[Report], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        print!("{}", reports.iter().map(Report::render).join("\n"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_padded_to_the_widest_cell() {
        let rendered = render_table(
            &["column".to_string(), "pct".to_string()],
            &[vec!["a".to_string(), "12.5".to_string()]],
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "column  pct");
        assert_eq!(lines[1], "------  ----");
        assert_eq!(lines[2], "a       12.5");
    }

    #[test]
    fn report_serializes_with_title() {
        let mut report = Report::new("nulls", vec!["column", "percent"]);
        report.push(["A", "100"]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["title"], "nulls");
        assert_eq!(json["rows"][0][1], "100");
    }
}
