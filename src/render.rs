//! Table, JSON and CSV rendering of listings and batch reports.

use clap::ValueEnum;
use serde_json::{Map, Value};

use crate::error::MailcowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Cuts `s` to `max` characters, marking the cut with `..`.
pub fn trunc(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(2);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("..");
    out
}

/// String form of a JSON field: strings unquoted, null as empty.
pub fn field(item: &Value, key: &str) -> String {
    match item.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn active_mark(item: &Value) -> &'static str {
    if field(item, "active") == "1" {
        "✓"
    } else {
        "✗"
    }
}

/// Left-aligned columns, each at most `max_col` wide.
pub fn table(headers: &[&str], rows: &[Vec<String>], max_col: usize) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| trunc(c, max_col)).collect())
        .collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let widest = cells
                .iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0);
            widest.max(h.chars().count()).min(max_col.max(h.chars().count()))
        })
        .collect();

    let line = |row: &[String]| -> String {
        row.iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<width$}", width = *w))
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let header_line = line(&header);
    let rule_len = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);

    let mut out = String::new();
    out.push_str(&header_line);
    out.push('\n');
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

fn json_key(header: &str) -> String {
    header.to_lowercase().replace(' ', "_")
}

pub fn json_rows(headers: &[&str], rows: &[Vec<String>]) -> Result<String, MailcowError> {
    let items: Vec<Value> = rows
        .iter()
        .map(|row| {
            let obj: Map<String, Value> = headers
                .iter()
                .zip(row)
                .map(|(h, c)| (json_key(h), Value::String(c.clone())))
                .collect();
            Value::Object(obj)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&items)?)
}

pub fn csv_rows(headers: &[&str], rows: &[Vec<String>]) -> Result<String, MailcowError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| MailcowError::Other(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| MailcowError::Other(e.to_string()))
}

pub fn render(
    format: OutputFormat,
    headers: &[&str],
    rows: &[Vec<String>],
    max_col: usize,
) -> Result<String, MailcowError> {
    match format {
        OutputFormat::Table => Ok(table(headers, rows, max_col)),
        OutputFormat::Json => json_rows(headers, rows).map(|s| s + "\n"),
        OutputFormat::Csv => csv_rows(headers, rows),
    }
}

/// Raw API listing as pretty JSON.
pub fn pretty_json(items: &[Value]) -> Result<String, MailcowError> {
    Ok(serde_json::to_string_pretty(items)?)
}
