//! Rendering of warehouse query results for the console and report files.

use super::QueryResult;
use std::io::Write;

/// Widest column rendered in table output
const MAX_TABLE_COLUMN_WIDTH: usize = 50;

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    /// Box-drawn table (default)
    #[default]
    Table,
    /// JSON array of objects
    Json,
    /// One JSON object per line
    JsonLines,
    Csv,
    Tsv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "jsonlines" | "ndjson" => Ok(OutputFormat::JsonLines),
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            _ => Err(format!(
                "Unknown format: {}. Valid: table, json, jsonl, csv, tsv",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonLines => write!(f, "jsonl"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Tsv => write!(f, "tsv"),
        }
    }
}

/// Formatter for query results
pub struct QueryResultFormatter;

impl QueryResultFormatter {
    /// Format a query result to a string
    pub fn format(result: &QueryResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(result),
            OutputFormat::Json => Self::format_json(result),
            OutputFormat::JsonLines => Self::format_jsonl(result),
            OutputFormat::Csv => Self::format_csv(result),
            OutputFormat::Tsv => Self::format_tsv(result),
        }
    }

    /// Write formatted result to a writer
    pub fn write<W: Write>(
        result: &QueryResult,
        format: OutputFormat,
        writer: &mut W,
    ) -> std::io::Result<()> {
        writer.write_all(Self::format(result, format).as_bytes())
    }

    fn format_table(result: &QueryResult) -> String {
        if result.columns.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
        for row in &result.rows {
            for (w, val) in widths.iter_mut().zip(row) {
                *w = (*w).max(val.chars().count());
            }
        }
        widths
            .iter_mut()
            .for_each(|w| *w = (*w).min(MAX_TABLE_COLUMN_WIDTH));

        let mut output = Self::border(&widths, '┌', '┬', '┐');
        output.push_str(&Self::table_row(&result.columns, &widths));
        output.push_str(&Self::border(&widths, '├', '┼', '┤'));
        for row in &result.rows {
            output.push_str(&Self::table_row(row, &widths));
        }
        output.push_str(&Self::border(&widths, '└', '┴', '┘'));

        output.push_str(&format!(
            "{} row{}\n",
            result.rows.len(),
            if result.rows.len() == 1 { "" } else { "s" }
        ));
        output
    }

    fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, segments.join(&mid.to_string()), right)
    }

    fn table_row(values: &[String], widths: &[usize]) -> String {
        let mut line = String::from("│");
        for (val, width) in values.iter().zip(widths) {
            let cell = Self::truncate(val, *width);
            let pad = width.saturating_sub(cell.chars().count());
            line.push_str(&format!(" {}{} │", cell, " ".repeat(pad)));
        }
        line.push('\n');
        line
    }

    /// Shorten to `max_len` characters, marking the cut with an ellipsis
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
            format!("{}…", kept)
        }
    }

    fn json_object(columns: &[String], row: &[String]) -> serde_json::Value {
        let obj: serde_json::Map<String, serde_json::Value> = columns
            .iter()
            .zip(row)
            .map(|(col, val)| (col.clone(), Self::json_value(val)))
            .collect();
        serde_json::Value::Object(obj)
    }

    fn format_json(result: &QueryResult) -> String {
        let rows: Vec<serde_json::Value> = result
            .rows
            .iter()
            .map(|row| Self::json_object(&result.columns, row))
            .collect();
        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_jsonl(result: &QueryResult) -> String {
        result
            .rows
            .iter()
            .map(|row| {
                serde_json::to_string(&Self::json_object(&result.columns, row))
                    .unwrap_or_else(|_| "{}".to_string())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Map a rendered value back to the closest JSON type
    fn json_value(val: &str) -> serde_json::Value {
        if val == "NULL" {
            return serde_json::Value::Null;
        }
        if let Ok(n) = val.parse::<i64>() {
            return serde_json::Value::Number(n.into());
        }
        if let Some(num) = val
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return serde_json::Value::Number(num);
        }
        if val.eq_ignore_ascii_case("true") {
            return serde_json::Value::Bool(true);
        }
        if val.eq_ignore_ascii_case("false") {
            return serde_json::Value::Bool(false);
        }
        serde_json::Value::String(val.to_string())
    }

    fn format_csv(result: &QueryResult) -> String {
        let mut output = Self::csv_row(&result.columns);
        output.push('\n');
        for row in &result.rows {
            output.push_str(&Self::csv_row(row));
            output.push('\n');
        }
        output
    }

    fn csv_row(values: &[String]) -> String {
        values
            .iter()
            .map(|v| Self::csv_escape(v))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn csv_escape(val: &str) -> String {
        if val.contains(&[',', '"', '\n', '\r'][..]) {
            format!("\"{}\"", val.replace('"', "\"\""))
        } else {
            val.to_string()
        }
    }

    fn format_tsv(result: &QueryResult) -> String {
        let mut output = result.columns.join("\t");
        output.push('\n');
        for row in &result.rows {
            let escaped: Vec<String> = row
                .iter()
                .map(|v| v.replace('\t', "\\t").replace('\n', "\\n"))
                .collect();
            output.push_str(&escaped.join("\t"));
            output.push('\n');
        }
        output
    }
}
