use anyhow::{anyhow, Result};
use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::config::ReportConfig;

/// Summary of one CSV export
#[derive(Debug, Clone)]
pub struct ReportStats {
    pub rows: usize,
    pub columns: usize,
}

/// CSV reporter: whitelists material keys, flattens nested objects with
/// dot-notation and writes one row per material.
pub struct CsvReporter {
    columns: Vec<String>,
}

impl CsvReporter {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.columns.clone())
    }

    /// Build the header and rows for a collection of material objects.
    ///
    /// Columns follow whitelist order; a nested object contributes its
    /// dotted sub-columns in first-seen order. Materials missing a column
    /// get an empty cell, mirroring what `json_normalize` produced.
    pub fn rows(&self, materials: &[Value]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut header: Vec<String> = Vec::new();
        let mut flat_rows: Vec<Vec<(String, String)>> = Vec::new();

        for (index, material) in materials.iter().enumerate() {
            let object = material
                .as_object()
                .ok_or_else(|| anyhow!("dump entry {} is not an object", index))?;

            let mut row: Vec<(String, String)> = Vec::new();
            for key in &self.columns {
                if let Some(value) = object.get(key) {
                    flatten_value(key, value, &mut row);
                }
            }

            for (column, _) in &row {
                if !header.contains(column) {
                    header.push(column.clone());
                }
            }

            flat_rows.push(row);
        }

        let rows = flat_rows
            .into_iter()
            .map(|row| {
                header
                    .iter()
                    .map(|column| {
                        row.iter()
                            .find(|(c, _)| c == column)
                            .map(|(_, cell)| cell.clone())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Ok((header, rows))
    }

    /// Read a JSON dump and write the CSV report
    pub async fn write_report(&self, json_path: &Path, csv_path: &Path) -> Result<ReportStats> {
        let raw = tokio::fs::read_to_string(json_path).await?;
        let materials: Vec<Value> = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("cannot parse {}: {}", json_path.display(), e))?;

        let (header, rows) = self.rows(&materials)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        // An empty dump produces an empty file, not an empty header record
        if !header.is_empty() {
            writer.write_record(&header)?;
            for row in &rows {
                writer.write_record(row)?;
            }
        }
        let data = writer
            .into_inner()
            .map_err(|e| anyhow!("cannot flush CSV writer: {}", e))?;
        tokio::fs::write(csv_path, data).await?;

        info!(
            "💾 Wrote {} rows x {} columns to {}",
            rows.len(),
            header.len(),
            csv_path.display()
        );

        Ok(ReportStats {
            rows: rows.len(),
            columns: header.len(),
        })
    }
}

/// Flatten one whitelisted value into dotted (column, cell) pairs
fn flatten_value(prefix: &str, value: &Value, row: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_value(&format!("{}.{}", prefix, key), nested, row);
            }
        }
        other => row.push((prefix.to_string(), render_cell(other))),
    }
}

/// Render a scalar (or array) JSON value as a CSV cell
fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
