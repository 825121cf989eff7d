/// Tabular export of wave observations.
///
/// Flattens features into time-indexed rows: one row per feature, keyed by
/// the observation date, with one column per measurement or metadata field.
/// Columns can be renamed to their glossary descriptive names. This is a
/// pure reshape: nothing is aggregated, filtered or resampled.

use std::io;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::glossary;
use crate::model::{ClientError, Observation};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// `None` when the sensor reported no data.
    Number(Option<f64>),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => *v,
            Cell::Text(_) => None,
        }
    }

    /// CSV/text rendering; absent numbers render as an empty string.
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(Some(v)) => v.to_string(),
            Cell::Number(None) => String::new(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(Some(v)) => serializer.serialize_f64(*v),
            Cell::Number(None) => serializer.serialize_none(),
        }
    }
}

/// One table row: the observation date (the row index) plus its columns in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub date: DateTime<Utc>,
    pub columns: Vec<(String, Cell)>,
}

impl Row {
    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.columns.iter().find(|(k, _)| k == key).map(|(_, cell)| cell)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 1))?;
        map.serialize_entry("date", &self.date)?;
        for (key, cell) in &self.columns {
            map.serialize_entry(key, cell)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Reshaping
// ---------------------------------------------------------------------------

/// One row per feature, in feature order. Columns are the record's metadata
/// and measurement fields under their wire names; the date is the row key,
/// not a column, and passthrough geometry fields are left out.
pub fn to_rows(observation: &Observation) -> Vec<Row> {
    observation
        .features
        .iter()
        .map(|feature| {
            let p = &feature.properties;
            let mut columns = vec![
                ("id".to_string(), Cell::Text(p.id.clone())),
                ("sensor".to_string(), Cell::Text(p.sensor.clone())),
                ("institution".to_string(), Cell::Text(p.institution.clone())),
                ("type".to_string(), Cell::Text(p.endpoint.segment().to_string())),
            ];
            columns.extend(
                p.measurements()
                    .into_iter()
                    .map(|(code, value)| (code.to_string(), Cell::Number(value))),
            );
            Row {
                date: p.date,
                columns,
            }
        })
        .collect()
}

/// Replaces every column key found in the glossary with its descriptive
/// name when `use_descriptive_names` is set; other keys are untouched.
/// With the flag unset the rows come back as they went in.
pub fn rename_columns(mut rows: Vec<Row>, use_descriptive_names: bool) -> Vec<Row> {
    if !use_descriptive_names {
        return rows;
    }
    for row in &mut rows {
        for (key, _) in &mut row.columns {
            let renamed = glossary::descriptive_name_or_key(key).to_string();
            *key = renamed;
        }
    }
    rows
}

/// Rows for one observation, ordered by date (stable: ties keep feature
/// order), with optional descriptive column names.
pub fn export(observation: &Observation, use_descriptive_names: bool) -> Vec<Row> {
    export_all(std::slice::from_ref(observation), use_descriptive_names)
}

/// Concatenates rows from several observations and orders them by date.
pub fn export_all<'a, I>(observations: I, use_descriptive_names: bool) -> Vec<Row>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut rows: Vec<Row> = observations.into_iter().flat_map(to_rows).collect();
    rows.sort_by_key(|row| row.date);
    rename_columns(rows, use_descriptive_names)
}

impl Observation {
    /// Time-indexed table of this observation's features.
    pub fn to_table(&self, use_descriptive_names: bool) -> Vec<Row> {
        export(self, use_descriptive_names)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Header for a set of rows: `date` followed by the first row's keys.
fn header(rows: &[Row]) -> Vec<String> {
    let mut header = vec!["date".to_string()];
    if let Some(first) = rows.first() {
        header.extend(first.keys().map(str::to_string));
    }
    header
}

/// Writes rows as CSV. Dates are RFC 3339 (UTC, `Z` suffix); absent
/// measurements are empty fields.
pub fn write_csv<W: io::Write>(rows: &[Row], writer: W) -> Result<(), ClientError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let header = header(rows);
    csv_writer.write_record(&header)?;

    for row in rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.date.to_rfc3339_opts(SecondsFormat::Secs, true));
        for key in &header[1..] {
            record.push(row.get(key).map(Cell::render).unwrap_or_default());
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Renders rows as a fixed-width text table for terminal output.
pub fn format_table(rows: &[Row]) -> String {
    let header = header(rows);
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.date.format("%Y-%m-%d %H:%M:%S").to_string()];
            cells.extend(
                header[1..]
                    .iter()
                    .map(|key| row.get(key).map(Cell::render).unwrap_or_default()),
            );
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .map(|cells| cells[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(&header);
    out.push('\n');
    for cells in &body {
        out.push_str(&line(cells));
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
