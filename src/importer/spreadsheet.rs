//! Building spreadsheet export parsing.
//!
//! Every export holds a single sheet laid out as:
//!
//! ```text
//! row 1   Datetime | <sensor type> | <sensor type> | ...   header
//! row 4   -        | <description> | <description> | ...
//! row 5   -        | <unit>        | <unit>        | ...
//! row 6.. <time>   | <value>       | <value>       | ...   newest first
//! ```
//!
//! The parser turns such a sheet into a [`Building`] whose table is indexed
//! by DST-corrected, ascending timestamps.

use crate::constants::{TIMESTAMP_COLUMN, sheet_rows};
use crate::dst::{self, TimestampColumn};
use crate::error::{DataError, Result};
use crate::models::{Building, Sensor};
use crate::table::TimeSeriesTable;
use crate::timestamp::{from_excel_serial, parse_timestamp};
use calamine::{Data, DataType, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// 0-based sheet row positions of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub header_row: usize,
    pub description_row: usize,
    pub unit_row: usize,
    pub first_data_row: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header_row: sheet_rows::HEADER,
            description_row: sheet_rows::DESCRIPTION,
            unit_row: sheet_rows::UNIT,
            first_data_row: sheet_rows::FIRST_DATA,
        }
    }
}

impl SheetLayout {
    /// Rows must appear in header, description, unit, data order
    pub fn is_consistent(&self) -> bool {
        self.header_row < self.first_data_row
            && self.description_row < self.first_data_row
            && self.unit_row < self.first_data_row
    }
}

/// Parser for building spreadsheet exports
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetParser {
    layout: SheetLayout,
}

impl SpreadsheetParser {
    pub fn new(layout: SheetLayout) -> Self {
        Self { layout }
    }

    /// Parse one export file into a building named after the file
    pub fn parse_file(&self, path: &Path) -> Result<Building> {
        let rows = read_first_sheet(path)?;
        self.parse_rows(Building::name_from_path(path), path, &rows)
    }

    /// Parse an already loaded sheet grid
    pub fn parse_rows(&self, name: String, path: &Path, rows: &[Vec<Data>]) -> Result<Building> {
        let layout = &self.layout;
        let header = rows
            .get(layout.header_row)
            .ok_or_else(|| DataError::parse_failure(path, "sheet has no header row"))?;
        let column_names = header_names(header);
        if column_names.is_empty() {
            return Err(DataError::parse_failure(path, "header row is empty"));
        }

        let metadata_row = |index: usize, what: &str| {
            rows.get(index).ok_or_else(|| {
                DataError::parse_failure(
                    path,
                    format!("sheet has {} rows, {} row {} is missing", rows.len(), what, index + 1),
                )
            })
        };
        let descriptions = metadata_row(layout.description_row, "description")?;
        let units = metadata_row(layout.unit_row, "unit")?;

        let sensors: Vec<Sensor> = column_names
            .iter()
            .enumerate()
            .skip(1)
            .map(|(col, name)| {
                Sensor::new(
                    name.clone(),
                    cell_text(descriptions.get(col)),
                    cell_text(units.get(col)),
                )
            })
            .collect();

        // Exports list the newest reading first
        let data_rows: Vec<(usize, &Vec<Data>)> = rows
            .iter()
            .enumerate()
            .skip(layout.first_data_row)
            .filter(|(_, row)| !row.iter().all(|cell| matches!(cell, Data::Empty)))
            .rev()
            .collect();

        let mut timestamps = Vec::with_capacity(data_rows.len());
        let mut columns: Vec<(String, Vec<Option<f64>>)> = sensors
            .iter()
            .map(|s| (s.sensor_type.clone(), Vec::with_capacity(data_rows.len())))
            .collect();

        for (row_index, row) in &data_rows {
            let ts = coerce_timestamp(row.first()).map_err(|reason| {
                DataError::parse_failure(
                    path,
                    format!("row {}, column '{}': {}", row_index + 1, TIMESTAMP_COLUMN, reason),
                )
            })?;
            timestamps.push(ts);

            for (offset, (sensor_type, values)) in columns.iter_mut().enumerate() {
                let value = coerce_value(row.get(offset + 1)).map_err(|reason| {
                    DataError::parse_failure(
                        path,
                        format!("row {}, column '{}': {}", row_index + 1, sensor_type, reason),
                    )
                })?;
                values.push(value);
            }
        }

        let mut index = TimestampColumn::local(timestamps);
        dst::correct(&mut index);
        let table = TimeSeriesTable::from_columns(index.into_values(), columns)?;

        debug!(
            "Parsed {}: {} sensors, {} rows",
            path.display(),
            sensors.len(),
            table.height()
        );

        Ok(Building::new(name, sensors, table))
    }
}

/// Read the first worksheet as a dense grid anchored at cell A1
fn read_first_sheet(path: &Path) -> Result<Vec<Vec<Data>>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| DataError::parse_failure(path, e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataError::parse_failure(path, "workbook has no sheets"))?
        .map_err(|e| DataError::parse_failure(path, e.to_string()))?;

    // Ranges only cover used cells; re-anchor so row and column numbers match the sheet
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Vec<Vec<Data>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Data::Empty; col_offset];
        cells.extend_from_slice(row);
        grid.push(cells);
    }
    Ok(grid)
}

/// Sensor names from the header row.
///
/// The first column is always the timestamp. Blank cells become
/// `Unnamed: {i}` and repeated names get a `.{n}` suffix, matching the
/// names the downstream services already know.
fn header_names(header: &[Data]) -> Vec<String> {
    let last_used = header
        .iter()
        .rposition(|cell| !matches!(cell, Data::Empty))
        .map_or(0, |i| i + 1);

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(last_used);
    for (col, cell) in header.iter().take(last_used).enumerate() {
        let base = if col == 0 {
            TIMESTAMP_COLUMN.to_string()
        } else {
            match cell {
                Data::Empty => format!("Unnamed: {col}"),
                other => other.to_string().trim().to_string(),
            }
        };

        let mut name = base.clone();
        let mut suffix = 0;
        while seen.contains(&name) {
            suffix += 1;
            name = format!("{base}.{suffix}");
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

fn coerce_timestamp(cell: Option<&Data>) -> std::result::Result<Option<NaiveDateTime>, String> {
    match cell {
        None | Some(Data::Empty) => Ok(None),
        Some(Data::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Data::String(text)) => parse_timestamp(text)
            .map(Some)
            .ok_or_else(|| format!("'{text}' is not a timestamp")),
        Some(Data::Float(serial)) => from_excel_serial(*serial)
            .map(Some)
            .ok_or_else(|| format!("{serial} is not a valid date serial")),
        Some(Data::Int(serial)) => from_excel_serial(*serial as f64)
            .map(Some)
            .ok_or_else(|| format!("{serial} is not a valid date serial")),
        Some(Data::DateTime(dt)) if from_excel_serial(dt.as_f64()).is_none() => {
            Err(format!("{} is not a valid date serial", dt.as_f64()))
        }
        Some(cell @ (Data::DateTime(_) | Data::DateTimeIso(_))) => cell
            .as_datetime()
            .map(Some)
            .ok_or_else(|| format!("'{cell}' is not a timestamp")),
        Some(other) => Err(format!("'{other}' is not a timestamp")),
    }
}

fn coerce_value(cell: Option<&Data>) -> std::result::Result<Option<f64>, String> {
    match cell {
        None | Some(Data::Empty) | Some(Data::Error(_)) => Ok(None),
        Some(Data::Float(v)) => Ok(Some(*v)),
        Some(Data::Int(v)) => Ok(Some(*v as f64)),
        Some(Data::Bool(v)) => Ok(Some(if *v { 1.0 } else { 0.0 })),
        Some(Data::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                text.parse::<f64>()
                    .map(Some)
                    .map_err(|_| format!("'{text}' is not a number"))
            }
        }
        Some(other) => Err(format!("'{other}' is not a number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    fn ts(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M").unwrap()
    }

    /// Export grid with the default layout, newest row first
    fn export_grid(data: Vec<Vec<Data>>) -> Vec<Vec<Data>> {
        let mut grid = vec![
            vec![s("Zeitstempel"), s("Wärme"), s("Elektrizität")],
            vec![Data::Empty, s("ID 17"), s("ID 18")],
            vec![Data::Empty, Data::Empty, Data::Empty],
            vec![Data::Empty, s("Wärmeenergie Tarif 1"), s("WV+ Arbeit tariflos")],
            vec![Data::Empty, s("kWh"), s("kWh")],
        ];
        grid.extend(data);
        grid
    }

    fn parse(grid: &[Vec<Data>]) -> Result<Building> {
        SpreadsheetParser::default().parse_rows("EF 40".to_string(), &PathBuf::from("EF 40.xls"), grid)
    }

    #[test]
    fn test_parse_reads_sensors_and_reverses_rows() {
        let grid = export_grid(vec![
            vec![s("2021-01-01 00:30:00"), Data::Float(3.0), Data::Int(30)],
            vec![s("2021-01-01 00:15:00"), Data::Float(2.0), Data::Empty],
            vec![s("2021-01-01 00:00:00"), s("1.5"), Data::Float(10.0)],
        ]);

        let building = parse(&grid).unwrap();

        assert_eq!(building.name, "EF 40");
        assert_eq!(
            building.sensors,
            vec![
                Sensor::new("Wärme", "Wärmeenergie Tarif 1", "kWh"),
                Sensor::new("Elektrizität", "WV+ Arbeit tariflos", "kWh"),
            ]
        );
        assert_eq!(
            building.table.timestamps().unwrap(),
            vec![ts("2021-01-01 00:00"), ts("2021-01-01 00:15"), ts("2021-01-01 00:30")]
        );
        assert_eq!(
            building.table.values("Wärme").unwrap(),
            vec![Some(1.5), Some(2.0), Some(3.0)]
        );
        assert_eq!(
            building.table.values("Elektrizität").unwrap(),
            vec![Some(10.0), None, Some(30.0)]
        );
    }

    #[test]
    fn test_parse_applies_dst_correction() {
        let grid = export_grid(vec![
            vec![s("2021-07-01 12:15:00"), Data::Float(2.0), Data::Float(2.0)],
            vec![s("2021-07-01 12:00:00"), Data::Float(1.0), Data::Float(1.0)],
        ]);

        let building = parse(&grid).unwrap();
        assert_eq!(
            building.table.timestamps().unwrap(),
            vec![ts("2021-07-01 11:00"), ts("2021-07-01 11:15")]
        );
    }

    #[test]
    fn test_autumn_duplicates_yield_distinct_index() {
        let grid = export_grid(vec![
            vec![s("2020-10-25 02:30:00"), Data::Float(3.0), Data::Float(3.0)],
            vec![s("2020-10-25 02:00:00"), Data::Float(2.0), Data::Float(2.0)],
            vec![s("2020-10-25 02:00:00"), Data::Float(1.0), Data::Float(1.0)],
        ]);

        let timestamps = parse(&grid).unwrap().table.timestamps().unwrap();
        assert_eq!(timestamps.len(), 2);
        assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_non_numeric_value_is_parse_failure() {
        let grid = export_grid(vec![vec![
            s("2021-01-01 00:00:00"),
            s("defekt"),
            Data::Float(1.0),
        ]]);

        match parse(&grid).unwrap_err() {
            DataError::ParseFailure { reason, .. } => {
                assert!(reason.contains("'Wärme'"));
                assert!(reason.contains("defekt"));
            }
            other => panic!("Expected ParseFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_timestamp_is_parse_failure() {
        let grid = export_grid(vec![vec![s("gestern"), Data::Float(1.0), Data::Float(1.0)]]);
        assert!(matches!(parse(&grid), Err(DataError::ParseFailure { .. })));
    }

    #[test]
    fn test_out_of_range_serial_is_parse_failure() {
        let grid = export_grid(vec![
            vec![s("2021-01-01 00:15:00"), Data::Float(2.0), Data::Float(2.0)],
            vec![Data::Float(-1e300), Data::Float(1.0), Data::Float(1.0)],
        ]);
        match parse(&grid).unwrap_err() {
            DataError::ParseFailure { reason, .. } => assert!(reason.contains("date serial")),
            other => panic!("Expected ParseFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_metadata_rows_is_parse_failure() {
        let grid = vec![vec![s("Zeit"), s("Wärme")], vec![Data::Empty, s("x")]];
        assert!(matches!(parse(&grid), Err(DataError::ParseFailure { .. })));
    }

    #[test]
    fn test_blank_rows_and_error_cells() {
        let grid = export_grid(vec![
            vec![s("2021-01-01 00:15:00"), Data::Error(calamine::CellErrorType::Div0), Data::Float(2.0)],
            vec![Data::Empty, Data::Empty, Data::Empty],
            vec![s("2021-01-01 00:00:00"), Data::Float(1.0), Data::Float(1.0)],
        ]);

        let building = parse(&grid).unwrap();
        assert_eq!(building.table.height(), 2);
        assert_eq!(building.table.values("Wärme").unwrap(), vec![Some(1.0), None]);
    }

    #[test]
    fn test_header_names_disambiguate_duplicates_and_blanks() {
        let header = vec![s("Zeit"), s("Wärme"), s("Wärme"), Data::Empty, s("Wärme"), Data::Empty];
        assert_eq!(
            header_names(&header),
            vec!["Datetime", "Wärme", "Wärme.1", "Unnamed: 3", "Wärme.2"]
        );
    }

    #[test]
    fn test_excel_serial_timestamps() {
        assert_eq!(
            coerce_timestamp(Some(&Data::Float(44197.0))).unwrap(),
            Some(ts("2021-01-01 00:00"))
        );
        assert_eq!(coerce_timestamp(Some(&Data::Empty)).unwrap(), None);
    }

    #[test]
    fn test_layout_consistency() {
        assert!(SheetLayout::default().is_consistent());
        let broken = SheetLayout {
            first_data_row: 2,
            ..SheetLayout::default()
        };
        assert!(!broken.is_consistent());
    }
}
