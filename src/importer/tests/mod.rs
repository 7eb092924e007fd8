//! Pipeline-level import tests over spreadsheet files written to disk.


use rust_xlsxwriter::Workbook;
use std::path::Path;

/// One data row of a fixture export: timestamp text and sensor values
pub type FixtureRow<'a> = (&'a str, Vec<Option<f64>>);

/// Write an export with header, description and unit rows in the default layout
pub fn write_export(path: &Path, sensors: &[(&str, &str, &str)], rows: &[FixtureRow<'_>]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string(0, 0, "Zeitstempel").unwrap();
    for (i, (sensor_type, desc, unit)) in sensors.iter().enumerate() {
        let col = i as u16 + 1;
        sheet.write_string(0, col, *sensor_type).unwrap();
        sheet.write_string(1, col, "ID").unwrap();
        sheet.write_string(3, col, *desc).unwrap();
        sheet.write_string(4, col, *unit).unwrap();
    }
    for (r, (timestamp, values)) in rows.iter().enumerate() {
        let row = r as u32 + 5;
        sheet.write_string(row, 0, *timestamp).unwrap();
        for (c, value) in values.iter().enumerate() {
            if let Some(value) = value {
                sheet.write_number(row, c as u16 + 1, *value).unwrap();
            }
        }
    }

    workbook.save(path).unwrap();
}
