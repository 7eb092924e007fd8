//! Core data structures shared across ingestion, the store and the query layer.

use crate::table::TimeSeriesTable;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A named measurement channel of a building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub desc: String,
    pub unit: String,
}

impl Sensor {
    pub fn new(
        sensor_type: impl Into<String>,
        desc: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            sensor_type: sensor_type.into(),
            desc: desc.into(),
            unit: unit.into(),
        }
    }
}

/// A building with its sensor descriptors and their time series
#[derive(Debug, Clone)]
pub struct Building {
    pub name: String,
    pub sensors: Vec<Sensor>,
    pub table: TimeSeriesTable,
}

impl Building {
    pub fn new(name: impl Into<String>, sensors: Vec<Sensor>, table: TimeSeriesTable) -> Self {
        Self {
            name: name.into(),
            sensors,
            table,
        }
    }

    /// Derive the building name from an export path: the file name up to its first dot
    pub fn name_from_path(path: &Path) -> String {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match file_name.split_once('.') {
            Some((stem, _)) => stem.to_string(),
            None => file_name,
        }
    }

    pub fn has_sensor(&self, sensor_type: &str) -> bool {
        self.sensors.iter().any(|s| s.sensor_type == sensor_type)
    }

    pub fn sensor_types(&self) -> impl Iterator<Item = &str> {
        self.sensors.iter().map(|s| s.sensor_type.as_str())
    }
}

/// Import statistics
#[derive(Debug, Default, Clone)]
pub struct ImportStats {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub total_rows: usize,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_name_from_path_stops_at_first_dot() {
        assert_eq!(Building::name_from_path(&PathBuf::from("data/EF 40a.xls")), "EF 40a");
        assert_eq!(Building::name_from_path(&PathBuf::from("EF.40.export.xls")), "EF");
        assert_eq!(Building::name_from_path(&PathBuf::from("/x/noext")), "noext");
    }

    #[test]
    fn test_sensor_serializes_type_field() {
        let sensor = Sensor::new("Temperatur", "Wetterstation", "°C");
        let json = serde_json::to_value(&sensor).unwrap();
        assert_eq!(json["type"], "Temperatur");
        assert_eq!(json["desc"], "Wetterstation");
        assert_eq!(json["unit"], "°C");
    }
}
