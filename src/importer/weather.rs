//! External weather merge.
//!
//! A data root holds at most one delimited weather file. Its third column is
//! the observation timestamp and its fourth the outdoor temperature; every
//! other column is ignored. The temperature is left-joined onto every
//! building as the `Temperatur` sensor.

use crate::config::MissingWeatherPolicy;
use crate::constants::{WEATHER_TEMPERATURE_COLUMN, WEATHER_TIMESTAMP_COLUMN, weather_sensor};
use crate::error::{DataError, Result};
use crate::importer::discovery::FileDiscovery;
use crate::models::Sensor;
use crate::store::BuildingStore;
use crate::timestamp::parse_timestamp;
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What a merge run did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherOutcome {
    /// No weather file present; no building was touched
    Skipped,
    Merged {
        source: PathBuf,
        readings: usize,
        buildings: usize,
    },
}

#[derive(Debug, Clone)]
pub struct WeatherMerger {
    discovery: FileDiscovery,
    extension: String,
    separator: u8,
    missing: MissingWeatherPolicy,
}

impl WeatherMerger {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            discovery: FileDiscovery::new(root),
            extension: extension.into(),
            separator: b',',
            missing: MissingWeatherPolicy::default(),
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_missing_policy(mut self, policy: MissingWeatherPolicy) -> Self {
        self.missing = policy;
        self
    }

    /// Locate the weather file and merge it into every building of `store`
    pub fn merge(&self, store: &mut BuildingStore) -> Result<WeatherOutcome> {
        let mut files = self.discovery.discover(&self.extension)?;

        let source = match files.len() {
            0 => return self.handle_missing(),
            1 => files.remove(0),
            _ => return Err(DataError::AmbiguousWeatherSource { files }),
        };

        let readings = read_temperatures(&source, self.separator)?;
        info!(
            "Merging {} temperature readings from {}",
            readings.len(),
            source.display()
        );

        let mut buildings = 0;
        for building in store.iter_mut() {
            let matched = building.table.join_lookup(weather_sensor::TYPE, &readings)?;
            if !building.has_sensor(weather_sensor::TYPE) {
                building.sensors.push(Sensor::new(
                    weather_sensor::TYPE,
                    weather_sensor::DESC,
                    weather_sensor::UNIT,
                ));
            }
            debug!(
                "{}: {} of {} rows matched a temperature reading",
                building.name,
                matched,
                building.table.height()
            );
            buildings += 1;
        }

        Ok(WeatherOutcome::Merged {
            source,
            readings: readings.len(),
            buildings,
        })
    }

    fn handle_missing(&self) -> Result<WeatherOutcome> {
        match self.missing {
            MissingWeatherPolicy::Skip => {
                warn!(
                    "No *.{} weather file under {}, buildings keep their sensors unchanged",
                    self.extension,
                    self.discovery.root().display()
                );
                Ok(WeatherOutcome::Skipped)
            }
            MissingWeatherPolicy::Abort => Err(DataError::MissingWeatherSource {
                dir: self.discovery.root().to_path_buf(),
                extension: self.extension.clone(),
            }),
        }
    }
}

/// Read the timestamp and temperature columns of a weather file.
///
/// Rows with an empty temperature are skipped. For repeated timestamps the
/// later row wins.
pub fn read_temperatures(path: &Path, separator: u8) -> Result<HashMap<NaiveDateTime, f64>> {
    let format_error = |reason: String| DataError::WeatherFormat {
        path: path.to_path_buf(),
        reason,
    };

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .into_reader_with_file_handle(File::open(path)?)
        .finish()?;

    let columns = frame.get_columns();
    if columns.len() <= WEATHER_TEMPERATURE_COLUMN {
        return Err(format_error(format!(
            "expected at least {} columns, found {}",
            WEATHER_TEMPERATURE_COLUMN + 1,
            columns.len()
        )));
    }
    let timestamps = columns[WEATHER_TIMESTAMP_COLUMN].str()?;
    let temperatures = columns[WEATHER_TEMPERATURE_COLUMN].str()?;

    let mut readings = HashMap::with_capacity(frame.height());
    for (line, (ts, temp)) in timestamps.into_iter().zip(temperatures).enumerate() {
        // Header is line 1
        let line = line + 2;
        let Some(temp) = temp.map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        let ts = ts
            .and_then(parse_timestamp)
            .ok_or_else(|| format_error(format!("line {line}: invalid timestamp {ts:?}")))?;
        let value = temp
            .parse::<f64>()
            .map_err(|_| format_error(format!("line {line}: invalid temperature '{temp}'")))?;
        readings.insert(ts, value);
    }

    Ok(readings)
}
