//! Read-side operations over the published building store.

use crate::error::DataError;
use crate::models::{Building, Sensor};
use crate::store::{BuildingStore, SharedStore};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Building not found")]
    BuildingNotFound,

    #[error("Sensor not found")]
    SensorNotFound,

    #[error("Invalid time span")]
    OutOfRange,

    #[error("Invalid sensor selection")]
    InvalidSelection,

    #[error("Missing query parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Lookup misses that a caller can correct
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BuildingNotFound | Self::SensorNotFound | Self::OutOfRange | Self::InvalidSelection
        )
    }
}

impl From<DataError> for QueryError {
    fn from(err: DataError) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Values of one sensor within a time window, ascending
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSlice {
    pub sensor: String,
    pub points: Vec<(NaiveDateTime, Option<f64>)>,
}

/// Query front end; every call reads one consistent store snapshot
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<SharedStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<SharedStore>) -> Self {
        Self { store }
    }

    pub fn from_store(store: BuildingStore) -> Self {
        Self::new(Arc::new(SharedStore::new(store)))
    }

    pub fn shared_store(&self) -> &Arc<SharedStore> {
        &self.store
    }

    pub fn list_buildings(&self) -> Vec<String> {
        self.store.snapshot().names()
    }

    /// Fails with [`QueryError::BuildingNotFound`] for an unknown building
    pub fn require_building(&self, building: &str) -> QueryResult<()> {
        find_building(&self.store.snapshot(), building).map(|_| ())
    }

    pub fn list_sensors(&self, building: &str) -> QueryResult<Vec<Sensor>> {
        let snapshot = self.store.snapshot();
        Ok(find_building(&snapshot, building)?.sensors.clone())
    }

    /// Full value sequence of one sensor in index order
    pub fn sensor_column(&self, building: &str, sensor: &str) -> QueryResult<Vec<Option<f64>>> {
        let snapshot = self.store.snapshot();
        let building = find_building(&snapshot, building)?;
        if !building.has_sensor(sensor) {
            return Err(QueryError::SensorNotFound);
        }
        Ok(building.table.values(sensor)?)
    }

    pub fn timestamps(&self, building: &str) -> QueryResult<Vec<NaiveDateTime>> {
        let snapshot = self.store.snapshot();
        Ok(find_building(&snapshot, building)?.table.timestamps()?)
    }

    /// Values of `sensors` with `start <= t <= stop`.
    ///
    /// The window must overlap the building's data, and every requested
    /// sensor must belong to the building. Repeated sensors are returned once.
    pub fn slice(
        &self,
        building: &str,
        start: NaiveDateTime,
        stop: NaiveDateTime,
        sensors: &[String],
    ) -> QueryResult<Vec<SensorSlice>> {
        let snapshot = self.store.snapshot();
        let building = find_building(&snapshot, building)?;

        let (first, last) = building.table.bounds()?.ok_or(QueryError::OutOfRange)?;
        if start > last || stop < first {
            return Err(QueryError::OutOfRange);
        }
        if sensors.iter().any(|s| !building.has_sensor(s)) {
            return Err(QueryError::InvalidSelection);
        }

        let mut seen = HashSet::new();
        let selected: Vec<&str> = sensors
            .iter()
            .map(String::as_str)
            .filter(|s| seen.insert(*s))
            .collect();

        let window = building.table.slice(start, stop, &selected)?;
        selected
            .iter()
            .map(|sensor| -> QueryResult<SensorSlice> {
                Ok(SensorSlice {
                    sensor: sensor.to_string(),
                    points: window.points(sensor)?,
                })
            })
            .collect()
    }
}

fn find_building<'a>(store: &'a BuildingStore, name: &str) -> QueryResult<&'a Building> {
    store.get(name).ok_or(QueryError::BuildingNotFound)
}
