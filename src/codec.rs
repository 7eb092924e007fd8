//! Canonical transport form of a [`BuildingStore`].
//!
//! The store travels as one JSON object keyed by building name, in store
//! order:
//!
//! ```json
//! {
//!   "EF 40": {
//!     "name": "EF 40",
//!     "sensors": [{"type": "Wärme", "desc": "Wärmeenergie", "unit": "kWh"}],
//!     "dataframe": "{\"Wärme\":{\"1622505600000\":1.5,\"1622506500000\":null}}"
//!   }
//! }
//! ```
//!
//! `dataframe` is itself JSON text: column name to a map of epoch
//! milliseconds to value. The external services exchange it wrapped in an
//! [`Envelope`].

use crate::error::{DataError, Result};
use crate::models::{Building, Sensor};
use crate::store::BuildingStore;
use crate::table::TimeSeriesTable;
use crate::timestamp::{from_epoch_millis, to_epoch_millis};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Sensor descriptor as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRecord {
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub desc: String,
    pub unit: String,
}

impl From<&Sensor> for SensorRecord {
    fn from(sensor: &Sensor) -> Self {
        Self {
            sensor_type: sensor.sensor_type.clone(),
            desc: sensor.desc.clone(),
            unit: sensor.unit.clone(),
        }
    }
}

impl From<SensorRecord> for Sensor {
    fn from(record: SensorRecord) -> Self {
        Sensor::new(record.sensor_type, record.desc, record.unit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub name: String,
    pub sensors: Vec<SensorRecord>,
    pub dataframe: String,
}

/// Request and response body of every collaborator call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub payload: String,
}

impl Envelope {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

pub fn encode_building(building: &Building) -> Result<BuildingRecord> {
    Ok(BuildingRecord {
        name: building.name.clone(),
        sensors: building.sensors.iter().map(SensorRecord::from).collect(),
        dataframe: encode_table(&building.table)?,
    })
}

/// Serialize the whole store into canonical text
pub fn encode_store(store: &BuildingStore) -> Result<String> {
    let mut top = Map::with_capacity(store.len());
    for building in store.iter() {
        let record = encode_building(building)?;
        top.insert(building.name.clone(), serde_json::to_value(record)?);
    }
    Ok(serde_json::to_string(&Value::Object(top))?)
}

/// Column-oriented JSON text of a table
pub fn encode_table(table: &TimeSeriesTable) -> Result<String> {
    let keys: Vec<String> = table
        .timestamps()?
        .iter()
        .map(|ts| to_epoch_millis(ts).to_string())
        .collect();

    let mut columns = Map::new();
    for name in table.column_names() {
        let cells: Map<String, Value> = keys
            .iter()
            .cloned()
            .zip(table.values(&name)?)
            .map(|(key, value)| (key, value.map_or(Value::Null, Value::from)))
            .collect();
        columns.insert(name, Value::Object(cells));
    }
    Ok(serde_json::to_string(&Value::Object(columns))?)
}

pub fn decode_building(record: BuildingRecord) -> Result<Building> {
    let table = decode_table(&record.dataframe)?;
    let sensors = record.sensors.into_iter().map(Sensor::from).collect();
    Ok(Building::new(record.name, sensors, table))
}

/// Rebuild a store from canonical text, keeping the payload's order
pub fn decode_store(text: &str) -> Result<BuildingStore> {
    let top: Map<String, Value> = serde_json::from_str(text)?;
    let mut store = BuildingStore::new();
    for (key, value) in top {
        let record: BuildingRecord = serde_json::from_value(value)?;
        if record.name != key {
            return Err(DataError::codec(format!(
                "entry '{}' carries building name '{}'",
                key, record.name
            )));
        }
        store.insert(decode_building(record)?);
    }
    Ok(store)
}

/// Parse column-oriented JSON text back into a table.
///
/// The index is the union of all column keys; a column lacking a key has a
/// missing value there.
pub fn decode_table(text: &str) -> Result<TimeSeriesTable> {
    let columns: Map<String, Value> = serde_json::from_str(text)?;

    let mut decoded: Vec<(String, HashMap<NaiveDateTime, Option<f64>>)> =
        Vec::with_capacity(columns.len());
    let mut index = BTreeSet::new();

    for (name, cells) in columns {
        let Value::Object(cells) = cells else {
            return Err(DataError::codec(format!("column '{name}' is not an object")));
        };
        let mut values = HashMap::with_capacity(cells.len());
        for (key, cell) in cells {
            let ts = key
                .parse::<i64>()
                .ok()
                .and_then(from_epoch_millis)
                .ok_or_else(|| {
                    DataError::codec(format!("column '{name}': '{key}' is not an epoch timestamp"))
                })?;
            let value = match cell {
                Value::Null => None,
                Value::Number(n) => n.as_f64(),
                other => {
                    return Err(DataError::codec(format!(
                        "column '{name}': value {other} at {key} is not numeric"
                    )));
                }
            };
            index.insert(ts);
            values.insert(ts, value);
        }
        decoded.push((name, values));
    }

    let timestamps: Vec<NaiveDateTime> = index.into_iter().collect();
    let columns = decoded
        .into_iter()
        .map(|(name, values)| {
            let aligned = timestamps
                .iter()
                .map(|ts| values.get(ts).copied().flatten())
                .collect();
            (name, aligned)
        })
        .collect();

    TimeSeriesTable::from_columns(timestamps.into_iter().map(Some).collect(), columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M").unwrap()
    }

    fn sample_store() -> BuildingStore {
        let table = TimeSeriesTable::from_columns(
            vec![Some(ts("2021-06-01 00:00")), Some(ts("2021-06-01 00:15"))],
            vec![
                ("Wärme".to_string(), vec![Some(1.5), None]),
                ("Temperatur".to_string(), vec![Some(12.25), Some(-3.0)]),
            ],
        )
        .unwrap();
        let sensors = vec![
            Sensor::new("Wärme", "Wärmeenergie Tarif 1", "kWh"),
            Sensor::new("Temperatur", "Wetterstation", "°C"),
        ];
        [
            Building::new("EF 42", sensors.clone(), table.clone()),
            Building::new("EF 40", sensors, table),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_table_text_is_column_oriented_epoch_millis() {
        let table = TimeSeriesTable::from_columns(
            vec![Some(ts("2021-06-01 00:00"))],
            vec![("Wärme".to_string(), vec![None])],
        )
        .unwrap();
        assert_eq!(
            encode_table(&table).unwrap(),
            r#"{"Wärme":{"1622505600000":null}}"#
        );
    }

    #[test]
    fn test_store_round_trip() {
        let store = sample_store();
        let decoded = decode_store(&encode_store(&store).unwrap()).unwrap();

        assert_eq!(decoded.names(), vec!["EF 42", "EF 40"]);
        for (original, restored) in store.iter().zip(decoded.iter()) {
            assert_eq!(original.sensors, restored.sensors);
            assert_eq!(original.table.column_names(), restored.table.column_names());
            assert_eq!(
                original.table.timestamps().unwrap(),
                restored.table.timestamps().unwrap()
            );
            for column in original.table.column_names() {
                let before = original.table.values(&column).unwrap();
                let after = restored.table.values(&column).unwrap();
                for (a, b) in before.iter().zip(&after) {
                    match (a, b) {
                        (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9),
                        (None, None) => {}
                        other => panic!("Value mismatch in {column}: {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_record_uses_wire_field_names() {
        let text = encode_store(&sample_store()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let record = &value["EF 40"];
        assert_eq!(record["name"], "EF 40");
        assert_eq!(record["sensors"][1]["type"], "Temperatur");
        assert!(record["dataframe"].is_string());
    }

    #[test]
    fn test_decode_unions_column_keys() {
        let table = decode_table(r#"{"a":{"0":1.0},"b":{"900000":2.0}}"#).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.values("a").unwrap(), vec![Some(1.0), None]);
        assert_eq!(table.values("b").unwrap(), vec![None, Some(2.0)]);
    }

    #[test]
    fn test_decode_rejects_malformed_payloads() {
        assert!(decode_store("[]").is_err());
        assert!(matches!(
            decode_table(r#"{"a":{"yesterday":1.0}}"#),
            Err(DataError::Codec { .. })
        ));
        assert!(matches!(
            decode_table(r#"{"a":{"0":"warm"}}"#),
            Err(DataError::Codec { .. })
        ));
        let mismatched = r#"{"EF 40":{"name":"EF 41","sensors":[],"dataframe":"{}"}}"#;
        assert!(matches!(decode_store(mismatched), Err(DataError::Codec { .. })));
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_string(&Envelope::new("{}")).unwrap();
        assert_eq!(json, r#"{"payload":"{}"}"#);
    }
}
