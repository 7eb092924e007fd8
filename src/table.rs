//! Timestamp-indexed sensor table backed by a polars `DataFrame`.
//!
//! The frame's first column is always [`TIMESTAMP_COLUMN`] with dtype
//! `Datetime(ms)`; every following column is a nullable `Float64` series
//! named after a sensor type. The index is ascending and free of duplicates.

use crate::constants::TIMESTAMP_COLUMN;
use crate::error::{DataError, Result};
use crate::timestamp::{from_epoch_millis, to_epoch_millis};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    frame: DataFrame,
}

impl TimeSeriesTable {
    /// Build a table from a timestamp column and named value columns.
    ///
    /// Rows without a timestamp are dropped. Rows are ordered by timestamp
    /// (stable) and for repeated timestamps only the first row is kept.
    /// `NaN` cells are stored as missing.
    pub fn from_columns(
        timestamps: Vec<Option<NaiveDateTime>>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        for (name, values) in &columns {
            if values.len() != timestamps.len() {
                return Err(DataError::TableShape {
                    reason: format!(
                        "column '{}' has {} values but the index has {} entries",
                        name,
                        values.len(),
                        timestamps.len()
                    ),
                });
            }
        }

        let mut order: Vec<(usize, NaiveDateTime)> = timestamps
            .iter()
            .enumerate()
            .filter_map(|(row, ts)| ts.map(|ts| (row, ts)))
            .collect();
        let untimed = timestamps.len() - order.len();
        order.sort_by_key(|(_, ts)| *ts);
        let before_dedup = order.len();
        order.dedup_by_key(|(_, ts)| *ts);

        if untimed > 0 || before_dedup != order.len() {
            debug!(
                "Index build dropped {} rows without timestamp and {} duplicate rows",
                untimed,
                before_dedup - order.len()
            );
        }

        let millis: Vec<i64> = order.iter().map(|(_, ts)| to_epoch_millis(ts)).collect();
        let index = Series::new(TIMESTAMP_COLUMN.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        let mut frame_columns: Vec<Column> = Vec::with_capacity(columns.len() + 1);
        frame_columns.push(index.into());
        for (name, values) in columns {
            let ordered: Vec<Option<f64>> = order
                .iter()
                .map(|(row, _)| values[*row].filter(|v| !v.is_nan()))
                .collect();
            frame_columns.push(Column::new(name.as_str().into(), ordered));
        }

        Ok(Self {
            frame: DataFrame::new(frame_columns)?,
        })
    }

    pub fn empty() -> Result<Self> {
        Self::from_columns(Vec::new(), Vec::new())
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Value column names in frame order, excluding the index
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .skip(1)
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        name != TIMESTAMP_COLUMN && self.frame.get_column_index(name).is_some()
    }

    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        let physical = self
            .frame
            .column(TIMESTAMP_COLUMN)?
            .cast(&DataType::Int64)?;
        physical
            .i64()?
            .into_iter()
            .map(|millis| {
                millis.and_then(from_epoch_millis).ok_or_else(|| DataError::TableShape {
                    reason: format!("index holds an invalid timestamp: {millis:?}"),
                })
            })
            .collect()
    }

    /// First and last index timestamps, `None` for an empty table
    pub fn bounds(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime)>> {
        let timestamps = self.timestamps()?;
        Ok(timestamps.first().copied().zip(timestamps.last().copied()))
    }

    pub fn values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.frame.column(name)?;
        Ok(column.f64()?.into_iter().collect())
    }

    /// `(timestamp, value)` pairs of one column in index order
    pub fn points(&self, name: &str) -> Result<Vec<(NaiveDateTime, Option<f64>)>> {
        let timestamps = self.timestamps()?;
        let values = self.values(name)?;
        Ok(timestamps.into_iter().zip(values).collect())
    }

    /// Add or replace a value column aligned with the current index
    pub fn set_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        if name == TIMESTAMP_COLUMN {
            return Err(DataError::TableShape {
                reason: format!("'{TIMESTAMP_COLUMN}' is reserved for the index"),
            });
        }
        if values.len() != self.height() {
            return Err(DataError::TableShape {
                reason: format!(
                    "column '{}' has {} values but the table has {} rows",
                    name,
                    values.len(),
                    self.height()
                ),
            });
        }
        self.frame.with_column(Column::new(name.into(), values))?;
        Ok(())
    }

    /// Left-join a timestamp lookup onto the index as column `name`.
    ///
    /// Index timestamps absent from `lookup` get a missing value. Returns the
    /// number of rows that found a match.
    pub fn join_lookup(&mut self, name: &str, lookup: &HashMap<NaiveDateTime, f64>) -> Result<usize> {
        let values: Vec<Option<f64>> = self
            .timestamps()?
            .iter()
            .map(|ts| lookup.get(ts).copied())
            .collect();
        let matched = values.iter().filter(|v| v.is_some()).count();
        self.set_column(name, values)?;
        Ok(matched)
    }

    /// Rows with `start <= timestamp <= stop`, restricted to `columns`
    pub fn slice(
        &self,
        start: NaiveDateTime,
        stop: NaiveDateTime,
        columns: &[&str],
    ) -> Result<TimeSeriesTable> {
        let mask: Vec<bool> = self
            .timestamps()?
            .iter()
            .map(|ts| *ts >= start && *ts <= stop)
            .collect();
        let mask = BooleanChunked::from_slice("mask".into(), &mask);

        let selected = self
            .frame
            .select(std::iter::once(TIMESTAMP_COLUMN).chain(columns.iter().copied()))?;

        Ok(Self {
            frame: selected.filter(&mask)?,
        })
    }
}
