//! Building Energy Data Manager Library
//!
//! Imports building-energy spreadsheet exports into timestamp-indexed tables
//! and serves them per building and sensor.
//!
//! This library provides tools for:
//! - Discovering and parsing spreadsheet exports with per-file failure recovery
//! - Correcting daylight-saving artifacts in local wall-clock timestamps
//! - Merging an external weather file as a temperature sensor
//! - Encoding the building store for the external transformation services
//! - Listing, looking up and slicing sensor series over HTTP

pub mod api;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod dst;
pub mod error;
pub mod importer;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod service;
pub mod store;
pub mod table;
pub mod timestamp;

// Re-export commonly used types
pub use config::{CollaboratorConfig, MissingWeatherPolicy, ServiceConfig};
pub use error::{DataError, Result};
pub use models::{Building, ImportStats, Sensor};
pub use query::{QueryEngine, QueryError};
pub use store::{BuildingStore, SharedStore};
pub use table::TimeSeriesTable;
