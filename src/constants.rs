//! Application constants for the energy data manager
//!
//! Default file suffixes, sheet layout positions, weather columns, the
//! synthetic temperature sensor and collaborator defaults.

// =============================================================================
// File Discovery
// =============================================================================

/// Extension of the building spreadsheet exports
pub const DEFAULT_SPREADSHEET_EXTENSION: &str = "xls";

/// Extension of the external weather file
pub const DEFAULT_WEATHER_EXTENSION: &str = "csv";

/// Default data root, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "data";

// =============================================================================
// Spreadsheet Layout
// =============================================================================

/// Name given to the first (timestamp) column of every export
pub const TIMESTAMP_COLUMN: &str = "Datetime";

/// Sheet rows, 0-based
pub mod sheet_rows {
    pub const HEADER: usize = 0;
    pub const DESCRIPTION: usize = 3;
    pub const UNIT: usize = 4;
    pub const FIRST_DATA: usize = 5;
}

/// Accepted textual timestamp formats, tried in order
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Date-only formats, interpreted as midnight
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y"];

// =============================================================================
// Weather Data
// =============================================================================

/// 0-based column holding the weather timestamp
pub const WEATHER_TIMESTAMP_COLUMN: usize = 2;

/// 0-based column holding the temperature reading
pub const WEATHER_TEMPERATURE_COLUMN: usize = 3;

/// Sensor descriptor appended to every building by the weather merge
pub mod weather_sensor {
    pub const TYPE: &str = "Temperatur";
    pub const DESC: &str = "Wetterstation";
    pub const UNIT: &str = "°C";
}

// =============================================================================
// Collaborator Services
// =============================================================================

pub const DEFAULT_CLEAN_URL: &str = "http://preprocessing/clean";
pub const DEFAULT_INTERPOLATE_URL: &str = "http://preprocessing/interpolate";
pub const DEFAULT_DIFF_URL: &str = "http://feature-engineering/diff";

/// Per-request timeout for a collaborator call
pub const DEFAULT_COLLABORATOR_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// Serving
// =============================================================================

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Detail returned for any failure that is not a lookup miss
pub const INTERNAL_ERROR_DETAIL: &str = "Internal Server Error";
