//! Configuration management and validation.
//!
//! Provides the service configuration: where the exports live, how they are
//! laid out, what to do without a weather file, where the transformation
//! services are reached and where the HTTP surface binds.

use crate::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_CLEAN_URL, DEFAULT_COLLABORATOR_TIMEOUT_SECS, DEFAULT_DATA_DIR,
    DEFAULT_DIFF_URL, DEFAULT_INTERPOLATE_URL, DEFAULT_SPREADSHEET_EXTENSION,
    DEFAULT_WEATHER_EXTENSION,
};
use crate::error::{DataError, Result};
use crate::importer::spreadsheet::SheetLayout;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Start-up behaviour when the data root holds no weather file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingWeatherPolicy {
    /// Log a notice and serve the buildings without temperature
    #[default]
    Skip,
    /// Treat the absence as a configuration error
    Abort,
}

/// Endpoints of the external transformation services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    pub clean_url: String,
    pub interpolate_url: String,
    pub diff_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// When false the ingested store is served as is
    pub enabled: bool,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            clean_url: DEFAULT_CLEAN_URL.to_string(),
            interpolate_url: DEFAULT_INTERPOLATE_URL.to_string(),
            diff_url: DEFAULT_DIFF_URL.to_string(),
            timeout_secs: DEFAULT_COLLABORATOR_TIMEOUT_SECS,
            enabled: true,
        }
    }
}

/// Global configuration for the energy data service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Root directory searched recursively for exports and the weather file
    pub data_dir: PathBuf,

    pub spreadsheet_extension: String,
    pub weather_extension: String,

    /// Field separator of the weather file
    pub weather_separator: char,

    pub missing_weather: MissingWeatherPolicy,

    /// Sheet row positions of the exports
    pub layout: SheetLayout,

    pub collaborators: CollaboratorConfig,

    pub bind_address: String,

    /// Show a progress bar while importing
    pub show_progress: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            spreadsheet_extension: DEFAULT_SPREADSHEET_EXTENSION.to_string(),
            weather_extension: DEFAULT_WEATHER_EXTENSION.to_string(),
            weather_separator: ',',
            missing_weather: MissingWeatherPolicy::default(),
            layout: SheetLayout::default(),
            collaborators: CollaboratorConfig::default(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            show_progress: true,
        }
    }
}

impl ServiceConfig {
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_spreadsheet_extension(mut self, extension: impl Into<String>) -> Self {
        self.spreadsheet_extension = extension.into();
        self
    }

    pub fn with_weather_extension(mut self, extension: impl Into<String>) -> Self {
        self.weather_extension = extension.into();
        self
    }

    pub fn with_weather_separator(mut self, separator: char) -> Self {
        self.weather_separator = separator;
        self
    }

    pub fn with_missing_weather(mut self, policy: MissingWeatherPolicy) -> Self {
        self.missing_weather = policy;
        self
    }

    pub fn with_layout(mut self, layout: SheetLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_collaborators(mut self, collaborators: CollaboratorConfig) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Serve the ingested store without the transformation round-trip
    pub fn without_transforms(mut self) -> Self {
        self.collaborators.enabled = false;
        self
    }

    pub fn with_bind_address(mut self, address: impl Into<String>) -> Self {
        self.bind_address = address.into();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Weather separator as the single byte the CSV reader expects
    pub fn weather_separator_byte(&self) -> Result<u8> {
        u8::try_from(self.weather_separator)
            .ok()
            .filter(|b| b.is_ascii() && *b != b'\n' && *b != b'"')
            .ok_or_else(|| {
                DataError::configuration(format!(
                    "weather separator {:?} must be a single ASCII character",
                    self.weather_separator
                ))
            })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address.parse().map_err(|_| {
            DataError::configuration(format!("invalid bind address '{}'", self.bind_address))
        })
    }

    /// Check the configuration before anything is read from disk
    pub fn validate(&self) -> Result<()> {
        if self.spreadsheet_extension.is_empty() || self.weather_extension.is_empty() {
            return Err(DataError::configuration("file extensions must not be empty"));
        }
        if self.spreadsheet_extension == self.weather_extension {
            return Err(DataError::configuration(format!(
                "spreadsheet and weather files cannot share the extension '{}'",
                self.spreadsheet_extension
            )));
        }
        if !self.layout.is_consistent() {
            return Err(DataError::configuration(
                "sheet layout must place header, description and unit rows before the data",
            ));
        }
        if self.collaborators.enabled && self.collaborators.timeout_secs == 0 {
            return Err(DataError::configuration("collaborator timeout must be positive"));
        }
        self.weather_separator_byte()?;
        self.socket_addr()?;
        Ok(())
    }
}
