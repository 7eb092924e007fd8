//! Command-line argument definitions for the energy data service

use crate::config::{CollaboratorConfig, MissingWeatherPolicy, ServiceConfig};
use crate::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_CLEAN_URL, DEFAULT_COLLABORATOR_TIMEOUT_SECS, DEFAULT_DATA_DIR,
    DEFAULT_DIFF_URL, DEFAULT_INTERPOLATE_URL, DEFAULT_SPREADSHEET_EXTENSION,
    DEFAULT_WEATHER_EXTENSION,
};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the building energy data service
///
/// Imports building spreadsheet exports, corrects daylight-saving artifacts,
/// merges the weather file, runs the data through the transformation
/// services and serves the result over HTTP.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "energy-data-manager",
    version,
    about = "Serve building energy time series imported from spreadsheet exports"
)]
pub struct Args {
    /// Directory searched recursively for exports and the weather file
    #[arg(value_name = "DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Address the HTTP server binds to
    #[arg(long = "bind", value_name = "ADDR", default_value = DEFAULT_BIND_ADDRESS)]
    pub bind_address: String,

    /// Extension of the building exports
    #[arg(long = "spreadsheet-ext", value_name = "EXT", default_value = DEFAULT_SPREADSHEET_EXTENSION)]
    pub spreadsheet_extension: String,

    /// Extension of the weather file
    #[arg(long = "weather-ext", value_name = "EXT", default_value = DEFAULT_WEATHER_EXTENSION)]
    pub weather_extension: String,

    /// Field separator of the weather file
    #[arg(long = "weather-separator", value_name = "CHAR", default_value_t = ',')]
    pub weather_separator: char,

    /// Abort start-up when no weather file is found
    #[arg(long = "require-weather")]
    pub require_weather: bool,

    /// Serve the imported data without calling the transformation services
    #[arg(long = "skip-transforms")]
    pub skip_transforms: bool,

    #[arg(long = "clean-url", value_name = "URL", default_value = DEFAULT_CLEAN_URL)]
    pub clean_url: String,

    #[arg(long = "interpolate-url", value_name = "URL", default_value = DEFAULT_INTERPOLATE_URL)]
    pub interpolate_url: String,

    #[arg(long = "diff-url", value_name = "URL", default_value = DEFAULT_DIFF_URL)]
    pub diff_url: String,

    /// Timeout for each transformation request, in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = DEFAULT_COLLABORATOR_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Disable the import progress bar
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Build and validate the service configuration
    pub fn into_config(self) -> Result<ServiceConfig> {
        let missing_weather = if self.require_weather {
            MissingWeatherPolicy::Abort
        } else {
            MissingWeatherPolicy::Skip
        };

        let config = ServiceConfig::default()
            .with_data_dir(self.data_dir)
            .with_bind_address(self.bind_address)
            .with_spreadsheet_extension(self.spreadsheet_extension)
            .with_weather_extension(self.weather_extension)
            .with_weather_separator(self.weather_separator)
            .with_missing_weather(missing_weather)
            .with_collaborators(CollaboratorConfig {
                clean_url: self.clean_url,
                interpolate_url: self.interpolate_url,
                diff_url: self.diff_url,
                timeout_secs: self.timeout_secs,
                enabled: !self.skip_transforms,
            })
            .with_progress(!self.no_progress);

        config.validate()?;
        Ok(config)
    }
}
