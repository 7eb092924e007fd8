//! Start-up ingestion of building spreadsheet exports.
//!
//! Orchestrates discovery, per-file parsing (with DST correction) and
//! progress reporting, collecting the parsed buildings into a
//! [`BuildingStore`]. A file that fails to parse is reported and skipped.

pub mod discovery;
pub mod progress;
pub mod spreadsheet;
pub mod weather;

#[cfg(test)]
mod tests;

use self::{
    discovery::FileDiscovery,
    progress::{ImportProgress, format_remaining},
    spreadsheet::SpreadsheetParser,
};

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::models::ImportStats;
use crate::store::BuildingStore;

use colored::*;
use tracing::{info, warn};

/// Imports every spreadsheet export under a data root
#[derive(Debug, Clone)]
pub struct Importer {
    discovery: FileDiscovery,
    parser: SpreadsheetParser,
    extension: String,
    show_progress: bool,
}

impl Importer {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            discovery: FileDiscovery::new(&config.data_dir),
            parser: SpreadsheetParser::new(config.layout),
            extension: config.spreadsheet_extension.clone(),
            show_progress: config.show_progress,
        }
    }

    /// Parse all exports into a fresh store
    pub fn import(&self) -> Result<(BuildingStore, ImportStats)> {
        println!("{}", "Importing building exports".bright_green().bold());
        println!(
            "  {} {}",
            "Data root:".bright_cyan(),
            self.discovery.root().display()
        );

        let files = self.discovery.discover(&self.extension)?;
        println!(
            "  {} {} *.{} files",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold(),
            self.extension
        );

        let mut store = BuildingStore::new();
        let mut stats = ImportStats {
            files_discovered: files.len(),
            ..Default::default()
        };
        let mut progress = ImportProgress::new(files.len(), self.show_progress);

        for path in &files {
            match self.parser.parse_file(path) {
                Ok(building) => {
                    stats.files_processed += 1;
                    store.insert(building);
                }
                Err(e) if e.is_recoverable() => {
                    stats.files_failed += 1;
                    warn!("Skipping {}: {}", path.display(), e);
                }
                Err(e) => return Err(e),
            }

            let file_name = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            let remaining = progress.advance(&file_name);
            if let Some(remaining) = remaining.filter(|_| !self.show_progress) {
                info!(
                    "Processed {}/{} files, estimated remaining {}",
                    progress.processed(),
                    files.len(),
                    format_remaining(remaining.as_secs())
                );
            }
        }
        progress.finish();

        stats.total_rows = store.total_rows();
        stats.elapsed = progress.elapsed();
        print_summary(&stats, store.len());

        Ok((store, stats))
    }
}

fn print_summary(stats: &ImportStats, buildings: usize) {
    println!("\n{}", "Import Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.elapsed.as_millis().to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Buildings:".bright_cyan(),
        buildings.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Total rows:".bright_cyan(),
        stats.total_rows.to_string().bright_white().bold()
    );
}
