//! Per-file import progress with a remaining-time estimate.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Tracks files handled so far and extrapolates the remaining time
#[derive(Debug)]
pub struct ImportProgress {
    total: usize,
    processed: usize,
    started: Instant,
    bar: Option<ProgressBar>,
}

impl ImportProgress {
    pub fn new(total: usize, show_bar: bool) -> Self {
        let bar = show_bar.then(|| create_progress_bar(total as u64));
        Self {
            total,
            processed: 0,
            started: Instant::now(),
            bar,
        }
    }

    /// Record one finished file (parsed or failed) and return the estimate
    pub fn advance(&mut self, file_name: &str) -> Option<Duration> {
        self.processed += 1;
        let remaining = estimate_remaining(self.total, self.processed, self.started.elapsed());

        if let Some(bar) = &self.bar {
            bar.set_position(self.processed as u64);
            let eta = remaining.map(|d| format_remaining(d.as_secs())).unwrap_or_default();
            bar.set_message(format!("{file_name} | remaining {eta}"));
        }
        remaining
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message("import complete");
        }
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message("Importing spreadsheets...");
    pb
}

/// `(total - processed) * (elapsed / processed)`, `None` before the first file
pub fn estimate_remaining(total: usize, processed: usize, elapsed: Duration) -> Option<Duration> {
    if processed == 0 {
        return None;
    }
    let per_file = elapsed.as_secs_f64() / processed as f64;
    let remaining = total.saturating_sub(processed) as f64 * per_file;
    Some(Duration::from_secs_f64(remaining))
}

/// Render whole seconds as `{h}h {m}min {s}s`
pub fn format_remaining(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}h {minutes}min {seconds}s")
}
