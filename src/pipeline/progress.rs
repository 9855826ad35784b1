use indicatif::{ProgressBar, ProgressStyle};

use super::RunSummary;

/// Trait for progress reporting - allows both a terminal bar and silent/test modes
pub trait Progress {
    fn start(&mut self, total: u64);
    fn record(&mut self, last: &str, succeeded: u32, failed: u32);
    fn finish(&mut self, summary: &RunSummary);
}

/// Progress bar on stderr for interactive runs
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for BarProgress {
    fn start(&mut self, total: u64) {
        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg:40} [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_message("Processing Pokémon");
        self.bar = Some(pb);
    }

    fn record(&mut self, last: &str, succeeded: u32, failed: u32) {
        if let Some(pb) = &self.bar {
            pb.set_message(format!("Last: {} | Success: {} | Fail: {}", last, succeeded, failed));
            pb.inc(1);
        }
    }

    fn finish(&mut self, summary: &RunSummary) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!(
                "Loaded {} / {} Pokémon",
                summary.succeeded, summary.attempted
            ));
        }
    }
}

/// Silent progress for tests and non-interactive use
#[derive(Default)]
pub struct SilentProgress;

impl SilentProgress {
    pub fn new() -> Self {
        Self
    }
}

impl Progress for SilentProgress {
    fn start(&mut self, _total: u64) {}
    fn record(&mut self, _last: &str, _succeeded: u32, _failed: u32) {}
    fn finish(&mut self, _summary: &RunSummary) {}
}
