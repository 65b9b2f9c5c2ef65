use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Clone)]
pub struct ProgressTracker {
    progress_bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(Self::style("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"));
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { progress_bar: pb }
    }

    pub fn hidden() -> Self {
        Self {
            progress_bar: ProgressBar::hidden(),
        }
    }

    fn style(template: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }

    pub fn start_progress(&self, total: u64, initial_message: &str) {
        self.progress_bar.reset();
        self.progress_bar.set_length(total);
        self.progress_bar.set_position(0);
        self.progress_bar.set_message(initial_message.to_string());
    }

    pub fn update_message(&self, message: &str) {
        self.progress_bar.set_message(message.to_string());
    }

    pub fn increment(&self, delta: u64) {
        self.progress_bar.inc(delta);
    }

    pub fn position(&self) -> u64 {
        self.progress_bar.position()
    }

    pub fn finish(&self) {
        self.progress_bar.set_style(Self::style(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} {msg}",
        ));
        self.progress_bar.finish_with_message("done");
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
