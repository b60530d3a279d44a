//! Progress reporter implementation
//!
//! Uses an indicatif spinner showing running counters while the tree is
//! walked. The total is unknown up front, so there is no bar or ETA.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress reporter for migrations
pub struct ProgressReporter {
    /// Spinner line
    spinner: ProgressBar,
    /// Start time
    start_time: Instant,
    /// Folders entered so far
    folders: AtomicU64,
    /// Files moved so far
    moved: AtomicU64,
    /// Files copied so far
    copied: AtomicU64,
    /// Is progress enabled
    enabled: AtomicBool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let template = "{spinner:.cyan} [{elapsed}] {prefix} {wide_msg}";
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self::with_spinner(spinner, true)
    }

    /// Create a disabled progress reporter (for quiet mode)
    ///
    /// The spinner draws to a hidden target and never ticks.
    pub fn disabled() -> Self {
        let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        Self::with_spinner(spinner, false)
    }

    fn with_spinner(spinner: ProgressBar, enabled: bool) -> Self {
        Self {
            spinner,
            start_time: Instant::now(),
            folders: AtomicU64::new(0),
            moved: AtomicU64::new(0),
            copied: AtomicU64::new(0),
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Whether anything is drawn
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn refresh_counts(&self) {
        self.spinner.set_prefix(format!(
            "{} folders, {} moved, {} copied",
            self.folders.load(Ordering::Relaxed),
            self.moved.load(Ordering::Relaxed),
            self.copied.load(Ordering::Relaxed),
        ));
    }

    /// Record that a folder was entered
    pub fn increment_folders(&self) {
        self.folders.fetch_add(1, Ordering::Relaxed);
        self.refresh_counts();
    }

    /// Record a moved file
    pub fn increment_moved(&self) {
        self.moved.fetch_add(1, Ordering::Relaxed);
        self.refresh_counts();
    }

    /// Record a copied file
    pub fn increment_copied(&self) {
        self.copied.fetch_add(1, Ordering::Relaxed);
        self.refresh_counts();
    }

    /// Show the entry currently being processed
    pub fn set_current(&self, name: &str) {
        // Truncate long names
        let display = if name.chars().count() > 60 {
            let skip = name.chars().count() - 57;
            let tail: String = name.chars().skip(skip).collect();
            format!("...{}", tail)
        } else {
            name.to_string()
        };
        self.spinner.set_message(display);
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Folders entered so far
    pub fn folders(&self) -> u64 {
        self.folders.load(Ordering::Relaxed)
    }

    /// Files relocated so far (moved + copied)
    pub fn files(&self) -> u64 {
        self.moved.load(Ordering::Relaxed) + self.copied.load(Ordering::Relaxed)
    }

    /// Finish and clear the spinner
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
