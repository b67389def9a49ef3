//! Progress spinner for listing operations
//!
//! The spinner doubles as a [`ListingObserver`], so a listing client can report
//! its page loads straight to the terminal.

use std::sync::atomic::{AtomicUsize, Ordering};

use bv_core::{ListingEvent, ListingObserver};

use super::OutputConfig;

/// Spinner wrapper
///
/// In quiet, JSON, or no-progress mode the spinner is hidden and every call is
/// a no-op.
#[derive(Debug)]
pub struct Spinner {
    bar: Option<indicatif::ProgressBar>,
    entries: AtomicUsize,
}

impl Spinner {
    /// Create a spinner showing `message`
    pub fn new(config: &OutputConfig, message: &str) -> Self {
        let bar = if config.quiet || config.json || config.no_progress {
            None
        } else {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(style) =
                indicatif::ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
            {
                bar.set_style(style);
            }
            bar.set_message(message.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(bar)
        };

        Self {
            bar,
            entries: AtomicUsize::new(0),
        }
    }

    /// Set message
    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Finish and clear the spinner
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Check if spinner is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// Entries merged so far
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }
}

impl ListingObserver for Spinner {
    fn on_event(&self, event: &ListingEvent) {
        match event {
            ListingEvent::LoadingStarted { prefix, initial } => {
                if *initial {
                    self.entries.store(0, Ordering::Relaxed);
                }
                let what = if prefix.is_empty() { "/" } else { prefix.as_str() };
                self.set_message(&format!("Listing {what} ({} entries)", self.entries()));
            }
            ListingEvent::PageMerged {
                prefix,
                folders_added,
                files_added,
                ..
            } => {
                self.entries
                    .fetch_add(folders_added + files_added, Ordering::Relaxed);
                let what = if prefix.is_empty() { "/" } else { prefix.as_str() };
                self.set_message(&format!("Listing {what} ({} entries)", self.entries()));
            }
            ListingEvent::Failed { .. } | ListingEvent::StaleDiscarded { .. } => {}
        }
    }
}
