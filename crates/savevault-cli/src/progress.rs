use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use savevault_core::{DiscoveredApplication, DiscoveryEvent};
use std::collections::HashSet;
use std::time::Duration;

/// Drains discovery events on the main thread.
///
/// A spinner shows the latest progress text; each discovered application is
/// printed above it. Records are de-duplicated again by executable path.
pub struct CliReporter {
    bar: ProgressBar,
    seen: HashSet<String>,
    apps: Vec<DiscoveredApplication>,
}

impl CliReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        bar.set_message("Starting discovery...");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            seen: HashSet::new(),
            apps: Vec::new(),
        }
    }

    pub fn handle(&mut self, event: DiscoveryEvent) {
        match event {
            DiscoveryEvent::Progress(message) => {
                self.bar.set_message(message);
            }
            DiscoveryEvent::Discovered(app) => {
                let key = app.executable_path.to_string_lossy().to_lowercase();
                if self.seen.insert(key) {
                    self.bar.println(format!(
                        "  {} {} {} {}",
                        "✓".green(),
                        app.name.bold(),
                        app.executable_path.display(),
                        format!("[{}]", app.source).dimmed(),
                    ));
                    self.apps.push(app);
                }
            }
            DiscoveryEvent::Error(message) => {
                self.bar.println(format!("  {} {}", "✗".red(), message));
            }
            DiscoveryEvent::Finished(_) => self.bar.finish_and_clear(),
        }
    }

    pub fn apps(&self) -> &[DiscoveredApplication] {
        &self.apps
    }
}
