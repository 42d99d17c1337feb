//! Progress reporting for a dispatched batch

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use relay_application::DispatchProgressNotifier;
use relay_domain::{ToolCallOutcome, Usage};
use std::sync::Mutex;

/// Reports instance completions on a progress bar (stderr)
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn batch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        let mut bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut bar);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchProgressNotifier for ProgressReporter {
    fn on_batch_start(&self, total: usize, valid: usize) {
        let pb = ProgressBar::new(valid as u64);
        pb.set_style(Self::batch_style());
        pb.set_prefix("Dispatch");
        pb.set_message(if total > valid {
            format!("{} rejected", total - valid)
        } else {
            "Starting...".to_string()
        });
        self.with_bar(|bar| *bar = Some(pb));
    }

    fn on_instance_start(&self, label: &str, _correlation_id: &str) {
        self.with_bar(|bar| {
            if let Some(pb) = bar.as_ref() {
                pb.set_message(format!("{} {}", "->".cyan(), label));
            }
        });
    }

    fn on_instance_complete(&self, label: &str, _correlation_id: &str, success: bool, usage: &Usage) {
        self.with_bar(|bar| {
            if let Some(pb) = bar.as_ref() {
                let status = if success {
                    format!("{} {} ({} tokens)", "v".green(), label, usage.total_tokens())
                } else {
                    format!("{} {}", "x".red(), label)
                };
                pb.set_message(status);
                pb.inc(1);
            }
        });
    }

    fn on_batch_complete(&self, outcomes: &[ToolCallOutcome]) {
        self.with_bar(|bar| {
            if let Some(pb) = bar.take() {
                let failed = outcomes.iter().filter(|o| o.result.is_error()).count();
                let summary = if failed == 0 {
                    format!("{} complete!", outcomes.len()).green().to_string()
                } else {
                    format!("{} complete, {} failed", outcomes.len(), failed)
                        .yellow()
                        .to_string()
                };
                pb.finish_with_message(summary);
            }
        });
    }
}
