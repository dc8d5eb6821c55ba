//! Terminal progress and confirmation for apply runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use stackgraph::{ApplyResult, ConfirmCallback, ProgressCallback};

/// Progress bar over all plan nodes
pub struct BarProgress {
    pb: ProgressBar,
}

impl BarProgress {
    pub fn new(total: usize, quiet: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { pb }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, index: usize, count: usize) {
        self.pb.set_message(format!("layer {index} ({count} nodes)"));
    }

    fn on_node_complete(&mut self, id: &str, result: &ApplyResult) {
        let symbol = match result {
            ApplyResult::Applied { .. } => "✓".green(),
            ApplyResult::Failed { .. } => "✗".red(),
            ApplyResult::Skipped { .. } => "○".dimmed(),
        };
        self.pb.suspend(|| println!("  {symbol} {id} {}", result.to_string().dimmed()));
        self.pb.inc(1);
    }

    fn on_batch_complete(&mut self) {}
}

/// Interactive confirmation; `--yes` bypasses the prompt
pub struct PromptConfirm {
    pub assume_yes: bool,
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        match dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
        {
            Ok(confirmed) => confirmed,
            Err(e) => {
                log::warn!("confirmation prompt failed: {e}");
                false
            }
        }
    }
}
