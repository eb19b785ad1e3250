use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

pub struct ProgressContext {
    bar: ProgressBar,
    start: Instant,
}

impl ProgressContext {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            start: Instant::now(),
        }
    }

    pub fn finish(&self, summary: &str) {
        let elapsed = self.start.elapsed();
        self.bar.finish_with_message(format!(
            "{} {} in {:.1}s",
            style("Done").green(),
            summary,
            elapsed.as_secs_f64()
        ));
    }

    pub fn fail(&self, reason: &str) {
        self.bar
            .abandon_with_message(format!("{} {}", style("Failed").red(), reason));
    }
}
