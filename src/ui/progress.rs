//! Spinners and progress bars with a plain-text fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner around a single foreground task
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}

/// Progress over a sequence of backend upgrades, run one at a time
pub struct UpgradeProgress {
    bar: Option<ProgressBar>,
    total: u64,
}

impl UpgradeProgress {
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        let total = total as u64;
        let bar = ctx.use_fancy_output().then(|| {
            let bar = ProgressBar::new(total);
            if let Ok(template) = ProgressStyle::default_bar()
                .template("  {spinner:.magenta} Upgrading {bar:20.magenta/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
            {
                bar.set_style(
                    template
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .progress_chars("━╸─"),
                );
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        Self { bar, total }
    }

    /// Announce the backend about to run
    pub fn start(&self, index: usize, backend: &str) {
        match &self.bar {
            Some(bar) => {
                bar.set_position(index as u64);
                bar.set_message(backend.to_string());
            }
            None => println!("[{}/{}] {}", index + 1, self.total, backend),
        }
    }

    /// Print a line above the bar
    pub fn println(&self, line: impl AsRef<str>) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line.as_ref()),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.set_position(self.total);
            bar.finish_and_clear();
        }
    }
}
