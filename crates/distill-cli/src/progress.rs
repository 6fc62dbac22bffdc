use distill_engine::{PipelineProgress, PipelineState};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a progress bar for determinate progress
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
    {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb.set_message(message.to_string());
    pb
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Renders pipeline progress events.
///
/// Stages without a known total show a spinner; dispatch switches to a bar
/// once the chunk count is reported. Nothing is drawn in JSON mode.
pub struct SummaryProgress {
    spinner: Option<ProgressBar>,
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl SummaryProgress {
    pub fn new(hidden: bool) -> Self {
        Self { spinner: None, bar: None, hidden }
    }

    pub fn update(&mut self, event: PipelineProgress) {
        tracing::debug!(state = %event.state, current = event.current, total = event.total, "{}", event.message);
        if self.hidden {
            return;
        }

        match event.state {
            PipelineState::Dispatching if event.total > 0 => {
                if let Some(spinner) = self.spinner.take() {
                    spinner.finish_and_clear();
                }
                let bar = self
                    .bar
                    .get_or_insert_with(|| create_progress_bar(event.total as u64, "Summarizing"));
                bar.set_length(event.total as u64);
                bar.set_position(event.current as u64);
                bar.set_message(event.message);
            }
            PipelineState::Complete => self.finish(true, &event.message),
            PipelineState::Failed => self.finish(false, &event.message),
            _ => {
                if let Some(bar) = &self.bar {
                    bar.set_message(event.message);
                } else if let Some(spinner) = &self.spinner {
                    spinner.set_message(event.message);
                } else {
                    self.spinner = Some(create_spinner(&event.message));
                }
            }
        }
    }

    fn finish(&mut self, ok: bool, message: &str) {
        let active = self.bar.take().or_else(|| self.spinner.take());
        if let Some(pb) = active {
            if ok {
                finish_success(&pb, message);
            } else {
                finish_error(&pb, message);
            }
        }
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Clear whatever is still drawn, e.g. after `prepare` returns
    pub fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
