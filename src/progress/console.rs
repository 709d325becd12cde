//! Terminal progress handler
//!
//! Renders model downloads as a byte progress bar and hands every other
//! event to [`LoggingHandler`]. The bar is hidden when stderr is not a TTY.

use super::{LoggingHandler, ProgressEvent, ProgressHandler};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

const PULL_TEMPLATE: &str =
    "{spinner:.green} {prefix} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}";

pub struct ConsoleHandler {
    interactive: bool,
    active_pull: Mutex<Option<ProgressBar>>,
    fallback: LoggingHandler,
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self {
            interactive: atty::is(atty::Stream::Stderr),
            active_pull: Mutex::new(None),
            fallback: LoggingHandler,
        }
    }

    fn new_bar(&self, model: &str) -> ProgressBar {
        if !self.interactive {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(PULL_TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix(model.to_string());
        bar
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler for ConsoleHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        let Ok(mut active) = self.active_pull.lock() else {
            self.fallback.on_progress(event);
            return;
        };

        match event {
            ProgressEvent::PullStarted { model } => {
                *active = Some(self.new_bar(model));
                self.fallback.on_progress(event);
            }
            ProgressEvent::PullProgress {
                status,
                completed,
                total,
                ..
            } => match active.as_ref() {
                Some(bar) => {
                    if let Some(total) = total {
                        bar.set_length(*total);
                    }
                    if let Some(completed) = completed {
                        bar.set_position(*completed);
                    }
                    bar.set_message(status.clone());
                }
                None => self.fallback.on_progress(event),
            },
            ProgressEvent::PullComplete { .. } | ProgressEvent::PullFailed { .. } => {
                if let Some(bar) = active.take() {
                    bar.finish_and_clear();
                }
                self.fallback.on_progress(event);
            }
            _ => self.fallback.on_progress(event),
        }
    }
}
