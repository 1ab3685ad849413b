//! Progress indicators using indicatif

#![allow(clippy::expect_used)] // Templates are compile-time constants

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::output::OutputContext;

/// Create a spinner for indeterminate progress.
///
/// # Panics
///
/// Panics if the spinner template string is invalid (it is a compile-time constant and will not panic).
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"])
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish a spinner with a checkmark on the left.
pub fn finish_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix} {msg}")
            .expect("valid template"),
    );
    pb.set_prefix("✓");
    pb.finish_with_message(msg.to_string());
}

/// Spinner scoped to one operation.
///
/// The spinner's ticker stops when the guard is finished or dropped, so no
/// exit path of the decorated operation can leave it running. When progress
/// is hidden (not a TTY, or `--quiet`) the guard holds nothing.
pub struct SpinnerGuard {
    pb: Option<ProgressBar>,
}

impl SpinnerGuard {
    #[must_use]
    pub fn start(ctx: &OutputContext, msg: &str) -> Self {
        Self {
            pb: ctx.show_progress().then(|| spinner(msg)),
        }
    }

    /// Whether a spinner is actually being drawn.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.pb.is_some()
    }

    /// Stop with a success line.
    pub fn finish_ok(mut self, msg: &str) {
        if let Some(pb) = self.pb.take() {
            finish_ok(&pb, msg);
        }
    }
}

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }
}
