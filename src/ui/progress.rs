//! Spinner for long-running steps

use super::context::{OutputMode, UiContext};
use super::output::{self, Status};

/// A cliclack spinner on a terminal, a status line elsewhere
pub struct TaskSpinner {
    ctx: UiContext,
    spinner: Option<cliclack::ProgressBar>,
}

impl TaskSpinner {
    /// Show `message` until the task finishes
    pub fn start(ctx: &UiContext, message: &str) -> Self {
        let spinner = match ctx.mode() {
            OutputMode::Styled => {
                let spinner = cliclack::spinner();
                spinner.start(message);
                Some(spinner)
            }
            OutputMode::Plain => {
                output::line(ctx, Status::Note, message);
                None
            }
            OutputMode::Silent => None,
        };
        Self { ctx: *ctx, spinner }
    }

    /// Replace the spinner with the task's outcome
    pub fn finish(self, status: Status, message: &str) {
        match (self.spinner, status) {
            (Some(spinner), Status::Done) => spinner.stop(message),
            (Some(spinner), Status::Failed) => spinner.error(message),
            (spinner, _) => {
                if let Some(spinner) = spinner {
                    spinner.clear();
                }
                output::line(&self.ctx, status, message);
            }
        }
    }
}
