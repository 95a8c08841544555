//! Terminal output for the CLI
//!
//! Styled `cliclack` lines and spinners on a terminal, tagged
//! `[OK]`/`[WARN]` lines when piped or in CI, and nothing at all when
//! stdout carries a JSON or plain report.
//!
//! # Example
//!
//! ```rust,ignore
//! use offshoot::ui::{self, Status, TaskSpinner, UiContext};
//!
//! let ctx = UiContext::detect();
//!
//! let spinner = TaskSpinner::start(&ctx, "Storing photo.jpg...");
//! // ... do work ...
//! spinner.finish(Status::Done, "Stored photo.jpg");
//!
//! ui::key_value(&ctx, "thumb", "/uploads/thumb_photo.jpg");
//! ```

mod context;
mod output;
mod progress;

pub use context::{OutputMode, UiContext};
pub use output::{key_value, line, line_with, remark, section, Status};
pub use progress::TaskSpinner;
