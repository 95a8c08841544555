//! Status lines, key-value listings and section headers

use super::context::{OutputMode, UiContext};
use console::{style, StyledObject};

/// Outcome a status line reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    Note,
    Warn,
    Failed,
}

impl Status {
    fn tag(self) -> StyledObject<&'static str> {
        match self {
            Status::Done => style("[OK]").green(),
            Status::Note => style("[INFO]").cyan(),
            Status::Warn => style("[WARN]").yellow(),
            Status::Failed => style("[FAIL]").red(),
        }
    }
}

/// Print a status line
pub fn line(ctx: &UiContext, status: Status, message: &str) {
    match ctx.mode() {
        OutputMode::Styled => {
            let printed = match status {
                Status::Done => cliclack::log::success(message),
                Status::Note => cliclack::log::info(message),
                Status::Warn => cliclack::log::warning(message),
                Status::Failed => cliclack::log::error(message),
            };
            printed.ok();
        }
        OutputMode::Plain => println!("  {} {}", status.tag(), message),
        OutputMode::Silent => {}
    }
}

/// Print a status line with a dimmed aside, such as a path or a hint
pub fn line_with(ctx: &UiContext, status: Status, message: &str, aside: &str) {
    line(ctx, status, &format!("{} ({})", message, style(aside).dim()));
}

pub fn remark(ctx: &UiContext, message: &str) {
    match ctx.mode() {
        OutputMode::Styled => {
            cliclack::log::remark(message).ok();
        }
        OutputMode::Plain => println!("  {}", style(message).dim()),
        OutputMode::Silent => {}
    }
}

pub fn section(ctx: &UiContext, title: &str) {
    if ctx.mode() != OutputMode::Silent {
        println!();
        println!("{}", style(title).bold());
    }
}

pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    match ctx.mode() {
        OutputMode::Styled => println!("  {}: {}", style(key).dim(), value),
        OutputMode::Plain => println!("  {}: {}", key, value),
        OutputMode::Silent => {}
    }
}
