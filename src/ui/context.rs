//! Choosing how much, and how, the CLI prints

use std::io::IsTerminal;

/// Environment variables set by common CI systems
const CI_VARS: [&str; 6] = [
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// How status output is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// cliclack lines and spinners on an interactive terminal
    Styled,
    /// Tagged lines for pipes and CI logs
    Plain,
    /// Nothing; stdout carries a machine-readable report instead
    Silent,
}

#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    mode: OutputMode,
}

impl UiContext {
    /// Styled on a terminal outside CI, plain otherwise
    pub fn detect() -> Self {
        let styled = std::io::stdout().is_terminal()
            && !CI_VARS.iter().any(|var| std::env::var_os(var).is_some());
        Self {
            mode: if styled {
                OutputMode::Styled
            } else {
                OutputMode::Plain
            },
        }
    }

    /// Suppress all status output
    pub fn silent() -> Self {
        Self {
            mode: OutputMode::Silent,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }
}
