//! External command processor
//!
//! Runs a program such as `mogrify` or `ffmpeg` against the cached file.

use crate::config::ProcessorConfig;
use crate::error::{OffshootError, OffshootResult};
use crate::processing::Processor;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Placeholder replaced by the cached file's path
const PATH_PLACEHOLDER: &str = "{path}";

/// Max number of stderr lines to include in error messages.
const ERROR_TAIL_LINES: usize = 20;

/// Processor invoking an external program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProcessor {
    program: String,
    args: Vec<String>,
    name: String,
}

impl CommandProcessor {
    /// Create a processor; `{path}` in `args` is substituted at run time
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        let name = std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            program,
            args,
            name,
        }
    }

    /// Arguments with the placeholder replaced
    ///
    /// When no argument mentions `{path}` the path is appended.
    fn args_for(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(PATH_PLACEHOLDER, &path))
            .collect();

        if !self.args.iter().any(|a| a.contains(PATH_PLACEHOLDER)) {
            args.push(path.into_owned());
        }
        args
    }
}

impl From<&ProcessorConfig> for CommandProcessor {
    fn from(config: &ProcessorConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

/// Last `ERROR_TAIL_LINES` lines of stderr
fn error_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl Processor for CommandProcessor {
    async fn process(&self, path: &Path) -> OffshootResult<()> {
        let args = self.args_for(path);
        debug!("Executing: {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| OffshootError::command_failed(self.name.clone(), e))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(OffshootError::ProcessingFailed {
                processor: self.name.clone(),
                reason: format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    error_tail(&stderr)
                ),
            })
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
