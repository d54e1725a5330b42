//! Generative-text provider seam.
//!
//! The pipeline never talks to a provider directly; it is handed something
//! that implements [`TextProvider`], which keeps tests free of network calls.

use crate::error::{Error, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

/// A service that turns a system instruction plus a user prompt into text.
pub trait TextProvider {
    /// Request a completion. Unreachable or failing services map to
    /// [`Error::ProviderUnavailable`].
    fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

impl<P: TextProvider + ?Sized> TextProvider for &P {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        (**self).complete(system, prompt)
    }
}

impl<P: TextProvider + ?Sized> TextProvider for Box<P> {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        (**self).complete(system, prompt)
    }
}

/// Provider that always answers with the same text.
///
/// Used to replay a saved reply and as a test double.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    reply: String,
}

impl StaticProvider {
    /// Create a provider replying with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl TextProvider for StaticProvider {
    fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Provider backed by an external command.
///
/// The system instruction and prompt are written to the command's stdin,
/// separated by a blank line; the reply is read from stdout.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
}

impl CommandProvider {
    /// Create a provider running `program` with `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line such as `llm -m gemini`.
    ///
    /// Returns `None` for a blank command line. Quoting is not supported.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl TextProvider for CommandProvider {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        log::debug!("Running provider command: {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::ProviderUnavailable(format!("failed to start '{}': {}", self.program, e))
            })?;

        // stdin is fed from its own thread: the child may fill stdout before
        // it has read the whole prompt.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = format!("{}\n\n{}\n", system, prompt);
            thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child
            .wait_with_output()
            .map_err(|e| Error::ProviderUnavailable(format!("provider did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ProviderUnavailable(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| Error::ProviderUnavailable("prompt writer panicked".to_string()))?
                .map_err(|e| Error::ProviderUnavailable(format!("failed to send prompt: {}", e)))?;
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
