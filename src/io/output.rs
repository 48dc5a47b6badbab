//! Output management for CLI commands.
//!
//! Handles formatting and display for different output formats,
//! providing a unified interface for text and JSON output.

use crate::coordinator::Durability;
use crate::display::THEME;
use crate::error::IndexError;
use crate::io::exit_code::ExitCode;
use crate::io::format::{JsonResponse, OutputFormat, ResponseMeta};
use serde::Serialize;
use std::io::{self, Write};

/// Manages output formatting and display.
///
/// Payloads go to stdout. Errors, warnings and progress go to stderr so
/// JSON on stdout can be piped.
pub struct OutputManager {
    format: OutputFormat,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl OutputManager {
    /// Create a new output manager with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Create an output manager for testing with custom writers.
    #[cfg(test)]
    pub fn new_with_writers(
        format: OutputFormat,
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            stdout,
            stderr,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn write_json<T: Serialize>(&mut self, response: JsonResponse<T>) -> io::Result<()> {
        let response = response.with_meta(ResponseMeta::now());
        writeln!(self.stdout, "{}", serde_json::to_string_pretty(&response)?)
    }

    /// Output a successful result.
    ///
    /// JSON mode wraps `data` in a success response; text mode prints what
    /// `render` returns.
    pub fn success<T, F>(&mut self, data: T, render: F) -> io::Result<ExitCode>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        match self.format {
            OutputFormat::Json => self.write_json(JsonResponse::success(data))?,
            OutputFormat::Text => writeln!(self.stdout, "{}", render(&data))?,
        }
        Ok(ExitCode::Success)
    }

    /// Output the result of a mutation, flagging it when the save failed.
    pub fn mutation<T, F>(
        &mut self,
        data: T,
        durability: &Durability,
        render: F,
    ) -> io::Result<ExitCode>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        let Durability::InMemoryOnly { reason } = durability else {
            return self.success(data, render);
        };
        match self.format {
            OutputFormat::Json => self.write_json(JsonResponse::not_persisted(data, reason))?,
            OutputFormat::Text => {
                writeln!(self.stdout, "{}", render(&data))?;
                writeln!(
                    self.stderr,
                    "{}",
                    THEME.warning_with_icon(&format!("Not saved to disk: {reason}"))
                )?;
            }
        }
        Ok(ExitCode::NotPersisted)
    }

    /// Output a single item or indicate not found.
    pub fn item<T, F>(
        &mut self,
        item: Option<T>,
        entity: &str,
        name: &str,
        render: F,
    ) -> io::Result<ExitCode>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        match item {
            Some(data) => self.success(data, render),
            None => self.not_found(entity, name),
        }
    }

    /// Output a not found result.
    pub fn not_found(&mut self, entity: &str, name: &str) -> io::Result<ExitCode> {
        match self.format {
            OutputFormat::Json => self.write_json(JsonResponse::not_found(entity, name))?,
            OutputFormat::Text => writeln!(self.stderr, "{entity} '{name}' not found")?,
        }
        Ok(ExitCode::NotFound)
    }

    /// Output a collection.
    ///
    /// An empty collection is reported as a successful empty result, since an
    /// empty index or a query with no hits is not an error.
    pub fn collection<T, F>(
        &mut self,
        items: Vec<T>,
        entity_name: &str,
        render: F,
    ) -> io::Result<ExitCode>
    where
        T: Serialize,
        F: FnOnce(&[T]) -> String,
    {
        match self.format {
            OutputFormat::Json => self.write_json(JsonResponse::success(&items))?,
            OutputFormat::Text if items.is_empty() => {
                writeln!(self.stdout, "No {entity_name} found")?;
            }
            OutputFormat::Text => {
                writeln!(self.stdout, "Found {} {entity_name}:", items.len())?;
                writeln!(self.stdout, "{}", render(&items))?;
            }
        }
        Ok(ExitCode::Success)
    }

    /// Output an error with suggestions.
    pub fn error(&mut self, error: &IndexError) -> io::Result<ExitCode> {
        match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::from_error(error).with_meta(ResponseMeta::now());
                writeln!(self.stderr, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text => {
                writeln!(self.stderr, "{}", THEME.error_with_icon(&error.to_string()))?;
                for suggestion in error.recovery_suggestions() {
                    writeln!(self.stderr, "  Suggestion: {suggestion}")?;
                }
            }
        }
        Ok(ExitCode::from_error(error))
    }

    /// Output an error that did not come from the index.
    pub fn failure(&mut self, code: ExitCode, message: &str) -> io::Result<ExitCode> {
        match self.format {
            OutputFormat::Json => {
                let response =
                    JsonResponse::error(code, message, Vec::new()).with_meta(ResponseMeta::now());
                writeln!(self.stderr, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text => {
                writeln!(self.stderr, "{}", THEME.error_with_icon(message))?;
            }
        }
        Ok(code)
    }

    /// Output a warning (text mode only).
    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        if matches!(self.format, OutputFormat::Text) {
            writeln!(self.stderr, "{}", THEME.warning_with_icon(message))?;
        }
        Ok(())
    }

    /// Output progress information (text mode only).
    pub fn progress(&mut self, message: &str) -> io::Result<()> {
        if matches!(self.format, OutputFormat::Text) {
            writeln!(self.stderr, "{message}")?;
        }
        Ok(())
    }

    /// Output informational message (text mode only).
    pub fn info(&mut self, message: &str) -> io::Result<()> {
        if matches!(self.format, OutputFormat::Text) {
            writeln!(self.stdout, "{message}")?;
        }
        Ok(())
    }
}
