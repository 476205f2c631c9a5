//! Output formatting for CLI commands.
//!
//! Provides abstraction layer for outputting results in text or JSON format.

use anyhow::Result;
use chrono::{DateTime, Utc};
use filedrop_core::{Digest, ResolvedFile, StoredFile};
use serde::Serialize;
use std::io::{self, Write};

use crate::handlers::DOWNLOAD_PREFIX;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
    stdout: io::Stdout,
}

impl OutputWriter {
    /// Create a new OutputWriter.
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            stdout: io::stdout(),
        }
    }

    /// Write output using the configured format.
    ///
    /// The `text_fn` closure is called only in text mode to generate the
    /// human-readable output.
    pub fn write<T: Serialize>(
        &self,
        data: &T,
        text_fn: impl FnOnce() -> String,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                writeln!(&self.stdout, "{}", json)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(&self.stdout, "{}", text)?;
                }
            }
        }
        Ok(())
    }

    /// Write an error message to stderr.
    ///
    /// In JSON mode, writes a JSON error object with success=false.
    /// In text mode, writes the error message directly.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        match self.format {
            OutputFormat::Json => {
                let error_output = ErrorOutput {
                    success: false,
                    result_code,
                    error: format!("{:#}", error),
                };
                if let Ok(json) = serde_json::to_string_pretty(&error_output) {
                    let _ = writeln!(io::stderr(), "{}", json);
                }
            }
            OutputFormat::Text => {
                let _ = writeln!(io::stderr(), "Error: {:#}", error);
            }
        }
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

/// Error output structure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Output for `put` command.
#[derive(Debug, Serialize)]
pub struct PutOutput {
    pub success: bool,
    pub result_code: u8,
    pub name: String,
    pub size: u64,
    pub blake3: Digest,
    pub stored_at: DateTime<Utc>,
    pub download_url: String,
}

impl From<StoredFile> for PutOutput {
    fn from(stored: StoredFile) -> Self {
        Self {
            success: true,
            result_code: 0,
            download_url: format!("{}{}", DOWNLOAD_PREFIX, stored.name),
            name: stored.name.into_string(),
            size: stored.size,
            blake3: stored.digest,
            stored_at: stored.stored_at,
        }
    }
}

/// Output for `resolve` command.
#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    pub success: bool,
    pub result_code: u8,
    pub name: String,
    pub path: String,
    pub content_type: String,
    pub size: u64,
}

impl ResolveOutput {
    pub fn new(name: &str, resolved: ResolvedFile) -> Self {
        Self {
            success: true,
            result_code: 0,
            name: name.to_string(),
            path: resolved.path.display().to_string(),
            content_type: resolved.content_type,
            size: resolved.size,
        }
    }
}
