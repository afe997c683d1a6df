//! Output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::error::Result;
use crate::scan::ScanWarning;
use serde::Serialize;

/// Serializes command results to stdout; diagnostics go to stderr.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Render a value in the configured format.
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Toml => toml::to_string_pretty(value)?,
        })
    }

    pub fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.render(value)?.trim_end());
        Ok(())
    }

    /// Print a message if not in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    /// Report skipped paths on stderr.
    pub fn warnings(&self, warnings: &[ScanWarning]) {
        if self.quiet {
            return;
        }
        for warning in warnings {
            eprintln!("Warning: skipped {}: {}", warning.path.display(), warning.message);
        }
    }
}
