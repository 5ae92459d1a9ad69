//! Shared output formatting for validation reports.
//!
//! Provides JSON and plain-text formatters for `ReportSummary`.
//! Color/terminal formatting is excluded from this core module; that concern
//! belongs to the CLI layer.

use std::io::Write;

use crate::messages::Severity;
use crate::report::ReportSummary;

/// Format a `ReportSummary` as JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(summary: &ReportSummary, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Format a `ReportSummary` as human-readable plain text to a writer.
///
/// Messages are grouped by severity, most severe first. The final verdict
/// line is left to the caller.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(summary: &ReportSummary, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer, "  NAVIGATION DOCUMENT CHECK")?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer)?;
    writeln!(writer, "  Fatal errors:   {}", summary.counts.fatal)?;
    writeln!(writer, "  Errors:         {}", summary.counts.errors)?;
    writeln!(writer, "  Warnings:       {}", summary.counts.warnings)?;
    writeln!(writer)?;

    for (severity, title) in [
        (Severity::Fatal, "FATAL ERRORS"),
        (Severity::Error, "ERRORS"),
        (Severity::Warning, "WARNINGS"),
        (Severity::Info, "INFO"),
        (Severity::Usage, "USAGE"),
    ] {
        let mut messages = summary
            .messages
            .iter()
            .filter(|m| m.severity == severity)
            .peekable();
        if messages.peek().is_none() {
            continue;
        }
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  {title}")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for message in messages {
            writeln!(writer, "{}", message.format_human_readable())?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "=".repeat(80))?;
    Ok(())
}

/// The one-line verdict for a summary, without color.
#[must_use]
pub fn verdict(summary: &ReportSummary) -> String {
    if summary.ok {
        "\u{2713} No errors or warnings detected".to_owned()
    } else {
        format!(
            "\u{2717} Check finished with {} fatal error(s), {} error(s) and {} warning(s)",
            summary.counts.fatal, summary.counts.errors, summary.counts.warnings
        )
    }
}
