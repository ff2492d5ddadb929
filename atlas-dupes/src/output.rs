//! Shared output formatting for analysis reports.
//!
//! Provides JSON and plain-text formatters for `AnalysisReport`.
//! Color/terminal formatting is left to the CLI layer.

use std::io::Write;

use crate::report::AnalysisReport;

/// Format an `AnalysisReport` as JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(report: &AnalysisReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Format an `AnalysisReport` as human-readable plain text to a writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(report: &AnalysisReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    write_human_filtered(report, "", writer)
}

/// Like [`write_human`], but only list the duplicates matching `filter`
/// (see [`AnalysisReport::filter`]).
///
/// The counts and the final verdict always cover every duplicate found.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human_filtered(
    report: &AnalysisReport,
    filter: &str,
    writer: &mut dyn Write,
) -> anyhow::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer, "  ATLAS REPEAT CHECKER")?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer)?;

    if report.nothing_to_analyze {
        write_scan_errors(report, writer)?;
        writeln!(writer, "No valid atlas files found! Nothing to analyze.")?;
        writeln!(writer, "{}", "=".repeat(80))?;
        return Ok(());
    }

    writeln!(writer, "  Atlas: {}", report.scanned_containers)?;
    writeln!(writer, "  Atlas failed: {}", report.failed_containers)?;
    writeln!(writer, "  GUID: {}", report.unique_guids)?;
    writeln!(writer, "  Repeat GUID: {}", report.duplicates_count())?;
    writeln!(writer)?;

    write_scan_errors(report, writer)?;

    if report.has_duplicates() {
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  REPEAT IMAGES (used by multiple atlases)")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        let shown = report.filter(filter);
        if !filter.is_empty() {
            writeln!(
                writer,
                "  Filter: \"{filter}\" ({} of {} shown)",
                shown.len(),
                report.duplicates_count()
            )?;
            writeln!(writer)?;
        }
        for entry in shown {
            let name = if entry.asset_name.is_empty() {
                entry.guid.as_str()
            } else {
                entry.asset_name.as_str()
            };
            writeln!(writer, "{name}")?;
            writeln!(writer, "  Path: {}", entry.display_path())?;
            writeln!(writer, "  GUID: {}", entry.guid)?;
            writeln!(
                writer,
                "  Used by the following {} atlases:",
                entry.owners.len()
            )?;
            for owner in &entry.owners {
                writeln!(writer, "    \u{2022} {} ({})", owner.name, owner.path.display())?;
            }
            writeln!(writer)?;
        }
    }

    writeln!(writer, "{}", "=".repeat(80))?;
    if report.has_duplicates() {
        writeln!(
            writer,
            "\u{2717} Found {} repeat images! It's recommended to check these images.",
            report.duplicates_count()
        )?;
    } else {
        writeln!(
            writer,
            "\u{2713} No repeat images found! All images are used by only one atlas."
        )?;
    }
    writeln!(writer, "{}", "=".repeat(80))?;

    Ok(())
}

fn write_scan_errors(report: &AnalysisReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    if report.scan_errors.is_empty() {
        return Ok(());
    }
    writeln!(writer, "{}", "-".repeat(80))?;
    writeln!(writer, "  WARNINGS (files left out of the analysis)")?;
    writeln!(writer, "{}", "-".repeat(80))?;
    for scan_err in &report.scan_errors {
        writeln!(writer, "{}", scan_err.format_human_readable())?;
    }
    writeln!(writer)?;
    Ok(())
}
