//! Human-readable and JSON listings of a project

use dbc_core::dbc::{format_number, serializer::signal_line, ParseSummary};
use dbc_core::{Project, ProjectStats};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

/// Write the node list, every message with its signals, and the value tables
pub fn write_project<W: Write>(out: &mut W, project: &Project) -> io::Result<()> {
    writeln!(out, "VERSION \"{}\"", project.version)?;
    writeln!(out, "Nodes: {}", project.nodes().join(" "))?;

    if project.messages.is_empty() {
        writeln!(out, "No messages.")?;
    }
    for message in &project.messages {
        writeln!(
            out,
            "- BO_ 0x{:X} {}: DLC={}, TX={}, SIGS={}{}",
            message.id,
            message.name,
            message.dlc,
            message.transmitter,
            message.signals.len(),
            if message.extended { " (extended)" } else { "" }
        )?;
        for (index, signal) in message.signals.iter().enumerate() {
            writeln!(out, "    [{}]{}", index, signal_line(signal))?;
        }
    }

    let names = project.value_table_names();
    if !names.is_empty() {
        writeln!(out, "Value tables:")?;
        for table in project.value_tables() {
            writeln!(out, "  {} ({} entries)", table.name, table.len())?;
        }
    }
    Ok(())
}

/// Write a project as pretty-printed JSON
pub fn write_project_json<W: Write>(out: &mut W, project: &Project) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, project)?;
    writeln!(out)
}

/// Outcome of checking one file
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub path: PathBuf,
    pub stats: Option<ProjectStats>,
    pub skipped: usize,
    pub dropped: usize,
    pub error: Option<String>,
}

impl CheckResult {
    pub fn ok(path: PathBuf, stats: ProjectStats, summary: ParseSummary) -> Self {
        Self {
            path,
            stats: Some(stats),
            skipped: summary.skipped,
            dropped: summary.dropped,
            error: None,
        }
    }

    pub fn failed(path: PathBuf, error: impl ToString) -> Self {
        Self {
            path,
            stats: None,
            skipped: 0,
            dropped: 0,
            error: Some(error.to_string()),
        }
    }
}

/// One line per checked file
pub fn write_check_results<W: Write>(out: &mut W, results: &[CheckResult]) -> io::Result<()> {
    for result in results {
        match (&result.stats, &result.error) {
            (Some(stats), _) => writeln!(
                out,
                "✓ {}: {} nodes, {} messages, {} signals, {} value tables ({} skipped, {} dropped)",
                result.path.display(),
                stats.num_nodes,
                stats.num_messages,
                stats.num_signals,
                stats.num_value_tables,
                result.skipped,
                result.dropped
            )?,
            (None, error) => writeln!(
                out,
                "✗ {}: {}",
                result.path.display(),
                error.as_deref().unwrap_or("unknown error")
            )?,
        }
    }
    Ok(())
}

/// `[min .. max]` as printed by the `range` command
pub fn format_range(min: f64, max: f64) -> String {
    format!("[{} .. {}]", format_number(min), format_number(max))
}
