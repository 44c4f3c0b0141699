//! Result sinks that turn an [`AuditReport`] into output.
//!
//! - [`TextSink`]: one line per violation and advisory, then a summary
//! - [`JsonSink`]: the full report as pretty-printed JSON

use std::io::Write;

use serde::Deserialize;

use crate::audit::{AuditReport, AuditStatus};

/// Output format for audit results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Destination for a finished audit report.
pub trait ResultSink {
    /// Emit the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying output fails.
    fn emit(&mut self, report: &AuditReport) -> anyhow::Result<()>;
}

/// Writes a human-readable summary.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    /// Wrap a writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for TextSink<W> {
    fn emit(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        let topology = &report.topology;

        if report.status == AuditStatus::Skipped {
            writeln!(
                self.out,
                "SKIPPED: audit only applies to single-replica topologies \
                 (control plane: {}, infrastructure: {})",
                topology.control_plane, topology.infrastructure
            )?;
            return Ok(());
        }

        for finding in report.violations() {
            if let Some(message) = finding.message() {
                writeln!(self.out, "FAIL  {message}")?;
            }
        }
        for finding in report.warnings() {
            if let Some(message) = finding.message() {
                writeln!(self.out, "WARN  {message}")?;
            }
        }

        writeln!(
            self.out,
            "{}: {} workload(s) inspected, {} subject to the single-replica rule, \
             {} violation(s), {} warning(s) (control plane: {}, infrastructure: {})",
            report.status.label(),
            report.findings.len(),
            report.checked_count(),
            report.violations().count(),
            report.warnings().count(),
            topology.control_plane,
            topology.infrastructure
        )?;
        self.out.flush()?;
        Ok(())
    }
}

/// Writes the report as JSON.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    /// Wrap a writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for JsonSink<W> {
    fn emit(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, report)
            .map_err(|e| anyhow::anyhow!("failed to serialize audit report: {e}"))?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Boxed sink for the requested format.
pub fn sink_for<'a, W: Write + 'a>(format: ReportFormat, out: W) -> Box<dyn ResultSink + 'a> {
    match format {
        ReportFormat::Text => Box::new(TextSink::new(out)),
        ReportFormat::Json => Box::new(JsonSink::new(out)),
    }
}
