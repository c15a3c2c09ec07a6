use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Stdout, Write};
use tracing::info;

use crate::certs::{RotationEvent, TickReport};
use crate::error::Result;
use crate::models::ScheduleConfig;

const SEPARATOR: &str =
    "=============================================================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable log lines
    #[default]
    Text,
    /// One JSON object per tick on stdout
    Json,
}

/// Timestamp layout used in every report line.
pub fn format_stamp(at: DateTime<Utc>) -> String {
    at.format("%b %e %Y %H:%M:%S").to_string()
}

/// Text lines describing a single rotation.
pub fn rotation_lines(event: &RotationEvent) -> Vec<String> {
    let label = event.kind;
    let mut lines = vec![
        format!("Rotated {} cert at [{}]", label, format_stamp(event.rotated_at)),
        format!("New {} cert validTill [{}]", label, format_stamp(event.valid_to)),
    ];
    if event.clamped {
        lines.push(format!(
            "New {} cert capped to CA lifetime minus margin",
            label
        ));
    }
    lines
}

/// Writes schedule and tick reports to `out`. Diagnostics go through
/// `tracing`, which logs to stderr, so JSON output on `out` stays clean.
pub struct Reporter<W: Write = Stdout> {
    format: OutputFormat,
    out: W,
}

impl Reporter<Stdout> {
    pub fn new(format: OutputFormat) -> Self {
        Self::with_writer(format, io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn with_writer(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Startup banner with the resolved schedule in hours.
    pub fn schedule(&mut self, config: &ScheduleConfig, now: DateTime<Utc>) -> Result<()> {
        let hours = config.hours_summary();
        if self.format == OutputFormat::Json {
            return self.json_line(&hours);
        }

        info!("CA cert duration is            [{}] hours", hours.ca_duration);
        info!("CA expiry duration is          [{}] hours", hours.ca_expiry);
        info!("Node cert duration is          [{}] hours", hours.node_duration);
        info!("Node expiry duration is        [{}] hours", hours.node_expiry);
        info!("Client cert duration is        [{}] hours", hours.client_duration);
        info!("Client expiry duration is      [{}] hours", hours.client_expiry);
        info!("Min-cert-duration is           [{}] hours", hours.min_cert_duration);
        info!("Current time is [{}]", format_stamp(now));
        info!("{}", SEPARATOR);
        Ok(())
    }

    pub fn tick(&mut self, report: &TickReport) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.tick_text(report),
            OutputFormat::Json => self.json_line(report),
        }
    }

    fn json_line<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, value).map_err(io::Error::from)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn tick_text(&mut self, report: &TickReport) -> Result<()> {
        writeln!(
            self.out,
            "{}",
            format!("Cron: [{}] at [{}]", report.cron, format_stamp(report.at)).green()
        )?;

        for event in &report.rotations {
            info!("Rotating {} cert", event.kind);
            for line in rotation_lines(event) {
                info!("{}", line);
            }
            if let Some(next) = event.next_rotation {
                writeln!(
                    self.out,
                    "{}",
                    format!("Next CA cron at [{}]", format_stamp(next)).yellow()
                )?;
            }
        }

        info!("{}", SEPARATOR);
        Ok(())
    }

    pub fn finished(&mut self, iterations: usize) -> Result<()> {
        info!(
            "✓ Cert rotation will work with these values, verification passed after {} cron tick(s). Exiting",
            iterations
        );
        self.out.flush()?;
        Ok(())
    }
}
