//! Offline summary of a recording.
//!
//! The recording is parsed by column name, every `(resource, class)` series
//! is reduced to its mean and standard deviation, and the result is laid out
//! as fixed-width tables. The whole report is rendered into memory first so
//! that a parse failure never leaves a partial table on stdout.

pub mod reader;
pub mod stats;
pub mod table;

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::collector::Domain;

pub use reader::{ColumnKey, Recording, classify, read_recording};
pub use stats::Summary;

/// Errors while summarising a recording.
#[derive(Debug)]
pub enum ReportError {
    /// The recording could not be read.
    Io(std::io::Error),
    /// A recognized column name lacks the tokens its prefix requires.
    MalformedColumn(String),
    /// A cell of a recognized column is not an unsigned integer.
    InvalidValue {
        column: String,
        value: String,
        line: usize,
    },
    /// A column declared in the header never received a sample.
    EmptySeries(String),
    /// The recording has no data rows.
    NoSamples,
    /// Table rendering failed.
    Format(fmt::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "I/O error: {}", e),
            ReportError::MalformedColumn(name) => write!(f, "malformed column name: {}", name),
            ReportError::InvalidValue {
                column,
                value,
                line,
            } => write!(
                f,
                "invalid value '{}' for column {} on line {}",
                value, column, line
            ),
            ReportError::EmptySeries(key) => write!(f, "no samples for column {}", key),
            ReportError::NoSamples => write!(f, "recording contains no samples"),
            ReportError::Format(e) => write!(f, "formatting error: {}", e),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(e) => Some(e),
            ReportError::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Io(e)
    }
}

impl From<fmt::Error> for ReportError {
    fn from(e: fmt::Error) -> Self {
        ReportError::Format(e)
    }
}

/// How a recording is read and which tables are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub delimiter: char,
    /// Also summarise `net` and `disk` columns.
    pub extended: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            extended: false,
        }
    }
}

/// Reads `path` and renders its report.
pub fn generate_file(path: &Path, options: &ReportOptions) -> Result<String, ReportError> {
    let file = File::open(path)?;
    info!("Processing {}", path.display());
    generate(BufReader::new(file), &path.display().to_string(), options)
}

/// Renders the report of a recording read from `reader`. `name` only
/// appears in the title line.
pub fn generate<R: BufRead>(
    reader: R,
    name: &str,
    options: &ReportOptions,
) -> Result<String, ReportError> {
    let recording = read_recording(reader, options)?;
    debug!(
        "Read {} rows, {} domains",
        recording.rows,
        recording.series.len()
    );
    render(&recording, name, options)
}

fn render(
    recording: &Recording,
    name: &str,
    options: &ReportOptions,
) -> Result<String, ReportError> {
    use std::fmt::Write;

    let mut out = String::new();
    writeln!(out, "Processing {} ...", name)?;
    writeln!(out)?;
    writeln!(out, "N = {}", recording.rows)?;
    writeln!(out)?;

    let cpu = recording.domain(Domain::Cpu);
    table::cpu_table(&mut out, cpu)?;
    writeln!(out)?;

    let cpus: Vec<&str> = cpu.keys().map(String::as_str).collect();
    table::interrupt_table(
        &mut out,
        "Interrupts",
        recording.domain(Domain::Interrupts),
        &cpus,
    )?;
    writeln!(out)?;
    table::interrupt_table(
        &mut out,
        "SoftIRQs",
        recording.domain(Domain::SoftIrqs),
        &cpus,
    )?;
    writeln!(out)?;

    if options.extended {
        table::net_table(&mut out, recording.domain(Domain::Net))?;
        writeln!(out)?;
        table::disk_table(&mut out, recording.domain(Domain::Disk))?;
        writeln!(out)?;
    }

    Ok(out)
}
