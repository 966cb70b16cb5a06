//! Parses a recording back into per-key sample series.

use std::collections::{BTreeMap, HashSet};
use std::io::BufRead;

use tracing::{debug, trace};

use crate::collector::Domain;
use crate::report::{ReportError, ReportOptions};

/// Samples keyed by resource, then class.
pub type SeriesMap = BTreeMap<String, BTreeMap<String, Vec<f64>>>;

/// Where a recognized column lands in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnKey {
    pub domain: Domain,
    pub resource: String,
    pub class: String,
}

impl ColumnKey {
    fn new(domain: Domain, resource: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            domain,
            resource: resource.into(),
            class: class.into(),
        }
    }
}

/// Maps a header name to its series key.
///
/// Returns `Ok(None)` for names the report does not summarise. `net` and
/// `disk` columns are only recognized when `extended` is set.
pub fn classify(name: &str, extended: bool) -> Result<Option<ColumnKey>, ReportError> {
    let tokens: Vec<&str> = name.split('.').collect();
    let malformed = || ReportError::MalformedColumn(name.to_string());

    let key = if name.starts_with("cpu") {
        let (resource, class) = name.split_once('.').ok_or_else(malformed)?;
        ColumnKey::new(Domain::Cpu, resource, class)
    } else if name.starts_with("softirq") {
        if tokens.len() < 3 {
            return Err(malformed());
        }
        ColumnKey::new(Domain::SoftIrqs, tokens[1], tokens[2..].join("."))
    } else if name.starts_with("int") {
        let (resource, class) = name.split_once('.').ok_or_else(malformed)?;
        ColumnKey::new(Domain::Interrupts, resource, class)
    } else if extended && (tokens[0] == "net" || tokens[0] == "disk") {
        if tokens.len() < 4 {
            return Err(malformed());
        }
        let domain = if tokens[0] == "net" {
            Domain::Net
        } else {
            Domain::Disk
        };
        let split = tokens.len() - 2;
        ColumnKey::new(domain, tokens[1..split].join("."), tokens[split..].join("."))
    } else {
        return Ok(None);
    };

    if key.resource.is_empty() || key.class.is_empty() {
        return Err(malformed());
    }
    Ok(Some(key))
}

/// Everything a report needs from one recording.
#[derive(Debug, Default)]
pub struct Recording {
    /// Number of data rows.
    pub rows: usize,
    pub series: BTreeMap<Domain, SeriesMap>,
}

impl Recording {
    /// Series of `domain`; empty when the recording had none.
    pub fn domain(&self, domain: Domain) -> &SeriesMap {
        static EMPTY: SeriesMap = BTreeMap::new();
        self.series.get(&domain).unwrap_or(&EMPTY)
    }
}

struct Column {
    index: usize,
    name: String,
    key: ColumnKey,
}

/// Reads a recording, looking every value up through the header by name.
pub fn read_recording<R: BufRead>(
    reader: R,
    options: &ReportOptions,
) -> Result<Recording, ReportError> {
    let mut recording = Recording::default();
    let mut columns: Option<Vec<Column>> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        let line_no = idx + 1;

        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(options.delimiter).collect();
        if fields[0].starts_with('#') {
            continue;
        }

        let Some(known) = columns.as_ref() else {
            let header = parse_header(&fields, options.extended)?;
            for column in &header {
                recording
                    .series
                    .entry(column.key.domain)
                    .or_default()
                    .entry(column.key.resource.clone())
                    .or_default()
                    .entry(column.key.class.clone())
                    .or_default();
            }
            debug!("Header: {} fields, {} recognized", fields.len(), header.len());
            columns = Some(header);
            continue;
        };

        for column in known {
            let Some(cell) = fields.get(column.index) else {
                continue;
            };
            let value: u64 = cell.trim().parse().map_err(|_| ReportError::InvalidValue {
                column: column.name.clone(),
                value: cell.to_string(),
                line: line_no,
            })?;

            if let Some(samples) = recording
                .series
                .get_mut(&column.key.domain)
                .and_then(|r| r.get_mut(&column.key.resource))
                .and_then(|c| c.get_mut(&column.key.class))
            {
                samples.push(value as f64);
            }
        }
        recording.rows += 1;
        trace!("Line {}: {} fields", line_no, fields.len());
    }

    if recording.rows == 0 {
        return Err(ReportError::NoSamples);
    }
    Ok(recording)
}

fn parse_header(fields: &[&str], extended: bool) -> Result<Vec<Column>, ReportError> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();

    for (index, &name) in fields.iter().enumerate() {
        if name.is_empty() || !seen.insert(name) {
            continue;
        }
        if let Some(key) = classify(name, extended)? {
            columns.push(Column {
                index,
                name: name.to_string(),
                key,
            });
        }
    }

    Ok(columns)
}
