//! Recording loop: drives every enabled collector once per tick and writes
//! the delimited text stream.
//!
//! A recording is a `#` comment block describing the kept columns, a header
//! line with the column names, then one line of unsigned integers per tick.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use tracing::{debug, info, trace, warn};

use crate::collector::Collector;
use crate::error::UstatError;

/// Granularity at which the loop re-checks the shutdown flag while waiting.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Column name predicate built from `--grep`.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilter {
    pattern: Option<Regex>,
}

impl ColumnFilter {
    /// Compiles `pattern`; `None` keeps every column.
    pub fn new(pattern: Option<&str>) -> Result<Self, UstatError> {
        let pattern = pattern
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| UstatError::config(format!("invalid --grep pattern '{}': {}", p, e)))
            })
            .transpose()?;
        Ok(Self { pattern })
    }

    /// Returns true when `name` belongs in the recording.
    pub fn keep(&self, name: &str) -> bool {
        self.pattern.as_ref().is_none_or(|re| re.is_match(name))
    }
}

/// Writes a recording from a fixed list of collectors.
///
/// The kept-column mask is derived once from the filter, so the header and
/// every data line carry the same number of fields.
pub struct Recorder<W: Write> {
    collectors: Vec<Box<dyn Collector>>,
    masks: Vec<Vec<bool>>,
    delimiter: char,
    out: W,
    rows: u64,
}

impl<W: Write> Recorder<W> {
    pub fn new(
        collectors: Vec<Box<dyn Collector>>,
        filter: &ColumnFilter,
        delimiter: char,
        out: W,
    ) -> Result<Self, UstatError> {
        if collectors.is_empty() {
            return Err(UstatError::config(
                "No stats enabled; select at least one of --cpu, --int, --softirq, --net, --disk",
            ));
        }

        let masks: Vec<Vec<bool>> = collectors
            .iter()
            .map(|c| c.metrics().names().iter().map(|n| filter.keep(n)).collect())
            .collect();

        let kept: usize = masks
            .iter()
            .map(|m| m.iter().filter(|&&k| k).count())
            .sum();
        if kept == 0 {
            warn!("Column filter matches no columns; data lines will be empty");
        }
        debug!("Recorder: {} collectors, {} columns kept", collectors.len(), kept);

        Ok(Self {
            collectors,
            masks,
            delimiter,
            out,
            rows: 0,
        })
    }

    /// Number of data lines written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Writes the comment block and the header line.
    pub fn write_preamble(&mut self) -> Result<(), UstatError> {
        let mut text = String::new();
        text.push_str(&format!(
            "# This file has been generated by ustat {}.\n",
            env!("CARGO_PKG_VERSION")
        ));
        text.push_str(&format!(
            "# Recorded at {}.\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        text.push_str("#\n");
        text.push_str("# Column descriptions:\n");

        let mut names: Vec<&str> = Vec::new();
        for (collector, mask) in self.collectors.iter().zip(&self.masks) {
            for ((name, description), &keep) in collector.metrics().columns().zip(mask) {
                if keep {
                    text.push_str(&format!("# {}\n", description));
                    names.push(name);
                }
            }
        }

        text.push_str(&join(names, self.delimiter));
        text.push('\n');

        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    /// Collects one tick from every collector and writes it as a single line.
    ///
    /// Nothing is written unless every collector succeeded.
    pub fn write_row(&mut self) -> Result<(), UstatError> {
        let mut fields: Vec<u64> = Vec::new();
        for (collector, mask) in self.collectors.iter_mut().zip(&self.masks) {
            let row = collector.collect()?;
            fields.extend(row.into_iter().zip(mask).filter(|&(_, &keep)| keep).map(|(v, _)| v));
        }

        let mut line = join(fields, self.delimiter);
        line.push('\n');
        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;

        self.rows += 1;
        trace!("Row #{}: {} fields", self.rows, self.masks.iter().flatten().filter(|&&k| k).count());
        Ok(())
    }

    /// Writes one row per `interval` until `running` is cleared or `count`
    /// rows have been written.
    ///
    /// Tick `n` is due at `start + n * interval`, so a slow tick shortens the
    /// following wait instead of shifting the schedule.
    pub fn run(
        &mut self,
        interval: Duration,
        running: &AtomicBool,
        count: Option<u64>,
    ) -> Result<(), UstatError> {
        let start = Instant::now();
        let mut tick: u32 = 0;

        info!("Starting collection loop");

        while running.load(Ordering::SeqCst) {
            if count.is_some_and(|limit| self.rows >= limit) {
                debug!("Reached row limit of {}", self.rows);
                break;
            }

            tick = tick.saturating_add(1);
            let deadline = interval
                .checked_mul(tick)
                .and_then(|offset| start.checked_add(offset))
                .ok_or_else(|| {
                    UstatError::config(format!(
                        "sampling interval of {}s is too large",
                        interval.as_secs()
                    ))
                })?;
            if !wait_until(deadline, running) {
                break;
            }

            self.write_row()?;
        }

        info!("Collection stopped after {} rows", self.rows);
        Ok(())
    }

    /// Flushes the sink and hands it back.
    pub fn finish(mut self) -> Result<W, UstatError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Sleeps until `deadline` in short slices. Returns false if `running` was
/// cleared first.
fn wait_until(deadline: Instant, running: &AtomicBool) -> bool {
    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(SHUTDOWN_POLL));
    }
}

fn join<T: ToString>(fields: impl IntoIterator<Item = T>, delimiter: char) -> String {
    let mut line = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            line.push(delimiter);
        }
        line.push_str(&field.to_string());
    }
    line
}
