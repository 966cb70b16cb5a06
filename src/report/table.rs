//! Fixed-width text tables.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::collector::domain::{DISK_CLASSES, NET_CLASSES};
use crate::report::ReportError;
use crate::report::reader::SeriesMap;
use crate::report::stats::Summary;

/// CPU table column order.
pub const CPU_TABLE_CLASSES: [&str; 10] = [
    "system",
    "usr",
    "nice",
    "irq",
    "softirq",
    "iowait",
    "guest",
    "guestnice",
    "steal",
    "idle",
];

/// Aggregate resource left out of the per-CPU interrupt columns.
const AGGREGATE_CPU: &str = "cpu";

/// Summary of one cell. `Ok(None)` when the header never declared the key.
fn cell(series: &SeriesMap, resource: &str, class: &str) -> Result<Option<Summary>, ReportError> {
    let Some(samples) = series.get(resource).and_then(|classes| classes.get(class)) else {
        return Ok(None);
    };
    Summary::of(samples)
        .map(Some)
        .ok_or_else(|| ReportError::EmptySeries(format!("{}.{}", resource, class)))
}

/// Renders the CPU utilization table. Rows are CPU ids in string order.
pub fn cpu_table(out: &mut String, cpu: &SeriesMap) -> Result<(), ReportError> {
    writeln!(out, "CPU utilization, mean (SD):")?;
    writeln!(out)?;

    write!(out, "      ")?;
    for class in CPU_TABLE_CLASSES {
        write!(out, " {:<12}", class)?;
    }
    writeln!(out)?;

    for resource in cpu.keys() {
        write!(out, "  {:<4}", resource)?;
        for class in CPU_TABLE_CLASSES {
            let text = cell(cpu, resource, class)?
                .map(|s| s.to_string())
                .unwrap_or_default();
            write!(out, " {:<12}", text)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Renders an interrupt or soft-IRQ table with one column per CPU.
///
/// `cpus` are the CPU-table resources. When they hold no per-CPU entry
/// (no CPU columns, or only the aggregate) the columns fall back to the CPUs
/// observed in `series` itself.
pub fn interrupt_table(
    out: &mut String,
    title: &str,
    series: &SeriesMap,
    cpus: &[&str],
) -> Result<(), ReportError> {
    let mut columns: Vec<&str> = cpus
        .iter()
        .copied()
        .filter(|&c| c != AGGREGATE_CPU)
        .collect();
    if columns.is_empty() {
        columns = series
            .values()
            .flat_map(|classes| classes.keys().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
    }

    keyed_table(out, title, "interrupt", series, &columns)
}

/// Renders the `--extended` network table.
pub fn net_table(out: &mut String, series: &SeriesMap) -> Result<(), ReportError> {
    let columns: Vec<&str> = NET_CLASSES.iter().map(|&(class, _)| class).collect();
    keyed_table(out, "Network", "interface", series, &columns)
}

/// Renders the `--extended` disk table.
pub fn disk_table(out: &mut String, series: &SeriesMap) -> Result<(), ReportError> {
    let columns: Vec<&str> = DISK_CLASSES.iter().map(|&(class, _)| class).collect();
    keyed_table(out, "Disk", "device", series, &columns)
}

fn keyed_table(
    out: &mut String,
    title: &str,
    label: &str,
    series: &SeriesMap,
    columns: &[&str],
) -> Result<(), ReportError> {
    writeln!(out, "{}, mean (SD):", title)?;
    writeln!(out)?;

    write!(out, "  {:<10}", label)?;
    for column in columns {
        write!(out, "{:>20}", column)?;
    }
    writeln!(out)?;

    for resource in series.keys() {
        write!(out, "  {:<10}", resource)?;
        for &column in columns {
            let text = cell(series, resource, column)?
                .map(|s| s.to_string())
                .unwrap_or_default();
            write!(out, "{:>20}", text)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
