//! Turns cumulative counter snapshots into per-interval rows.
//!
//! Raw domains report `current - previous` with wrapping `u64` arithmetic, so
//! a counter that wraps or resets shows up as a large but well defined value.
//! The CPU domain reports each time class as a rounded percentage of the
//! elapsed CPU time of its resource.

use tracing::{debug, trace};

use crate::collector::domain::{CPU_CLASSES, CPU_RUNTIME_CLASSES, Domain, MetricSet};
use crate::collector::error::CollectError;
use crate::collector::traits::{Collector, Counter, CounterSource};

/// Cumulative counter values of one domain, aligned with its `MetricSet`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    values: Vec<u64>,
}

impl Snapshot {
    pub fn new(values: Vec<u64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Element-wise `current - previous`, modulo 2^64.
pub fn raw_delta(previous: &[u64], current: &[u64]) -> Vec<u64> {
    previous
        .iter()
        .zip(current)
        .map(|(&prev, &curr)| curr.wrapping_sub(prev))
        .collect()
}

/// Per-CPU utilization percentages.
///
/// Both slices hold whole blocks of `CPU_CLASSES.len()` counters. Within a
/// block the runtime is the sum of the first `CPU_RUNTIME_CLASSES` deltas and
/// every class reports `round(100 * delta / runtime)`. A block with zero
/// runtime reports zero for every class.
pub fn cpu_utilization(previous: &[u64], current: &[u64]) -> Vec<u64> {
    let deltas = raw_delta(previous, current);
    let mut row = Vec::with_capacity(deltas.len());

    for block in deltas.chunks(CPU_CLASSES.len()) {
        let runtime = block
            .iter()
            .take(CPU_RUNTIME_CLASSES)
            .fold(0u64, |acc, &d| acc.wrapping_add(d));

        if runtime == 0 {
            row.extend(std::iter::repeat_n(0, block.len()));
            continue;
        }

        let runtime = runtime as f64;
        row.extend(
            block
                .iter()
                .map(|&delta| (100.0 * delta as f64 / runtime).round() as u64),
        );
    }

    row
}

/// Stateful converter for one domain.
///
/// Owns its source and the previous snapshot. The baseline is read at
/// construction, so the first row covers the time since `new`, not since boot.
pub struct DeltaEngine<S: CounterSource> {
    source: S,
    metrics: MetricSet,
    previous: Snapshot,
}

impl<S: CounterSource> DeltaEngine<S> {
    /// Takes the baseline snapshot and fixes the column layout.
    pub fn new(mut source: S) -> Result<Self, CollectError> {
        let domain = source.domain();
        let counters = source.read()?;
        let metrics = MetricSet::from_counters(domain, &counters);

        if domain.is_normalized() {
            check_cpu_layout(&metrics)?;
        }

        debug!(
            domain = %domain,
            columns = metrics.len(),
            "delta engine initialized"
        );

        Ok(Self {
            source,
            metrics,
            previous: snapshot_of(&counters),
        })
    }

    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    /// Reads the source and returns the row relative to the previous read.
    pub fn collect(&mut self) -> Result<Vec<u64>, CollectError> {
        let counters = self.source.read()?;
        self.check_shape(&counters)?;

        let current = snapshot_of(&counters);
        let row = if self.metrics.domain().is_normalized() {
            cpu_utilization(self.previous.values(), current.values())
        } else {
            raw_delta(self.previous.values(), current.values())
        };
        self.previous = current;

        trace!(domain = %self.metrics.domain(), ?row, "collected");
        Ok(row)
    }

    fn check_shape(&self, counters: &[Counter]) -> Result<(), CollectError> {
        let domain = self.metrics.domain();
        if counters.len() != self.metrics.len() {
            return Err(CollectError::ShapeChanged {
                domain,
                expected: self.metrics.len(),
                actual: counters.len(),
            });
        }

        let renamed = self
            .metrics
            .names()
            .iter()
            .zip(counters)
            .find(|(name, counter)| **name != counter.name);
        if let Some((expected, counter)) = renamed {
            return Err(CollectError::ColumnChanged {
                domain,
                expected: expected.clone(),
                actual: counter.name.clone(),
            });
        }

        Ok(())
    }
}

impl<S: CounterSource> Collector for DeltaEngine<S> {
    fn metrics(&self) -> &MetricSet {
        DeltaEngine::metrics(self)
    }

    fn collect(&mut self) -> Result<Vec<u64>, CollectError> {
        DeltaEngine::collect(self)
    }
}

fn snapshot_of(counters: &[Counter]) -> Snapshot {
    Snapshot::new(counters.iter().map(|c| c.value).collect())
}

/// The CPU domain must be whole blocks of the ten classes in canonical order.
fn check_cpu_layout(metrics: &MetricSet) -> Result<(), CollectError> {
    let layout_error = |message: String| CollectError::Layout {
        domain: metrics.domain(),
        message,
    };

    if metrics.len() % CPU_CLASSES.len() != 0 {
        return Err(layout_error(format!(
            "{} columns is not a multiple of {}",
            metrics.len(),
            CPU_CLASSES.len()
        )));
    }

    for block in metrics.names().chunks(CPU_CLASSES.len()) {
        for (name, (class, _)) in block.iter().zip(CPU_CLASSES) {
            let matches = name
                .rsplit_once('.')
                .is_some_and(|(_, suffix)| suffix == class);
            if !matches {
                return Err(layout_error(format!(
                    "expected a '{}' column, found '{}'",
                    class, name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, ScriptedSource};
    use crate::collector::procfs::ProcfsSource;

    fn cpu_names(id: &str) -> Vec<String> {
        CPU_CLASSES
            .iter()
            .map(|(class, _)| format!("{}.{}", id, class))
            .collect()
    }

    #[test]
    fn test_raw_delta_is_elementwise() {
        let source = ScriptedSource::new(
            Domain::Interrupts,
            ["int0.cpu0", "int0.cpu1", "intNMI.cpu0"],
        )
        .frame(&[100, 200, 7])
        .frame(&[150, 200, 9]);
        let mut engine = DeltaEngine::new(source).unwrap();

        assert_eq!(engine.collect().unwrap(), vec![50, 0, 2]);
    }

    #[test]
    fn test_raw_delta_wraps_on_decrease() {
        let source = ScriptedSource::new(Domain::Net, ["net.eth0.rx.bytes"])
            .frame(&[10])
            .frame(&[4]);
        let mut engine = DeltaEngine::new(source).unwrap();

        let row = engine.collect().unwrap();
        assert_eq!(row, vec![4u64.wrapping_sub(10)]);
        assert_eq!(row[0], u64::MAX - 5);
    }

    #[test]
    fn test_cpu_percentages() {
        //            usr nice system idle iowait irq softirq steal guest guestnice
        let prev = [0, 0, 0, 100, 0, 0, 0, 0, 0, 0];
        let curr = [50, 0, 50, 100, 0, 0, 0, 0, 0, 0];
        let source = ScriptedSource::new(Domain::Cpu, cpu_names("cpu0"))
            .frame(&prev)
            .frame(&curr);
        let mut engine = DeltaEngine::new(source).unwrap();

        let row = engine.collect().unwrap();
        assert_eq!(row[0], 50); // usr
        assert_eq!(row[2], 50); // system
        assert_eq!(row[3], 0); // idle
        assert_eq!(row.iter().sum::<u64>(), 100);
    }

    #[test]
    fn test_cpu_percentages_round_to_nearest() {
        // runtime 3: 1/3 -> 33, 2/3 -> 67
        let row = cpu_utilization(&[0; 10], &[1, 0, 0, 2, 0, 0, 0, 0, 0, 0]);
        assert_eq!(row[0], 33);
        assert_eq!(row[3], 67);
    }

    #[test]
    fn test_cpu_steal_and_guest_are_not_runtime() {
        // steal/guest deltas are reported against runtime but do not add to it
        let row = cpu_utilization(&[0; 10], &[10, 0, 0, 10, 0, 0, 0, 5, 20, 0]);
        assert_eq!(row[0], 50);
        assert_eq!(row[3], 50);
        assert_eq!(row[7], 25);
        assert_eq!(row[8], 100);
    }

    #[test]
    fn test_cpu_blocks_are_independent() {
        let mut names = cpu_names("cpu");
        names.extend(cpu_names("cpu0"));
        let source = ScriptedSource::new(Domain::Cpu, names)
            .frame(&[0; 20])
            .frame(&[
                25, 0, 0, 75, 0, 0, 0, 0, 0, 0, // cpu
                0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // cpu0 idle tick-less
            ]);
        let mut engine = DeltaEngine::new(source).unwrap();

        let row = engine.collect().unwrap();
        assert_eq!(&row[..4], &[25, 0, 0, 75]);
        assert!(row[10..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_second_collect_without_change_is_all_zero() {
        let source = ScriptedSource::new(Domain::Disk, ["disk.sda.read.sectors"])
            .frame(&[10])
            .frame(&[30]);
        let mut engine = DeltaEngine::new(source).unwrap();

        assert_eq!(engine.collect().unwrap(), vec![20]);
        assert_eq!(engine.collect().unwrap(), vec![0]);
    }

    #[test]
    fn test_cpu_zero_runtime_still_advances_baseline() {
        let busy = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let after = [60, 0, 0, 40, 0, 0, 0, 0, 0, 0];
        let source = ScriptedSource::new(Domain::Cpu, cpu_names("cpu0"))
            .frame(&busy)
            .frame(&busy)
            .frame(&after)
            .frame(&after);
        let mut engine = DeltaEngine::new(source).unwrap();

        assert_eq!(engine.collect().unwrap(), vec![0; 10]);
        assert_eq!(engine.previous().values(), &busy);

        let row = engine.collect().unwrap();
        assert_eq!((row[0], row[3]), (60, 40));

        assert_eq!(engine.collect().unwrap(), vec![0; 10]);
        assert_eq!(engine.previous().values(), &after);
    }

    #[test]
    fn test_first_row_is_relative_to_construction() {
        let mut fs = MockFs::single_cpu([1000, 0, 1000, 8000, 0, 0, 0, 0, 0, 0]);
        let mut engine =
            DeltaEngine::new(ProcfsSource::new(fs.clone(), "/proc", Domain::Cpu)).unwrap();
        assert_eq!(engine.metrics().names()[..2], ["cpu.usr", "cpu.nice"]);

        fs.set_single_cpu([1010, 0, 1030, 8060, 0, 0, 0, 0, 0, 0]);
        let row = engine.collect().unwrap();

        // aggregate and cpu0 see the same 100 jiffies
        for block in row.chunks(10) {
            assert_eq!(block[0], 10);
            assert_eq!(block[2], 30);
            assert_eq!(block[3], 60);
        }
    }

    #[test]
    fn test_shape_change_is_fatal() {
        let source = ScriptedSource::new(Domain::Net, ["net.lo.rx.bytes"])
            .frame(&[1])
            .frame(&[2, 3]);
        let mut engine = DeltaEngine::new(source).unwrap();

        match engine.collect() {
            Err(CollectError::ShapeChanged {
                domain,
                expected,
                actual,
            }) => {
                assert_eq!(domain, Domain::Net);
                assert_eq!((expected, actual), (1, 2));
            }
            other => panic!("expected shape change, got {:?}", other),
        }
    }

    #[test]
    fn test_renamed_column_is_fatal() {
        let mut fs = MockFs::typical_system();
        let mut engine =
            DeltaEngine::new(ProcfsSource::new(fs.clone(), "/proc", Domain::Net)).unwrap();

        fs.add_file(
            "/proc/net/dev",
            "\
    lo: 1 1 0 0 0 0 0 0 1 1 0 0 0 0 0 0
  eth1: 1 1 0 0 0 0 0 0 1 1 0 0 0 0 0 0
",
        );
        assert!(matches!(
            engine.collect(),
            Err(CollectError::ColumnChanged { .. })
        ));
    }

    #[test]
    fn test_vanished_file_is_io_error() {
        let mut fs = MockFs::typical_system();
        let mut engine =
            DeltaEngine::new(ProcfsSource::new(fs.clone(), "/proc", Domain::Net)).unwrap();
        let baseline = engine.previous().clone();

        fs.remove_file("/proc/net/dev");
        match engine.collect() {
            Err(CollectError::Io { path, source }) => {
                assert_eq!(path, std::path::Path::new("/proc/net/dev"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {:?}", other),
        }
        assert_eq!(engine.previous(), &baseline);
    }

    #[test]
    fn test_cpu_layout_is_checked() {
        let source = ScriptedSource::new(Domain::Cpu, ["cpu0.usr", "cpu0.nice"]).frame(&[1, 2]);
        assert!(matches!(
            DeltaEngine::new(source),
            Err(CollectError::Layout { .. })
        ));

        let mut names = cpu_names("cpu0");
        names.swap(0, 1);
        let source = ScriptedSource::new(Domain::Cpu, names).frame(&[0; 10]);
        assert!(matches!(
            DeltaEngine::new(source),
            Err(CollectError::Layout { .. })
        ));
    }

    #[test]
    fn test_engine_behind_collector_trait() {
        let source = ScriptedSource::new(Domain::SoftIrqs, ["softirq.TIMER.cpu0"])
            .frame(&[5])
            .frame(&[8]);
        let mut collector: Box<dyn Collector> = Box::new(DeltaEngine::new(source).unwrap());

        assert_eq!(collector.metrics().domain(), Domain::SoftIrqs);
        assert_eq!(collector.collect().unwrap(), vec![3]);
    }
}
