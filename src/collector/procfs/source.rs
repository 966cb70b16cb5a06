//! Kernel-backed counter source reading one `/proc` pseudo-file per domain.

use std::path::{Path, PathBuf};

use crate::collector::domain::{CPU_CLASSES, DISK_CLASSES, Domain, NET_CLASSES};
use crate::collector::error::CollectError;
use crate::collector::procfs::parser::{
    CpuStat, DiskStats, InterruptStats, NetDevStats, ParseError, parse_cpu_stats,
    parse_diskstats, parse_interrupts, parse_net_dev,
};
use crate::collector::traits::{Counter, CounterSource, FileSystem};

/// Reads the counters of one domain from the proc filesystem.
pub struct ProcfsSource<F: FileSystem> {
    fs: F,
    path: PathBuf,
    domain: Domain,
}

impl<F: FileSystem> ProcfsSource<F> {
    /// Creates a new source.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `domain` - Which pseudo-file to read
    pub fn new(fs: F, proc_path: impl AsRef<Path>, domain: Domain) -> Self {
        Self {
            fs,
            path: proc_path.as_ref().join(domain.proc_file()),
            domain,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_error(&self, e: ParseError) -> CollectError {
        CollectError::Parse {
            path: self.path.clone(),
            message: e.message,
        }
    }
}

impl<F: FileSystem> CounterSource for ProcfsSource<F> {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn read(&mut self) -> Result<Vec<Counter>, CollectError> {
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|source| CollectError::Io {
                path: self.path.clone(),
                source,
            })?;

        let counters = match self.domain {
            Domain::Cpu => cpu_counters(&parse_cpu_stats(&content).map_err(|e| self.parse_error(e))?),
            Domain::Interrupts => interrupt_counters(
                &parse_interrupts(&content).map_err(|e| self.parse_error(e))?,
            ),
            Domain::SoftIrqs => {
                softirq_counters(&parse_interrupts(&content).map_err(|e| self.parse_error(e))?)
            }
            Domain::Net => net_counters(&parse_net_dev(&content).map_err(|e| self.parse_error(e))?),
            Domain::Disk => {
                disk_counters(&parse_diskstats(&content).map_err(|e| self.parse_error(e))?)
            }
        };

        Ok(counters)
    }
}

/// `cpuN.<class>` columns, ten per CPU line, aggregate line first.
pub fn cpu_counters(cpus: &[CpuStat]) -> Vec<Counter> {
    let mut counters = Vec::with_capacity(cpus.len() * CPU_CLASSES.len());
    for cpu in cpus {
        let id = cpu.label();
        for ((class, text), value) in CPU_CLASSES.iter().zip(cpu.values()) {
            let name = format!("{}.{}", id, class);
            let description = format!("{} = {} {}", name, id, text);
            counters.push(Counter::new(name, description, value));
        }
    }
    counters
}

/// `int<irq>.cpuN` columns, one per count present on the line.
pub fn interrupt_counters(lines: &[InterruptStats]) -> Vec<Counter> {
    let mut counters = Vec::new();
    for line in lines {
        for (cpu, &value) in line.counts.iter().enumerate() {
            let name = format!("int{}.cpu{}", line.name, cpu);
            let description = if line.description.is_empty() {
                format!("{} = interrupt {} on cpu{}", name, line.name, cpu)
            } else {
                format!("{} = {} on cpu{}", name, line.description, cpu)
            };
            counters.push(Counter::new(name, description, value));
        }
    }
    counters
}

/// `softirq.<name>.cpuN` columns, one per count present on the line.
pub fn softirq_counters(lines: &[InterruptStats]) -> Vec<Counter> {
    let mut counters = Vec::new();
    for line in lines {
        for (cpu, &value) in line.counts.iter().enumerate() {
            let name = format!("softirq.{}.cpu{}", line.name, cpu);
            let description = format!("{} = {} softirqs on cpu{}", name, line.name, cpu);
            counters.push(Counter::new(name, description, value));
        }
    }
    counters
}

/// `net.<iface>.<class>` columns, eight per interface.
pub fn net_counters(devices: &[NetDevStats]) -> Vec<Counter> {
    let mut counters = Vec::with_capacity(devices.len() * NET_CLASSES.len());
    for dev in devices {
        for ((class, text), value) in NET_CLASSES.iter().zip(dev.values()) {
            let name = format!("net.{}.{}", dev.interface, class);
            let description = format!("{} = {} {}", name, dev.interface, text);
            counters.push(Counter::new(name, description, value));
        }
    }
    counters
}

/// `disk.<device>.<class>` columns, two per block device.
pub fn disk_counters(disks: &[DiskStats]) -> Vec<Counter> {
    let mut counters = Vec::with_capacity(disks.len() * DISK_CLASSES.len());
    for disk in disks {
        let values = [disk.read_sectors, disk.write_sectors];
        for ((class, text), value) in DISK_CLASSES.iter().zip(values) {
            let name = format!("disk.{}.{}", disk.device, class);
            let description = format!("{} = {} {}", name, disk.device, text);
            counters.push(Counter::new(name, description, value));
        }
    }
    counters
}
