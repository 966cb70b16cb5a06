//! Metric domains and the column layout derived from them.

use std::fmt;

use crate::collector::traits::Counter;

/// One metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    Cpu,
    Interrupts,
    SoftIrqs,
    Net,
    Disk,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Cpu,
        Domain::Interrupts,
        Domain::SoftIrqs,
        Domain::Net,
        Domain::Disk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Cpu => "cpu",
            Domain::Interrupts => "interrupts",
            Domain::SoftIrqs => "softirqs",
            Domain::Net => "net",
            Domain::Disk => "disk",
        }
    }

    /// Pseudo-file under the proc root that holds this domain's counters.
    pub fn proc_file(self) -> &'static str {
        match self {
            Domain::Cpu => "stat",
            Domain::Interrupts => "interrupts",
            Domain::SoftIrqs => "softirqs",
            Domain::Net => "net/dev",
            Domain::Disk => "diskstats",
        }
    }

    /// Whether rows are utilization percentages instead of raw deltas.
    pub fn is_normalized(self) -> bool {
        matches!(self, Domain::Cpu)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU time classes in `/proc/stat` column order, with their descriptions.
pub const CPU_CLASSES: [(&str, &str); 10] = [
    ("usr", "User"),
    ("nice", "Nice"),
    ("system", "System"),
    ("idle", "Idle"),
    ("iowait", "IOWait"),
    ("irq", "IRQ"),
    ("softirq", "SoftIRQ"),
    ("steal", "Steal"),
    ("guest", "Guest"),
    ("guestnice", "GuestNice"),
];

/// The leading `CPU_CLASSES` entries whose sum is the elapsed CPU time.
pub const CPU_RUNTIME_CLASSES: usize = 7;

pub const NET_CLASSES: [(&str, &str); 8] = [
    ("rx.bytes", "Number of bytes received"),
    ("rx.packets", "Number of packets received"),
    ("rx.errors", "Number of receive errors"),
    ("rx.drop", "Number of receive packets dropped"),
    ("tx.bytes", "Number of bytes transmitted"),
    ("tx.packets", "Number of packets transmitted"),
    ("tx.errors", "Number of transmit errors"),
    ("tx.drop", "Number of transmit packets dropped"),
];

pub const DISK_CLASSES: [(&str, &str); 2] = [
    ("read.sectors", "Number of 512 byte sectors read"),
    ("write.sectors", "Number of 512 byte sectors written"),
];

/// Static column metadata of one domain.
///
/// Names and descriptions are parallel and keep the order in which the
/// resources were first discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSet {
    domain: Domain,
    names: Vec<String>,
    descriptions: Vec<String>,
}

impl MetricSet {
    pub fn new(domain: Domain, names: Vec<String>, descriptions: Vec<String>) -> Self {
        debug_assert_eq!(names.len(), descriptions.len());
        Self {
            domain,
            names,
            descriptions,
        }
    }

    /// Derives the layout from the shape of a first snapshot.
    pub fn from_counters(domain: Domain, counters: &[Counter]) -> Self {
        let (names, descriptions) = counters
            .iter()
            .map(|c| (c.name.clone(), c.description.clone()))
            .unzip();
        Self::new(domain, names, descriptions)
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates `(name, description)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .zip(&self.descriptions)
            .map(|(n, d)| (n.as_str(), d.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_classes_prefix() {
        let runtime: Vec<&str> = CPU_CLASSES[..CPU_RUNTIME_CLASSES]
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(
            runtime,
            ["usr", "nice", "system", "idle", "iowait", "irq", "softirq"]
        );
    }

    #[test]
    fn test_metric_set_from_counters_keeps_order() {
        let counters = vec![
            Counter::new("net.lo.rx.bytes", "net.lo.rx.bytes = lo bytes", 5),
            Counter::new("net.eth0.rx.bytes", "net.eth0.rx.bytes = eth0 bytes", 9),
        ];
        let set = MetricSet::from_counters(Domain::Net, &counters);

        assert_eq!(set.domain(), Domain::Net);
        assert_eq!(set.len(), 2);
        assert_eq!(set.names(), ["net.lo.rx.bytes", "net.eth0.rx.bytes"]);
        let columns: Vec<_> = set.columns().collect();
        assert_eq!(columns[1].1, "net.eth0.rx.bytes = eth0 bytes");
    }

    #[test]
    fn test_only_cpu_is_normalized() {
        for domain in Domain::ALL {
            assert_eq!(domain.is_normalized(), domain == Domain::Cpu);
        }
    }
}
