//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

// ============ CPU Stats Parser ============

/// Single CPU line from `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuStat {
    pub cpu_id: Option<u32>, // None for aggregate "cpu" line
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuStat {
    /// Resource id used in column names: `cpu` or `cpuN`.
    pub fn label(&self) -> String {
        match self.cpu_id {
            Some(id) => format!("cpu{}", id),
            None => "cpu".to_string(),
        }
    }

    /// Counters in `CPU_CLASSES` order.
    pub fn values(&self) -> [u64; 10] {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
    }
}

/// Parses the `cpu` lines of `/proc/stat`.
///
/// Older kernels omit the trailing columns; missing values read as zero.
pub fn parse_cpu_stats(content: &str) -> Result<Vec<CpuStat>, ParseError> {
    let mut cpus = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = parts.first() else {
            continue;
        };
        let Some(suffix) = first.strip_prefix("cpu") else {
            continue;
        };

        let cpu_id: Option<u32> = if suffix.is_empty() {
            None
        } else {
            Some(
                suffix
                    .parse()
                    .map_err(|_| ParseError::new(format!("invalid cpu id '{}'", first)))?,
            )
        };

        let get_val = |idx: usize| -> Result<u64, ParseError> {
            match parts.get(idx) {
                Some(s) => s
                    .parse()
                    .map_err(|_| ParseError::new(format!("invalid counter '{}' for {}", s, first))),
                None => Ok(0),
            }
        };

        cpus.push(CpuStat {
            cpu_id,
            user: get_val(1)?,
            nice: get_val(2)?,
            system: get_val(3)?,
            idle: get_val(4)?,
            iowait: get_val(5)?,
            irq: get_val(6)?,
            softirq: get_val(7)?,
            steal: get_val(8)?,
            guest: get_val(9)?,
            guest_nice: get_val(10)?,
        });
    }

    if cpus.is_empty() {
        return Err(ParseError::new("no cpu lines found"));
    }

    Ok(cpus)
}

// ============ Interrupts / SoftIRQs Parser ============

/// One line of `/proc/interrupts` or `/proc/softirqs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterruptStats {
    /// Line name without the trailing colon (`0`, `NMI`, `TIMER`, ...).
    pub name: String,
    /// Per-CPU counts; shorter than the CPU count for lines like `ERR`.
    pub counts: Vec<u64>,
    /// Free text after the counts (chip, hwirq, device). Empty for softirqs.
    pub description: String,
}

/// Parses `/proc/interrupts` or `/proc/softirqs` content.
///
/// Format:
/// ```text
///            CPU0       CPU1
///   0:         20          0   IO-APIC   2-edge      timer
/// NMI:          0          0   Non-maskable interrupts
/// ERR:          0
/// ```
pub fn parse_interrupts(content: &str) -> Result<Vec<InterruptStats>, ParseError> {
    let mut lines = content.lines().skip_while(|l| l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| ParseError::new("missing CPU header line"))?;
    let cpu_count = header
        .split_whitespace()
        .filter(|col| col.starts_with("CPU"))
        .count();
    if cpu_count == 0 {
        return Err(ParseError::new("no CPU columns in header line"));
    }

    let mut interrupts = Vec::new();

    for line in lines {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let mut fields = rest.split_whitespace().peekable();
        let mut counts = Vec::with_capacity(cpu_count);
        while counts.len() < cpu_count {
            let Some(count) = fields.peek().and_then(|f| f.parse::<u64>().ok()) else {
                break;
            };
            counts.push(count);
            fields.next();
        }

        interrupts.push(InterruptStats {
            name: name.to_string(),
            counts,
            description: fields.collect::<Vec<_>>().join(" "),
        });
    }

    Ok(interrupts)
}

// ============ Disk Stats Parser ============

/// Parsed data from `/proc/diskstats`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskStats {
    /// Device name (sda, nvme0n1, etc.)
    pub device: String,
    /// Number of sectors read
    pub read_sectors: u64,
    /// Number of sectors written
    pub write_sectors: u64,
}

/// Parses `/proc/diskstats` content.
///
/// Format: major minor name reads r_merged r_sectors r_time writes w_merged w_sectors w_time io_pending io_time w_io_time [discards ...]
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskStats>, ParseError> {
    let mut disks = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue; // Skip malformed lines
        }

        let get_val = |idx: usize| -> Result<u64, ParseError> {
            parts[idx].parse().map_err(|_| {
                ParseError::new(format!("invalid counter '{}' for {}", parts[idx], parts[2]))
            })
        };

        disks.push(DiskStats {
            device: parts[2].to_string(),
            read_sectors: get_val(5)?,
            write_sectors: get_val(9)?,
        });
    }

    Ok(disks)
}

// ============ Network Device Stats Parser ============

/// Parsed data from `/proc/net/dev`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetDevStats {
    /// Interface name (eth0, lo, etc.)
    pub interface: String,
    /// Bytes received
    pub rx_bytes: u64,
    /// Packets received
    pub rx_packets: u64,
    /// Receive errors
    pub rx_errs: u64,
    /// Receive drops
    pub rx_drop: u64,
    /// Bytes transmitted
    pub tx_bytes: u64,
    /// Packets transmitted
    pub tx_packets: u64,
    /// Transmit errors
    pub tx_errs: u64,
    /// Transmit drops
    pub tx_drop: u64,
}

impl NetDevStats {
    /// Counters in `NET_CLASSES` order.
    pub fn values(&self) -> [u64; 8] {
        [
            self.rx_bytes,
            self.rx_packets,
            self.rx_errs,
            self.rx_drop,
            self.tx_bytes,
            self.tx_packets,
            self.tx_errs,
            self.tx_drop,
        ]
    }
}

/// Parses `/proc/net/dev` content.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
pub fn parse_net_dev(content: &str) -> Result<Vec<NetDevStats>, ParseError> {
    let mut devices = Vec::new();

    for line in content.lines() {
        // Skip header lines
        if line.contains('|') || line.trim().is_empty() {
            continue;
        }

        let Some((interface, counters)) = line.split_once(':') else {
            continue;
        };
        let interface = interface.trim().to_string();
        let values: Vec<&str> = counters.split_whitespace().collect();
        if values.len() < 16 {
            continue;
        }

        let get_val = |idx: usize| -> Result<u64, ParseError> {
            values[idx].parse().map_err(|_| {
                ParseError::new(format!("invalid counter '{}' for {}", values[idx], interface))
            })
        };

        devices.push(NetDevStats {
            rx_bytes: get_val(0)?,
            rx_packets: get_val(1)?,
            rx_errs: get_val(2)?,
            rx_drop: get_val(3)?,
            tx_bytes: get_val(8)?,
            tx_packets: get_val(9)?,
            tx_errs: get_val(10)?,
            tx_drop: get_val(11)?,
            interface,
        });
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_stats() {
        let content = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 7 3 1
intr 1000000 50 0 0 0
ctxt 500000
btime 1700000000
";
        let cpus = parse_cpu_stats(content).unwrap();

        assert_eq!(cpus.len(), 3);
        assert_eq!(cpus[0].cpu_id, None);
        assert_eq!(cpus[0].label(), "cpu");
        assert_eq!(cpus[0].user, 10000);
        assert_eq!(cpus[0].idle, 80000);
        assert_eq!(cpus[1].cpu_id, Some(0));
        assert_eq!(cpus[2].label(), "cpu1");
        assert_eq!(cpus[2].values(), [2500, 125, 750, 20000, 250, 50, 25, 7, 3, 1]);
    }

    #[test]
    fn test_parse_cpu_stats_short_line() {
        // 2.6.x kernels stop after softirq
        let cpus = parse_cpu_stats("cpu0 1 2 3 4 5 6 7\n").unwrap();
        assert_eq!(cpus[0].softirq, 7);
        assert_eq!(cpus[0].steal, 0);
        assert_eq!(cpus[0].guest_nice, 0);
    }

    #[test]
    fn test_parse_cpu_stats_rejects_garbage() {
        assert!(parse_cpu_stats("cpu0 1 x 3\n").is_err());
        assert!(parse_cpu_stats("cpuX 1 2 3\n").is_err());
        assert!(parse_cpu_stats("ctxt 5\n").is_err());
    }

    #[test]
    fn test_parse_interrupts() {
        let content = "\
           CPU0       CPU1
  0:         20          3   IO-APIC   2-edge      timer
  8:          0          1   IO-APIC   8-edge      rtc0
NMI:          5          6   Non-maskable interrupts
ERR:          0
MIS:          0
";
        let lines = parse_interrupts(content).unwrap();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].name, "0");
        assert_eq!(lines[0].counts, vec![20, 3]);
        assert_eq!(lines[0].description, "IO-APIC 2-edge timer");
        assert_eq!(lines[2].name, "NMI");
        assert_eq!(lines[2].description, "Non-maskable interrupts");
        assert_eq!(lines[3].name, "ERR");
        assert_eq!(lines[3].counts, vec![0]);
        assert_eq!(lines[3].description, "");
    }

    #[test]
    fn test_parse_softirqs() {
        let content = "\
                    CPU0       CPU1
          HI:          1          0
       TIMER:     123456     654321
      NET_RX:         77         88
";
        let lines = parse_interrupts(content).unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].name, "TIMER");
        assert_eq!(lines[1].counts, vec![123456, 654321]);
        assert!(lines[1].description.is_empty());
    }

    #[test]
    fn test_parse_interrupts_without_header() {
        assert!(parse_interrupts("").is_err());
        assert!(parse_interrupts("  0: 1 2 3\n").is_err());
    }

    #[test]
    fn test_parse_diskstats() {
        let content = "\
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0
 259       0 nvme0n1 50000 200 2000000 10000 30000 150 1500000 8000 5 15000 18000
   7       0 loop0 1 2
";
        let disks = parse_diskstats(content).unwrap();

        assert_eq!(disks.len(), 3);
        assert_eq!(disks[0].device, "sda");
        assert_eq!(disks[0].read_sectors, 987654);
        assert_eq!(disks[0].write_sectors, 456789);
        assert_eq!(disks[2].device, "nvme0n1");
        assert_eq!(disks[2].read_sectors, 2000000);
    }

    #[test]
    fn test_parse_net_dev() {
        let content = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
  eth0: 9876543    98765    1    2    0     0          0         0  5432100    54321    3    4    0     0       0          0
";
        let devices = parse_net_dev(content).unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].interface, "lo");
        assert_eq!(devices[1].interface, "eth0");
        assert_eq!(devices[1].rx_bytes, 9876543);
        assert_eq!(devices[1].rx_errs, 1);
        assert_eq!(devices[1].rx_drop, 2);
        assert_eq!(devices[1].tx_bytes, 5432100);
        assert_eq!(devices[1].tx_drop, 4);
        assert_eq!(
            devices[1].values(),
            [9876543, 98765, 1, 2, 5432100, 54321, 3, 4]
        );
    }
}
