//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` filesystem states
//! for testing various system conditions.

use super::filesystem::MockFs;

impl MockFs {
    /// Creates a typical four-core system with every file the sampler reads.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );

        fs.add_file(
            "/proc/interrupts",
            "\
           CPU0       CPU1       CPU2       CPU3
  0:         20          0          0          0   IO-APIC   2-edge      timer
  8:          0          0          1          0   IO-APIC   8-edge      rtc0
  9:          0          4          0          0   IO-APIC   9-fasteoi   acpi
NMI:         10         11         12         13   Non-maskable interrupts
LOC:    1000000     900000     800000     700000   Local timer interrupts
ERR:          0
MIS:          0
",
        );

        fs.add_file(
            "/proc/softirqs",
            "\
                    CPU0       CPU1       CPU2       CPU3
          HI:          1          0          0          2
       TIMER:     123456     120000     110000     100000
      NET_TX:          5          6          7          8
      NET_RX:        700        600        500        400
       BLOCK:       1000       2000       3000       4000
       SCHED:      50000      40000      30000      20000
         RCU:      90000      80000      70000      60000
",
        );

        // Disk statistics
        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0
 259       0 nvme0n1 50000 200 2000000 10000 30000 150 1500000 8000 5 15000 18000 0 0 0 0
",
        );

        // Network device statistics
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678     9876    0    0    0     0          0         0 12345678     9876    0    0    0     0       0          0
  eth0: 987654321   654321    5   10    0     0          0       100 123456789   456789    2    5    0     0       0          0
",
        );

        fs
    }

    /// Creates a single-core system whose `/proc/stat` the caller controls.
    ///
    /// Values are given in `CPU_CLASSES` order for the `cpu0` line; the
    /// aggregate line mirrors it.
    pub fn single_cpu(values: [u64; 10]) -> Self {
        let mut fs = Self::new();
        fs.set_single_cpu(values);
        fs
    }

    /// Rewrites `/proc/stat` of a [`MockFs::single_cpu`] system.
    pub fn set_single_cpu(&mut self, values: [u64; 10]) {
        let row = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.add_file("/proc/stat", format!("cpu  {}\ncpu0 {}\nctxt 1\n", row, row));
    }
}
