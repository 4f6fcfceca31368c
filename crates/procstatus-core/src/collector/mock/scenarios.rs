//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` and `/sys` states for the
//! collector, aggregator and web tests.

use super::filesystem::MockFs;

/// RTC value used by every scenario that has a clock device.
pub const MOCK_EPOCH: u64 = 1_700_000_000;

pub const MOCK_RTC_PATH: &str = "/sys/class/rtc/rtc0/since_epoch";

impl MockFs {
    /// Creates a typical two-core host with a few processes, disks and NICs.
    pub fn typical_host() -> Self {
        let mut fs = Self::new();

        fs.add_file(MOCK_RTC_PATH, format!("{}\n", MOCK_EPOCH));
        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_file(
            "/proc/version",
            "Linux version 6.1.0-18-amd64 (debian-kernel@lists.debian.org) \
(gcc-12 (Debian 12.2.0-14) 12.2.0, GNU ld (GNU Binutils for Debian) 2.40) \
#1 SMP PREEMPT_DYNAMIC Debian 6.1.76-1 (2024-02-01)\n",
        );
        fs.add_file(
            "/proc/cpuinfo",
            "\
processor\t: 0
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 142
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
stepping\t: 10
cpu MHz\t\t: 1800.000
cache size\t: 8192 KB
flags\t\t: fpu vme de pse tsc msr pae mce
bugs\t\t: cpu_meltdown spectre_v1
address sizes\t: 39 bits physical, 48 bits virtual
power management:

processor\t: 1
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 142
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
stepping\t: 10
cpu MHz\t\t: 1992.000
cache size\t: 8192 KB
flags\t\t: fpu vme de pse tsc msr pae mce
bugs\t\t: cpu_meltdown spectre_v1
address sizes\t: 39 bits physical, 48 bits virtual
power management:

",
        );
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         4096000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
HugePages_Total:       0
Hugepagesize:       2048 kB
",
        );
        fs.add_file(
            "/proc/partitions",
            "\
major minor  #blocks  name

   8        0    1000000 sda
   8        1     512000 sda1
 259        0  500107608 nvme0n1
 259        1     524288 nvme0n1p1
",
        );
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678     9876    0    0    0     0          0         0 12345678     9876    0    0    0     0       0          0
  eth0: 987654321   654321    5   10    0     0          0       100 123456789   456789    2    5    0     0       0          0
",
        );

        fs.add_process(1, "systemd");
        fs.add_process(1000, "bash");
        fs.add_process(1001, "sshd");

        // Non-PID entries that live next to the process directories.
        fs.add_dir("/proc/self");
        fs.add_dir("/proc/sys");
        fs.add_file("/proc/self/comm", "cat\n");

        fs
    }

    /// A bare container: no RTC device, no visible processes, no block
    /// devices, no network statistics.
    pub fn minimal_host() -> Self {
        let mut fs = Self::new();
        fs.add_dir("/proc");
        fs.add_file("/proc/uptime", "42.00 40.00\n");
        fs.add_file("/proc/version", "Linux version 5.15.0\n");
        fs.add_file(
            "/proc/meminfo",
            "MemTotal:        1024000 kB\nMemFree:          512000 kB\n",
        );
        fs.add_file(
            "/proc/cpuinfo",
            "processor\t: 0\nBogoMIPS\t: 48.00\nFeatures\t: fp asimd\n",
        );
        fs
    }

    /// Typical host whose `/proc/meminfo` is not exposed.
    pub fn without_meminfo() -> Self {
        let mut fs = Self::typical_host();
        fs.remove_file("/proc/meminfo");
        fs
    }

    /// Typical host plus a process that exited after `/proc` was listed:
    /// its directory is still present but `comm` is gone.
    pub fn with_vanishing_process() -> Self {
        let mut fs = Self::typical_host();
        fs.add_dir("/proc/4242");
        fs
    }

    /// Typical host with unusual kernel formatting: wide net/dev counters glued
    /// to the interface name and a partitions table with stray rows.
    pub fn with_quirky_tables() -> Self {
        let mut fs = Self::typical_host();
        fs.add_file(
            "/proc/partitions",
            "\
major minor  #blocks  name

   8        0    1000000 sda
   8        1
   7        0  notanumber loop0
 253        0  20971520 dm-0

",
        );
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
  eth0:4294967296 1 0 0 0 0 0 0 1 1 0 0 0 0 0 0
wlp2s0: 1 1 0 0 0 0 0 0 1 1 0 0 0 0 0 0

",
        );
        fs
    }
}
