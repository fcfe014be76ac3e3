use super::{
    format_cpu_load, format_disk_usage, format_memory_usage, parse_loadavg, parse_meminfo,
    pick_display_address, DiskUsage, HostStats, MemoryUsage, StatsCollector, StatsQuery,
    StatsQueryError, StatsResult, StatsSnapshot,
};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use std::{env, fs};

const GIB: u64 = 1024 * 1024 * 1024;

struct FailingCollector {
    failing: HashSet<StatsQuery>,
    calls: Vec<StatsQuery>,
}

impl StatsCollector for FailingCollector {
    fn query(&mut self, query: StatsQuery) -> StatsResult {
        self.calls.push(query);
        if self.failing.contains(&query) {
            Err(StatsQueryError::new(query, "command not found"))
        } else {
            Ok(format!("{} ok", query.label()))
        }
    }
}

fn scratch_proc(prefix: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = env::temp_dir().join(format!("{prefix}_{unique}"));
    fs::create_dir_all(dir.join("sys/kernel")).unwrap();
    dir
}

#[test]
fn parse_loadavg_reads_first_field() {
    assert_eq!(parse_loadavg("0.52 0.58 0.59 1/123 4567\n"), Some(0.52));
    assert_eq!(parse_loadavg(""), None);
    assert_eq!(parse_loadavg("busy"), None);
}

#[test]
fn cpu_load_uses_two_decimals() {
    assert_eq!(format_cpu_load(0.5), "CPU Load: 0.50");
    assert_eq!(format_cpu_load(1.234), "CPU Load: 1.23");
}

#[test]
fn parse_meminfo_uses_available_memory() {
    let raw = "MemTotal:         947732 kB\nMemFree:          100000 kB\nMemAvailable:     628000 kB\n";
    let usage = parse_meminfo(raw).unwrap();
    assert_eq!(
        usage,
        MemoryUsage {
            total_mb: 925,
            used_mb: 312
        }
    );
    assert_eq!(format_memory_usage(&usage), "Mem: 312/925MB 33.73%");
}

#[test]
fn parse_meminfo_requires_both_fields() {
    assert_eq!(parse_meminfo("MemTotal: 1024 kB\n"), None);
    assert_eq!(parse_meminfo("MemAvailable: 1024 kB\n"), None);
}

#[test]
fn memory_usage_handles_zero_total() {
    let usage = MemoryUsage {
        total_mb: 0,
        used_mb: 0,
    };
    assert_eq!(format_memory_usage(&usage), "Mem: 0/0MB 0.00%");
}

#[test]
fn disk_usage_rounds_percent_up_like_df() {
    let usage = DiskUsage {
        total_bytes: 29 * GIB,
        used_bytes: 3 * GIB + GIB / 2,
        available_bytes: 24 * GIB,
    };
    // 3.5 / 27.5 = 12.7%
    assert_eq!(usage.percent_used(), 13);
    assert_eq!(format_disk_usage(&usage), "Disk: 3/29GB 13%");
}

#[test]
fn disk_usage_on_empty_filesystem_is_zero_percent() {
    let usage = DiskUsage {
        total_bytes: 0,
        used_bytes: 0,
        available_bytes: 0,
    };
    assert_eq!(usage.percent_used(), 0);
}

#[test]
fn display_address_skips_loopback_and_link_local() {
    let picked = pick_display_address([
        Ipv4Addr::LOCALHOST,
        Ipv4Addr::new(169, 254, 3, 4),
        Ipv4Addr::new(192, 168, 1, 42),
        Ipv4Addr::new(10, 0, 0, 2),
    ]);
    assert_eq!(picked, Some(Ipv4Addr::new(192, 168, 1, 42)));
    assert_eq!(pick_display_address([Ipv4Addr::LOCALHOST]), None);
}

#[test]
fn snapshot_isolates_failing_queries() {
    let mut collector = FailingCollector {
        failing: [StatsQuery::CpuLoad].into_iter().collect(),
        calls: Vec::new(),
    };
    let snapshot = collector.snapshot();
    assert_eq!(collector.calls, StatsQuery::ALL.to_vec());
    assert_eq!(snapshot.display_line(StatsQuery::CpuLoad), "CPU Load: --");
    assert_eq!(snapshot.display_line(StatsQuery::IpAddress), "IP ok");
    assert_eq!(snapshot.display_line(StatsQuery::Memory), "Mem ok");
    assert_eq!(snapshot.failures().len(), 1);
    assert_eq!(snapshot.failures()[0].query, StatsQuery::CpuLoad);
}

#[test]
fn snapshot_with_every_query_failing_still_has_placeholders() {
    let snapshot = StatsSnapshot::collect(|query| Err(StatsQueryError::new(query, "nope")));
    for query in StatsQuery::ALL {
        assert_eq!(snapshot.display_line(query), format!("{}: --", query.label()));
    }
    assert_eq!(snapshot.failures().len(), StatsQuery::ALL.len());
}

#[test]
fn query_error_names_the_query() {
    let err = StatsQueryError::new(StatsQuery::Disk, "statvfs failed");
    assert_eq!(err.to_string(), "Disk query failed: statvfs failed");
}

#[test]
fn host_stats_reads_scratch_procfs() {
    let root = scratch_proc("lora_panel_proc");
    fs::write(root.join("loadavg"), "0.25 0.20 0.10 1/99 1234\n").unwrap();
    fs::write(
        root.join("meminfo"),
        "MemTotal: 2048000 kB\nMemAvailable: 1024000 kB\n",
    )
    .unwrap();
    fs::write(root.join("sys/kernel/hostname"), "raspberrypi\n").unwrap();

    let mut stats = HostStats::with_proc_root(&root, env::temp_dir());
    assert_eq!(stats.query(StatsQuery::CpuLoad).unwrap(), "CPU Load: 0.25");
    assert_eq!(stats.query(StatsQuery::Memory).unwrap(), "Mem: 1000/2000MB 50.00%");
    assert_eq!(stats.query(StatsQuery::Hostname).unwrap(), "raspberrypi");
    assert!(stats
        .query(StatsQuery::Disk)
        .unwrap()
        .starts_with("Disk: "));
    let _ = fs::remove_dir_all(root);
}

#[test]
fn host_stats_missing_loadavg_only_fails_cpu() {
    let root = scratch_proc("lora_panel_proc_partial");
    fs::write(
        root.join("meminfo"),
        "MemTotal: 1024000 kB\nMemAvailable: 512000 kB\n",
    )
    .unwrap();

    let mut stats = HostStats::with_proc_root(&root, env::temp_dir());
    let snapshot = stats.snapshot();
    let cpu_err = snapshot.cpu_load.clone().unwrap_err();
    assert_eq!(cpu_err.query, StatsQuery::CpuLoad);
    assert!(cpu_err.reason.contains("loadavg"));
    assert_eq!(snapshot.memory_usage.as_deref(), Ok("Mem: 500/1000MB 50.00%"));
    assert!(snapshot.hostname.is_err());
    let _ = fs::remove_dir_all(root);
}

#[test]
fn host_stats_reports_missing_disk_path() {
    let mut stats = HostStats::with_proc_root("/nonexistent-proc", "/nonexistent/disk/path");
    let err = stats.query(StatsQuery::Disk).unwrap_err();
    assert_eq!(err.query, StatsQuery::Disk);
}
