use super::{StatsCollector, StatsQuery, StatsQueryError, StatsResult};
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

const KIB: u64 = 1024;
const GIB: u64 = 1024 * 1024 * 1024;

/// Reads host figures straight from procfs and libc rather than piping
/// `hostname`, `top`, `free` and `df` through awk.
#[derive(Debug, Clone)]
pub struct HostStats {
    proc_root: PathBuf,
    disk_path: PathBuf,
}

impl HostStats {
    pub fn new(disk_path: impl Into<PathBuf>) -> Self {
        Self::with_proc_root("/proc", disk_path)
    }

    /// Point at an alternate procfs tree (tests use a scratch directory).
    pub fn with_proc_root(proc_root: impl Into<PathBuf>, disk_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            disk_path: disk_path.into(),
        }
    }

    fn read_proc(&self, query: StatsQuery, relative: &str) -> Result<String, StatsQueryError> {
        let path = self.proc_root.join(relative);
        fs::read_to_string(&path)
            .map_err(|err| StatsQueryError::new(query, format!("{}: {err}", path.display())))
    }

    fn ip_address(&self) -> StatsResult {
        let addresses = interface_addresses()
            .map_err(|err| StatsQueryError::new(StatsQuery::IpAddress, err.to_string()))?;
        pick_display_address(addresses)
            .map(|ip| ip.to_string())
            .ok_or_else(|| StatsQueryError::new(StatsQuery::IpAddress, "no routable IPv4 address"))
    }

    fn hostname(&self) -> StatsResult {
        let raw = self.read_proc(StatsQuery::Hostname, "sys/kernel/hostname")?;
        let name = raw.trim();
        if name.is_empty() {
            return Err(StatsQueryError::new(StatsQuery::Hostname, "hostname is empty"));
        }
        Ok(name.to_string())
    }

    fn cpu_load(&self) -> StatsResult {
        let raw = self.read_proc(StatsQuery::CpuLoad, "loadavg")?;
        let load = parse_loadavg(&raw)
            .ok_or_else(|| StatsQueryError::new(StatsQuery::CpuLoad, "unparseable loadavg"))?;
        Ok(format_cpu_load(load))
    }

    fn memory(&self) -> StatsResult {
        let raw = self.read_proc(StatsQuery::Memory, "meminfo")?;
        let usage = parse_meminfo(&raw).ok_or_else(|| {
            StatsQueryError::new(StatsQuery::Memory, "meminfo lacks MemTotal/MemAvailable")
        })?;
        Ok(format_memory_usage(&usage))
    }

    fn disk(&self) -> StatsResult {
        let usage = disk_usage(&self.disk_path).map_err(|err| {
            StatsQueryError::new(
                StatsQuery::Disk,
                format!("{}: {err}", self.disk_path.display()),
            )
        })?;
        Ok(format_disk_usage(&usage))
    }
}

impl StatsCollector for HostStats {
    fn query(&mut self, query: StatsQuery) -> StatsResult {
        match query {
            StatsQuery::IpAddress => self.ip_address(),
            StatsQuery::Hostname => self.hostname(),
            StatsQuery::CpuLoad => self.cpu_load(),
            StatsQuery::Memory => self.memory(),
            StatsQuery::Disk => self.disk(),
        }
    }
}

/// One-minute load average, the first field of `/proc/loadavg`.
pub fn parse_loadavg(raw: &str) -> Option<f32> {
    raw.split_whitespace().next()?.parse().ok()
}

pub fn format_cpu_load(load: f32) -> String {
    format!("CPU Load: {load:.2}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total_mb: u64,
    pub used_mb: u64,
}

/// Used memory is total minus available, which is what `free` reports.
pub fn parse_meminfo(raw: &str) -> Option<MemoryUsage> {
    let mut total_kb = None;
    let mut available_kb = None;
    for line in raw.lines() {
        let mut fields = line.split_whitespace();
        let slot = match fields.next() {
            Some("MemTotal:") => &mut total_kb,
            Some("MemAvailable:") => &mut available_kb,
            _ => continue,
        };
        *slot = fields.next().and_then(|value| value.parse::<u64>().ok());
    }
    let total_kb = total_kb?;
    let available_kb = available_kb?;
    Some(MemoryUsage {
        total_mb: total_kb / KIB,
        used_mb: total_kb.saturating_sub(available_kb) / KIB,
    })
}

pub fn format_memory_usage(usage: &MemoryUsage) -> String {
    let percent = if usage.total_mb == 0 {
        0.0
    } else {
        usage.used_mb as f64 * 100.0 / usage.total_mb as f64
    };
    format!("Mem: {}/{}MB {percent:.2}%", usage.used_mb, usage.total_mb)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

impl DiskUsage {
    /// Percentage as `df` computes it: rounded up, relative to used + available.
    pub fn percent_used(&self) -> u64 {
        let denominator = self.used_bytes.saturating_add(self.available_bytes);
        if denominator == 0 {
            return 0;
        }
        (self.used_bytes.saturating_mul(100)).div_ceil(denominator)
    }
}

pub fn format_disk_usage(usage: &DiskUsage) -> String {
    format!(
        "Disk: {}/{}GB {}%",
        usage.used_bytes / GIB,
        usage.total_bytes / GIB,
        usage.percent_used()
    )
}

/// First address worth showing: not loopback, not link-local, not unspecified.
pub fn pick_display_address<I>(addresses: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = Ipv4Addr>,
{
    addresses
        .into_iter()
        .find(|ip| !ip.is_loopback() && !ip.is_link_local() && !ip.is_unspecified())
}

#[cfg(unix)]
fn interface_addresses() -> io::Result<Vec<Ipv4Addr>> {
    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: getifaddrs fills `head` with a list we release with freeifaddrs below.
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let mut addresses = Vec::new();
    let mut cursor = head;
    while !cursor.is_null() {
        // SAFETY: cursor walks the list returned by getifaddrs and is non-null here.
        let entry = unsafe { &*cursor };
        if !entry.ifa_addr.is_null() {
            // SAFETY: ifa_addr is non-null; sa_family tells us the concrete sockaddr type.
            let family = unsafe { (*entry.ifa_addr).sa_family } as libc::c_int;
            if family == libc::AF_INET {
                // SAFETY: AF_INET entries point at a sockaddr_in.
                let sin = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in) };
                addresses.push(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
            }
        }
        cursor = entry.ifa_next;
    }
    // SAFETY: head came from a successful getifaddrs call and is freed exactly once.
    unsafe { libc::freeifaddrs(head) };
    Ok(addresses)
}

#[cfg(not(unix))]
fn interface_addresses() -> io::Result<Vec<Ipv4Addr>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "interface listing needs a unix host",
    ))
}

#[cfg(unix)]
fn disk_usage(path: &Path) -> io::Result<DiskUsage> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"))?;
    // SAFETY: statvfs is a plain C struct; zeroed is a valid baseline before the call fills it.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: c_path is a valid NUL-terminated string and stat is writable.
    if unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let block = stat.f_frsize as u64;
    let total_bytes = (stat.f_blocks as u64).saturating_mul(block);
    let free_bytes = (stat.f_bfree as u64).saturating_mul(block);
    Ok(DiskUsage {
        total_bytes,
        used_bytes: total_bytes.saturating_sub(free_bytes),
        available_bytes: (stat.f_bavail as u64).saturating_mul(block),
    })
}

#[cfg(not(unix))]
fn disk_usage(_path: &Path) -> io::Result<DiskUsage> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "disk usage needs a unix host",
    ))
}
