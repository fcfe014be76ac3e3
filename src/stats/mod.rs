//! Host introspection for Stats mode.
//!
//! Each figure is its own query so one unreadable source (no network yet,
//! missing `/proc` entry) only blanks that line instead of the whole frame.

mod host;
#[cfg(test)]
mod tests;

use std::fmt;
use thiserror::Error;

pub use host::{
    format_cpu_load, format_disk_usage, format_memory_usage, parse_loadavg, parse_meminfo,
    pick_display_address, DiskUsage, HostStats, MemoryUsage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsQuery {
    IpAddress,
    Hostname,
    CpuLoad,
    Memory,
    Disk,
}

impl StatsQuery {
    pub const ALL: [StatsQuery; 5] = [
        StatsQuery::IpAddress,
        StatsQuery::Hostname,
        StatsQuery::CpuLoad,
        StatsQuery::Memory,
        StatsQuery::Disk,
    ];

    /// Prefix used for the placeholder when the query fails.
    pub fn label(self) -> &'static str {
        match self {
            StatsQuery::IpAddress => "IP",
            StatsQuery::Hostname => "Host",
            StatsQuery::CpuLoad => "CPU Load",
            StatsQuery::Memory => "Mem",
            StatsQuery::Disk => "Disk",
        }
    }
}

impl fmt::Display for StatsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single host query that could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{query} query failed: {reason}")]
pub struct StatsQueryError {
    pub query: StatsQuery,
    pub reason: String,
}

impl StatsQueryError {
    pub fn new(query: StatsQuery, reason: impl Into<String>) -> Self {
        Self {
            query,
            reason: reason.into(),
        }
    }
}

pub type StatsResult = Result<String, StatsQueryError>;

/// One pass over every query. Nothing here outlives the Stats frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub ip_address: StatsResult,
    pub hostname: StatsResult,
    pub cpu_load: StatsResult,
    pub memory_usage: StatsResult,
    pub disk_usage: StatsResult,
}

impl StatsSnapshot {
    pub fn collect<F>(mut run: F) -> Self
    where
        F: FnMut(StatsQuery) -> StatsResult,
    {
        Self {
            ip_address: run(StatsQuery::IpAddress),
            hostname: run(StatsQuery::Hostname),
            cpu_load: run(StatsQuery::CpuLoad),
            memory_usage: run(StatsQuery::Memory),
            disk_usage: run(StatsQuery::Disk),
        }
    }

    pub fn get(&self, query: StatsQuery) -> &StatsResult {
        match query {
            StatsQuery::IpAddress => &self.ip_address,
            StatsQuery::Hostname => &self.hostname,
            StatsQuery::CpuLoad => &self.cpu_load,
            StatsQuery::Memory => &self.memory_usage,
            StatsQuery::Disk => &self.disk_usage,
        }
    }

    /// Formatted value, or `"<label>: --"` when the query failed.
    pub fn display_line(&self, query: StatsQuery) -> String {
        match self.get(query) {
            Ok(text) => text.clone(),
            Err(_) => format!("{}: --", query.label()),
        }
    }

    pub fn failures(&self) -> Vec<&StatsQueryError> {
        StatsQuery::ALL
            .into_iter()
            .filter_map(|query| self.get(query).as_ref().err())
            .collect()
    }
}

/// Source of host figures for Stats mode.
pub trait StatsCollector {
    fn query(&mut self, query: StatsQuery) -> StatsResult;

    /// Run every query; failures stay confined to their own field.
    fn snapshot(&mut self) -> StatsSnapshot {
        StatsSnapshot::collect(|query| self.query(query))
    }
}

impl<T: StatsCollector + ?Sized> StatsCollector for Box<T> {
    fn query(&mut self, query: StatsQuery) -> StatsResult {
        (**self).query(query)
    }
}
