//! Well-known platform paths
//!
//! Agents and helper binaries live in fixed locations that depend only on the
//! operating system family of the target machine. The locations are kept in
//! one immutable table per family, built on first use and never mutated.
//!
//! A machine's platform is identified by its series name (`trusty`,
//! `win2012r2`, `centos7`, ...).

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{TetherError, TetherResult};

/// Operating system family of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsType {
    /// Ubuntu releases
    Ubuntu,
    /// CentOS releases
    CentOS,
    /// Windows server and client releases
    Windows,
}

/// A well-known location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Scratch directory
    TempDir,
    /// Log directory
    LogDir,
    /// Agent data (tools, charms, locks)
    DataDir,
    /// Mount point root for machine-level storage
    StorageDir,
    /// Configuration directory
    ConfDir,
    /// The `tether-run` helper binary
    RunBinary,
    /// The `tether-dumplogs` helper binary
    DumpLogsBinary,
    /// Extra certificates added to the client certificate pool
    CertDir,
    /// Spool directory for collected metrics
    MetricsSpoolDir,
    /// Persistent uniter state
    UniterStateDir,
}

static UNIX_PATHS: Lazy<HashMap<PathKind, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (PathKind::TempDir, "/tmp"),
        (PathKind::LogDir, "/var/log"),
        (PathKind::DataDir, "/var/lib/tether"),
        (PathKind::StorageDir, "/var/lib/tether/storage"),
        (PathKind::ConfDir, "/etc/tether"),
        (PathKind::RunBinary, "/usr/bin/tether-run"),
        (PathKind::DumpLogsBinary, "/usr/bin/tether-dumplogs"),
        (PathKind::CertDir, "/etc/tether/certs.d"),
        (PathKind::MetricsSpoolDir, "/var/lib/tether/metricspool"),
        (PathKind::UniterStateDir, "/var/lib/tether/uniter/state"),
    ])
});

static WINDOWS_PATHS: Lazy<HashMap<PathKind, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (PathKind::TempDir, "C:/Tether/tmp"),
        (PathKind::LogDir, "C:/Tether/log"),
        (PathKind::DataDir, "C:/Tether/lib/tether"),
        (PathKind::StorageDir, "C:/Tether/lib/tether/storage"),
        (PathKind::ConfDir, "C:/Tether/etc"),
        (PathKind::RunBinary, "C:/Tether/bin/tether-run.exe"),
        (PathKind::DumpLogsBinary, "C:/Tether/bin/tether-dumplogs.exe"),
        (PathKind::CertDir, "C:/Tether/certs"),
        (PathKind::MetricsSpoolDir, "C:/Tether/lib/tether/metricspool"),
        (PathKind::UniterStateDir, "C:/Tether/lib/tether/uniter/state"),
    ])
});

static SERIES_OS: Lazy<HashMap<&'static str, OsType>> = Lazy::new(|| {
    let ubuntu = [
        "precise", "quantal", "raring", "saucy", "trusty", "utopic", "vivid", "wily", "xenial",
    ];
    let windows = [
        "win2012hvr2", "win2012hv", "win2012r2", "win2012", "win7", "win8", "win81", "win10",
    ];
    ubuntu
        .iter()
        .map(|s| (*s, OsType::Ubuntu))
        .chain(windows.iter().map(|s| (*s, OsType::Windows)))
        .chain(std::iter::once(("centos7", OsType::CentOS)))
        .collect()
});

/// Look up the operating system family for a series
pub fn os_from_series(series: &str) -> TetherResult<OsType> {
    SERIES_OS
        .get(series)
        .copied()
        .ok_or_else(|| TetherError::not_valid(format!("unknown OS for series: {:?}", series)))
}

/// Resolve a well-known path for a series
pub fn path_for(series: &str, kind: PathKind) -> TetherResult<&'static str> {
    let table = match os_from_series(series)? {
        OsType::Windows => &*WINDOWS_PATHS,
        OsType::Ubuntu | OsType::CentOS => &*UNIX_PATHS,
    };
    table
        .get(&kind)
        .copied()
        .ok_or_else(|| TetherError::internal(format!("no {:?} entry in path table", kind)))
}

/// Scratch directory for the series
pub fn temp_dir(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::TempDir)
}

/// Directory where agents write log files
pub fn log_dir(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::LogDir)
}

/// Directory holding tools, charms and locks
pub fn data_dir(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::DataDir)
}

/// Directory where machine-level storage is mounted
pub fn storage_dir(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::StorageDir)
}

/// Configuration directory
pub fn conf_dir(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::ConfDir)
}

/// Absolute path of the `tether-run` binary
pub fn run_binary(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::RunBinary)
}

/// Absolute path of the `tether-dumplogs` binary
pub fn dump_logs_binary(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::DumpLogsBinary)
}

/// Directory of extra client certificates
pub fn cert_dir(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::CertDir)
}

/// Spool directory for metrics
pub fn metrics_spool_dir(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::MetricsSpoolDir)
}

/// Uniter state directory
pub fn uniter_state_dir(series: &str) -> TetherResult<&'static str> {
    path_for(series, PathKind::UniterStateDir)
}
