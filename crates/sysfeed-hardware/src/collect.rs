//! Raw host samples.

use std::path::Path;

use sysfeed_core::{SourceError, UpdateKind};
use sysinfo::{Disks, ProcessesToUpdate, System};

/// OS, host and memory summary.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemInfo {
    /// Operating system family (`linux`, `macos`, ...).
    pub os: String,
    /// Distribution and version, e.g. `ubuntu 24.04`.
    pub platform: String,
    /// Host name.
    pub hostname: String,
    /// Number of running processes.
    pub processes: usize,
    /// Total memory in bytes.
    pub total_memory: u64,
    /// Free memory in bytes.
    pub free_memory: u64,
    /// Used memory as a percentage of total.
    pub used_memory_pct: f64,
}

/// Usage of one filesystem.
#[derive(Clone, Debug, PartialEq)]
pub struct DiskInfo {
    /// Total space in bytes.
    pub total_space: u64,
    /// Used space in bytes.
    pub used_space: u64,
    /// Available space in bytes.
    pub free_space: u64,
    /// Used space as a percentage of total.
    pub used_space_pct: f64,
}

/// CPU model and per-core usage.
#[derive(Clone, Debug, PartialEq)]
pub struct CpuInfo {
    /// Marketing name of the first CPU.
    pub model_name: String,
    /// Vendor id of the first CPU.
    pub family: String,
    /// Frequency of the first CPU in MHz.
    pub speed_mhz: u64,
    /// Usage percent per logical core, in core order.
    pub cores_usage: Vec<f32>,
}

/// `part / whole * 100`, or `0` for an empty whole.
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Sample memory, host and process data.
pub fn system_info(sys: &mut System) -> Result<SystemInfo, SourceError> {
    sys.refresh_memory();
    let _ = sys.refresh_processes(ProcessesToUpdate::All, true);

    let total_memory = sys.total_memory();
    if total_memory == 0 {
        return Err(SourceError::Collect {
            section: UpdateKind::SystemData,
            reason: "memory totals not reported".to_string(),
        });
    }
    let free_memory = sys.free_memory();
    let used_memory_pct = percent(sys.used_memory(), total_memory);

    let platform = match System::os_version() {
        Some(version) => format!("{} {version}", System::distribution_id()),
        None => System::distribution_id(),
    };

    Ok(SystemInfo {
        os: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
        platform,
        hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        processes: sys.processes().len(),
        total_memory,
        free_memory,
        used_memory_pct,
    })
}

/// Sample the filesystem mounted at `mount_point`.
pub fn disk_info(mount_point: &Path) -> Result<DiskInfo, SourceError> {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == mount_point)
        .ok_or_else(|| SourceError::Unavailable {
            section: UpdateKind::DiskData,
            reason: format!("no filesystem mounted at {}", mount_point.display()),
        })?;

    Ok(disk_usage(disk.total_space(), disk.available_space()))
}

/// Derive used space and percentage from total/available.
pub fn disk_usage(total_space: u64, free_space: u64) -> DiskInfo {
    let used_space = total_space.saturating_sub(free_space);
    DiskInfo {
        total_space,
        used_space,
        free_space,
        used_space_pct: percent(used_space, total_space),
    }
}

/// Sample CPU identity and per-core usage.
///
/// Usage is measured since the previous refresh of `sys`, so the first call after
/// construction reports near-zero values.
pub fn cpu_info(sys: &mut System) -> Result<CpuInfo, SourceError> {
    sys.refresh_cpu_all();

    let cpus = sys.cpus();
    let first = cpus.first().ok_or_else(|| SourceError::Unavailable {
        section: UpdateKind::CpuData,
        reason: "no CPUs reported".to_string(),
    })?;

    Ok(CpuInfo {
        model_name: first.brand().trim().to_string(),
        family: first.vendor_id().to_string(),
        speed_mhz: first.frequency(),
        cores_usage: cpus.iter().map(sysinfo::Cpu::cpu_usage).collect(),
    })
}
